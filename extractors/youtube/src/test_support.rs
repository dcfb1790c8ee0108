use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tubescope_extractor_api::anyhow::{bail, Result};
use tubescope_extractor_api::{async_trait, ExtractionContext, Fetcher, Locale};

/// Offline `Fetcher` serving canned pages.
///
/// POST responses are picked by a substring of the request body, which is
/// enough to tell continuation tokens apart.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    posts: Vec<(String, String)>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        FixtureFetcher::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn post(mut self, body_contains: &str, response: &str) -> Self {
        self.posts
            .push((body_contains.to_string(), response.to_string()));
        self
    }

    /// Every request made so far: URL, and body for POSTs.
    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn get(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push((url.to_string(), None));
        match self.pages.get(url) {
            Some(body) => Ok(body.clone()),
            None => bail!("no fixture for {url}"),
        }
    }

    async fn post_json(&self, url: &str, body: String) -> Result<String> {
        let response = self
            .posts
            .iter()
            .find(|(needle, _)| body.contains(needle.as_str()))
            .map(|(_, response)| response.clone());
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), Some(body)));
        match response {
            Some(response) => Ok(response),
            None => bail!("no fixture for POST {url}"),
        }
    }
}

pub fn context(fetcher: Arc<FixtureFetcher>) -> ExtractionContext {
    ExtractionContext::with_fetcher(fetcher, Locale::new("en", "US"))
}

/// `"continuation":"<token>"` as it appears in a serialized request body.
pub fn token_needle(token: &str) -> String {
    format!("\"continuation\":\"{token}\"")
}
