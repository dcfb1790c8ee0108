use std::env;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use sys_locale::get_locale;
use tracing::debug;

use crate::cache::api::{CacheAPI, MapAPI};
use crate::cache::local::LocalCache;
use crate::cache::memory::MemoryCache;
use crate::error::ExtractError;
use crate::page::{Item, PageResult};
use crate::wrap::{SingleLine, TitleLayout, TitleWrapper};

/// The mobile site serves the single-column layouts the mapper understands best.
const MWEB_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Mobile Safari/537.36";

/// HTTP transport collaborator. An error or an empty body is a transport failure.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<String>;

    async fn post_json(&self, url: &str, body: String) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(locale: &Locale) -> Result<Self> {
        Ok(HttpFetcher {
            client: build_http(locale)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String> {
        Ok(self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    async fn post_json(&self, url: &str, body: String) -> Result<String> {
        Ok(self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }
}

/// Language and region codes, injected verbatim into request bodies.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Locale {
    /// ISO 639-1, lowercase
    pub hl: String,
    /// ISO 3166-1 alpha-2, uppercase
    pub gl: String,
}

impl Default for Locale {
    fn default() -> Self {
        Locale::new("en", "US")
    }
}

impl Locale {
    pub fn new(hl: &str, gl: &str) -> Self {
        Locale {
            hl: hl.to_string(),
            gl: gl.to_string(),
        }
    }

    pub fn from_system() -> Self {
        get_locale()
            .filter(|l| l != "c" && l != "C")
            .map(|l| Locale::parse(&l))
            .unwrap_or_default()
    }

    /// Parses BCP 47 (`en-US`) and POSIX (`pl_PL.UTF-8`) style tags.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.split(['.', '@']).next().unwrap_or_default();
        let mut parts = tag.split(['-', '_']);
        let hl = parts
            .next()
            .filter(|l| l.len() >= 2)
            .map(str::to_lowercase)
            .unwrap_or_else(|| "en".to_string());
        let gl = parts
            .find(|p| p.len() == 2)
            .map(str::to_uppercase)
            .unwrap_or_else(|| "US".to_string());
        Locale { hl, gl }
    }
}

#[derive(Clone)]
pub struct ExtractionContext {
    pub http: Arc<dyn Fetcher>,
    pub locale: Locale,
    pub title_wrapper: Arc<dyn TitleWrapper>,
    pub title_layout: TitleLayout,
    pub cache: CacheAPI,
}

impl ExtractionContext {
    pub fn new() -> Result<ExtractionContext> {
        ExtractionContext::new_with_locale(Locale::from_system())
    }

    pub fn new_with_locale(locale: Locale) -> Result<ExtractionContext> {
        Ok(ExtractionContext {
            http: Arc::new(HttpFetcher::new(&locale)?),
            locale,
            title_wrapper: Arc::new(SingleLine),
            title_layout: TitleLayout::default(),
            cache: CacheAPI::new(Arc::new(LocalCache::new())),
        })
    }

    /// Context over a caller-supplied transport, with an in-memory cache.
    pub fn with_fetcher(http: Arc<dyn Fetcher>, locale: Locale) -> ExtractionContext {
        ExtractionContext {
            http,
            locale,
            title_wrapper: Arc::new(SingleLine),
            title_layout: TitleLayout::default(),
            cache: CacheAPI::new(Arc::new(MemoryCache::new())),
        }
    }

    pub fn with_title_wrapper(
        mut self,
        wrapper: Arc<dyn TitleWrapper>,
        layout: TitleLayout,
    ) -> ExtractionContext {
        self.title_wrapper = wrapper;
        self.title_layout = layout;
        self
    }

    pub async fn get_body(&self, resource_name: &str, url: &str) -> Result<String, ExtractError> {
        match self.http.get(url).await {
            Ok(body) if !body.is_empty() => Ok(body),
            Ok(_) => {
                debug!(resource = resource_name, url, "empty body");
                Err(ExtractError::TransportFailure(resource_name.to_string()))
            }
            Err(e) => {
                debug!(resource = resource_name, url, error = %e, "GET failed");
                Err(ExtractError::TransportFailure(resource_name.to_string()))
            }
        }
    }

    pub async fn post_body(
        &self,
        resource_name: &str,
        url: &str,
        body: String,
    ) -> Result<String, ExtractError> {
        match self.http.post_json(url, body).await {
            Ok(body) if !body.is_empty() => Ok(body),
            Ok(_) => {
                debug!(resource = resource_name, url, "empty body");
                Err(ExtractError::TransportFailure(resource_name.to_string()))
            }
            Err(e) => {
                debug!(resource = resource_name, url, error = %e, "POST failed");
                Err(ExtractError::TransportFailure(resource_name.to_string()))
            }
        }
    }

    /// Appends items to the page through this context's title wrapper.
    pub fn append_items(&self, page: &mut PageResult, items: Vec<Item>) {
        page.extend_items(items, self.title_wrapper.as_ref(), &self.title_layout);
    }
}

pub fn build_http(locale: &Locale) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_str(&format!(
            "{}-{},{};q=0.9",
            locale.hl, locale.gl, locale.hl
        ))?,
    );

    let mut builder = reqwest::ClientBuilder::new()
        .user_agent(MWEB_USER_AGENT)
        .default_headers(headers);

    if let Ok(proxy) = env::var("http_proxy") {
        builder = builder
            .danger_accept_invalid_certs(true)
            .proxy(reqwest::Proxy::all(proxy)?);
    }

    Ok(builder.build()?)
}
