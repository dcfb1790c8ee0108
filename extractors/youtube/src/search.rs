use tracing::warn;
use tubescope_extractor_api::url::Url;
use tubescope_extractor_api::{
    async_trait, ExtractError, ExtractionContext, ListExtractor, NewExtractor, PageKind,
    PageResult, URLMatcher,
};

use super::common::{fetch_initial, is_youtube_url, MOBILE_ORIGIN};
use super::continuation::continue_page;
use super::mapper::map_search_page;

#[derive(Clone, Copy)]
pub struct YoutubeSearchLE {}

impl NewExtractor for YoutubeSearchLE {
    fn new() -> Self {
        YoutubeSearchLE {}
    }
}

pub fn search_url(query: &str) -> Result<Url, ExtractError> {
    Url::parse_with_params(
        &format!("{MOBILE_ORIGIN}/results"),
        &[("search_query", query)],
    )
    .map_err(|_| ExtractError::InvalidUrl(query.to_string()))
}

fn query_of(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == "search_query" || k == "q")
        .map(|(_, v)| v.trim().to_string())
        .filter(|q| !q.is_empty())
}

impl YoutubeSearchLE {
    /// Searches for `query`, which is kept as the page's original URL.
    pub async fn search(&self, ctx: &ExtractionContext, query: &str) -> PageResult {
        let mut page = PageResult::new(PageKind::Search, query);
        self.fetch_results(ctx, &mut page, query).await;
        page
    }

    async fn fetch_results(&self, ctx: &ExtractionContext, page: &mut PageResult, query: &str) {
        page.url = match search_url(query) {
            Ok(url) => url.to_string(),
            Err(e) => {
                page.fail(e);
                return;
            }
        };
        page.name = query.to_string();
        if let Err(e) =
            fetch_initial(ctx, page, "search results", |data, _| map_search_page(data)).await
        {
            warn!(url = %page.url, error = %e, "search failed");
            page.fail(e);
        }
    }
}

impl URLMatcher for YoutubeSearchLE {
    fn match_extractor(&self, url: &Url) -> bool {
        is_youtube_url(url) && url.path() == "/results" && query_of(url).is_some()
    }
}

#[async_trait]
impl ListExtractor for YoutubeSearchLE {
    async fn extract_list_initial(&self, ctx: &ExtractionContext, url: &Url) -> PageResult {
        let mut page = PageResult::new(PageKind::Search, url.as_str());
        let query = match query_of(url).filter(|_| is_youtube_url(url)) {
            Some(query) => query,
            None => {
                page.fail(ExtractError::InvalidUrl(url.to_string()));
                return page;
            }
        };
        self.fetch_results(ctx, &mut page, &query).await;
        page
    }

    async fn extract_list_continuation(
        &self,
        ctx: &ExtractionContext,
        page: &mut PageResult,
    ) -> Result<usize, ExtractError> {
        continue_page(ctx, page).await
    }
}
