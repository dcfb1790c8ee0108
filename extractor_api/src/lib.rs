#[macro_use]
extern crate smart_default;

mod context;
mod error;
mod page;
mod wrap;

pub mod cache;

pub use context::{build_http, ExtractionContext, Fetcher, HttpFetcher, Locale};
pub use error::ExtractError;
pub use page::{
    BrowseTarget, ChannelItem, Item, PageKind, PageResult, PlaylistItem, VideoItem, WrappedTitle,
};
pub use wrap::{FixedWidthWrapper, SingleLine, TitleLayout, TitleWrapper};

pub use anyhow;
pub use async_trait::async_trait;
pub use url;

use url::Url;

pub trait NewExtractor {
    fn new() -> Self;
}

pub trait URLMatcher {
    fn match_extractor(&self, url: &Url) -> bool;
}

#[async_trait]
pub trait ListExtractor: URLMatcher + Sync + Send {
    /// Fetches the first page of a list (channel uploads, search results, playlist).
    ///
    /// Never fails outright: anything that goes wrong is stored in `PageResult::error`,
    /// next to whatever could still be mapped.
    async fn extract_list_initial(&self, ctx: &ExtractionContext, url: &Url) -> PageResult;

    /// Fetches the next page and appends it to `page`, returning the number of new items.
    ///
    /// `ExtractError::MissingToken` means the list is exhausted, which is not a failure
    /// and leaves `page.error` untouched.
    async fn extract_list_continuation(
        &self,
        ctx: &ExtractionContext,
        page: &mut PageResult,
    ) -> Result<usize, ExtractError>;
}
