use tracing::warn;
use tubescope_extractor_api::url::Url;
use tubescope_extractor_api::{
    async_trait, ExtractError, ExtractionContext, ListExtractor, NewExtractor, PageKind,
    PageResult, URLMatcher,
};

use super::common::{fetch_initial, is_youtube_url, playlist_url};
use super::continuation::continue_page;
use super::mapper::map_playlist_page;

#[derive(Clone, Copy)]
pub struct YoutubePlaylistLE {}

impl NewExtractor for YoutubePlaylistLE {
    fn new() -> Self {
        YoutubePlaylistLE {}
    }
}

fn playlist_id(url: &Url) -> Option<String> {
    if !is_youtube_url(url) || url.path() != "/playlist" {
        return None;
    }
    url.query_pairs()
        .find(|(k, _)| k == "list")
        .map(|(_, v)| v.to_string())
        .filter(|id| !id.is_empty())
}

impl URLMatcher for YoutubePlaylistLE {
    fn match_extractor(&self, url: &Url) -> bool {
        playlist_id(url).is_some()
    }
}

#[async_trait]
impl ListExtractor for YoutubePlaylistLE {
    async fn extract_list_initial(&self, ctx: &ExtractionContext, url: &Url) -> PageResult {
        let mut page = PageResult::new(PageKind::Playlist, url.as_str());
        let Some(id) = playlist_id(url) else {
            page.fail(ExtractError::InvalidUrl(url.to_string()));
            return page;
        };
        page.url = playlist_url(&id);
        page.id = id;
        if let Err(e) = fetch_initial(ctx, &mut page, "playlist page", map_playlist_page).await {
            warn!(url = %page.url, error = %e, "playlist extraction failed");
            page.fail(e);
        }
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

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tubescope_extractor_api::url::Url;
    use tubescope_extractor_api::{ListExtractor, PageKind, URLMatcher};

    use super::YoutubePlaylistLE;
    use crate::test_support::{context, token_needle, FixtureFetcher};

    const PLAYLIST_URL: &str = "https://m.youtube.com/playlist?list=PLpTn8onHfnD2QpCHU-llSG9hbQUwKIVFr";

    #[test]
    fn url_matching() {
        let yt = YoutubePlaylistLE {};
        assert!(yt.match_extractor(
            &Url::parse("https://www.youtube.com/playlist?list=PLpTn8onHfnD2QpCHU-llSG9hbQUwKIVFr").unwrap()
        ));
        assert!(!yt.match_extractor(&Url::parse("https://www.youtube.com/playlist").unwrap()));
        assert!(!yt.match_extractor(&Url::parse("https://www.youtube.com/watch?v=x&list=PL1").unwrap()));
    }

    #[tokio::test]
    async fn extracts_and_continues_a_playlist() {
        let data = json!({
            "metadata": {"playlistMetadataRenderer": {"title": "Outrun"}},
            "contents": {"singleColumnBrowseResultsRenderer": {"tabs": [{"tabRenderer": {"content": {
                "sectionListRenderer": {"contents": [{"itemSectionRenderer": {"contents": [
                    {"playlistVideoListRenderer": {"contents": [
                        {"playlistVideoRenderer": {"videoId": "p1", "title": {"runs": [{"text": "One"}]}}},
                        {"continuationItemRenderer": {"continuationEndpoint": {"continuationCommand": {"token": "plc"}}}}
                    ]}}
                ]}}]}
            }}}]}}
        });
        let html = format!(
            r#"<script>window["ytInitialData"] = {data};</script><script>{{"INNERTUBE_API_KEY":"KEY"}}</script>"#
        );
        let more = json!({"onResponseReceivedActions": [{"appendContinuationItemsAction": {"continuationItems": [
            {"playlistVideoRenderer": {"videoId": "p2"}},
            {"playlistVideoRenderer": {"videoId": "p3"}}
        ]}}]});
        let fetcher = Arc::new(
            FixtureFetcher::new()
                .page(PLAYLIST_URL, &html)
                .post(&token_needle("plc"), &more.to_string()),
        );
        let ctx = context(fetcher.clone());
        let yt = YoutubePlaylistLE {};

        let mut page = yt
            .extract_list_initial(&ctx, &Url::parse(PLAYLIST_URL).unwrap())
            .await;
        assert_eq!(page.error, None);
        assert_eq!(page.kind, PageKind::Playlist);
        assert_eq!(page.id, "PLpTn8onHfnD2QpCHU-llSG9hbQUwKIVFr");
        assert_eq!(page.name, "Outrun");
        assert_eq!(page.items().len(), 1);

        assert_eq!(yt.extract_list_continuation(&ctx, &mut page).await, Ok(2));
        assert_eq!(page.items().len(), 3);
        assert!(fetcher.requests()[1].0.contains("/youtubei/v1/browse?key=KEY"));
        assert!(!page.has_continuation());
    }
}
