use tracing::{debug, warn};
use tubescope_extractor_api::url::Url;
use tubescope_extractor_api::{
    async_trait, ExtractError, ExtractionContext, ListExtractor, NewExtractor, PageKind,
    PageResult, PlaylistItem, URLMatcher,
};

use super::common::{fetch_initial, innertube_request, is_youtube_url, MOBILE_ORIGIN};
use super::continuation::continue_page;
use super::mapper::{map_channel_page, map_playlists_tab};
use super::types::request::{self, clients::MWEB};

#[derive(Clone, Copy)]
pub struct YoutubeChannelLE {}

impl NewExtractor for YoutubeChannelLE {
    fn new() -> Self {
        YoutubeChannelLE {}
    }
}

/// The uploads tab of a channel on the mobile site, whichever host and tab the URL pointed at.
pub fn normalize_channel_url(url: &Url) -> Option<String> {
    if !is_youtube_url(url) {
        return None;
    }
    let mut segments = url.path_segments()?;
    let first = segments.next()?;
    if first.starts_with('@') && first.len() > 1 {
        return Some(format!("{MOBILE_ORIGIN}/{first}/videos"));
    }
    let id = segments.next().filter(|s| !s.is_empty())?;
    matches!(first, "channel" | "c" | "user").then(|| format!("{MOBILE_ORIGIN}/{first}/{id}/videos"))
}

impl YoutubeChannelLE {
    /// Loads the channel's playlists tab into `page.playlists`, replacing what was there.
    pub async fn load_playlists(
        &self,
        ctx: &ExtractionContext,
        page: &mut PageResult,
    ) -> Result<usize, ExtractError> {
        match self.fetch_playlists(ctx, page).await {
            Ok(playlists) => {
                debug!(channel = %page.id, playlists = playlists.len(), "playlists loaded");
                page.playlists = playlists;
                page.error = None;
                Ok(page.playlists.len())
            }
            Err(e) => {
                warn!(channel = %page.id, error = %e, "loading playlists failed");
                page.fail(e.clone());
                Err(e)
            }
        }
    }

    async fn fetch_playlists(
        &self,
        ctx: &ExtractionContext,
        page: &PageResult,
    ) -> Result<Vec<PlaylistItem>, ExtractError> {
        let api_key = page
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ExtractError::MissingApiKey)?;
        let tab = page
            .playlist_tab
            .as_ref()
            .filter(|t| !t.browse_id.is_empty() && !t.params.is_empty())
            .ok_or(ExtractError::MissingPlaylistTab)?;
        let json = request::Browse {
            context: MWEB.context(&ctx.locale),
            browse_id: Some(tab.browse_id.clone()),
            params: Some(tab.params.clone()),
            ..Default::default()
        };
        let response =
            innertube_request(ctx, "channel playlists", &MWEB, "browse", api_key, json).await?;
        Ok(map_playlists_tab(&response))
    }
}

impl URLMatcher for YoutubeChannelLE {
    fn match_extractor(&self, url: &Url) -> bool {
        normalize_channel_url(url).is_some()
    }
}

#[async_trait]
impl ListExtractor for YoutubeChannelLE {
    async fn extract_list_initial(&self, ctx: &ExtractionContext, url: &Url) -> PageResult {
        let mut page = PageResult::new(PageKind::Channel, url.as_str());
        let Some(normalized) = normalize_channel_url(url) else {
            page.fail(ExtractError::InvalidUrl(url.to_string()));
            return page;
        };
        page.url = normalized;
        if let Err(e) = fetch_initial(ctx, &mut page, "channel page", map_channel_page).await {
            warn!(url = %page.url, error = %e, "channel extraction failed");
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

    use futures::prelude::*;
    use futures::stream;
    use serde_json::json;
    use tubescope_extractor_api::url::Url;
    use tubescope_extractor_api::{
        BrowseTarget, ExtractError, Item, ListExtractor, PageKind, PageResult, URLMatcher,
    };

    use super::{normalize_channel_url, YoutubeChannelLE};
    use crate::test_support::{context, token_needle, FixtureFetcher};

    const VIDEOS_URL: &str = "https://m.youtube.com/c/Astrophysicsynth/videos";
    const CANONICAL_URL: &str = "https://m.youtube.com/channel/UCWSC_-y9QsDmACXRY3rvtsQ";

    fn channel_html(with_key: bool) -> String {
        let data = json!({
            "metadata": {"channelMetadataRenderer": {"title": "Astrophysics", "externalId": "UCWSC_-y9QsDmACXRY3rvtsQ"}},
            "contents": {"singleColumnBrowseResultsRenderer": {"tabs": [
                {"tabRenderer": {"content": {"sectionListRenderer": {"contents": [
                    {"itemSectionRenderer": {"contents": [
                        {"compactVideoRenderer": {"videoId": "abc123", "title": {"runs": [{"text": "Nightcall"}]}}},
                        {"continuationItemRenderer": {"continuationEndpoint": {"continuationCommand": {"token": "page2"}}}}
                    ]}}
                ]}}}},
                {"tabRenderer": {"endpoint": {
                    "commandMetadata": {"webCommandMetadata": {"url": "/c/Astrophysicsynth/playlists"}},
                    "browseEndpoint": {"browseId": "UCWSC_-y9QsDmACXRY3rvtsQ", "params": "EglwbGF5bGlzdHM%3D"}
                }}}
            ]}}
        });
        let key = if with_key {
            r#"ytcfg.set({"INNERTUBE_API_KEY":"KEY"});"#
        } else {
            ""
        };
        format!("<html><script>{key}</script><script>var ytInitialData = {data};</script></html>")
    }

    fn page2() -> String {
        json!({"onResponseReceivedActions": [{"appendContinuationItemsAction": {"continuationItems": [
            {"compactVideoRenderer": {"videoId": "def456", "title": {"simpleText": "Resonance"}}}
        ]}}]})
        .to_string()
    }

    #[test]
    fn normalizes_channel_urls() {
        let normalize = |u: &str| normalize_channel_url(&Url::parse(u).unwrap());
        assert_eq!(
            normalize("https://www.youtube.com/c/Astrophysicsynth").as_deref(),
            Some(VIDEOS_URL)
        );
        assert_eq!(
            normalize("https://youtube.com/channel/UCWSC_-y9QsDmACXRY3rvtsQ/playlists").as_deref(),
            Some("https://m.youtube.com/channel/UCWSC_-y9QsDmACXRY3rvtsQ/videos")
        );
        assert_eq!(
            normalize("https://m.youtube.com/@astrophysics").as_deref(),
            Some("https://m.youtube.com/@astrophysics/videos")
        );
        assert_eq!(normalize("https://m.youtube.com/watch?v=abc123"), None);
        assert_eq!(normalize("https://example.com/c/Astrophysicsynth"), None);
        assert_eq!(normalize("https://www.youtube.com/c/"), None);
    }

    #[test]
    fn url_matching() {
        let yt = YoutubeChannelLE {};
        assert!(yt.match_extractor(&Url::parse("https://www.youtube.com/c/Astrophysicsynth/videos").unwrap()));
        assert!(!yt.match_extractor(&Url::parse("https://www.youtube.com/playlist?list=PL1").unwrap()));
    }

    #[tokio::test]
    async fn extracts_and_continues_a_channel() {
        let fetcher = Arc::new(
            FixtureFetcher::new()
                .page(VIDEOS_URL, &channel_html(true))
                .post(&token_needle("page2"), &page2()),
        );
        let ctx = context(fetcher.clone());
        let yt = YoutubeChannelLE {};
        let url = Url::parse("https://www.youtube.com/c/Astrophysicsynth").unwrap();

        let initial = yt.extract_list_initial(&ctx, &url).await;
        assert_eq!(initial.error, None);
        assert_eq!(initial.url_original, "https://www.youtube.com/c/Astrophysicsynth");
        assert_eq!(initial.url, CANONICAL_URL);
        assert_eq!(initial.id, "UCWSC_-y9QsDmACXRY3rvtsQ");
        assert_eq!(initial.api_key.as_deref(), Some("KEY"));
        assert_eq!(initial.items().len(), 1);

        let pages: Vec<usize> = stream::unfold(initial, |mut page| {
            let local = ctx.clone();
            async move {
                yt.extract_list_continuation(&local, &mut page)
                    .await
                    .ok()
                    .map(|n| (n, page))
            }
        })
        .collect()
        .await;
        assert_eq!(pages, vec![1]);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn handle_urls_resolve_to_the_channel_id() {
        let fetcher = Arc::new(
            FixtureFetcher::new().page("https://m.youtube.com/@astrophysics/videos", &channel_html(true)),
        );
        let ctx = context(fetcher.clone());
        let url = Url::parse("https://www.youtube.com/@astrophysics").unwrap();
        let page = YoutubeChannelLE {}.extract_list_initial(&ctx, &url).await;
        assert_eq!(page.error, None);
        assert_eq!(page.url_original, "https://www.youtube.com/@astrophysics");
        assert_eq!(page.url, CANONICAL_URL);
        assert_eq!(fetcher.requests()[0].0, "https://m.youtube.com/@astrophysics/videos");
    }

    #[tokio::test]
    async fn missing_key_keeps_mapped_items() {
        let ctx = context(Arc::new(
            FixtureFetcher::new().page(VIDEOS_URL, &channel_html(false)),
        ));
        let page = YoutubeChannelLE {}
            .extract_list_initial(&ctx, &Url::parse(VIDEOS_URL).unwrap())
            .await;
        assert_eq!(page.error, Some(ExtractError::ApiKeyNotFound));
        assert_eq!(page.items().len(), 1);
        assert!(page.has_continuation());
    }

    #[tokio::test]
    async fn download_failure() {
        let ctx = context(Arc::new(FixtureFetcher::new()));
        let page = YoutubeChannelLE {}
            .extract_list_initial(&ctx, &Url::parse(VIDEOS_URL).unwrap())
            .await;
        assert_eq!(
            page.error,
            Some(ExtractError::TransportFailure("channel page".to_string()))
        );
        assert!(page.items().is_empty());
    }

    #[tokio::test]
    async fn invalid_url() {
        let ctx = context(Arc::new(FixtureFetcher::new()));
        let url = Url::parse("https://example.com/c/x").unwrap();
        let page = YoutubeChannelLE {}.extract_list_initial(&ctx, &url).await;
        assert_eq!(page.error, Some(ExtractError::InvalidUrl(url.to_string())));
        assert_eq!(page.kind, PageKind::Channel);
    }

    #[tokio::test]
    async fn consent_wall_is_malformed_markup() {
        let ctx = context(Arc::new(
            FixtureFetcher::new().page(VIDEOS_URL, "<html>Before you continue to YouTube</html>"),
        ));
        let page = YoutubeChannelLE {}
            .extract_list_initial(&ctx, &Url::parse(VIDEOS_URL).unwrap())
            .await;
        assert!(matches!(page.error, Some(ExtractError::MalformedMarkup(_))));
    }

    #[tokio::test]
    async fn loads_playlists() {
        let response = json!({"contents": {"singleColumnBrowseResultsRenderer": {"tabs": [{"tabRenderer": {"content": {
            "sectionListRenderer": {"contents": [{"itemSectionRenderer": {"contents": [
                {"compactPlaylistRenderer": {
                    "playlistId": "PLa",
                    "title": {"simpleText": "Albums"},
                    "thumbnail": {"thumbnails": [{"url": "https://i.ytimg.com/vi/vidA/hqdefault.jpg", "width": 480, "height": 360}]}
                }}
            ]}}]}
        }}}]}}});
        let fetcher = Arc::new(
            FixtureFetcher::new().post("EglwbGF5bGlzdHM%3D", &response.to_string()),
        );
        let ctx = context(fetcher.clone());
        let yt = YoutubeChannelLE {};

        let mut page = PageResult::new(PageKind::Channel, VIDEOS_URL);
        page.api_key = Some("KEY".to_string());
        page.playlist_tab = Some(BrowseTarget {
            browse_id: "UCWSC_-y9QsDmACXRY3rvtsQ".to_string(),
            params: "EglwbGF5bGlzdHM%3D".to_string(),
        });
        assert_eq!(yt.load_playlists(&ctx, &mut page).await, Ok(1));
        assert_eq!(page.playlists[0].url, "https://m.youtube.com/watch?v=vidA&list=PLa");

        let (_, body) = &fetcher.requests()[0];
        let body: serde_json::Value = serde_json::from_str(body.as_deref().unwrap()).unwrap();
        assert_eq!(body["browseId"], "UCWSC_-y9QsDmACXRY3rvtsQ");
        assert_eq!(body["context"]["client"]["hl"], "en");
        assert_eq!(body["context"]["client"]["gl"], "US");
        assert_eq!(body.get("continuation"), None);
        // playlists do not count as page items
        assert!(page.items().iter().all(|i| !matches!(i, Item::Playlist(_))));
    }

    #[tokio::test]
    async fn playlists_need_key_and_tab() {
        let ctx = context(Arc::new(FixtureFetcher::new()));
        let yt = YoutubeChannelLE {};
        let mut page = PageResult::new(PageKind::Channel, VIDEOS_URL);
        assert_eq!(
            yt.load_playlists(&ctx, &mut page).await,
            Err(ExtractError::MissingApiKey)
        );
        page.api_key = Some("KEY".to_string());
        page.playlist_tab = Some(BrowseTarget {
            browse_id: "UC1".to_string(),
            params: String::new(),
        });
        assert_eq!(
            yt.load_playlists(&ctx, &mut page).await,
            Err(ExtractError::MissingPlaylistTab)
        );
        assert_eq!(page.error, Some(ExtractError::MissingPlaylistTab));
    }
}
