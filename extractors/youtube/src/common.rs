use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tubescope_extractor_api::url::Url;
use tubescope_extractor_api::{ExtractError, ExtractionContext, PageResult};

use super::initial_data;
use super::mapper::MappedItems;
use super::types::request;

pub static YOUTUBE_HOSTS_MAIN: Lazy<Vec<&str>> = Lazy::new(|| {
    vec![
        "youtube.com",
        "www.youtube.com",
        "m.youtube.com",
        "music.youtube.com",
    ]
});

/// Everything links to the mobile site, whatever host the source used.
pub const MOBILE_ORIGIN: &str = "https://m.youtube.com";

pub fn watch_url(video_id: &str) -> String {
    format!("{MOBILE_ORIGIN}/watch?v={video_id}")
}

pub fn playlist_watch_url(video_id: &str, playlist_id: &str) -> String {
    format!("{MOBILE_ORIGIN}/watch?v={video_id}&list={playlist_id}")
}

pub fn playlist_url(playlist_id: &str) -> String {
    format!("{MOBILE_ORIGIN}/playlist?list={playlist_id}")
}

pub fn channel_url(channel_id: &str) -> String {
    format!("{MOBILE_ORIGIN}/channel/{channel_id}")
}

pub fn default_thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{video_id}/default.jpg")
}

/// Prefixes protocol-less (`//host/path`) URLs with `https:`.
pub fn normalize_scheme(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

pub fn is_youtube_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url
            .host_str()
            .map(|h| YOUTUBE_HOSTS_MAIN.contains(&h))
            .unwrap_or(false)
}

pub async fn innertube_request<S>(
    ctx: &ExtractionContext,
    resource_name: &str,
    client: &request::Client<'_>,
    endpoint: &str,
    api_key: &str,
    json: S,
) -> Result<Value, ExtractError>
where
    S: Serialize,
{
    let body = serde_json::to_string(&json)
        .map_err(|e| ExtractError::MalformedResponse(e.to_string()))?;
    let response = ctx
        .post_body(
            resource_name,
            &format!(
                "https://{}/youtubei/v1/{}?key={}",
                client.host, endpoint, api_key
            ),
            body,
        )
        .await?;
    initial_data::parse_response(&response)
}

/// Downloads `page.url`, maps its embedded data into `page` and captures the API key.
///
/// Items mapped before a missing key is noticed stay on the page.
pub async fn fetch_initial<F>(
    ctx: &ExtractionContext,
    page: &mut PageResult,
    resource_name: &str,
    map: F,
) -> Result<(), ExtractError>
where
    F: FnOnce(&Value, &mut PageResult) -> MappedItems,
{
    let html = ctx.get_body(resource_name, &page.url).await?;
    let data = initial_data::initial_data(&html)?;
    let mapped = map(&data, page);
    debug!(url = %page.url, items = mapped.items.len(), "initial page mapped");
    ctx.append_items(page, mapped.items);
    page.set_continuation(mapped.continuation);
    page.api_key = initial_data::extract_api_key(&html);
    if page.api_key.is_none() {
        return Err(ExtractError::ApiKeyNotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tubescope_extractor_api::url::Url;

    use super::{default_thumbnail_url, is_youtube_url, normalize_scheme, watch_url};

    #[test]
    fn video_templates() {
        assert_eq!(watch_url("abc123"), "https://m.youtube.com/watch?v=abc123");
        assert!(default_thumbnail_url("abc123").contains("/vi/abc123/default.jpg"));
    }

    #[test]
    fn protocol_less_urls_get_https() {
        assert_eq!(
            normalize_scheme("//yt3.ggpht.com/banner=w1060"),
            "https://yt3.ggpht.com/banner=w1060"
        );
        assert_eq!(
            normalize_scheme("https://i.ytimg.com/vi/x/default.jpg"),
            "https://i.ytimg.com/vi/x/default.jpg"
        );
        assert_eq!(normalize_scheme(""), "");
    }

    #[test]
    fn matches_youtube_hosts_only() {
        assert!(is_youtube_url(&Url::parse("https://www.youtube.com/c/x").unwrap()));
        assert!(!is_youtube_url(&Url::parse("https://youtu.be/x").unwrap()));
        assert!(!is_youtube_url(&Url::parse("ftp://m.youtube.com/x").unwrap()));
    }
}
