//! Walks `ytInitialData` documents and API responses into typed items.
//!
//! Every lookup goes through `Value` indexing or JSON pointers, so missing or renamed
//! fields degrade to empty strings instead of failing the whole page.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use tubescope_extractor_api::{
    BrowseTarget, ChannelItem, Item, PageResult, PlaylistItem, VideoItem,
};

use super::common::{
    channel_url, default_thumbnail_url, normalize_scheme, playlist_url, playlist_watch_url,
    watch_url,
};
use super::types::response::parts::Thumbnail;

pub const BANNER_WIDTH: u64 = 1060;
pub const ICON_MAX_WIDTH: u64 = 1024;

type ItemMapper = fn(&Value) -> Option<Item>;

static ITEM_MAPPERS: Lazy<HashMap<&'static str, ItemMapper>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, ItemMapper> = HashMap::new();
    for kind in [
        "compactVideoRenderer",
        "videoRenderer",
        "gridVideoRenderer",
        "playlistVideoRenderer",
    ] {
        map.insert(kind, map_video);
    }
    for kind in [
        "compactChannelRenderer",
        "channelRenderer",
        "gridChannelRenderer",
    ] {
        map.insert(kind, map_channel);
    }
    for kind in [
        "compactPlaylistRenderer",
        "playlistRenderer",
        "gridPlaylistRenderer",
    ] {
        map.insert(kind, map_playlist);
    }
    map
});

/// Renderers that only hold other renderers, and where their children live.
static CONTAINERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("tabRenderer", "/content"),
        ("sectionListRenderer", "/contents"),
        ("itemSectionRenderer", "/contents"),
        ("playlistVideoListRenderer", "/contents"),
        ("richGridRenderer", "/contents"),
        ("richItemRenderer", "/content"),
        ("richSectionRenderer", "/content"),
        ("shelfRenderer", "/content"),
        ("verticalListRenderer", "/items"),
        ("horizontalListRenderer", "/items"),
        ("expandedShelfContentsRenderer", "/items"),
        ("gridRenderer", "/items"),
    ])
});

static THUMBNAIL_VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/vi/([a-zA-Z0-9_-]+)/").unwrap());

/// How to pick one image out of a `thumbnails` list.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ImageSelection {
    /// The last candidate of exactly this width.
    ExactWidth(u64),
    /// The first candidate of the largest width not above the cap.
    MaxWidth(u64),
}

/// Items in source order, plus the last continuation marker seen.
#[derive(Default, Debug)]
pub struct MappedItems {
    pub items: Vec<Item>,
    pub continuation: Option<String>,
}

/// Text of either a `{simpleText}` or a `{runs: [{text}]}` node.
pub fn text_of(value: &Value) -> String {
    if let Some(s) = value.as_str() {
        return s.to_string();
    }
    if let Some(s) = value.get("simpleText").and_then(Value::as_str) {
        return s.to_string();
    }
    value
        .get("runs")
        .and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|r| r.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

fn first_text(body: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|k| text_of(&body[*k]))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn str_at(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Candidates of a `{thumbnails: [...]}` node, skipping malformed entries.
pub fn thumbnails(value: &Value) -> Vec<Thumbnail> {
    value
        .get("thumbnails")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|t| Thumbnail::deserialize(t).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub fn select_thumbnail(candidates: &[Thumbnail], selection: ImageSelection) -> Option<String> {
    let chosen = match selection {
        ImageSelection::ExactWidth(width) => candidates.iter().filter(|t| t.width == width).last(),
        ImageSelection::MaxWidth(cap) => candidates
            .iter()
            .filter(|t| t.width <= cap)
            .fold(None, |best: Option<&Thumbnail>, t| match best {
                Some(b) if b.width >= t.width => Some(b),
                _ => Some(t),
            }),
    };
    chosen
        .filter(|t| !t.url.is_empty())
        .map(|t| normalize_scheme(&t.url))
}

fn map_video(body: &Value) -> Option<Item> {
    let id = str_at(body, "/videoId");
    if id.is_empty() {
        return None;
    }
    let mut duration_text = text_of(&body["lengthText"]);
    if duration_text.is_empty() {
        duration_text = body["thumbnailOverlays"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|o| text_of(&o["thumbnailOverlayTimeStatusRenderer"]["text"]))
            .find(|t| !t.is_empty())
            .unwrap_or_default();
    }
    Some(Item::Video(VideoItem {
        url: watch_url(&id),
        thumbnail_url: default_thumbnail_url(&id),
        title: first_text(body, &["title", "headline"]),
        author: first_text(body, &["shortBylineText", "longBylineText", "ownerText"]),
        duration_text,
        publish_date: text_of(&body["publishedTimeText"]),
        view_count_text: first_text(body, &["viewCountText", "shortViewCountText"]),
        id,
    }))
}

fn map_channel(body: &Value) -> Option<Item> {
    let id = str_at(body, "/channelId");
    if id.is_empty() {
        return None;
    }
    Some(Item::Channel(ChannelItem {
        url: channel_url(&id),
        name: first_text(body, &["title", "displayName"]),
        icon_url: select_thumbnail(
            &thumbnails(&body["thumbnail"]),
            ImageSelection::MaxWidth(ICON_MAX_WIDTH),
        )
        .unwrap_or_default(),
        subscriber_count_text: text_of(&body["subscriberCountText"]),
        video_count_text: text_of(&body["videoCountText"]),
        id,
    }))
}

fn map_playlist(body: &Value) -> Option<Item> {
    let id = str_at(body, "/playlistId");
    if id.is_empty() {
        return None;
    }
    let mut candidates = thumbnails(&body["thumbnail"]);
    if candidates.is_empty() {
        // desktop search results nest them one level deeper
        candidates = thumbnails(&body["thumbnails"][0]);
    }
    let first_video = candidates
        .iter()
        .find_map(|t| THUMBNAIL_VIDEO_ID_RE.captures(&t.url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| str_at(body, "/navigationEndpoint/watchEndpoint/videoId"));
    Some(Item::Playlist(PlaylistItem {
        url: if first_video.is_empty() {
            playlist_url(&id)
        } else {
            playlist_watch_url(&first_video, &id)
        },
        title: text_of(&body["title"]),
        thumbnail_url: select_thumbnail(&candidates, ImageSelection::MaxWidth(u64::MAX))
            .unwrap_or_default(),
        video_count_text: first_text(body, &["videoCountShortText", "videoCountText", "videoCount"]),
        id,
    }))
}

fn continuation_token(body: &Value) -> Option<String> {
    [
        "/continuationEndpoint/continuationCommand/token",
        "/button/buttonRenderer/command/continuationCommand/token",
    ]
    .into_iter()
    .map(|p| str_at(body, p))
    .find(|t| !t.is_empty())
}

fn legacy_continuation(body: &Value) -> Option<String> {
    body["continuations"]
        .as_array()?
        .iter()
        .filter_map(|c| c["nextContinuationData"]["continuation"].as_str())
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Maps one `{kind: body}` wrapper, recursing into containers.
fn walk(renderer: &Value, out: &mut MappedItems) {
    let Some(wrapper) = renderer.as_object() else {
        return;
    };
    for (kind, body) in wrapper {
        if let Some(mapper) = ITEM_MAPPERS.get(kind.as_str()) {
            match mapper(body) {
                Some(item) => out.items.push(item),
                None => debug!(kind = kind.as_str(), "renderer without id, skipped"),
            }
        } else if kind == "continuationItemRenderer" {
            match continuation_token(body) {
                Some(token) => out.continuation = Some(token),
                None => debug!("continuation marker without token"),
            }
        } else if let Some(pointer) = CONTAINERS.get(kind.as_str()) {
            match body.pointer(pointer) {
                Some(Value::Array(children)) => children.iter().for_each(|c| walk(c, out)),
                Some(child) => walk(child, out),
                None => {}
            }
            if let Some(token) = legacy_continuation(body) {
                out.continuation = Some(token);
            }
        } else {
            debug!(kind = kind.as_str(), "unknown renderer, skipped");
        }
    }
}

fn walk_list(list: &Value, out: &mut MappedItems) {
    for renderer in list.as_array().into_iter().flatten() {
        walk(renderer, out);
    }
}

fn tabs(data: &Value) -> impl Iterator<Item = &Value> + '_ {
    [
        "singleColumnBrowseResultsRenderer",
        "twoColumnBrowseResultsRenderer",
    ]
    .into_iter()
    .filter_map(move |layout| data["contents"][layout]["tabs"].as_array())
    .flatten()
}

fn walk_tabs(data: &Value) -> MappedItems {
    let mut out = MappedItems::default();
    for tab in tabs(data) {
        walk(tab, &mut out);
    }
    out
}

fn playlist_tab(tab: &Value) -> Option<BrowseTarget> {
    let renderer = &tab["tabRenderer"];
    str_at(renderer, "/endpoint/commandMetadata/webCommandMetadata/url")
        .ends_with("/playlists")
        .then(|| BrowseTarget {
            browse_id: str_at(renderer, "/endpoint/browseEndpoint/browseId"),
            params: str_at(renderer, "/endpoint/browseEndpoint/params"),
        })
}

/// Channel uploads carry no byline, the channel itself is the author.
pub fn inherit_author(items: &mut [Item], author: &str) {
    for item in items {
        if let Item::Video(video) = item {
            if video.author.is_empty() {
                video.author = author.to_string();
            }
        }
    }
}

pub fn map_channel_page(data: &Value, page: &mut PageResult) -> MappedItems {
    let meta = &data["metadata"]["channelMetadataRenderer"];
    page.name = str_at(meta, "/title");
    page.id = str_at(meta, "/externalId");
    if !page.id.is_empty() {
        page.url = channel_url(&page.id);
    }
    page.description = str_at(meta, "/description");

    let header = &data["header"]["c4TabbedHeaderRenderer"];
    page.subscriber_count_text = text_of(&header["subscriberCountText"]);
    page.banner_url = select_thumbnail(
        &thumbnails(&header["banner"]),
        ImageSelection::ExactWidth(BANNER_WIDTH),
    )
    .unwrap_or_default();
    page.icon_url = select_thumbnail(
        &thumbnails(&header["avatar"]),
        ImageSelection::MaxWidth(ICON_MAX_WIDTH),
    )
    .unwrap_or_default();
    page.playlist_tab = tabs(data).find_map(playlist_tab);

    let mut mapped = walk_tabs(data);
    inherit_author(&mut mapped.items, &page.name);
    debug!(
        channel = %page.id,
        items = mapped.items.len(),
        has_continuation = mapped.continuation.is_some(),
        "mapped channel page"
    );
    mapped
}

pub fn map_search_page(data: &Value) -> MappedItems {
    let root = data
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents")
        .unwrap_or(&data["contents"]);
    let mut mapped = MappedItems::default();
    walk(root, &mut mapped);
    debug!(items = mapped.items.len(), "mapped search page");
    mapped
}

pub fn map_playlist_page(data: &Value, page: &mut PageResult) -> MappedItems {
    let meta = &data["metadata"]["playlistMetadataRenderer"];
    page.name = str_at(meta, "/title");
    if page.name.is_empty() {
        page.name = text_of(&data["header"]["playlistHeaderRenderer"]["title"]);
    }
    page.description = str_at(meta, "/description");
    let mapped = walk_tabs(data);
    debug!(playlist = %page.id, items = mapped.items.len(), "mapped playlist page");
    mapped
}

/// Items of a continuation response, whichever envelope it came in.
pub fn map_continuation_response(data: &Value) -> MappedItems {
    let mut mapped = MappedItems::default();
    for envelope in [
        "onResponseReceivedActions",
        "onResponseReceivedCommands",
        "onResponseReceivedEndpoints",
    ] {
        for action in data[envelope].as_array().into_iter().flatten() {
            for kind in [
                "appendContinuationItemsAction",
                "reloadContinuationItemsCommand",
            ] {
                walk_list(&action[kind]["continuationItems"], &mut mapped);
            }
        }
    }
    for legacy in [
        "sectionListContinuation",
        "playlistVideoListContinuation",
        "itemSectionContinuation",
        "gridContinuation",
    ] {
        let body = &data["continuationContents"][legacy];
        walk_list(&body["contents"], &mut mapped);
        walk_list(&body["items"], &mut mapped);
        if let Some(token) = legacy_continuation(body) {
            mapped.continuation = Some(token);
        }
    }
    debug!(
        items = mapped.items.len(),
        has_continuation = mapped.continuation.is_some(),
        "mapped continuation"
    );
    mapped
}

/// Playlists listed on a channel's playlists tab.
pub fn map_playlists_tab(data: &Value) -> Vec<PlaylistItem> {
    walk_tabs(data)
        .items
        .into_iter()
        .filter_map(|item| match item {
            Item::Playlist(playlist) => Some(playlist),
            _ => None,
        })
        .collect()
}
