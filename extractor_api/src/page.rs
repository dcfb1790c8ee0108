use serde::{Serialize, Serializer};

use crate::error::ExtractError;
use crate::wrap::{TitleLayout, TitleWrapper};

/// Lines of an item title, as laid out by a `TitleWrapper`.
pub type WrappedTitle = Vec<String>;

/// Which page a result set came from. Decides the continuation endpoint.
#[derive(Serialize, SmartDefault, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    #[default]
    Channel,
    Search,
    Playlist,
}

#[derive(Serialize, Default, PartialEq, Eq, Clone, Debug)]
pub struct VideoItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub thumbnail_url: String,
    pub author: String,
    pub duration_text: String,
    pub publish_date: String,
    pub view_count_text: String,
}

#[derive(Serialize, Default, PartialEq, Eq, Clone, Debug)]
pub struct ChannelItem {
    pub id: String,
    pub url: String,
    pub name: String,
    pub icon_url: String,
    pub subscriber_count_text: String,
    pub video_count_text: String,
}

#[derive(Serialize, Default, PartialEq, Eq, Clone, Debug)]
pub struct PlaylistItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub thumbnail_url: String,
    pub video_count_text: String,
}

/// One entry of a result set. Identity is the canonical URL.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Video(VideoItem),
    Channel(ChannelItem),
    Playlist(PlaylistItem),
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Item::Video(v) => &v.id,
            Item::Channel(c) => &c.id,
            Item::Playlist(p) => &p.id,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Item::Video(v) => &v.url,
            Item::Channel(c) => &c.url,
            Item::Playlist(p) => &p.url,
        }
    }

    /// Video/playlist title, or channel name.
    pub fn title(&self) -> &str {
        match self {
            Item::Video(v) => &v.title,
            Item::Channel(c) => &c.name,
            Item::Playlist(p) => &p.title,
        }
    }

    pub fn thumbnail_url(&self) -> &str {
        match self {
            Item::Video(v) => &v.thumbnail_url,
            Item::Channel(c) => &c.icon_url,
            Item::Playlist(p) => &p.thumbnail_url,
        }
    }
}

/// Browse endpoint of a channel tab, as found in the tab's navigation endpoint.
#[derive(Serialize, Default, PartialEq, Eq, Clone, Debug)]
pub struct BrowseTarget {
    pub browse_id: String,
    pub params: String,
}

/// A channel page, search result or playlist, plus everything needed to fetch more of it.
///
/// Created by an initial fetch and then mutated in place by continuations: items are only
/// ever appended, while the continuation token and the error get replaced.
/// `error` describes the most recent operation only; items already accumulated stay valid.
#[derive(Serialize, Default, Clone, Debug)]
pub struct PageResult {
    pub kind: PageKind,
    /// What the caller asked for, before normalization.
    pub url_original: String,
    pub url: String,
    pub id: String,
    pub name: String,
    pub description: String,
    pub subscriber_count_text: String,
    pub banner_url: String,
    pub icon_url: String,
    /// `None` once the result set is exhausted.
    pub continuation_token: Option<String>,
    pub api_key: Option<String>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ExtractError>,
    pub playlist_tab: Option<BrowseTarget>,
    pub playlists: Vec<PlaylistItem>,
    items: Vec<Item>,
    wrapped_titles: Vec<WrappedTitle>,
}

fn serialize_error<S>(error: &Option<ExtractError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl PageResult {
    pub fn new(kind: PageKind, url_original: &str) -> Self {
        PageResult {
            kind,
            url_original: url_original.to_string(),
            ..Default::default()
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Title lines, index-aligned with `items()`.
    pub fn wrapped_titles(&self) -> &[WrappedTitle] {
        &self.wrapped_titles
    }

    /// Appends items in order, wrapping each title so both sequences keep the same length.
    pub fn extend_items<I>(&mut self, items: I, wrapper: &dyn TitleWrapper, layout: &TitleLayout)
    where
        I: IntoIterator<Item = Item>,
    {
        for item in items {
            self.wrapped_titles.push(wrapper.wrap(item.title(), layout));
            self.items.push(item);
        }
    }

    pub fn has_continuation(&self) -> bool {
        self.continuation_token.is_some()
    }

    /// Replaces the continuation token; an empty token counts as exhaustion.
    pub fn set_continuation(&mut self, token: Option<String>) {
        self.continuation_token = token.filter(|t| !t.is_empty());
    }

    pub fn fail(&mut self, error: ExtractError) {
        self.error = Some(error);
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
