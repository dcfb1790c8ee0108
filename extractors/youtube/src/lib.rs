#[macro_use]
extern crate smart_default;

mod common;
mod continuation;
pub mod channel;
pub mod initial_data;
pub mod mapper;
pub mod nsig;
pub mod playlist;
pub mod search;
pub mod types;

#[cfg(test)]
mod test_support;

use once_cell::sync::Lazy;
use tubescope_extractor_api::url::Url;
use tubescope_extractor_api::{ListExtractor, NewExtractor, URLMatcher};

pub use channel::YoutubeChannelLE;
pub use continuation::continue_page;
pub use playlist::YoutubePlaylistLE;
pub use search::YoutubeSearchLE;

pub static EXTRACTORS: Lazy<Vec<Box<dyn ListExtractor>>> = Lazy::new(|| {
    let extractors: Vec<Box<dyn ListExtractor>> = vec![
        Box::new(YoutubePlaylistLE::new()),
        Box::new(YoutubeSearchLE::new()),
        Box::new(YoutubeChannelLE::new()),
    ];
    extractors
});

/// The first extractor claiming `url`.
pub fn extractor_for(url: &Url) -> Option<&'static dyn ListExtractor> {
    EXTRACTORS
        .iter()
        .find(|e| e.match_extractor(url))
        .map(|e| e.as_ref())
}

#[cfg(test)]
mod tests {
    use tubescope_extractor_api::url::Url;

    use super::extractor_for;

    #[test]
    fn dispatches_by_url() {
        for url in [
            "https://www.youtube.com/playlist?list=PL1",
            "https://m.youtube.com/results?search_query=synth",
            "https://youtube.com/c/Astrophysicsynth",
        ] {
            assert!(extractor_for(&Url::parse(url).unwrap()).is_some(), "{url}");
        }
        assert!(extractor_for(&Url::parse("https://m.youtube.com/watch?v=abc123").unwrap()).is_none());
    }
}
