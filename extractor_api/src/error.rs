use thiserror::Error;

/// Errors of the page extraction and pagination engine.
///
/// They are values stored in `PageResult::error`, so they must stay cheap to clone.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum ExtractError {
    #[error("failed to download {0}")]
    TransportFailure(String),

    #[error("invalid URL : {0}")]
    InvalidUrl(String),

    /// No extraction pattern matched, or the embedded document did not parse.
    #[error("{0}")]
    MalformedMarkup(String),

    /// An API response that is not a JSON document.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("INNERTUBE_API_KEY not found")]
    ApiKeyNotFound,

    #[error("continue key empty")]
    MissingApiKey,

    #[error("continue token empty")]
    MissingToken,

    #[error("playlist tab not found")]
    MissingPlaylistTab,
}

impl ExtractError {
    /// Whether this is the normal end of a result set rather than a failure.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ExtractError::MissingToken)
    }
}
