//! Descrambling of the `n` query parameter of media URLs.
//!
//! Player scripts rename the transform function every release, so it is found
//! through a stable call-site fingerprint and then run in a throwaway interpreter.

mod locator;
mod sandbox;
mod scan;
mod solver;

use thiserror::Error;
use tubescope_extractor_api::ExtractError;

pub use locator::{locate_n_function, ScriptFunction};
pub use sandbox::{evaluate, evaluate_detailed, Evaluation};
pub use solver::{NsigSolver, PLAYER_FUNCTIONS_POOL};

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum NsigError {
    #[error("expected exactly one n function candidate, found {candidates}")]
    FunctionNameUnresolved { candidates: usize },

    #[error("n function {0} is not defined in the player")]
    FunctionSiteNotFound(String),

    #[error("n function {0} does not end")]
    FunctionTruncated(String),

    #[error("player script URL not found")]
    PlayerNotFound,

    #[error("media URL has no n parameter")]
    MissingParameter,

    #[error("n function returned its input unchanged")]
    Unchanged,

    #[error("n function raised: {0}")]
    ScriptFault(String),

    #[error("invalid URL : {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Fetch(#[from] ExtractError),
}
