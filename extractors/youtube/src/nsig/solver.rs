use once_cell::sync::Lazy;
use qstring::QString;
use regex::Regex;
use tracing::{debug, warn};
use tubescope_extractor_api::url::Url;
use tubescope_extractor_api::ExtractionContext;

use super::locator::{locate_n_function, ScriptFunction};
use super::sandbox::{evaluate, evaluate_detailed};
use super::NsigError;
use crate::common::watch_url;

pub static PLAYER_FUNCTIONS_POOL: &str = "youtube_js_n_fns";

static WEB_JS_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""jsUrl"\s*:\s*"(/s/player/([a-zA-Z0-9_-]+)/(?:player_ias\.vflset/[^/]+|player-plasma-ias-phone-[^/.]+\.vflset)/base\.js)""#)
        .unwrap()
});

static PLAYER_HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/s/player/([a-zA-Z0-9_-]+)/").unwrap());

/// Transforms `n` values with the function of one player version.
#[derive(Clone, Debug)]
pub struct NsigSolver {
    function: ScriptFunction,
}

impl NsigSolver {
    pub fn new(function: ScriptFunction) -> Self {
        NsigSolver { function }
    }

    pub fn from_script(script: &str) -> Result<Self, NsigError> {
        Ok(NsigSolver::new(locate_n_function(script)?))
    }

    /// Loads the function of a player script, going through the context cache.
    ///
    /// Entries are keyed by the player version hash, which is part of the script path.
    pub async fn from_player_url(
        ctx: &ExtractionContext,
        player_url: &str,
    ) -> Result<Self, NsigError> {
        let player_hash = PLAYER_HASH_RE
            .captures(player_url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or(player_url);

        if let Ok(Some(function)) = ctx
            .cache
            .get::<ScriptFunction>(PLAYER_FUNCTIONS_POOL, player_hash)
            .await
        {
            debug!(player = player_hash, name = %function.name, "n function from cache");
            return Ok(NsigSolver::new(function));
        }

        let script = ctx
            .get_body(&format!("js player {player_hash}"), player_url)
            .await?;
        let function = locate_n_function(&script)?;
        if let Err(e) = ctx
            .cache
            .set(PLAYER_FUNCTIONS_POOL, player_hash, &function)
            .await
        {
            warn!(player = player_hash, error = %e, "could not cache n function");
        }
        Ok(NsigSolver::new(function))
    }

    /// Finds the current player through a video's watch page.
    pub async fn for_video(ctx: &ExtractionContext, video_id: &str) -> Result<Self, NsigError> {
        let webpage = ctx.get_body("watch page", &watch_url(video_id)).await?;
        let script_path = WEB_JS_URL_RE
            .captures(&webpage)
            .and_then(|c| c.get(1))
            .ok_or(NsigError::PlayerNotFound)?
            .as_str();
        let script_url = Url::parse("https://www.youtube.com/")
            .and_then(|base| base.join(script_path))
            .map_err(|_| NsigError::InvalidUrl(script_path.to_string()))?;
        NsigSolver::from_player_url(ctx, script_url.as_str()).await
    }

    pub fn function(&self) -> &ScriptFunction {
        &self.function
    }

    /// Best-effort transform; a script fault yields the fault text.
    pub fn transform(&self, n: &str) -> String {
        evaluate(&self.function.source, n)
    }

    /// Replaces the `n` query parameter of a media URL with its transformed value.
    pub fn descramble_url(&self, media_url: &str) -> Result<String, NsigError> {
        let mut url =
            Url::parse(media_url).map_err(|_| NsigError::InvalidUrl(media_url.to_string()))?;
        let params = QString::from(url.query().unwrap_or_default());
        let original = params
            .get("n")
            .ok_or(NsigError::MissingParameter)?
            .to_string();

        let evaluation = evaluate_detailed(&self.function.source, &original);
        if let Some(fault) = evaluation.fault {
            return Err(NsigError::ScriptFault(fault));
        }
        if evaluation.output == original {
            return Err(NsigError::Unchanged);
        }

        let pairs: Vec<(String, String)> = params
            .into_pairs()
            .into_iter()
            .map(|(k, v)| {
                if k == "n" {
                    (k, evaluation.output.clone())
                } else {
                    (k, v)
                }
            })
            .collect();
        url.set_query(Some(&QString::new(pairs).to_string()));
        Ok(url.to_string())
    }
}
