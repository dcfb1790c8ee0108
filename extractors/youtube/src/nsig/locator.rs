use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scan::{matching_close, trailing_end};
use super::NsigError;

/// The n-parameter transform function of one player script version.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ScriptFunction {
    pub name: String,
    /// A function expression, starting at `function`.
    pub source: String,
}

static CALL_SITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\.get\("n"\)\)&&\(.=(?P<name>[a-zA-Z0-9_$]+)(?:\[(?P<index>\d+)\])?"#).unwrap()
});

fn candidates(script: &str) -> BTreeSet<(String, Option<usize>)> {
    CALL_SITE_RE
        .captures_iter(script)
        .filter_map(|c| {
            let name = c.name("name")?.as_str().to_string();
            let index = match c.name("index") {
                Some(i) => Some(i.as_str().parse().ok()?),
                None => None,
            };
            Some((name, index))
        })
        .collect()
}

/// `b=NAME[0](b)` call sites go through an array holding the real function.
fn resolve_alias(script: &str, array: &str, index: usize) -> Result<String, NsigError> {
    let declaration = Regex::new(&format!(
        r#"(?:^|[^a-zA-Z0-9_$.]){}\s*=\s*\[(?P<list>[^\]]*)\]"#,
        regex::escape(array)
    ))
    .map_err(|_| NsigError::FunctionSiteNotFound(array.to_string()))?;
    declaration
        .captures(script)
        .and_then(|c| c.name("list"))
        .and_then(|list| list.as_str().split(',').nth(index))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| NsigError::FunctionSiteNotFound(format!("{array}[{index}]")))
}

fn extract_definition(script: &str, name: &str) -> Result<String, NsigError> {
    let definition = Regex::new(&format!(
        r#"(?:^|[^a-zA-Z0-9_$.]){}\s*=\s*(?P<fn>function\s*\()"#,
        regex::escape(name)
    ))
    .map_err(|_| NsigError::FunctionSiteNotFound(name.to_string()))?;
    let site = definition
        .captures(script)
        .and_then(|c| c.name("fn"))
        .ok_or_else(|| NsigError::FunctionSiteNotFound(name.to_string()))?;

    let truncated = || NsigError::FunctionTruncated(name.to_string());
    let params_end = matching_close(script, site.end() - 1).ok_or_else(truncated)?;
    let brace = params_end
        + script[params_end..]
            .find(|c: char| !c.is_whitespace())
            .ok_or_else(truncated)?;
    if script.as_bytes()[brace] != b'{' {
        return Err(truncated());
    }
    let body_end = matching_close(script, brace).ok_or_else(truncated)?;
    let end = trailing_end(script, body_end);
    Ok(script[site.start()..end].to_string())
}

/// Finds the n-parameter transform function of a player script.
pub fn locate_n_function(script: &str) -> Result<ScriptFunction, NsigError> {
    let found = candidates(script);
    if found.len() != 1 {
        debug!(candidates = ?found, "n function call site ambiguous");
        return Err(NsigError::FunctionNameUnresolved {
            candidates: found.len(),
        });
    }
    let (call_name, index) = found.into_iter().next().unwrap_or_default();
    let name = match index {
        Some(index) => resolve_alias(script, &call_name, index)?,
        None => call_name,
    };
    let source = extract_definition(script, &name)?;
    debug!(name = %name, len = source.len(), "n function located");
    Ok(ScriptFunction { name, source })
}
