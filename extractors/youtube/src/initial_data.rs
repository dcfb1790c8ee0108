//! Pulls the JSON documents YouTube embeds in its pages (`ytInitialData`,
//! `ytInitialPlayerResponse`) out of raw HTML, and decodes API responses.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use tubescope_extractor_api::ExtractError;

/// One way of finding where a declared value starts inside a page.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Byte offset of the first character of the value (`{`, or `'` for string literals).
    fn locate(&self, html: &str) -> Option<usize>;
}

/// Plain substring scan, cheap enough to try before any regex.
pub struct DirectMarker {
    marker: String,
}

impl DirectMarker {
    pub fn new(marker: String) -> Self {
        DirectMarker { marker }
    }
}

impl ExtractionStrategy for DirectMarker {
    fn name(&self) -> &str {
        &self.marker
    }

    fn locate(&self, html: &str) -> Option<usize> {
        let start = html.find(&self.marker)? + self.marker.len();
        match html[start..].chars().next() {
            Some('{') | Some('\'') => Some(start),
            _ => None,
        }
    }
}

/// A regex whose match ends right after the opening character of the value.
pub struct PatternMatch {
    pattern: Regex,
}

impl PatternMatch {
    pub fn new(pattern: Regex) -> Self {
        PatternMatch { pattern }
    }
}

impl ExtractionStrategy for PatternMatch {
    fn name(&self) -> &str {
        self.pattern.as_str()
    }

    fn locate(&self, html: &str) -> Option<usize> {
        self.pattern.find(html).map(|m| m.end() - 1)
    }
}

/// Ordered list of strategies, first one that yields a parseable value wins.
pub struct InitialDataExtractor {
    variable: String,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl InitialDataExtractor {
    pub fn for_variable(variable: &str) -> Self {
        let escaped = regex::escape(variable);
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> =
            vec![Box::new(DirectMarker::new(format!("var {variable} = ")))];
        strategies.extend(
            [
                format!(r#"window\[['"]{escaped}['"]\]\s*=\s*['{{]"#),
                format!(r#"{escaped}\s*=\s*['{{]"#),
            ]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .map(|r| Box::new(PatternMatch::new(r)) as Box<dyn ExtractionStrategy>),
        );
        InitialDataExtractor {
            variable: variable.to_string(),
            strategies,
        }
    }

    /// Appends a strategy, tried after the built-in ones.
    pub fn with_strategy(mut self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn extract(&self, html: &str) -> Result<Value, ExtractError> {
        if html.is_empty() {
            return Err(ExtractError::MalformedMarkup("empty document".to_string()));
        }
        let mut parse_error = None;
        for strategy in &self.strategies {
            let Some(start) = strategy.locate(html) else {
                continue;
            };
            match parse_value_at(&html[start..]) {
                Ok(value) => {
                    debug!(variable = %self.variable, strategy = strategy.name(), "found embedded data");
                    return Ok(value);
                }
                Err(e) => {
                    debug!(variable = %self.variable, strategy = strategy.name(), error = %e, "embedded data did not parse");
                    parse_error.get_or_insert(e);
                }
            }
        }
        Err(parse_error.unwrap_or_else(|| {
            ExtractError::MalformedMarkup(format!(
                "did not match any of the {} patterns",
                self.variable
            ))
        }))
    }
}

pub fn initial_data(html: &str) -> Result<Value, ExtractError> {
    InitialDataExtractor::for_variable("ytInitialData").extract(html)
}

/// Reads exactly one JSON value, ignoring the script text after it.
fn parse_value_at(source: &str) -> Result<Value, ExtractError> {
    if let Some(literal) = source.strip_prefix('\'') {
        let unescaped = unescape_js_string(literal).ok_or_else(|| {
            ExtractError::MalformedMarkup("unterminated string literal".to_string())
        })?;
        return serde_json::from_str(&unescaped)
            .map_err(|e| ExtractError::MalformedMarkup(format!("embedded json: {e}")));
    }
    match serde_json::Deserializer::from_str(source)
        .into_iter::<Value>()
        .next()
    {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(ExtractError::MalformedMarkup(format!("embedded json: {e}"))),
        None => Err(ExtractError::MalformedMarkup("embedded json missing".to_string())),
    }
}

/// Decodes the body of a single-quoted JS string literal, up to its closing quote.
fn unescape_js_string(literal: &str) -> Option<String> {
    let mut out = String::with_capacity(literal.len());
    let mut units: Vec<u16> = Vec::new();
    let mut chars = literal.chars();

    fn flush(units: &mut Vec<u16>, out: &mut String) {
        out.extend(char::decode_utf16(units.drain(..)).map(|c| c.unwrap_or('\u{fffd}')));
    }

    while let Some(c) = chars.next() {
        if c == '\'' {
            flush(&mut units, &mut out);
            return Some(out);
        }
        if c != '\\' {
            flush(&mut units, &mut out);
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        let hex_len = match escaped {
            'x' => 2,
            'u' => 4,
            _ => 0,
        };
        if hex_len != 0 {
            let hex: String = chars.by_ref().take(hex_len).collect();
            let unit = u16::from_str_radix(&hex, 16).ok()?;
            // \u escapes may be halves of a surrogate pair
            units.push(unit);
            continue;
        }
        flush(&mut units, &mut out);
        out.push(match escaped {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            other => other,
        });
    }
    None
}

static API_KEY_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""INNERTUBE_API_KEY"\s*:\s*"([a-zA-Z0-9_-]+)""#,
        r#""innertubeApiKey"\s*:\s*"([a-zA-Z0-9_-]+)""#,
    ]
    .into_iter()
    .map(Regex::new)
    .map(Result::unwrap)
    .collect()
});

/// The key continuation requests are sent with.
pub fn extract_api_key(html: &str) -> Option<String> {
    API_KEY_RES
        .iter()
        .find_map(|r| r.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decodes an API response envelope.
pub fn parse_response(body: &str) -> Result<Value, ExtractError> {
    let body = body.trim_start();
    // anti-JSON-hijacking prefix, sent by some endpoints
    let body = body.strip_prefix(")]}'").unwrap_or(body);
    match serde_json::from_str::<Value>(body) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err(ExtractError::MalformedResponse(
            "response is not an object".to_string(),
        )),
        Err(e) => Err(ExtractError::MalformedResponse(e.to_string())),
    }
}
