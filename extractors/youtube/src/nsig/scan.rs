//! Bracket matching over minified JS, skipping string, template and regex
//! literals and comments so that brackets inside them are not counted.

enum Frame {
    Bracket(u8),
    /// `${` inside a template literal, closed by `}`
    Template,
}

const REGEX_PRECEDING_KEYWORDS: &[&[u8]] = &[
    b"return",
    b"typeof",
    b"instanceof",
    b"case",
    b"do",
    b"else",
    b"in",
    b"of",
    b"new",
    b"delete",
    b"void",
    b"throw",
    b"yield",
    b"await",
];

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn closer_of(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

fn ends_with_keyword(bytes: &[u8], last: usize) -> bool {
    let start = bytes[..=last]
        .iter()
        .rposition(|b| !is_ident_byte(*b))
        .map(|p| p + 1)
        .unwrap_or(0);
    if start > 0 && bytes[start - 1] == b'.' {
        return false;
    }
    let word = &bytes[start..=last];
    REGEX_PRECEDING_KEYWORDS.iter().any(|k| *k == word)
}

/// Position right after the closing quote.
fn skip_string(bytes: &[u8], open: usize) -> Option<usize> {
    let quote = bytes[open];
    let mut i = open + 1;
    loop {
        match *bytes.get(i)? {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
}

/// Scans template text from `i` up to the closing backtick or the next `${`.
fn skip_template(bytes: &[u8], mut i: usize, frames: &mut Vec<Frame>) -> Option<usize> {
    loop {
        match *bytes.get(i)? {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                frames.push(Frame::Template);
                return Some(i + 2);
            }
            _ => i += 1,
        }
    }
}

/// `None` when the literal runs into a line break, meaning the slash was a division.
fn skip_regex(bytes: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    let mut in_class = false;
    loop {
        match *bytes.get(i)? {
            b'\\' => i += 2,
            b'\n' => return None,
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => {
                i += 1;
                while bytes.get(i).copied().map(is_ident_byte).unwrap_or(false) {
                    i += 1;
                }
                return Some(i);
            }
            _ => i += 1,
        }
    }
}

/// Position right after the bracket closing the one at `open`, or `None` if it never closes.
pub fn matching_close(source: &str, open: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    if !matches!(bytes.get(open), Some(b'(' | b'[' | b'{')) {
        return None;
    }
    let mut frames: Vec<Frame> = Vec::new();
    let mut regex_allowed = true;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\'' | b'"' => {
                i = skip_string(bytes, i)?;
                regex_allowed = false;
                continue;
            }
            b'`' => {
                i = skip_template(bytes, i + 1, &mut frames)?;
                regex_allowed = bytes[i - 1] == b'{';
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = bytes[i..]
                    .iter()
                    .position(|c| *c == b'\n')
                    .map(|p| i + p + 1)
                    .unwrap_or(bytes.len());
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = source[i + 2..].find("*/").map(|p| i + 2 + p + 2)?;
                continue;
            }
            b'/' if regex_allowed => {
                if let Some(end) = skip_regex(bytes, i) {
                    i = end;
                    regex_allowed = false;
                    continue;
                }
            }
            b'(' | b'[' | b'{' => frames.push(Frame::Bracket(closer_of(b))),
            b')' | b']' | b'}' => match frames.pop()? {
                Frame::Bracket(expected) if expected == b => {
                    if frames.is_empty() {
                        return Some(i + 1);
                    }
                }
                Frame::Template if b == b'}' => {
                    i = skip_template(bytes, i + 1, &mut frames)?;
                    regex_allowed = bytes[i - 1] == b'{';
                    continue;
                }
                _ => return None,
            },
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            regex_allowed = if is_ident_byte(b) {
                ends_with_keyword(bytes, i)
            } else {
                !matches!(b, b')' | b']')
            };
        }
        i += 1;
    }
    None
}

/// Extends a function expression ending at `from` over directly chained
/// `.member`, `(...)` and `[...]` parts.
pub fn trailing_end(source: &str, from: usize) -> usize {
    let bytes = source.as_bytes();
    let mut end = from;
    loop {
        match bytes.get(end) {
            Some(b'(' | b'[') => match matching_close(source, end) {
                Some(close) => end = close,
                None => return end,
            },
            Some(b'.') => {
                let member = bytes[end + 1..]
                    .iter()
                    .take_while(|b| is_ident_byte(**b))
                    .count();
                if member == 0 {
                    return end;
                }
                end += 1 + member;
            }
            _ => return end,
        }
    }
}
