//! Citation grammar: `ref`, `ref:start`, `ref:start:end`, `ref%pattern`.

use std::fmt;

use crate::error::Error;
use crate::types::{Citation, Selector};

/// Separator between the target and its line numbers.
const LINE_SEPARATOR: char = ':';

/// Separator between the target and a match pattern.
const PATTERN_SEPARATOR: char = '%';

impl Citation {
    /// Parse a full marker, brackets included, such as `[src/lib.rs:3:9]`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedCitation` if the brackets are missing or the
    /// body does not follow the grammar.
    pub fn from_marker(marker: &str) -> Result<Self, Error> {
        let Some(body) = marker.strip_prefix('[').and_then(|m| return m.strip_suffix(']')) else {
            return Err(malformed(marker, "expected `[` ... `]`"));
        };
        return Self::parse(body);
    }

    /// Parse a marker body with the enclosing brackets already stripped.
    ///
    /// A `%` takes precedence over `:`, so patterns may contain colons.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedCitation` for an empty target or pattern,
    /// a line number that is not a non-negative integer, an end line
    /// without a start line, or more than two line numbers.
    pub fn parse(token: &str) -> Result<Self, Error> {
        if let Some((target, pattern)) = token.split_once(PATTERN_SEPARATOR) {
            if pattern.is_empty() {
                return Err(malformed(token, "empty pattern after `%`"));
            }
            return Ok(Self {
                selector: Selector::Pattern(pattern.to_string()),
                target: parse_target(token, target)?,
            });
        }

        let mut parts = token.split(LINE_SEPARATOR);
        let target = parse_target(token, parts.next().unwrap_or_default())?;
        let start = parts.next();
        let end = parts.next();
        if parts.next().is_some() {
            return Err(malformed(token, "at most two line numbers are allowed"));
        }

        let selector = match (start, end) {
            (None, _) => Selector::WholeFile,
            (Some(""), Some(_)) => return Err(malformed(token, "end line given without a start line")),
            (Some(start), None) => Selector::Line(parse_line_number(token, start)?),
            (Some(start), Some(end)) => Selector::Range {
                end: parse_line_number(token, end)?,
                start: parse_line_number(token, start)?,
            },
        };

        return Ok(Self { selector, target });
    }
}

impl fmt::Display for Citation {
    /// Render the bracketed marker form, the inverse of `Citation::from_marker`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match &self.selector {
            Selector::Line(line) => write!(f, "[{}:{line}]", self.target),
            Selector::Pattern(pattern) => write!(f, "[{}%{pattern}]", self.target),
            Selector::Range { end, start } => write!(f, "[{}:{start}:{end}]", self.target),
            Selector::WholeFile => write!(f, "[{}]", self.target),
        };
    }
}

/// Whether a bracket body has the shape of a citation: a non-empty target
/// without whitespace, optionally followed by `:` or `%` qualifiers.
///
/// This is the splitter's test. It does not validate line numbers; those
/// are checked when the marker is parsed during resolution.
pub fn is_citation_shaped(body: &str) -> bool {
    let target = body
        .split([LINE_SEPARATOR, PATTERN_SEPARATOR])
        .next()
        .unwrap_or_default();
    return !target.is_empty() && !target.chars().any(char::is_whitespace);
}

/// Build a `MalformedCitation` error for a marker body.
fn malformed(token: &str, reason: &str) -> Error {
    return Error::MalformedCitation {
        marker: token.to_string(),
        reason: reason.to_string(),
    };
}

/// Validate the target portion of a marker.
///
/// # Errors
///
/// Returns `Error::MalformedCitation` if the target is empty.
fn parse_target(token: &str, target: &str) -> Result<String, Error> {
    if target.is_empty() {
        return Err(malformed(token, "empty target path"));
    }
    return Ok(target.to_string());
}

/// Parse a line number segment.
///
/// # Errors
///
/// Returns `Error::MalformedCitation` unless the segment is all ASCII digits.
fn parse_line_number(token: &str, segment: &str) -> Result<usize, Error> {
    if segment.is_empty() || !segment.bytes().all(|b| return b.is_ascii_digit()) {
        return Err(malformed(token, &format!("`{segment}` is not a line number")));
    }
    return segment
        .parse()
        .map_err(|_err| return malformed(token, &format!("line number `{segment}` is too large")));
}
