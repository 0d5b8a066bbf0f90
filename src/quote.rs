//! Quote extraction from a cited file's lines, plus quote post-processing.

use std::path::Path;

use crate::error::Error;
use crate::types::{Citation, Selector};

/// Comment terminators dropped from the end of a pattern payload.
const COMMENT_CLOSERS: [&str; 2] = ["*/", "-->"];

/// Extract the quote a citation selects from the lines of `target`.
///
/// Line numbers are one-based and ranges inclusive. A pattern selects the
/// first line containing it; the quote is the text after the pattern on
/// that line, or the whole line when nothing follows the pattern.
///
/// # Errors
///
/// Returns `Error::LineOutOfRange` for a line outside the file,
/// `Error::InvalidRange` when the end line precedes the start line,
/// or `Error::PatternNotFound` when no line contains the pattern.
pub fn extract(target: &Path, lines: &[String], citation: &Citation) -> Result<String, Error> {
    return match &citation.selector {
        Selector::Line(line) => Ok(line_at(target, lines, *line)?.to_string()),
        Selector::Pattern(pattern) => match_pattern(target, lines, pattern),
        Selector::Range { end, start } => slice_range(target, lines, *start, *end),
        Selector::WholeFile => Ok(lines.join("\n")),
    };
}

/// Escape the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    return out;
}

/// Prefix every line of a quote with `width` spaces. Blank lines stay blank.
pub fn indent(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }
    let pad = " ".repeat(width);
    return text
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                return line.to_string();
            }
            return format!("{pad}{line}");
        })
        .collect::<Vec<_>>()
        .join("\n");
}

/// Fetch one one-based line.
///
/// # Errors
///
/// Returns `Error::LineOutOfRange` if `line` is zero or past the end.
fn line_at<'a>(target: &Path, lines: &'a [String], line: usize) -> Result<&'a str, Error> {
    return line
        .checked_sub(1)
        .and_then(|idx| return lines.get(idx))
        .map(String::as_str)
        .ok_or_else(|| return out_of_range(target, lines, line));
}

/// Find the first line containing `pattern` and return its payload.
///
/// # Errors
///
/// Returns `Error::PatternNotFound` if no line contains the pattern.
fn match_pattern(target: &Path, lines: &[String], pattern: &str) -> Result<String, Error> {
    for line in lines {
        let Some(pos) = line.find(pattern) else {
            continue;
        };
        let after = line.get(pos.saturating_add(pattern.len())..).unwrap_or_default();
        let payload = strip_comment_closers(after.trim());
        if payload.is_empty() {
            return Ok(line.clone());
        }
        return Ok(payload.to_string());
    }
    return Err(Error::PatternNotFound {
        pattern: pattern.to_string(),
        target: target.to_path_buf(),
    });
}

/// Build a `LineOutOfRange` error for `target`.
fn out_of_range(target: &Path, lines: &[String], line: usize) -> Error {
    return Error::LineOutOfRange {
        line,
        line_count: lines.len(),
        target: target.to_path_buf(),
    };
}

/// Join an inclusive one-based range of lines.
///
/// # Errors
///
/// Returns `Error::InvalidRange` if `end < start`, or `Error::LineOutOfRange`
/// if either bound falls outside the file.
fn slice_range(target: &Path, lines: &[String], start: usize, end: usize) -> Result<String, Error> {
    if end < start {
        return Err(Error::InvalidRange {
            end,
            start,
            target: target.to_path_buf(),
        });
    }
    line_at(target, lines, start)?;
    line_at(target, lines, end)?;
    let selected = lines
        .get(start.saturating_sub(1)..end)
        .ok_or_else(|| return out_of_range(target, lines, end))?;
    return Ok(selected.join("\n"));
}

/// Drop trailing block-comment terminators and the whitespace before them.
fn strip_comment_closers(payload: &str) -> &str {
    let mut rest = payload;
    while let Some(stripped) = COMMENT_CLOSERS.iter().find_map(|c| return rest.strip_suffix(*c)) {
        rest = stripped.trim_end();
    }
    return rest;
}
