use std::fmt::Write as _;
use std::path::Path;

use crate::error::Error;

/// ANSI bold, used for headings on a terminal.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it. Errors located in a file get a `Location` section.
pub fn render_error(e: &Error) -> String {
    let Error::InFile { file, line, source } = e else {
        return render_cause(e);
    };
    let mut out = render_cause(source.root_cause());
    let _ = write!(out, "\n## Location\n\n    {}:{line}\n", file.display());
    return out;
}

/// Render an error without location context.
fn render_cause(e: &Error) -> String {
    return match e {
        Error::InvalidRange { end, start, target } => render_invalid_range(target, *start, *end),
        Error::LineOutOfRange { line, line_count, target } => {
            render_line_out_of_range(target, *line, *line_count)
        },
        Error::MalformedCitation { marker, reason } => render_malformed(marker, reason),
        Error::PatternNotFound { pattern, target } => render_pattern_not_found(target, pattern),
        Error::RecursionLimitExceeded { max_depth, target } => render_recursion_limit(target, *max_depth),
        Error::UnresolvedCitation { marker } => render_unresolved(marker),
        _ => render_generic(e),
    };
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::InvalidConfig { reason } => format!("\
# Error: Invalid Config

{reason}

## Fix

Edit `.xcite.toml` in the source directory.
"),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON

{e}
"),
        // Already handled in render_cause, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_invalid_range(target: &Path, start: usize, end: usize) -> String {
    format!("\
# Error: Invalid Range

`{start}:{end}` in a citation of `{}` ends before it starts.

## Fix

Write the first line before the last one: `{end}:{start}`.
", target.display())
}

fn render_line_out_of_range(target: &Path, line: usize, line_count: usize) -> String {
    format!("\
# Error: Line Out Of Range

Line {line} was cited, but `{}` has {line_count} lines. Line numbers start at 1.
", target.display())
}

fn render_malformed(marker: &str, reason: &str) -> String {
    format!("\
# Error: Malformed Citation

`[{marker}]`: {reason}.

## Citation forms

- `[path]` quotes the whole file
- `[path:N]` quotes line N
- `[path:N:M]` quotes lines N through M
- `[path%text]` quotes what follows `text` on the first line containing it

Escape a bracket that is not a citation with a backslash: `\\[`.
")
}

fn render_pattern_not_found(target: &Path, pattern: &str) -> String {
    format!("\
# Error: Pattern Not Found

No line of `{}` contains `{pattern}`.
", target.display())
}

fn render_recursion_limit(target: &Path, max_depth: usize) -> String {
    let mut out = format!("\
# Error: Citations Nested Too Deeply

Quoting `{}` would exceed the nesting limit of {max_depth}.
", target.display());
    out.push_str("\
\n## Fix

Check for a file that cites itself, directly or through other files.
If the nesting is intended, raise the limit:

    xcite resolve --max-depth <N>
");
    out
}

fn render_unresolved(marker: &str) -> String {
    format!("\
# Error: Unresolved Citation

`{marker}` names a file that does not exist.

## Fix

Correct the path, or run without `--strict` to leave such markers untouched.
")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn located_errors_render_cause_and_location() {
        let err = Error::LineOutOfRange {
            line: 9,
            line_count: 3,
            target: PathBuf::from("lib/code.rs"),
        }
        .in_file(PathBuf::from("docs/guide.txt"), 4);

        let md = render_error(&err);
        assert!(md.starts_with("# Error: Line Out Of Range"));
        assert!(md.contains("`lib/code.rs` has 3 lines"));
        assert!(md.contains("docs/guide.txt:4"));
    }

    #[test]
    fn malformed_lists_citation_forms() {
        let err = Error::MalformedCitation {
            marker: "a.txt::2".to_string(),
            reason: "end line given without a start line".to_string(),
        };
        let md = render_error(&err);
        assert!(md.contains("`[a.txt::2]`"));
        assert!(md.contains("## Citation forms"));
    }

    #[test]
    fn recursion_limit_suggests_flag() {
        let err = Error::RecursionLimitExceeded {
            max_depth: 10,
            target: PathBuf::from("loop.txt"),
        };
        assert!(render_error(&err).contains("--max-depth"));
    }
}
