//! Line splitting: locate citation markers inside arbitrary text.

use crate::citation::is_citation_shaped;
use crate::types::Segment;

/// Split a line into alternating text and marker segments.
///
/// Markers are `[` ... `]` runs whose body is citation-shaped. A `[`
/// preceded by a backslash never opens a marker, and an unescaped `[`
/// inside an open run restarts the run there, so marker bodies never
/// contain a nested bracket. Bracketed text that is not citation-shaped
/// stays literal.
///
/// No empty text segment is ever produced between or around markers. A line
/// without markers comes back as a single text segment equal to the line,
/// even when the line is empty.
pub fn split(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text_start = 0_usize;
    let mut open: Option<usize> = None;
    let mut escaped = false;

    for (idx, ch) in line.char_indices() {
        match ch {
            '[' if !escaped => open = Some(idx),
            ']' => {
                if let Some(start) = open.take() {
                    let end = idx.saturating_add(1);
                    if accept_marker(line, start, end) {
                        push_text(&mut segments, line.get(text_start..start));
                        push_marker(&mut segments, line.get(start..end));
                        text_start = end;
                    }
                }
            },
            _ => {},
        }
        escaped = ch == '\\' && !escaped;
    }

    push_text(&mut segments, line.get(text_start..));
    if segments.is_empty() {
        segments.push(Segment::Text(line.to_string()));
    }
    return segments;
}

/// Whether any marker occurs in the line.
pub fn contains_marker(line: &str) -> bool {
    return split(line).iter().any(Segment::is_marker);
}

/// Check whether the bracketed run `line[start..end]` is a marker.
fn accept_marker(line: &str, start: usize, end: usize) -> bool {
    let body = line.get(start.saturating_add(1)..end.saturating_sub(1));
    return body.is_some_and(is_citation_shaped);
}

/// Append a marker segment.
fn push_marker(segments: &mut Vec<Segment>, raw: Option<&str>) {
    if let Some(raw) = raw {
        segments.push(Segment::Marker(raw.to_string()));
    }
}

/// Append a text segment unless it is empty.
fn push_text(segments: &mut Vec<Segment>, text: Option<&str>) {
    if let Some(text) = text.filter(|t| return !t.is_empty()) {
        segments.push(Segment::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split and return raw segment strings for terse assertions.
    fn parts(line: &str) -> Vec<String> {
        return split(line).iter().map(|s| return s.as_str().to_string()).collect();
    }

    #[test]
    fn no_citation_is_one_segment() {
        assert_eq!(parts("No citation to match."), vec!["No citation to match."]);
        assert_eq!(parts(""), vec![""]);
    }

    #[test]
    fn marker_flanked_by_text() {
        assert_eq!(parts("pre [/test:start:end] post"), vec!["pre ", "[/test:start:end]", " post"]);
        assert_eq!(parts("pre [/test:start] post")[1], "[/test:start]");
        assert_eq!(parts("pre [/test] post"), vec!["pre ", "[/test]", " post"]);
    }

    #[test]
    fn marker_at_line_end() {
        assert_eq!(parts("pre [/test]").len(), 2);
        assert_eq!(parts("pre [/test:start:end]")[0], "pre ");
        assert_eq!(parts("pre [/test:start]")[1], "[/test:start]");
    }

    #[test]
    fn marker_at_line_start() {
        assert_eq!(parts("[/test:start:end] post")[1], " post");
        assert_eq!(parts("[/test:start] post")[0], "[/test:start]");
        assert_eq!(parts("[/test] post")[1], " post");
    }

    #[test]
    fn marker_alone() {
        assert_eq!(parts("[/test:start:end]")[0], "[/test:start:end]");
        assert_eq!(parts("[/test:start]").len(), 1);
        assert!(split("[/test:start]")[0].is_marker());
        assert_eq!(parts("[/test] ").len(), 2);
    }

    #[test]
    fn adjacent_markers_stay_distinct() {
        assert_eq!(parts("[/test] [/test]"), vec!["[/test]", " ", "[/test]"]);
        assert_eq!(parts("[/test][/test]"), vec!["[/test]", "[/test]"]);
    }

    #[test]
    fn non_citation_brackets_are_text() {
        assert_eq!(parts("- [ ] todo"), vec!["- [ ] todo"]);
        assert_eq!(parts("see [the docs] here"), vec!["see [the docs] here"]);
        assert_eq!(parts("a ] b [ c"), vec!["a ] b [ c"]);
    }

    #[test]
    fn escaped_bracket_is_text() {
        assert_eq!(parts(r"\[file.txt] and [file.txt]"), vec![r"\[file.txt] and ", "[file.txt]"]);
    }

    #[test]
    fn inner_bracket_restarts_marker() {
        assert_eq!(parts("[outer [inner.txt]"), vec!["[outer ", "[inner.txt]"]);
    }

    #[test]
    fn segments_reassemble_the_line() {
        let lines = ["x [a.txt:1] y [b.txt%p q] z", "[a][b] [c d] \\[e]", "plain", "]["];
        for line in lines {
            assert_eq!(parts(line).concat(), line);
        }
    }

    #[test]
    fn detects_markers() {
        assert!(contains_marker("see [file.txt]"));
        assert!(!contains_marker("see [the file]"));
    }
}
