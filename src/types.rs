//! Core domain types for xcite citations, line segments, and resolved output.

/// A parsed citation marker. The selector enum makes it impossible to carry
/// both a line range and a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// Which part of the target file to quote.
    pub selector: Selector,
    /// Path to the cited file as written in the marker, absolute or relative.
    pub target: String,
}

/// The portion of a target file a citation selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A single one-based line: `[file:7]`.
    Line(usize),
    /// The payload of the first line containing the pattern: `[file%pattern]`.
    Pattern(String),
    /// An inclusive one-based line range: `[file:3:9]`.
    Range {
        /// Last line, inclusive.
        end: usize,
        /// First line.
        start: usize,
    },
    /// The entire file: `[file]`.
    WholeFile,
}

/// One piece of a split line. Concatenating every segment's text
/// reproduces the original line byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A citation marker, brackets included, exactly as it appeared.
    Marker(String),
    /// Literal text between markers. Empty only for the lone segment of an empty line.
    Text(String),
}

impl Segment {
    /// The raw text this segment covers in the source line.
    pub fn as_str(&self) -> &str {
        return match self {
            Segment::Marker(raw) | Segment::Text(raw) => raw,
        };
    }

    /// Whether this segment is a citation marker.
    pub const fn is_marker(&self) -> bool {
        return matches!(self, Segment::Marker(_));
    }
}

/// The lines of a text file together with its trailing-newline state,
/// so rewriting a file does not change how it ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceText {
    /// The file's lines without terminators.
    pub lines: Vec<String>,
    /// Whether the last line was terminated by a newline.
    pub trailing_newline: bool,
}

impl SourceText {
    /// Split text into lines, accepting both `\n` and `\r\n` terminators.
    pub fn from_text(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        return Self {
            lines: text.lines().map(String::from).collect(),
            trailing_newline: text.ends_with('\n'),
        };
    }

    /// Join lines back into a single string with `\n` separators.
    pub fn to_text(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        return out;
    }
}

/// The output of resolving one file. Lines may themselves contain newlines
/// when a multi-line quote was substituted into them.
pub type ResolvedFile = SourceText;
