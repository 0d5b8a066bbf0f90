//! Crate-level error types for xcite diagnostics.
use std::path::PathBuf;

/// All errors in xcite carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the marker, file, or reason for failure.
///
/// A missing citation target is not an error unless strict mode is on;
/// otherwise the marker is passed through unchanged.
#[allow(clippy::error_impl_error, reason = "crate-wide error type exported as xcite::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input file handed to the resolver does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Resolution of a file failed at a specific marker.
    #[error("{}:{line}: {source}", file.display())]
    InFile {
        /// The citing file.
        file: PathBuf,
        /// One-based line number of the marker in the citing file.
        line: usize,
        /// The underlying resolution failure.
        source: Box<Error>,
    },

    /// A configuration value is out of its accepted range.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// Description of the offending value.
        reason: String,
    },

    /// A line range whose end precedes its start.
    #[error("invalid range {start}:{end} in {}: end precedes start", target.display())]
    InvalidRange {
        /// Requested last line.
        end: usize,
        /// Requested first line.
        start: usize,
        /// File the range was applied to.
        target: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of a run report failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A requested line lies outside the referenced file.
    #[error("line {line} out of range in {} ({line_count} lines)", target.display())]
    LineOutOfRange {
        /// One-based line that was requested.
        line: usize,
        /// Number of lines the file actually has.
        line_count: usize,
        /// File the line was requested from.
        target: PathBuf,
    },

    /// A marker does not follow the citation grammar.
    #[error("malformed citation `{marker}`: {reason}")]
    MalformedCitation {
        /// The offending marker body.
        marker: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No line of the referenced file contains the pattern.
    #[error("pattern `{pattern}` not found in {}", target.display())]
    PatternNotFound {
        /// The pattern that was searched for.
        pattern: String,
        /// File that was searched.
        target: PathBuf,
    },

    /// Nested citations went deeper than the configured bound.
    #[error("citation nesting exceeds depth {max_depth} at {}", target.display())]
    RecursionLimitExceeded {
        /// The configured maximum depth.
        max_depth: usize,
        /// Target whose quote would have exceeded the bound.
        target: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A citation target does not exist and strict mode is on.
    #[error("unresolved citation `{marker}`: target does not exist")]
    UnresolvedCitation {
        /// The raw marker text, brackets included.
        marker: String,
    },
}

impl Error {
    /// Strip `InFile` context and return the underlying failure.
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::InFile { source, .. } = current {
            current = &**source;
        }
        return current;
    }

    /// Attach the citing file and line to an error, unless it already carries a location.
    pub(crate) fn in_file(self, file: PathBuf, line: usize) -> Self {
        if matches!(self, Self::InFile { .. }) {
            return self;
        }
        return Self::InFile {
            file,
            line,
            source: Box::new(self),
        };
    }
}
