use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::resolver::{DEFAULT_MAX_DEPTH, ResolverOptions};

/// Name of the config file looked up in the source directory.
pub const CONFIG_FILE: &str = ".xcite.toml";

/// Project configuration loaded from `.xcite.toml`.
/// Include/exclude patterns are path prefixes applied to files under the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Escape XML special characters in quotes.
    pub escape_xml: bool,
    /// Path prefixes that are never resolved.
    exclude: Vec<String>,
    /// File extensions to resolve, without the dot. Empty means every file.
    extensions: Vec<String>,
    /// Path prefixes to resolve. Empty means everything.
    include: Vec<String>,
    /// Spaces prepended to every quoted line.
    pub indent: usize,
    /// Deepest allowed nesting of citations inside quotes.
    pub max_depth: usize,
    /// Where resolved files are written, relative to the source directory.
    /// `None` rewrites files in place.
    pub output_dir: Option<PathBuf>,
    /// Resolve citations found inside quotes.
    pub recursive: bool,
    /// Fail on citations whose target does not exist.
    pub strict: bool,
}

/// Raw TOML structure for `.xcite.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct XciteTomlConfig {
    #[serde(default)]
    escape_xml: bool,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    indent: usize,
    max_depth: Option<usize>,
    output_dir: Option<PathBuf>,
    recursive: Option<bool>,
    #[serde(default)]
    strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            escape_xml: false,
            exclude: Vec::new(),
            extensions: Vec::new(),
            include: Vec::new(),
            indent: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            output_dir: None,
            recursive: true,
            strict: false,
        };
    }
}

impl Config {
    /// Load config from `.xcite.toml` in the given source directory.
    /// Returns the defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed. Never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::InvalidConfig` if a pattern is not a relative path.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys,
    /// or `Error::InvalidConfig` if an include/exclude pattern is absolute.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: XciteTomlConfig = toml::from_str(content)?;

        for pattern in raw.include.iter().chain(&raw.exclude) {
            if Path::new(pattern).is_absolute() {
                return Err(Error::InvalidConfig {
                    reason: format!("pattern `{pattern}` must be relative to the source directory"),
                });
            }
        }

        return Ok(Self {
            escape_xml: raw.escape_xml,
            exclude: raw.exclude,
            extensions: raw
                .extensions
                .into_iter()
                .map(|e| return e.trim_start_matches('.').to_string())
                .collect(),
            include: raw.include,
            indent: raw.indent,
            max_depth: raw.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            output_dir: raw.output_dir,
            recursive: raw.recursive.unwrap_or(true),
            strict: raw.strict,
        });
    }

    /// Resolver options for a run rooted at `source_dir`.
    pub fn resolver_options(&self, source_dir: &Path) -> ResolverOptions {
        let output_dir = self
            .output_dir
            .as_ref()
            .map_or_else(|| return source_dir.to_path_buf(), |dir| return source_dir.join(dir));
        return ResolverOptions {
            escape_xml: self.escape_xml,
            indent: self.indent,
            max_depth: self.max_depth,
            output_dir,
            recursive: self.recursive,
            strict: self.strict,
        };
    }

    /// Check whether a file should be resolved.
    ///
    /// A path is included if no include patterns are set (resolve everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern,
    /// or if extensions are configured and its extension is not among them.
    pub fn should_scan(&self, relative_path: &Path) -> bool {
        let relative_str = relative_path.to_string_lossy();
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_str.starts_with(p.as_str()));

        if !included || self.exclude.iter().any(|p| return relative_str.starts_with(p.as_str())) {
            return false;
        }

        if self.extensions.is_empty() {
            return true;
        }
        let ext = relative_path.extension().and_then(|e| return e.to_str()).unwrap_or("");
        return self.extensions.iter().any(|allowed| return allowed == ext);
    }
}
