use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::Error;
use crate::source::{FsSource, LineSource as _};
use crate::splitter;
use crate::types::Segment;

/// A citation marker found in a file, before any resolution.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MarkerLocation {
    /// File containing the marker, relative to the scanned root.
    pub file: PathBuf,
    /// One-based line number of the marker.
    pub line: usize,
    /// The raw marker, brackets included.
    pub marker: String,
}

/// List candidate files under `root`, relative to it and sorted.
/// Applies the config's include/exclude/extension filters and skips hidden
/// entries (the config file among them) and anything under `skip_dir`.
/// `skip_dir` is ignored when it is `root` itself.
pub fn scan(root: &Path, config: &Config, skip_dir: Option<&Path>) -> Vec<PathBuf> {
    let skip = skip_dir.and_then(|dir| return skipped_subtree(root, dir));
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| return e.depth() == 0 || !(is_hidden(e) || is_skipped(e, skip.as_deref())))
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
        .filter_map(|e| return e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .filter(|relative| return config.should_scan(relative))
        .collect();
    files.sort();
    return files;
}

/// Find every citation marker in the candidate files under `root`.
/// Files that are not valid UTF-8 text are skipped.
///
/// # Errors
///
/// Returns `Error::Io` if a candidate file cannot be read for a reason
/// other than its encoding.
pub fn find_markers(root: &Path, config: &Config) -> Result<Vec<MarkerLocation>, Error> {
    let mut found = Vec::new();
    for relative in scan(root, config, None) {
        let text = match FsSource.read_lines(&root.join(&relative)) {
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => continue,
            Err(e) => return Err(e),
            Ok(t) => t,
        };
        extract_markers_from_lines(&relative, &text.lines, &mut found);
    }
    return Ok(found);
}

/// Collect the markers of one file's lines.
fn extract_markers_from_lines(file: &Path, lines: &[String], found: &mut Vec<MarkerLocation>) {
    for (idx, line) in lines.iter().enumerate() {
        for segment in splitter::split(line) {
            let Segment::Marker(marker) = segment else {
                continue;
            };
            found.push(MarkerLocation {
                file: file.to_path_buf(),
                line: idx.saturating_add(1),
                marker,
            });
        }
    }
}

/// The canonical form of `dir` when it exists and differs from `root`.
/// Both sides are canonicalized so `./build` under root `.` matches `build`.
fn skipped_subtree(root: &Path, dir: &Path) -> Option<PathBuf> {
    let dir = std::fs::canonicalize(dir).ok()?;
    let root = std::fs::canonicalize(root).ok()?;
    return (dir != root).then_some(dir);
}

/// Whether `entry` is the skipped directory.
fn is_skipped(entry: &DirEntry, skip: Option<&Path>) -> bool {
    let Some(skip) = skip else {
        return false;
    };
    return entry.file_type().is_dir() && std::fs::canonicalize(entry.path()).is_ok_and(|p| return p == skip);
}

/// Dot-prefixed files and directories (`.git`, `.xcite.toml`, ...).
fn is_hidden(entry: &DirEntry) -> bool {
    return entry.file_name().to_str().is_some_and(|name| return name.starts_with('.'));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;

    /// Build a small tree: two text files, one hidden dir, one output dir.
    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("out")).unwrap();
        std::fs::write(root.join("docs/a.txt"), "intro [b.txt:1] and [c.txt]\nplain [not a marker]\n").unwrap();
        std::fs::write(root.join("docs/b.txt"), "quoted\n").unwrap();
        std::fs::write(root.join(".git/config"), "[core]\n").unwrap();
        std::fs::write(root.join("out/a.txt"), "old output\n").unwrap();
        std::fs::write(root.join(CONFIG_FILE), "").unwrap();
        return dir;
    }

    #[test]
    fn scan_skips_hidden_config_and_output() {
        let dir = fixture();
        let out = dir.path().join("out");
        let files = scan(dir.path(), &Config::default(), Some(&out));
        assert_eq!(files, vec![PathBuf::from("docs/a.txt"), PathBuf::from("docs/b.txt")]);
    }

    #[test]
    fn scan_skips_output_named_through_another_path() {
        let dir = fixture();
        let out = dir.path().join("docs/../out");
        let files = scan(dir.path(), &Config::default(), Some(&out));
        assert_eq!(files, vec![PathBuf::from("docs/a.txt"), PathBuf::from("docs/b.txt")]);
    }

    #[test]
    fn scan_ignores_skip_dir_equal_to_root() {
        let dir = fixture();
        let files = scan(dir.path(), &Config::default(), Some(&dir.path().join(".")));
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn scan_applies_config_filters() {
        let dir = fixture();
        let config = Config::parse(r#"include = ["docs/"]
exclude = ["docs/b"]"#)
        .unwrap();
        assert_eq!(scan(dir.path(), &config, None), vec![PathBuf::from("docs/a.txt")]);
    }

    #[test]
    fn finds_markers_with_locations() {
        let dir = fixture();
        let config = Config::parse(r#"include = ["docs/"]"#).unwrap();
        let markers = find_markers(dir.path(), &config).unwrap();
        let found: Vec<(usize, &str)> = markers.iter().map(|m| return (m.line, m.marker.as_str())).collect();
        assert_eq!(found, vec![(1, "[b.txt:1]"), (1, "[c.txt]")]);
        assert_eq!(markers[0].file, PathBuf::from("docs/a.txt"));
    }
}
