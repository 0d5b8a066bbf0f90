//! Line-level file access: the resolver reads cited files and writes
//! resolved files only through this module.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::{ResolvedFile, SourceText};

/// Where the resolver gets lines from. Cited files are looked up fresh on
/// every citation; implementations must not assume any caching upstream.
pub trait LineSource {
    /// Whether `path` names an existing readable file.
    fn exists(&self, path: &Path) -> bool;

    /// Read the file at `path` as lines.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the file is missing, or `Error::Io`
    /// if it cannot be read as UTF-8 text.
    fn read_lines(&self, path: &Path) -> Result<SourceText, Error>;
}

/// Reads UTF-8 files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl LineSource for FsSource {
    fn exists(&self, path: &Path) -> bool {
        return path.is_file();
    }

    fn read_lines(&self, path: &Path) -> Result<SourceText, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Ok(SourceText::from_text(&content));
    }
}

/// In-memory files keyed by path, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    /// File contents keyed by the exact path the resolver will ask for.
    files: HashMap<PathBuf, String>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl LineSource for MemorySource {
    fn exists(&self, path: &Path) -> bool {
        return self.files.contains_key(path);
    }

    fn read_lines(&self, path: &Path) -> Result<SourceText, Error> {
        return self
            .files
            .get(path)
            .map(|content| return SourceText::from_text(content))
            .ok_or_else(|| return Error::FileNotFound { path: path.to_path_buf() });
    }
}

/// Write a resolved file, creating parent directories as needed.
///
/// # Errors
///
/// Returns `Error::Io` if a directory cannot be created or the file cannot be written.
pub fn write_lines(path: &Path, resolved: &ResolvedFile) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| return !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, resolved.to_text())?;
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_source_reads_lines_and_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\r\ntwo\n").unwrap();

        let text = FsSource.read_lines(&path).unwrap();
        assert_eq!(text.lines, vec!["one", "two"]);
        assert!(text.trailing_newline);
        assert!(FsSource.exists(&path));
    }

    #[test]
    fn fs_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        assert!(!FsSource.exists(&path));
        assert!(matches!(FsSource.read_lines(&path), Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn write_lines_creates_parents_and_keeps_ending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        let resolved = SourceText {
            lines: vec!["a".to_string(), "b".to_string()],
            trailing_newline: true,
        };
        write_lines(&path, &resolved).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn byte_order_mark_is_dropped() {
        let text = SourceText::from_text("\u{feff}first\nsecond");
        assert_eq!(text.lines, vec!["first", "second"]);
        assert!(!text.trailing_newline);
    }

    #[test]
    fn memory_source_lookup() {
        let mut source = MemorySource::new();
        source.insert("/docs/a.txt", "x\ny\n");
        assert!(source.exists(Path::new("/docs/a.txt")));
        assert_eq!(source.read_lines(Path::new("/docs/a.txt")).unwrap().lines, vec!["x", "y"]);
        assert!(source.read_lines(Path::new("/docs/b.txt")).is_err());
    }
}
