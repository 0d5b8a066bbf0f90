//! Citation resolution: split lines, look up cited files, substitute quotes,
//! and follow citations nested inside quotes up to a depth bound.

use std::path::{Component, Path, PathBuf};

use crate::error::Error;
use crate::quote;
use crate::source::{self, FsSource, LineSource};
use crate::splitter;
use crate::types::{Citation, ResolvedFile, Segment};

/// Default bound on citations nested inside quotes.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Knobs for one resolver. Immutable once the resolver is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Escape XML special characters in quotes.
    pub escape_xml: bool,
    /// Spaces prepended to every quoted line.
    pub indent: usize,
    /// Deepest allowed nesting of citations inside quotes.
    pub max_depth: usize,
    /// Root under which `resolve_files` mirrors its input paths.
    pub output_dir: PathBuf,
    /// Resolve citations found inside quotes.
    pub recursive: bool,
    /// Fail on citations whose target does not exist instead of keeping them verbatim.
    pub strict: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        return Self {
            escape_xml: false,
            indent: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            output_dir: PathBuf::from("."),
            recursive: true,
            strict: false,
        };
    }
}

/// Where relative targets are looked up, and how deep into nested quotes we are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    /// First directory relative targets are resolved against.
    pub base_dir: PathBuf,
    /// Directory of the file containing the marker; the fallback for relative targets.
    pub citing_dir: PathBuf,
    /// Zero for the top-level file, incremented per nested quote.
    pub depth: usize,
}

impl ResolutionContext {
    /// Context for a top-level file.
    pub fn new(base_dir: &Path, citing_dir: &Path) -> Self {
        return Self {
            base_dir: base_dir.to_path_buf(),
            citing_dir: citing_dir.to_path_buf(),
            depth: 0,
        };
    }

    /// Context for the quote of `target`, one level deeper.
    fn nested(&self, target: &Path) -> Self {
        let dir = parent_dir(target);
        return Self {
            base_dir: dir.clone(),
            citing_dir: dir,
            depth: self.depth.saturating_add(1),
        };
    }
}

/// Result of resolving one file in a batch.
#[derive(Debug)]
pub struct FileOutcome {
    /// Path of the input file, relative to the source directory when given that way.
    pub path: PathBuf,
    /// Number of citations substituted, or why the file failed.
    pub result: Result<usize, Error>,
}

/// Resolves citation markers against files provided by a `LineSource`.
#[derive(Debug, Clone)]
pub struct Resolver<S = FsSource> {
    /// Behaviour switches.
    options: ResolverOptions,
    /// Where cited and input files are read from.
    source: S,
}

impl Resolver<FsSource> {
    /// A resolver reading from disk.
    pub fn new(options: ResolverOptions) -> Self {
        return Self::with_source(options, FsSource);
    }
}

impl<S: LineSource> Resolver<S> {
    /// A resolver reading through a custom line source.
    pub const fn with_source(options: ResolverOptions, source: S) -> Self {
        return Self { options, source };
    }

    /// Resolve each file under `source_dir` in list order and write it to the
    /// same relative path under the output directory. A failing file is
    /// reported in its outcome and does not stop the rest of the batch.
    pub fn resolve_files(&self, source_dir: &Path, files: &[PathBuf]) -> Vec<FileOutcome> {
        return files
            .iter()
            .map(|file| {
                let result = self.resolve_and_write(source_dir, file);
                if let Err(e) = &result {
                    tracing::warn!(file = %file.display(), error = %e, "resolution failed");
                }
                return FileOutcome {
                    path: file.clone(),
                    result,
                };
            })
            .collect();
    }

    /// Resolve one file and return its lines without writing anything.
    /// A relative `file` is taken relative to `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the file is missing, or the first
    /// resolution error wrapped in `Error::InFile` with the marker's location.
    pub fn resolve_file(&self, base_dir: &Path, file: &Path) -> Result<ResolvedFile, Error> {
        return self.resolve_file_counted(base_dir, file).map(|(resolved, _)| return resolved);
    }

    /// Resolve the markers in a string. `citing` is the file the text belongs
    /// to, whose directory becomes the base, or a directory used directly.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error, located at `citing`.
    pub fn resolve_text(&self, citing: &Path, text: &str) -> Result<String, Error> {
        let ctx = self.context_for(citing);
        let mut lines = Vec::new();
        for (idx, line) in text.split('\n').enumerate() {
            let (resolved, _) = self
                .resolve_line(line, &ctx)
                .map_err(|e| return e.in_file(citing.to_path_buf(), idx.saturating_add(1)))?;
            lines.push(resolved);
        }
        return Ok(lines.join("\n"));
    }

    /// The text that replaces one citation made from `citing`: the processed
    /// quote, or the marker itself when the target does not exist.
    ///
    /// # Errors
    ///
    /// Returns extraction errors, `Error::RecursionLimitExceeded`, or
    /// `Error::UnresolvedCitation` for a missing target in strict mode.
    pub fn quote(&self, citing: &Path, citation: &Citation) -> Result<String, Error> {
        let ctx = self.context_for(citing);
        let raw = citation.to_string();
        return self
            .substitute(citation, &raw, &ctx)
            .map(|quoted| return quoted.unwrap_or(raw));
    }

    /// Build the top-level context for a file or directory.
    fn context_for(&self, citing: &Path) -> ResolutionContext {
        let dir = if self.source.exists(citing) {
            parent_dir(citing)
        } else {
            citing.to_path_buf()
        };
        return ResolutionContext::new(&dir, &dir);
    }

    /// Find the file a target names: absolute as-is, otherwise under the base
    /// directory, falling back to the citing file's directory.
    fn locate(&self, target: &str, ctx: &ResolutionContext) -> Option<PathBuf> {
        let path = Path::new(target);
        if path.is_absolute() {
            let path = normalize_path(path);
            return self.source.exists(&path).then_some(path);
        }
        return [&ctx.base_dir, &ctx.citing_dir]
            .into_iter()
            .map(|dir| return normalize_path(&dir.join(path)))
            .find(|candidate| return self.source.exists(candidate));
    }

    /// Resolve citations inside a quote taken from `target`.
    ///
    /// # Errors
    ///
    /// Returns `Error::RecursionLimitExceeded` if the quote holds markers and
    /// the nesting bound is already reached, or any nested resolution error.
    fn resolve_nested(&self, text: String, target: &Path, ctx: &ResolutionContext) -> Result<String, Error> {
        if !self.options.recursive || !text.split('\n').any(splitter::contains_marker) {
            return Ok(text);
        }
        let nested = ctx.nested(target);
        if nested.depth > self.options.max_depth {
            if !self.cites_existing_file(&text, &nested) {
                return Ok(text);
            }
            return Err(Error::RecursionLimitExceeded {
                max_depth: self.options.max_depth,
                target: target.to_path_buf(),
            });
        }
        tracing::debug!(path = %target.display(), depth = nested.depth, "resolving nested citations");

        let mut lines = Vec::new();
        for line in text.split('\n') {
            lines.push(self.resolve_line(line, &nested)?.0);
        }
        return Ok(lines.join("\n"));
    }

    /// Whether any marker in `text` parses and names a file that exists.
    fn cites_existing_file(&self, text: &str, ctx: &ResolutionContext) -> bool {
        return text
            .split('\n')
            .flat_map(splitter::split)
            .filter_map(|segment| return Citation::from_marker(segment.as_str()).ok())
            .any(|citation| return self.locate(&citation.target, ctx).is_some());
    }

    /// Resolve and write one file of a batch.
    ///
    /// # Errors
    ///
    /// Returns resolution or write errors.
    fn resolve_and_write(&self, source_dir: &Path, file: &Path) -> Result<usize, Error> {
        let (resolved, count) = self.resolve_file_counted(source_dir, file)?;
        let relative = file.strip_prefix(source_dir).unwrap_or(file);
        let relative = if relative.is_absolute() {
            relative.file_name().map_or_else(PathBuf::new, PathBuf::from)
        } else {
            relative.to_path_buf()
        };
        let destination = self.options.output_dir.join(relative);
        source::write_lines(&destination, &resolved)?;
        tracing::info!(file = %file.display(), output = %destination.display(), citations = count, "resolved");
        return Ok(count);
    }

    /// Resolve one file, also returning how many citations were substituted.
    ///
    /// # Errors
    ///
    /// See `resolve_file`.
    fn resolve_file_counted(&self, base_dir: &Path, file: &Path) -> Result<(ResolvedFile, usize), Error> {
        let path = if file.is_absolute() {
            file.to_path_buf()
        } else {
            base_dir.join(file)
        };
        let input = self.source.read_lines(&path)?;
        let ctx = ResolutionContext::new(base_dir, &parent_dir(&path));

        let mut lines = Vec::with_capacity(input.lines.len());
        let mut count = 0_usize;
        for (idx, line) in input.lines.iter().enumerate() {
            let (resolved, substituted) = self
                .resolve_line(line, &ctx)
                .map_err(|e| return e.in_file(path.clone(), idx.saturating_add(1)))?;
            lines.push(resolved);
            count = count.saturating_add(substituted);
        }

        let resolved = ResolvedFile {
            lines,
            trailing_newline: input.trailing_newline,
        };
        return Ok((resolved, count));
    }

    /// Resolve every marker in one line. Returns the new line and the number
    /// of markers that were replaced by quotes. Inside quotes, markers that
    /// do not parse (`s[i:j]` in quoted code) are kept as text.
    ///
    /// # Errors
    ///
    /// Returns the first error from parsing or substituting a marker.
    fn resolve_line(&self, line: &str, ctx: &ResolutionContext) -> Result<(String, usize), Error> {
        let mut out = String::with_capacity(line.len());
        let mut count = 0_usize;
        for segment in splitter::split(line) {
            match segment {
                Segment::Marker(raw) => {
                    let citation = match Citation::from_marker(&raw) {
                        Ok(citation) => citation,
                        Err(_) if ctx.depth > 0 => {
                            out.push_str(&raw);
                            continue;
                        },
                        Err(e) => return Err(e),
                    };
                    match self.substitute(&citation, &raw, ctx)? {
                        None => out.push_str(&raw),
                        Some(quoted) => {
                            out.push_str(&quoted);
                            count = count.saturating_add(1);
                        },
                    }
                },
                Segment::Text(text) => out.push_str(&text),
            }
        }
        return Ok((out, count));
    }

    /// Produce the quote for a citation, or `None` when the target is missing
    /// and the marker should stay as written. Escaping and indentation are
    /// applied once, to the top-level quote.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnresolvedCitation` for a missing target in strict
    /// mode, read and extraction errors, or nested resolution errors.
    fn substitute(&self, citation: &Citation, raw: &str, ctx: &ResolutionContext) -> Result<Option<String>, Error> {
        let Some(target) = self.locate(&citation.target, ctx) else {
            if self.options.strict {
                return Err(Error::UnresolvedCitation { marker: raw.to_string() });
            }
            tracing::debug!(marker = raw, "target not found, keeping marker");
            return Ok(None);
        };

        let text = self.source.read_lines(&target)?;
        let extracted = quote::extract(&target, &text.lines, citation)?;
        let mut quoted = self.resolve_nested(extracted, &target, ctx)?;
        if ctx.depth == 0 {
            if self.options.escape_xml {
                quoted = quote::escape_xml(&quoted);
            }
            quoted = quote::indent(&quoted, self.options.indent);
        }
        tracing::debug!(marker = raw, path = %target.display(), depth = ctx.depth, "resolved citation");
        return Ok(Some(quoted));
    }
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                let can_pop = matches!(
                    components.last(),
                    Some(c) if matches!(c, Component::Normal(_))
                );
                if can_pop {
                    components.pop();
                } else {
                    components.push(component);
                }
            },
            other => components.push(other),
        }
    }
    if components.is_empty() {
        return PathBuf::from(".");
    }
    return components.iter().collect();
}

/// The directory containing `path`, or `.` for a bare file name.
fn parent_dir(path: &Path) -> PathBuf {
    return path
        .parent()
        .filter(|p| return !p.as_os_str().is_empty())
        .map_or_else(|| return PathBuf::from("."), Path::to_path_buf);
}
