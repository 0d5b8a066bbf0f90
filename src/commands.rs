//! CLI commands for xcite: resolve, quote, list.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;

use crate::config::Config;
use crate::diagnostics;
use crate::error;
use crate::resolver::{FileOutcome, Resolver, ResolverOptions};
use crate::scanner;
use crate::types::Citation;

/// How `resolve` and `list` report their results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// A JSON document on stdout.
    Json,
    /// One line per file.
    #[default]
    Text,
}

/// Command-line overrides for values that can also come from `.xcite.toml`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Escape XML special characters in quotes.
    pub escape_xml: bool,
    /// Spaces prepended to every quoted line.
    pub indent: Option<usize>,
    /// Deepest allowed nesting of citations inside quotes.
    pub max_depth: Option<usize>,
    /// Disable resolution of citations inside quotes.
    pub no_recursive: bool,
    /// Where resolved files are written.
    pub output_dir: Option<PathBuf>,
    /// Fail on citations whose target does not exist.
    pub strict: bool,
}

/// JSON report for one file.
#[derive(Debug, Serialize)]
struct FileReport {
    /// Number of citations substituted, when the file resolved.
    citations: Option<usize>,
    /// Error message, when it did not.
    error: Option<String>,
    /// The input file.
    file: PathBuf,
}

/// JSON report for a whole run.
#[derive(Debug, Serialize)]
struct RunReport {
    /// Number of files that failed.
    failed: usize,
    /// Per-file results in processing order.
    files: Vec<FileReport>,
    /// Number of files resolved.
    resolved: usize,
}

/// List every citation marker under `source_dir` without resolving anything.
///
/// # Errors
///
/// Returns errors from config loading, file reading, or JSON serialization.
pub fn list(source_dir: &Path, format: Format) -> Result<(), error::Error> {
    let config = Config::load(source_dir)?;
    let markers = scanner::find_markers(source_dir, &config)?;
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&markers)?);
        return Ok(());
    }
    for location in &markers {
        println!("{}:{}: {}", location.file.display(), location.line, location.marker);
    }
    eprintln!("{} citations", markers.len());
    return Ok(());
}

/// Resolve the markers in `text` and print the result.
///
/// # Errors
///
/// Returns errors from config loading or resolution.
pub fn quote(text: &str, base: &Path, overrides: &Overrides) -> Result<(), error::Error> {
    let config_dir = if base.is_file() { base.parent().unwrap_or(Path::new(".")) } else { base };
    let config = Config::load(config_dir)?;
    let resolver = Resolver::new(apply_overrides(&config, config_dir, overrides));

    // A bare marker goes through the single-citation entry point.
    let resolved = match Citation::from_marker(text) {
        Ok(citation) if crate::splitter::split(text).len() == 1 => resolver.quote(base, &citation)?,
        _ => resolver.resolve_text(base, text)?,
    };
    println!("{resolved}");
    return Ok(());
}

/// Resolve files under `source_dir` and write them to the output directory.
/// With no explicit files, every candidate file under `source_dir` is resolved.
/// Exits 0 when every file resolved, 1 otherwise.
///
/// # Errors
///
/// Returns errors from config loading or report serialization.
/// Per-file resolution errors are reported, not returned.
pub fn resolve(
    source_dir: &Path,
    files: &[PathBuf],
    overrides: &Overrides,
    format: Format,
) -> Result<ExitCode, error::Error> {
    let config = Config::load(source_dir)?;
    let options = apply_overrides(&config, source_dir, overrides);

    let files = if files.is_empty() {
        scanner::scan(source_dir, &config, Some(&options.output_dir))
    } else {
        files.to_vec()
    };

    let resolver = Resolver::new(options);
    let outcomes = resolver.resolve_files(source_dir, &files);
    let failed = outcomes.iter().filter(|o| return o.result.is_err()).count();

    match format {
        Format::Json => print_json_report(&outcomes, failed)?,
        Format::Text => print_text_report(&outcomes, failed),
    }

    if failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    return Ok(ExitCode::SUCCESS);
}

/// Merge config values with command-line overrides.
fn apply_overrides(config: &Config, source_dir: &Path, overrides: &Overrides) -> ResolverOptions {
    let mut options = config.resolver_options(source_dir);
    options.escape_xml |= overrides.escape_xml;
    options.strict |= overrides.strict;
    if overrides.no_recursive {
        options.recursive = false;
    }
    if let Some(indent) = overrides.indent {
        options.indent = indent;
    }
    if let Some(max_depth) = overrides.max_depth {
        options.max_depth = max_depth;
    }
    if let Some(output_dir) = &overrides.output_dir {
        options.output_dir.clone_from(output_dir);
    }
    return options;
}

/// Print the run as JSON on stdout.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
fn print_json_report(outcomes: &[FileOutcome], failed: usize) -> Result<(), error::Error> {
    let files = outcomes
        .iter()
        .map(|o| {
            return FileReport {
                citations: o.result.as_ref().ok().copied(),
                error: o.result.as_ref().err().map(ToString::to_string),
                file: o.path.clone(),
            };
        })
        .collect();
    let report = RunReport {
        failed,
        files,
        resolved: outcomes.len().saturating_sub(failed),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
}

/// Print one line per file, with a markdown diagnostic for each failure.
fn print_text_report(outcomes: &[FileOutcome], failed: usize) {
    for outcome in outcomes {
        match &outcome.result {
            Err(e) => {
                println!("FAILED    {}", outcome.path.display());
                diagnostics::print_error(e);
            },
            Ok(count) => println!("RESOLVED  {} ({count} citations)", outcome.path.display()),
        }
    }

    let resolved = outcomes.len().saturating_sub(failed);
    println!();
    if failed > 0 {
        println!("{resolved} resolved, {failed} failed");
    } else {
        println!("All {resolved} files resolved");
    }
    return;
}
