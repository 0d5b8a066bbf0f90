//! Resolve citation markers in text files into verbatim quotes from other files.
//!
//! A citation is a bracketed reference written inline in any text file:
//!
//! - `[path]` quotes the whole file
//! - `[path:N]` quotes line N (one-based)
//! - `[path:N:M]` quotes lines N through M, inclusive
//! - `[path%text]` quotes what follows `text` on the first line containing it
//!
//! Citations whose target does not exist are left as written.

pub mod citation;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod quote;
pub mod resolver;
pub mod scanner;
pub mod source;
pub mod splitter;
pub mod types;

pub use crate::error::Error;
pub use crate::resolver::{DEFAULT_MAX_DEPTH, FileOutcome, ResolutionContext, Resolver, ResolverOptions};
pub use crate::source::{FsSource, LineSource, MemorySource};
pub use crate::splitter::split;
pub use crate::types::{Citation, ResolvedFile, Segment, Selector, SourceText};
