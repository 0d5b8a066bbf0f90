use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};
use xcite::commands::{self, Format, Overrides};
use xcite::diagnostics;

#[derive(Parser)]
#[command(name = "xcite", version, about = "Resolve citation markers into quotes from other files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Resolution switches shared by `resolve` and `quote`.
#[derive(clap::Args)]
struct ResolveArgs {
    /// Escape XML special characters in quotes
    #[arg(long)]
    escape_xml: bool,
    /// Prefix every quoted line with N spaces
    #[arg(long, value_name = "N")]
    indent: Option<usize>,
    /// Maximum nesting of citations inside quotes
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
    /// Do not resolve citations found inside quotes
    #[arg(long)]
    no_recursive: bool,
    /// Fail on citations whose target file does not exist
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List every citation under the source directory
    List {
        /// Directory to scan
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Resolve a citation or a line of text and print the result
    Quote {
        /// Text containing citations, e.g. "[src/lib.rs:1:10]"
        text: String,
        /// File the text belongs to, or a directory relative targets start from
        #[arg(long, default_value = ".")]
        base: PathBuf,
        #[command(flatten)]
        args: ResolveArgs,
    },
    /// Resolve files and write them to the output directory
    Resolve {
        /// Files to resolve, relative to the source directory (default: all)
        files: Vec<PathBuf>,
        /// Directory input files and relative citations are taken from
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,
        /// Directory resolved files are written to (default: in place)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        #[command(flatten)]
        args: ResolveArgs,
    },
}

impl ResolveArgs {
    /// Turn flags into config overrides.
    fn into_overrides(self, output_dir: Option<PathBuf>) -> Overrides {
        return Overrides {
            escape_xml: self.escape_xml,
            indent: self.indent,
            max_depth: self.max_depth,
            no_recursive: self.no_recursive,
            output_dir,
            strict: self.strict,
        };
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("XCITE_LOG")
                .unwrap_or_else(|_| return "xcite=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List { source_dir, format } => commands::list(&source_dir, format).map(|()| return ExitCode::SUCCESS),
        Commands::Quote { text, base, args } => {
            commands::quote(&text, &base, &args.into_overrides(None)).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Resolve { files, source_dir, output_dir, format, args } => {
            commands::resolve(&source_dir, &files, &args.into_overrides(output_dir), format)
        },
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}
