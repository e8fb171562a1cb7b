//! ctxlink: append `("Title" at <URL>)` after markdown cross-references.

mod annotator;
mod commands;
mod config;
mod diagnostics;
mod error;
mod extractor;
mod placeholder;
mod resolver;
mod scanner;
mod title;
mod types;
mod watch;

use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::types::{Mode, Output};

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "ctxlink", about = "Context-preserving URLs for markdown cross-references")]
struct Cli {
    /// Base URL prepended to corpus-relative paths (overrides `.ctxlink.toml`)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
    /// Corpus root directory
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
}

/// ctxlink subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Append ("Title" at <URL>) to every unannotated cross-reference
    Annotate {
        /// Resolve and report, but do not write any file
        #[arg(long)]
        dry_run: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List references still missing an annotation (exit 1 if any)
    Check,
    /// Write the base URL to .ctxlink.toml, keeping existing settings
    Init {
        /// Base URL, e.g. https://github.com/owner/repo/blob/main/
        url: String,
    },
    /// Annotate, then re-annotate whenever documents change
    Watch,
}

/// Run the selected command. Fatal errors print a diagnostic and exit 1.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    let base_url = cli.base_url.as_deref();

    let result = match cli.command {
        Commands::Annotate { dry_run, json } => {
            let mode = if dry_run { Mode::DryRun } else { Mode::Write };
            let output = if json { Output::Json } else { Output::Text };
            commands::annotate(&cli.root, base_url, mode, output).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Check => commands::check(&cli.root, base_url),
        Commands::Init { url } => commands::init(&cli.root, &url).map(|()| return ExitCode::SUCCESS),
        Commands::Watch => watch::run(&cli.root, base_url),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}
