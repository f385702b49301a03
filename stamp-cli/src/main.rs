//! stamp — prepend rendered headers to files.
//!
//! # Usage
//!
//! ```text
//! stamp apply <PATHS>... [--header TEXT | --header-file FILE] [--set KEY=VALUE]...
//!             [--context-file FILE] [--raw] [--base DIR] [--ext EXT]...
//!             [--out-dir DIR] [--dry-run] [--stream]
//! stamp diff <PATHS>... [header options]
//! stamp render [--file PATH] [header options]
//! ```
//!
//! Header options fall back to `.stamp.yaml` in the working directory, or the
//! file given with `--config`.

mod collect;
mod commands;
mod writer;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{apply::ApplyArgs, diff::DiffArgs, render::RenderArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stamp",
    version,
    about = "Prepend rendered header templates to files",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prepend the header to every file and write the result.
    Apply(ApplyArgs),

    /// Show a unified diff of what `apply` would change.
    Diff(DiffArgs),

    /// Print the header rendered for a single file.
    Render(RenderArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Apply(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Render(args) => args.run(),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
