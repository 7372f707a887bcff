use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rust_sqlsig::{inspect_snapshot, ExtractOptions, InspectOptions};

#[derive(Parser)]
#[command(name = "rust-sqlsig")]
#[command(author, version, about = "Extract T-SQL procedure and function signatures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the parameter signatures of the routines in a catalog snapshot
    Inspect {
        /// Path to the JSON catalog snapshot
        #[arg(short, long)]
        snapshot: PathBuf,

        /// SQL LIKE pattern selecting routines by name (repeatable)
        #[arg(short, long = "pattern")]
        patterns: Vec<String>,

        /// Only report this routine (name or schema.name)
        #[arg(short, long)]
        routine: Option<String>,

        /// Output path for the signatures JSON (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Signature cache file reused between runs
        #[arg(short, long)]
        cache: Option<PathBuf>,

        /// Ignore cached signatures
        #[arg(long)]
        refresh: bool,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "rust_sqlsig=debug"
    } else {
        "rust_sqlsig=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr; stdout carries the signatures
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            snapshot,
            patterns,
            routine,
            output,
            cache,
            refresh,
            verbose,
        } => {
            init_logging(verbose);

            let options = InspectOptions {
                snapshot_path: snapshot,
                output_path: output,
                routine,
                cache_path: cache,
                extract: ExtractOptions {
                    name_patterns: patterns,
                    refresh,
                    verbose,
                },
            };

            inspect_snapshot(options)?;
        }
    }

    Ok(())
}
