//! rulegen CLI tool.
//!
//! Usage:
//! ```bash
//! rulegen generate [OPTIONS] [PATH]
//! rulegen init [--force]
//! rulegen verify-manifest --manifest M --generator-hash G --requirements R
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Bazel rule generator for Python sources
#[derive(Parser)]
#[command(name = "rulegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate declarations for every package of a repository
    Generate {
        /// Path inside the repository (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init {
        /// Directory to write `rulegen.toml` into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Check that a modules manifest matches its inputs
    VerifyManifest {
        /// Manifest file to check
        #[arg(long)]
        manifest: PathBuf,

        /// File identifying the generator that produced the manifest
        #[arg(long)]
        generator_hash: PathBuf,

        /// Requirements file the manifest was generated from
        #[arg(long)]
        requirements: PathBuf,

        /// Rewrite the integrity instead of failing
        #[arg(long)]
        update: bool,
    },
}

/// Output format for generated declarations.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Starlark rule blocks.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One line per declaration.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Generate { path, format } => {
            commands::generate::run(&path, format, cli.config.as_deref())
        }
        Commands::Init { path, force } => commands::init::run(&path, force),
        Commands::VerifyManifest {
            manifest,
            generator_hash,
            requirements,
            update,
        } => commands::verify_manifest::run(&manifest, &generator_hash, &requirements, update),
    }
}
