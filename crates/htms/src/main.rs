//! htms CLI - static site compiler for component-based HTML and Markdown.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

use commands::BuildArgs;

#[derive(Parser)]
#[command(name = "htms")]
#[command(about = "Static site compiler for component-based HTML and Markdown")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to htms.toml project file
    #[arg(long, default_value = "htms.toml", global = true)]
    project: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a starter site in the current directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Build a directory of source files
    Build(BuildArgs),

    /// Build, then rebuild whenever a source file changes
    Watch(BuildArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(Path::new("."), yes).await?;
        }
        Commands::Build(args) => {
            commands::build::run(args, &cli.project).await?;
        }
        Commands::Watch(args) => {
            commands::watch::run(args, &cli.project).await?;
        }
    }

    Ok(())
}
