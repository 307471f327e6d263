pub mod build;
pub mod init;
pub mod watch;

use std::path::PathBuf;

use clap::Args;

/// Source, output and configuration locations shared by `build` and `watch`.
#[derive(Debug, Clone, Default, Args)]
pub struct BuildArgs {
    /// Input directory (defaults to htms.toml or "src")
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory (defaults to htms.toml or "out")
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override rules file (.json, .yaml or .nix)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
