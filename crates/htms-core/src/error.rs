//! Errors raised while loading and expanding source files.

use std::path::PathBuf;

use htms_markdown::FrontmatterError;

/// Errors that can occur when loading a file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },

    #[error("Invalid frontmatter in {}: {source}", .path.display())]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },

    #[error("Component import cycle: {chain}")]
    Recursion { chain: String },

    #[error("Component nesting exceeds {depth} levels at {}", .path.display())]
    DepthExceeded { path: PathBuf, depth: usize },
}
