use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a run before any item is processed.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Input directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("No `*{suffix}` files found in {}", .dir.display())]
    EmptyInputSet { dir: PathBuf, suffix: String },

    #[error("Failed to list {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),
}
