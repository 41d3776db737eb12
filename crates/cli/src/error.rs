//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// No configured radar could start listening
    #[error("No radar is listening ({rejected} rejected)")]
    NoActiveRadar { rejected: usize },

    /// Output sink error
    #[error("Failed to write radar events: {0}")]
    Output(#[from] std::io::Error),

    /// Event encoding error
    #[error("Failed to encode radar event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
