//! Layered error definitions
//!
//! Categorized by source: config / episode / actor

use thiserror::Error;

use crate::ActorId;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Episode Errors =====
    /// The tick source has been torn down
    #[error("episode unavailable: the simulation has been destroyed")]
    EpisodeUnavailable,

    /// Actor lookup failed
    #[error("actor not found: {actor_id}")]
    ActorNotFound { actor_id: ActorId },

    /// Actor spawn error
    #[error("spawn error for '{name}': {message}")]
    Spawn { name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create spawn error
    pub fn spawn(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            name: name.into(),
            message: message.into(),
        }
    }
}
