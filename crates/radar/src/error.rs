//! Radar error types

use contracts::{ActorId, ContractError};
use thiserror::Error;

/// Radar specific error
#[derive(Debug, Error)]
pub enum RadarError {
    /// `listen` called on a sensor whose parent is not a vehicle
    #[error("{sensor}: not attached to a vehicle")]
    NotAttachedToVehicle { sensor: String },

    /// Parent pose cannot be used for a measurement
    #[error("parent actor {parent} has a malformed pose: {reason}")]
    MalformedParent { parent: ActorId, reason: String },

    /// A tick handler panicked
    #[error("tick handler panicked: {message}")]
    Panicked { message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl RadarError {
    /// Create attachment error
    pub fn not_attached(sensor: impl Into<String>) -> Self {
        Self::NotAttachedToVehicle {
            sensor: sensor.into(),
        }
    }

    /// Short label used as a metrics dimension
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAttachedToVehicle { .. } => "not_attached",
            Self::MalformedParent { .. } => "malformed_parent",
            Self::Panicked { .. } => "panic",
            Self::Contract(_) => "contract",
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, RadarError>;
