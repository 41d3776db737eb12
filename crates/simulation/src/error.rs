//! Simulation error types

use contracts::{ActorId, ContractError};
use thiserror::Error;

/// Simulation specific error
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Sensor spawned against a parent that does not exist
    #[error("cannot attach '{blueprint}': parent actor {parent} not found")]
    ParentNotFound { blueprint: String, parent: ActorId },

    /// Scenario references an undefined actor
    #[error("scenario item '{item}' references unknown actor '{actor}'")]
    UnknownActor { item: String, actor: String },

    /// Two scenario actors share a configuration ID
    #[error("duplicate actor id '{id}' in scenario")]
    DuplicateActor { id: String },

    /// Background tick thread could not be started
    #[error("failed to start tick thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Result alias
pub type Result<T> = std::result::Result<T, SimulationError>;
