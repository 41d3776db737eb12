//! # Simulation
//!
//! In-process simulation episode.
//!
//! Responsibilities:
//! - Keep a registry of kinematic actors (vehicles, walkers, sensors)
//! - Advance the clock and publish one immutable `WorldSnapshot` per tick
//! - Dispatch tick callbacks registered through `TickSource`
//! - Spawn a complete scenario from `ScenarioBlueprint`, with rollback
//!
//! Ticks are produced either manually with [`Episode::tick`] (synchronous mode)
//! or by a background thread started with [`Episode::start`].

pub mod episode;
pub mod error;
pub mod scenario;

pub use contracts::{EpisodeProxy, TickSource, WorldSnapshot};
pub use episode::{Episode, TickThread};
pub use error::{Result, SimulationError};
pub use scenario::{RadarPlacement, Scenario};
