//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `frame` is the simulation tick counter reported by the episode
//! - `elapsed_seconds` is simulation time (seconds, f64), not wall-clock time
//!
//! ## Ownership Model
//! - Snapshots are immutable and shared through `Arc`
//! - Sensors refer to actors by `ActorId` only and resolve them against each snapshot
//! - Sensors hold the tick source through [`EpisodeProxy`], which never keeps it alive

mod actor;
mod blueprint;
mod error;
mod geom;
mod radar;
mod sensor_source;
mod tick;

pub use actor::*;
pub use blueprint::*;
pub use error::*;
pub use geom::*;
pub use radar::*;
pub use sensor_source::{SensorCallback, SensorSource};
pub use tick::*;
