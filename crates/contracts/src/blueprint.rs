//! ScenarioBlueprint - Config Loader output
//!
//! Describes a complete scenario: episode timing, spawned actors and the radars
//! attached to them.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ActorKind, Transform, Vector3D};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete scenario blueprint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScenarioBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Episode clock settings
    #[serde(default)]
    #[validate(nested)]
    pub episode: EpisodeConfig,

    /// Actors spawned before the first tick
    #[serde(default)]
    #[validate(nested)]
    pub actors: Vec<ActorConfig>,

    /// Long-range radars and their parents
    #[serde(default)]
    #[validate(nested)]
    pub radars: Vec<RadarConfig>,
}

/// Episode clock settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EpisodeConfig {
    /// Simulation time advanced per tick (seconds)
    #[serde(default = "default_fixed_delta")]
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub fixed_delta_seconds: f64,

    /// Wall-clock pause between ticks of the background thread (ms)
    #[serde(default = "default_tick_interval_ms")]
    #[validate(range(min = 1, max = 10_000))]
    pub tick_interval_ms: u64,

    /// Frame number of the first tick
    #[serde(default)]
    pub start_frame: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            fixed_delta_seconds: default_fixed_delta(),
            tick_interval_ms: default_tick_interval_ms(),
            start_frame: 0,
        }
    }
}

fn default_fixed_delta() -> f64 {
    0.05
}

fn default_tick_interval_ms() -> u64 {
    50
}

/// Actor definition
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ActorConfig {
    /// Unique identifier
    #[validate(length(min = 1))]
    pub id: String,

    /// Actor category
    pub kind: ActorKind,

    /// Blueprint name (e.g., "vehicle.tesla.model3")
    #[serde(default)]
    pub blueprint: Option<String>,

    /// Spawn pose
    #[serde(default)]
    pub transform: Transform,

    /// Constant velocity (m/s)
    #[serde(default)]
    pub velocity: Vector3D,
}

/// Long-range radar definition
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RadarConfig {
    /// Unique identifier
    #[validate(length(min = 1))]
    pub id: String,

    /// ID of the parent actor in `actors`
    #[validate(length(min = 1))]
    pub parent: String,

    /// Mounting pose relative to the parent
    #[serde(default)]
    pub transform: Transform,
}
