//! WorldSnapshot - Episode output
//!
//! Immutable per-frame view of the simulated world.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Location, Transform, Vector3D};

/// Simulator actor handle type
pub type ActorId = u32;

/// Actor category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Vehicle,
    Walker,
    Sensor,
    Other,
}

impl ActorKind {
    /// Whether the actor exposes a vehicle-shaped view
    #[inline]
    pub fn is_vehicle(self) -> bool {
        matches!(self, Self::Vehicle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Walker => "walker",
            Self::Sensor => "sensor",
            Self::Other => "other",
        }
    }
}

/// Parent a sensor is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentRef {
    pub id: ActorId,
    pub kind: ActorKind,
}

/// An object reported as sensed by its parent actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub id: ActorId,
    pub location: Location,
    pub velocity: Vector3D,
}

/// Read-only state of one actor at one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub kind: ActorKind,
    pub transform: Transform,
    pub velocity: Vector3D,
    /// Objects detected by this actor, in detection order
    pub detected_objects: Vec<DetectedObject>,
}

impl ActorSnapshot {
    #[inline]
    pub fn location(&self) -> Location {
        self.transform.location
    }
}

/// World state at one tick
///
/// Built once by the episode and shared with every tick subscriber.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    frame: u64,
    elapsed_seconds: f64,
    delta_seconds: f64,
    actors: HashMap<ActorId, ActorSnapshot>,
}

impl WorldSnapshot {
    pub fn new(
        frame: u64,
        elapsed_seconds: f64,
        delta_seconds: f64,
        actors: impl IntoIterator<Item = ActorSnapshot>,
    ) -> Self {
        Self {
            frame,
            elapsed_seconds,
            delta_seconds,
            actors: actors.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    /// Simulation frame number
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulation time since the episode started (seconds)
    #[inline]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Simulation time step of this frame (seconds)
    #[inline]
    pub fn delta_seconds(&self) -> f64 {
        self.delta_seconds
    }

    /// Look up an actor alive in this frame
    #[inline]
    pub fn find(&self, id: ActorId) -> Option<&ActorSnapshot> {
        self.actors.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn actors(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.actors.values()
    }
}
