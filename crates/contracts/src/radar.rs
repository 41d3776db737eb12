//! RadarEvent - Long-range radar output
//!
//! One event per tick, delivered to the user callback as `Arc<RadarEvent>`.

use serde::{Deserialize, Serialize};

use crate::{ActorId, ActorSnapshot, Location, Transform, WorldSnapshot};

/// Blueprint name of the long-range radar
pub const LONG_RANGE_RADAR_BLUEPRINT: &str = "sensor.other.long_range_radar";

/// A single radar detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarDataPoint {
    /// World location of the detected object
    pub location: Location,

    /// Speed of the detected object (m/s). This is the object's own speed,
    /// not a closing speed against the parent.
    pub relative_velocity: f64,

    /// Distance from the parent (m)
    pub distance: f64,

    /// Horizontal bearing from the parent, degrees in (-180, 180]
    pub azimuth: f64,
}

/// Radar measurement for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarEvent {
    frame: u64,
    timestamp: f64,
    sensor_transform: Transform,
    parent: ActorId,
    data: Vec<RadarDataPoint>,
}

impl RadarEvent {
    pub fn new(
        frame: u64,
        timestamp: f64,
        sensor_transform: Transform,
        parent: ActorId,
        data: Vec<RadarDataPoint>,
    ) -> Self {
        Self {
            frame,
            timestamp,
            sensor_transform,
            parent,
            data,
        }
    }

    /// Frame the measurement was taken at
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulation time (seconds)
    #[inline]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Transform of the sensor's parent at measurement time
    #[inline]
    pub fn sensor_transform(&self) -> &Transform {
        &self.sensor_transform
    }

    /// Actor the radar is associated with
    #[inline]
    pub fn parent(&self) -> ActorId {
        self.parent
    }

    /// Resolve the associated actor against `snapshot`
    ///
    /// Returns `None` once the actor no longer exists.
    pub fn actor_in<'a>(&self, snapshot: &'a WorldSnapshot) -> Option<&'a ActorSnapshot> {
        snapshot.find(self.parent)
    }

    /// Detections, in detection order
    #[inline]
    pub fn radar_data(&self) -> &[RadarDataPoint] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RadarDataPoint> {
        self.data.iter()
    }
}

impl<'a> IntoIterator for &'a RadarEvent {
    type Item = &'a RadarDataPoint;
    type IntoIter = std::slice::Iter<'a, RadarDataPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
