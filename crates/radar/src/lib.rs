//! # Radar
//!
//! Tick-synchronized long-range radar sensor.
//!
//! Responsibilities:
//! - Subscribe a sensor to the episode's per-frame tick notification
//! - Derive radar detections relative to the parent vehicle from each snapshot
//! - Deliver one `RadarEvent` per tick to the user callback
//! - Keep exactly one live subscription per sensor, race-free against the tick thread
//!
//! ## Layout
//!
//! - [`geometry`]: rotation and azimuth helpers
//! - [`measurement`]: snapshot -> `RadarEvent`
//! - [`subscription`]: atomic subscription binding and failure isolation
//! - [`sensor`]: `LongRangeRadarSensor` lifecycle facade

pub mod error;
pub mod geometry;
pub mod measurement;
pub mod sensor;
pub mod subscription;

pub use contracts::{
    ParentRef, RadarDataPoint, RadarEvent, SensorSource, SubscriptionId,
    LONG_RANGE_RADAR_BLUEPRINT,
};
pub use error::{RadarError, Result};
pub use geometry::{azimuth, rotate};
pub use measurement::{measure, synthesize};
pub use sensor::{LongRangeRadarSensor, RadarCallbackFn};
pub use subscription::{subscribe, SensorBinding, TickHandler};
