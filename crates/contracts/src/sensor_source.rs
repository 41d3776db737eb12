//! SensorSource trait - Tick-driven sensor abstraction
//!
//! Defines a unified lifecycle for client-side sensors that derive a measurement
//! from each simulation tick and hand it to a user callback.

use std::sync::Arc;

use crate::{ActorId, SubscriptionId};

/// Sensor data callback type
///
/// Measurements are shared through `Arc` since delivery happens on the
/// episode's dispatch thread and consumers may keep them around.
pub type SensorCallback<E> = Arc<dyn Fn(Arc<E>) + Send + Sync>;

/// Sensor data source trait
///
/// # Example
///
/// ```ignore
/// let sensor = LongRangeRadarSensor::new(id, Some(parent), EpisodeProxy::new(&episode));
/// sensor.listen(Arc::new(|event| {
///     println!("frame {}: {} detections", event.frame(), event.len());
/// }))?;
/// // ... use sensor ...
/// sensor.stop();
/// ```
pub trait SensorSource: Send + Sync {
    /// Measurement delivered per tick
    type Event;

    /// Error reported when listening cannot start
    type Error;

    /// Actor ID of the sensor
    fn sensor_id(&self) -> ActorId;

    /// Register data callback
    ///
    /// Calling `listen` again replaces the previous callback: exactly one
    /// subscription remains active.
    fn listen(&self, callback: SensorCallback<Self::Event>) -> Result<SubscriptionId, Self::Error>;

    /// Stop listening
    ///
    /// Safe to call repeatedly and when never started.
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
