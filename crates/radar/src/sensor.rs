//! Long-range radar sensor
//!
//! Client-side lifecycle object: `listen` / `stop` / drop. The sensor keeps its
//! parent only as an ID and the episode only as an [`EpisodeProxy`]; both are
//! resolved fresh when needed.

use std::fmt;
use std::sync::Arc;

use contracts::{
    ActorId, EpisodeProxy, ParentRef, RadarEvent, SensorCallback, SensorSource, SubscriptionId,
    TickSource, WorldSnapshot, LONG_RANGE_RADAR_BLUEPRINT,
};
use tracing::{debug, error, trace};

use crate::error::{RadarError, Result};
use crate::measurement::synthesize_for;
use crate::subscription::{SensorBinding, TickHandler};

/// User callback receiving one event per tick
pub type RadarCallbackFn = SensorCallback<RadarEvent>;

/// Handler registered with the episode
///
/// Captures the parent ID and the user callback at `listen` time; nothing in it
/// changes afterwards.
struct RadarCallback {
    parent: ActorId,
    sensor: Arc<str>,
    callback: RadarCallbackFn,
}

impl TickHandler for RadarCallback {
    fn on_tick(&self, snapshot: &WorldSnapshot) -> Result<()> {
        // Parent not spawned yet or already destroyed.
        let Some(parent) = snapshot.find(self.parent) else {
            return Ok(());
        };

        let event = synthesize_for(snapshot, parent)?;
        trace!(
            sensor = %self.sensor,
            frame = event.frame(),
            detections = event.len(),
            "radar event"
        );
        observability::record_radar_event(&self.sensor, event.len());

        (self.callback)(Arc::new(event));
        Ok(())
    }
}

/// Long-range radar attached to a vehicle
///
/// Dropping the sensor stops it, so no subscription outlives it.
pub struct LongRangeRadarSensor<T: TickSource + ?Sized> {
    id: ActorId,
    parent: Option<ParentRef>,
    episode: EpisodeProxy<T>,
    binding: SensorBinding,
    display_id: Arc<str>,
}

impl<T: TickSource + ?Sized> LongRangeRadarSensor<T> {
    /// Create a sensor for actor `id`
    ///
    /// `parent` is `None` for a sensor spawned without attachment.
    pub fn new(id: ActorId, parent: Option<ParentRef>, episode: EpisodeProxy<T>) -> Self {
        Self {
            id,
            parent,
            episode,
            binding: SensorBinding::new(),
            display_id: Arc::from(format!("{LONG_RANGE_RADAR_BLUEPRINT} ({id})")),
        }
    }

    #[inline]
    pub fn id(&self) -> ActorId {
        self.id
    }

    #[inline]
    pub fn parent(&self) -> Option<ParentRef> {
        self.parent
    }

    /// Name used in logs, e.g. `sensor.other.long_range_radar (42)`
    #[inline]
    pub fn display_id(&self) -> &str {
        &self.display_id
    }

    /// Start delivering one `RadarEvent` per tick to `callback`
    ///
    /// Replaces any previous callback. Fails without registering anything if
    /// the parent is not a vehicle or the episode is gone.
    pub fn listen(&self, callback: RadarCallbackFn) -> Result<SubscriptionId> {
        let Some(parent) = self.parent.filter(|p| p.kind.is_vehicle()) else {
            error!(sensor = %self.display_id, "{}: not attached to a vehicle", self.display_id);
            return Err(RadarError::not_attached(self.display_id.as_ref()));
        };

        let episode = self.episode.lock()?;

        let handler = RadarCallback {
            parent: parent.id,
            sensor: self.display_id.clone(),
            callback,
        };
        let id = self
            .binding
            .start_listening(&*episode, self.display_id.clone(), handler);

        debug!(sensor = %self.display_id, parent = parent.id, subscription = %id, "radar listening");
        Ok(id)
    }

    /// Stop delivering events
    ///
    /// Safe to call repeatedly, when never started, and after the episode is gone.
    /// A tick already being dispatched still completes.
    pub fn stop(&self) {
        if self.binding.stop_listening(&self.episode) {
            debug!(sensor = %self.display_id, "radar stopped");
        }
    }

    #[inline]
    pub fn is_listening(&self) -> bool {
        self.binding.is_listening()
    }

    /// Live subscription, if any
    #[inline]
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.binding.current()
    }
}

impl<T: TickSource + ?Sized> Drop for LongRangeRadarSensor<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: TickSource + ?Sized> fmt::Debug for LongRangeRadarSensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LongRangeRadarSensor")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("subscription", &self.binding.current())
            .finish()
    }
}

impl<T: TickSource + ?Sized> SensorSource for LongRangeRadarSensor<T> {
    type Event = RadarEvent;
    type Error = RadarError;

    fn sensor_id(&self) -> ActorId {
        self.id
    }

    fn listen(&self, callback: SensorCallback<RadarEvent>) -> Result<SubscriptionId> {
        LongRangeRadarSensor::listen(self, callback)
    }

    fn stop(&self) {
        LongRangeRadarSensor::stop(self)
    }

    fn is_listening(&self) -> bool {
        LongRangeRadarSensor::is_listening(self)
    }
}
