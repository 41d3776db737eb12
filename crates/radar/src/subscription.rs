//! Tick subscription management
//!
//! A [`SensorBinding`] owns the single live registration of a sensor with the
//! episode's tick notification. The stored ID is the only shared mutable state
//! and is only ever read-and-replaced with an atomic swap, so a concurrent
//! `start_listening` / `stop_listening` never observes a half-installed value.
//!
//! Every registered handler is wrapped in a failure boundary: an `Err` or a
//! panic from one sensor is logged and suppressed, it never unwinds into the
//! episode's dispatch loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{EpisodeProxy, SubscriptionId, TickSource, WorldSnapshot};
use tracing::{debug, error};

use crate::error::RadarError;

/// Per-tick work registered with the episode
pub trait TickHandler: Send + Sync + 'static {
    fn on_tick(&self, snapshot: &WorldSnapshot) -> Result<(), RadarError>;
}

impl<F> TickHandler for F
where
    F: Fn(&WorldSnapshot) -> Result<(), RadarError> + Send + Sync + 'static,
{
    fn on_tick(&self, snapshot: &WorldSnapshot) -> Result<(), RadarError> {
        self(snapshot)
    }
}

/// Register `handler` with `source` behind the failure boundary
///
/// `label` identifies the owner in logs and metrics.
pub fn subscribe<T, H>(source: &T, label: Arc<str>, handler: H) -> SubscriptionId
where
    T: TickSource + ?Sized,
    H: TickHandler,
{
    source.register_on_tick(Arc::new(move |snapshot: &WorldSnapshot| {
        invoke_isolated(&label, &handler, snapshot)
    }))
}

fn invoke_isolated<H: TickHandler>(label: &str, handler: &H, snapshot: &WorldSnapshot) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.on_tick(snapshot)))
        .unwrap_or_else(|payload| {
            Err(RadarError::Panicked {
                message: panic_message(payload.as_ref()),
            })
        });

    if let Err(e) = outcome {
        error!(sensor = %label, frame = snapshot.frame(), error = %e, "tick handler failed");
        observability::record_tick_failure(label, e.kind());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Subscription state of one sensor
///
/// Holds the raw subscription ID, `0` meaning "not subscribed".
#[derive(Debug, Default)]
pub struct SensorBinding {
    callback_id: AtomicU64,
}

impl SensorBinding {
    pub const fn new() -> Self {
        Self {
            callback_id: AtomicU64::new(0),
        }
    }

    /// Currently installed subscription
    pub fn current(&self) -> Option<SubscriptionId> {
        SubscriptionId::from_raw(self.callback_id.load(Ordering::Acquire))
    }

    pub fn is_listening(&self) -> bool {
        self.current().is_some()
    }

    /// Register `handler` and install it as the only live subscription
    ///
    /// A previously installed subscription is removed from `source` after the
    /// new one is in place, so two calls in a row leave exactly one registration.
    pub fn start_listening<T, H>(&self, source: &T, label: Arc<str>, handler: H) -> SubscriptionId
    where
        T: TickSource + ?Sized,
        H: TickHandler,
    {
        let id = subscribe(source, label.clone(), handler);
        let previous = self.callback_id.swap(id.get(), Ordering::AcqRel);

        if let Some(previous) = SubscriptionId::from_raw(previous) {
            source.remove_on_tick(previous);
            debug!(sensor = %label, %previous, current = %id, "replaced tick subscription");
            observability::record_subscription("replace");
        } else {
            debug!(sensor = %label, current = %id, "installed tick subscription");
            observability::record_subscription("install");
        }

        id
    }

    /// Clear the installed subscription
    ///
    /// The episode is acquired without blocking. If it is already gone the
    /// registration went with it and nothing is removed. Returns whether a
    /// subscription was cleared.
    pub fn stop_listening<T>(&self, episode: &EpisodeProxy<T>) -> bool
    where
        T: TickSource + ?Sized,
    {
        let Some(previous) = SubscriptionId::from_raw(self.callback_id.swap(0, Ordering::AcqRel))
        else {
            return false;
        };

        if let Some(source) = episode.try_lock() {
            source.remove_on_tick(previous);
        }
        observability::record_subscription("remove");
        true
    }
}
