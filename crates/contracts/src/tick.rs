//! TickSource - Per-frame notification contract
//!
//! The episode notifies every registered callback once per simulation tick.
//! Registrations are keyed by a non-zero [`SubscriptionId`].

use std::fmt;
use std::num::NonZeroU64;
use std::sync::{Arc, Weak};

use crate::{ContractError, WorldSnapshot};

/// Callback invoked on the tick source's dispatch thread
pub type TickCallback = Arc<dyn Fn(&WorldSnapshot) + Send + Sync>;

/// Handle of a live tick registration
///
/// Never zero: zero is reserved as the "no subscription" sentinel in atomic storage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(NonZeroU64);

impl SubscriptionId {
    /// Wrap a raw value, `None` for the zero sentinel
    #[inline]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl From<NonZeroU64> for SubscriptionId {
    #[inline]
    fn from(value: NonZeroU64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

/// Source of per-frame snapshots
///
/// Implementations must tolerate registration and removal from any thread,
/// including from inside a callback that is currently being dispatched.
pub trait TickSource: Send + Sync {
    /// Register `callback`, returning a fresh identifier
    fn register_on_tick(&self, callback: TickCallback) -> SubscriptionId;

    /// Remove a registration
    ///
    /// Returns `false` if `id` was not registered. Removing does not cancel an
    /// invocation that is already running.
    fn remove_on_tick(&self, id: SubscriptionId) -> bool;
}

/// Non-owning handle to a tick source
///
/// Sensors keep only this proxy, so they never extend the episode's lifetime.
pub struct EpisodeProxy<T: ?Sized> {
    episode: Weak<T>,
}

impl<T: ?Sized> EpisodeProxy<T> {
    pub fn new(episode: &Arc<T>) -> Self {
        Self {
            episode: Arc::downgrade(episode),
        }
    }

    /// Acquire the episode without blocking, `None` once it is torn down
    #[inline]
    pub fn try_lock(&self) -> Option<Arc<T>> {
        self.episode.upgrade()
    }

    /// Acquire the episode, failing if it no longer exists
    pub fn lock(&self) -> Result<Arc<T>, ContractError> {
        self.episode
            .upgrade()
            .ok_or(ContractError::EpisodeUnavailable)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.episode.strong_count() > 0
    }
}

impl<T: ?Sized> Clone for EpisodeProxy<T> {
    fn clone(&self) -> Self {
        Self {
            episode: self.episode.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for EpisodeProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpisodeProxy")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_sentinel() {
        assert!(SubscriptionId::from_raw(0).is_none());
        assert_eq!(SubscriptionId::from_raw(7).map(SubscriptionId::get), Some(7));
    }

    #[test]
    fn test_proxy_does_not_keep_episode_alive() {
        let episode = Arc::new(5u32);
        let proxy = EpisodeProxy::new(&episode);

        assert_eq!(proxy.try_lock().as_deref(), Some(&5));
        assert!(proxy.lock().is_ok());

        drop(episode);
        assert!(!proxy.is_alive());
        assert!(proxy.try_lock().is_none());
        assert!(matches!(proxy.lock(), Err(ContractError::EpisodeUnavailable)));
    }
}
