//! Episode 核心实现
//!
//! 维护 actor 注册表与仿真时钟，每个 tick 构建一份不可变快照并分发给所有订阅者。

use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{
    ActorId, ActorKind, ActorSnapshot, DetectedObject, EpisodeConfig, ParentRef, Rotation,
    SubscriptionId, TickCallback, TickSource, Transform, Vector3D, WorldSnapshot,
};
use tracing::{debug, info, instrument, trace};

use crate::error::{Result, SimulationError};

/// Actor 状态
#[derive(Debug, Clone)]
struct ActorRecord {
    kind: ActorKind,
    blueprint: String,
    /// 世界坐标位姿；传感器为相对父 actor 的位姿
    transform: Transform,
    velocity: Vector3D,
    parent: Option<ActorId>,
}

/// 仿真时钟
#[derive(Debug, Clone, Copy)]
struct Clock {
    frame: u64,
    elapsed_seconds: f64,
}

/// In-process simulation episode
///
/// Implements [`TickSource`]: callbacks are invoked on whichever thread calls
/// [`Episode::tick`], without holding the actor or callback registries, so a
/// callback may spawn actors or register and remove subscriptions (including
/// its own) while being dispatched. It must not call `tick` itself.
pub struct Episode {
    config: EpisodeConfig,
    /// Actor ID 计数器
    next_actor_id: AtomicU32,
    /// 订阅 ID 计数器 (ID = 计数 + 1，0 保留为"无订阅")
    next_callback_id: AtomicU64,
    actors: Mutex<BTreeMap<ActorId, ActorRecord>>,
    callbacks: Mutex<BTreeMap<SubscriptionId, TickCallback>>,
    clock: Mutex<Clock>,
    /// 串行化 tick，保证帧号单调
    tick_lock: Mutex<()>,
}

impl Episode {
    /// 创建新的 episode
    pub fn new(config: EpisodeConfig) -> Arc<Self> {
        let clock = Clock {
            frame: config.start_frame,
            elapsed_seconds: 0.0,
        };
        Arc::new(Self {
            config,
            next_actor_id: AtomicU32::new(1000), // 从 1000 开始，便于识别
            next_callback_id: AtomicU64::new(0),
            actors: Mutex::new(BTreeMap::new()),
            callbacks: Mutex::new(BTreeMap::new()),
            clock: Mutex::new(clock),
            tick_lock: Mutex::new(()),
        })
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Arc<Self> {
        Self::new(EpisodeConfig::default())
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Spawn a free actor
    #[instrument(
        name = "episode_spawn_actor",
        skip(self, kind, transform, velocity),
        fields(kind = kind.as_str())
    )]
    pub fn spawn_actor(
        &self,
        blueprint: &str,
        kind: ActorKind,
        transform: Transform,
        velocity: Vector3D,
    ) -> ActorId {
        let actor_id = self.allocate_actor_id();
        lock(&self.actors).insert(
            actor_id,
            ActorRecord {
                kind,
                blueprint: blueprint.to_string(),
                transform,
                velocity,
                parent: None,
            },
        );
        debug!(actor_id, "actor spawned");
        actor_id
    }

    /// Spawn a sensor attached to `parent`
    ///
    /// `transform` is relative to the parent.
    #[instrument(name = "episode_spawn_sensor", skip(self, transform))]
    pub fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent: ActorId,
    ) -> Result<ActorId> {
        let mut actors = lock(&self.actors);
        if !actors.contains_key(&parent) {
            return Err(SimulationError::ParentNotFound {
                blueprint: blueprint.to_string(),
                parent,
            });
        }

        let actor_id = self.allocate_actor_id();
        actors.insert(
            actor_id,
            ActorRecord {
                kind: ActorKind::Sensor,
                blueprint: blueprint.to_string(),
                transform,
                velocity: Vector3D::ZERO,
                parent: Some(parent),
            },
        );
        debug!(actor_id, "sensor spawned");
        Ok(actor_id)
    }

    /// Destroy an actor
    ///
    /// Idempotent: returns `false` if the actor did not exist. Sensors attached
    /// to it are left in place and simply stop resolving their parent.
    #[instrument(name = "episode_destroy_actor", skip(self))]
    pub fn destroy_actor(&self, actor_id: ActorId) -> bool {
        let removed = lock(&self.actors).remove(&actor_id).is_some();
        if removed {
            debug!(actor_id, "actor destroyed");
        }
        removed
    }

    /// Overwrite an actor's velocity
    pub fn set_velocity(&self, actor_id: ActorId, velocity: Vector3D) -> bool {
        match lock(&self.actors).get_mut(&actor_id) {
            Some(record) => {
                record.velocity = velocity;
                true
            }
            None => false,
        }
    }

    pub fn actor_exists(&self, actor_id: ActorId) -> bool {
        lock(&self.actors).contains_key(&actor_id)
    }

    pub fn actor_kind(&self, actor_id: ActorId) -> Option<ActorKind> {
        lock(&self.actors).get(&actor_id).map(|r| r.kind)
    }

    pub fn actor_blueprint(&self, actor_id: ActorId) -> Option<String> {
        lock(&self.actors).get(&actor_id).map(|r| r.blueprint.clone())
    }

    /// Parent of an attached actor, with the parent's current kind
    pub fn parent_of(&self, actor_id: ActorId) -> Option<ParentRef> {
        let actors = lock(&self.actors);
        let parent = actors.get(&actor_id)?.parent?;
        let kind = actors.get(&parent)?.kind;
        Some(ParentRef { id: parent, kind })
    }

    pub fn actor_count(&self) -> usize {
        lock(&self.actors).len()
    }

    /// Number of registered tick callbacks
    pub fn subscriber_count(&self) -> usize {
        lock(&self.callbacks).len()
    }

    /// Frame number of the last tick
    pub fn frame(&self) -> u64 {
        lock(&self.clock).frame
    }

    /// Advance the simulation by one step and notify every subscriber
    ///
    /// Returns the published snapshot.
    pub fn tick(&self) -> Arc<WorldSnapshot> {
        let _serial = lock(&self.tick_lock);
        let dt = self.config.fixed_delta_seconds;

        let (frame, elapsed_seconds) = {
            let mut clock = lock(&self.clock);
            clock.frame += 1;
            clock.elapsed_seconds += dt;
            (clock.frame, clock.elapsed_seconds)
        };

        let snapshot = {
            let mut actors = lock(&self.actors);
            for record in actors.values_mut().filter(|r| r.parent.is_none()) {
                record.transform.location = record.transform.location + record.velocity * dt;
            }
            Arc::new(build_snapshot(frame, elapsed_seconds, dt, &actors))
        };

        // Dispatch outside the registry lock.
        let callbacks: Vec<TickCallback> = lock(&self.callbacks).values().cloned().collect();
        observability::record_episode_tick(callbacks.len());
        trace!(frame, subscribers = callbacks.len(), "dispatching tick");

        for callback in &callbacks {
            callback(&snapshot);
        }

        snapshot
    }

    /// Start a background thread ticking every `tick_interval_ms`
    ///
    /// The thread only holds a weak reference, it exits once the episode is
    /// dropped or the returned handle is stopped.
    pub fn start(self: &Arc<Self>) -> Result<TickThread> {
        let running = Arc::new(AtomicBool::new(true));
        let episode: Weak<Self> = Arc::downgrade(self);
        let interval = Duration::from_millis(self.config.tick_interval_ms);
        let flag = running.clone();

        let handle = thread::Builder::new()
            .name("episode-tick".to_string())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis() as u64, "tick thread started");

                while flag.load(Ordering::Acquire) {
                    match episode.upgrade() {
                        Some(episode) => {
                            episode.tick();
                        }
                        None => break,
                    }
                    thread::sleep(interval);
                }

                debug!("tick thread stopped");
            })
            .map_err(SimulationError::ThreadSpawn)?;

        info!(
            interval_ms = self.config.tick_interval_ms,
            fixed_delta_seconds = self.config.fixed_delta_seconds,
            "episode ticking"
        );

        Ok(TickThread {
            running,
            handle: Some(handle),
        })
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl TickSource for Episode {
    fn register_on_tick(&self, callback: TickCallback) -> SubscriptionId {
        let raw = self.next_callback_id.fetch_add(1, Ordering::SeqCst);
        let id = SubscriptionId::from(NonZeroU64::MIN.saturating_add(raw));
        lock(&self.callbacks).insert(id, callback);
        trace!(subscription = %id, "tick callback registered");
        id
    }

    fn remove_on_tick(&self, id: SubscriptionId) -> bool {
        let removed = lock(&self.callbacks).remove(&id).is_some();
        trace!(subscription = %id, removed, "tick callback removed");
        removed
    }
}

/// Handle of the background tick thread
///
/// Dropping the handle signals the thread to stop without waiting for it.
pub struct TickThread {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickThread {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("tick thread panicked");
            }
        }
    }
}

impl Drop for TickThread {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 根据当前 actor 状态构建快照
///
/// 车辆检测到所有其他非传感器 actor，按 actor ID 顺序排列。
fn build_snapshot(
    frame: u64,
    elapsed_seconds: f64,
    delta_seconds: f64,
    actors: &BTreeMap<ActorId, ActorRecord>,
) -> WorldSnapshot {
    let world_transform = |record: &ActorRecord| -> Option<Transform> {
        match record.parent {
            None => Some(record.transform),
            Some(parent) => {
                let base = actors.get(&parent)?.transform;
                Some(Transform::new(
                    base.location + record.transform.location.rotate_yaw(base.rotation.yaw),
                    Rotation::new(
                        base.rotation.pitch + record.transform.rotation.pitch,
                        base.rotation.yaw + record.transform.rotation.yaw,
                        base.rotation.roll + record.transform.rotation.roll,
                    ),
                ))
            }
        }
    };

    let snapshots = actors.iter().filter_map(|(&id, record)| {
        // Sensors whose parent is gone are not part of the world anymore.
        let transform = world_transform(record)?;
        let detected_objects = if record.kind.is_vehicle() {
            actors
                .iter()
                .filter(|(&other, r)| other != id && r.kind != ActorKind::Sensor)
                .map(|(&other, r)| DetectedObject {
                    id: other,
                    location: r.transform.location,
                    velocity: r.velocity,
                })
                .collect()
        } else {
            Vec::new()
        };

        Some(ActorSnapshot {
            id,
            kind: record.kind,
            transform,
            velocity: record.velocity,
            detected_objects,
        })
    });

    WorldSnapshot::new(frame, elapsed_seconds, delta_seconds, snapshots)
}
