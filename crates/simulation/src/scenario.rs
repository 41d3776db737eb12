//! Scenario 构建
//!
//! 从 ScenarioBlueprint spawn actors 与雷达，失败时回滚。

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{
    ActorConfig, ActorId, ActorKind, ParentRef, RadarConfig, ScenarioBlueprint,
    LONG_RANGE_RADAR_BLUEPRINT,
};
use tracing::{info, instrument, warn};

use crate::episode::Episode;
use crate::error::{Result, SimulationError};

/// Radar actor spawned from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarPlacement {
    /// Configuration ID
    pub id: String,
    /// Sensor actor
    pub actor_id: ActorId,
    /// Parent at spawn time
    pub parent: Option<ParentRef>,
}

/// Spawned scenario
pub struct Scenario {
    episode: Arc<Episode>,
    /// Config ID -> Actor handle
    actors: HashMap<String, ActorId>,
    radars: Vec<RadarPlacement>,
}

impl Scenario {
    /// Create a fresh episode and spawn everything in `blueprint`
    pub fn spawn(blueprint: &ScenarioBlueprint) -> Result<Self> {
        Self::spawn_into(Episode::new(blueprint.episode.clone()), blueprint)
    }

    /// Spawn everything in `blueprint` into an existing episode
    ///
    /// # 原子性保证
    /// 如果任何 spawn 失败，会回滚销毁所有已创建的 actors。
    #[instrument(
        name = "scenario_spawn",
        skip(episode, blueprint),
        fields(actors = blueprint.actors.len(), radars = blueprint.radars.len())
    )]
    pub fn spawn_into(episode: Arc<Episode>, blueprint: &ScenarioBlueprint) -> Result<Self> {
        let mut scenario = Self {
            episode,
            actors: HashMap::new(),
            radars: Vec::new(),
        };

        for config in &blueprint.actors {
            if let Err(e) = scenario.spawn_actor(config) {
                warn!(error = %e, actor = %config.id, "actor spawn failed, rolling back all actors");
                scenario.teardown();
                return Err(e);
            }
        }

        for config in &blueprint.radars {
            if let Err(e) = scenario.spawn_radar(config) {
                warn!(error = %e, radar = %config.id, "radar spawn failed, rolling back all actors");
                scenario.teardown();
                return Err(e);
            }
        }

        info!(
            actors = scenario.actors.len(),
            radars = scenario.radars.len(),
            "scenario spawned"
        );
        Ok(scenario)
    }

    pub fn episode(&self) -> &Arc<Episode> {
        &self.episode
    }

    pub fn radars(&self) -> &[RadarPlacement] {
        &self.radars
    }

    /// Actor handle for a configuration ID
    pub fn actor(&self, id: &str) -> Option<ActorId> {
        self.actors.get(id).copied()
    }

    /// Destroy every spawned actor, radars first
    ///
    /// 幂等：多次调用安全。
    pub fn teardown(&mut self) {
        for radar in self.radars.drain(..) {
            self.episode.destroy_actor(radar.actor_id);
        }
        for (_, actor_id) in self.actors.drain() {
            self.episode.destroy_actor(actor_id);
        }
    }

    fn spawn_actor(&mut self, config: &ActorConfig) -> Result<()> {
        if self.actors.contains_key(&config.id) {
            return Err(SimulationError::DuplicateActor {
                id: config.id.clone(),
            });
        }

        let blueprint = config
            .blueprint
            .as_deref()
            .unwrap_or_else(|| default_blueprint(config.kind));

        let actor_id =
            self.episode
                .spawn_actor(blueprint, config.kind, config.transform, config.velocity);
        self.actors.insert(config.id.clone(), actor_id);
        Ok(())
    }

    fn spawn_radar(&mut self, config: &RadarConfig) -> Result<()> {
        let parent = self
            .actor(&config.parent)
            .ok_or_else(|| SimulationError::UnknownActor {
                item: config.id.clone(),
                actor: config.parent.clone(),
            })?;

        let actor_id =
            self.episode
                .spawn_sensor(LONG_RANGE_RADAR_BLUEPRINT, config.transform, parent)?;
        self.radars.push(RadarPlacement {
            id: config.id.clone(),
            actor_id,
            parent: self.episode.parent_of(actor_id),
        });
        Ok(())
    }
}

/// Blueprint used for actors that do not name one
fn default_blueprint(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::Vehicle => "vehicle.generic",
        ActorKind::Walker => "walker.pedestrian.generic",
        ActorKind::Sensor => "sensor.generic",
        ActorKind::Other => "static.prop.generic",
    }
}
