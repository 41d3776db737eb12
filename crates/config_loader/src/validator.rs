//! 配置校验模块
//!
//! 校验规则：
//! - 字段取值范围 (validator derive)
//! - actor id / radar id 唯一
//! - radar parent 必须存在且不能是 sensor
//! - 位姿与速度必须是有限值

use std::collections::{HashMap, HashSet};

use contracts::{ActorKind, ContractError, ScenarioBlueprint};
use validator::Validate;

/// 校验 ScenarioBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))?;
    validate_actor_ids(blueprint)?;
    validate_radar_ids(blueprint)?;
    validate_radar_parents(blueprint)?;
    validate_finite(blueprint)?;
    Ok(())
}

/// 校验 actor id 唯一性
fn validate_actor_ids(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for actor in &blueprint.actors {
        if !seen.insert(&actor.id) {
            return Err(ContractError::config_validation(
                format!("actors[id={}]", actor.id),
                "duplicate actor id",
            ));
        }
    }
    Ok(())
}

/// 校验 radar id 唯一性
fn validate_radar_ids(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for radar in &blueprint.radars {
        if !seen.insert(&radar.id) {
            return Err(ContractError::config_validation(
                format!("radars[id={}]", radar.id),
                "duplicate radar id",
            ));
        }
    }
    Ok(())
}

/// 校验挂载拓扑
///
/// 非 vehicle 的 parent 允许出现在配置里：listen 时才会被拒绝。
fn validate_radar_parents(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let kinds: HashMap<&str, ActorKind> = blueprint
        .actors
        .iter()
        .map(|a| (a.id.as_str(), a.kind))
        .collect();

    for radar in &blueprint.radars {
        match kinds.get(radar.parent.as_str()) {
            None => {
                return Err(ContractError::config_validation(
                    format!("radars[{}].parent", radar.id),
                    format!("unknown parent '{}'", radar.parent),
                ));
            }
            Some(ActorKind::Sensor) => {
                return Err(ContractError::config_validation(
                    format!("radars[{}].parent", radar.id),
                    format!("parent '{}' is a sensor", radar.parent),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// 校验位姿与速度
fn validate_finite(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    for actor in &blueprint.actors {
        if !actor.transform.is_finite() || !actor.velocity.is_finite() {
            return Err(ContractError::config_validation(
                format!("actors[{}]", actor.id),
                "transform and velocity must be finite",
            ));
        }
    }
    for radar in &blueprint.radars {
        if !radar.transform.is_finite() {
            return Err(ContractError::config_validation(
                format!("radars[{}].transform", radar.id),
                "transform must be finite",
            ));
        }
    }
    Ok(())
}
