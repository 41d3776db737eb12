//! 雷达指标收集模块
//!
//! 通过 `metrics` facade 记录 tick 分发、订阅变更与雷达事件，
//! 并提供内存聚合器用于运行结束后的摘要输出。

use std::collections::HashMap;

use contracts::RadarEvent;
use metrics::{counter, histogram};

/// 记录一次雷达事件投递
pub fn record_radar_event(sensor: &str, detections: usize) {
    counter!("radar_events_total", "sensor" => sensor.to_string()).increment(1);
    histogram!("radar_detections", "sensor" => sensor.to_string()).record(detections as f64);
}

/// 记录 tick 处理失败 (错误或 panic)
pub fn record_tick_failure(sensor: &str, kind: &str) {
    counter!(
        "radar_tick_failures_total",
        "sensor" => sensor.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录订阅变更 (install / replace / remove)
pub fn record_subscription(action: &'static str) {
    counter!("radar_subscriptions_total", "action" => action).increment(1);
}

/// 记录一次 episode tick 分发
pub fn record_episode_tick(subscribers: usize) {
    counter!("episode_ticks_total").increment(1);
    histogram!("episode_tick_subscribers").record(subscribers as f64);
}

/// 雷达指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RadarMetricsAggregator {
    /// 事件总数
    pub total_events: u64,

    /// 检测点总数
    pub total_detections: u64,

    /// 空事件数 (无检测点)
    pub empty_events: u64,

    /// 每帧检测点数量统计
    pub detection_stats: RunningStats,

    /// 检测距离统计 (米)
    pub distance_stats: RunningStats,

    /// 目标速度统计 (m/s)
    pub velocity_stats: RunningStats,

    /// 各父 actor 的事件数
    pub events_per_parent: HashMap<u32, u64>,
}

impl RadarMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, event: &RadarEvent) {
        self.total_events += 1;
        self.total_detections += event.len() as u64;
        if event.is_empty() {
            self.empty_events += 1;
        }
        *self.events_per_parent.entry(event.parent()).or_insert(0) += 1;

        self.detection_stats.push(event.len() as f64);
        for point in event {
            self.distance_stats.push(point.distance);
            self.velocity_stats.push(point.relative_velocity);
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> RadarSummary {
        RadarSummary {
            total_events: self.total_events,
            total_detections: self.total_detections,
            empty_events: self.empty_events,
            detections_per_event: StatsSummary::from(&self.detection_stats),
            distance_m: StatsSummary::from(&self.distance_stats),
            velocity_mps: StatsSummary::from(&self.velocity_stats),
            events_per_parent: self.events_per_parent.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct RadarSummary {
    pub total_events: u64,
    pub total_detections: u64,
    pub empty_events: u64,
    pub detections_per_event: StatsSummary,
    pub distance_m: StatsSummary,
    pub velocity_mps: StatsSummary,
    pub events_per_parent: HashMap<u32, u64>,
}

impl std::fmt::Display for RadarSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Radar Metrics Summary ===")?;
        writeln!(f, "Total events: {}", self.total_events)?;
        writeln!(f, "Total detections: {}", self.total_detections)?;
        writeln!(f, "Empty events: {}", self.empty_events)?;
        writeln!(f, "Detections per event: {}", self.detections_per_event)?;
        writeln!(f, "Distance (m): {}", self.distance_m)?;
        writeln!(f, "Velocity (m/s): {}", self.velocity_mps)?;

        if !self.events_per_parent.is_empty() {
            let mut parents: Vec<_> = self.events_per_parent.iter().collect();
            parents.sort();
            writeln!(f, "Events per parent:")?;
            for (parent, count) in parents {
                writeln!(f, "  {}: {}", parent, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RadarDataPoint, Transform, Vector3D};

    fn point(distance: f64, speed: f64) -> RadarDataPoint {
        RadarDataPoint {
            location: Vector3D::new(distance, 0.0, 0.0),
            relative_velocity: speed,
            distance,
            azimuth: 0.0,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = RadarMetricsAggregator::new();

        aggregator.update(&RadarEvent::new(
            1,
            0.05,
            Transform::default(),
            7,
            vec![point(10.0, 2.0), point(20.0, 4.0)],
        ));
        aggregator.update(&RadarEvent::new(2, 0.10, Transform::default(), 7, Vec::new()));

        assert_eq!(aggregator.total_events, 2);
        assert_eq!(aggregator.total_detections, 2);
        assert_eq!(aggregator.empty_events, 1);
        assert_eq!(aggregator.events_per_parent.get(&7), Some(&2));
        assert!((aggregator.distance_stats.mean() - 15.0).abs() < 1e-10);

        aggregator.reset();
        assert_eq!(aggregator.total_events, 0);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = RadarMetricsAggregator::new();
        aggregator.update(&RadarEvent::new(1, 0.0, Transform::default(), 3, vec![point(5.0, 1.0)]));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Total events: 1"));
        assert!(output.contains("Total detections: 1"));
        assert!(output.contains("  3: 1"));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_radar_event("radar", 3);
        record_tick_failure("radar", "panic");
        record_subscription("install");
        record_episode_tick(2);
    }
}
