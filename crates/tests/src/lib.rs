//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> Scenario -> 雷达事件 的 e2e 测试
//! - listen / stop 生命周期与并发测试

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use contracts::{ActorId, ActorKind, ParentRef, RadarEvent, Transform, Vector3D};
    use radar::{LongRangeRadarSensor, RadarCallbackFn};
    use simulation::{Episode, EpisodeProxy};

    pub type Events = Arc<Mutex<Vec<Arc<RadarEvent>>>>;

    pub fn collecting() -> (RadarCallbackFn, Events) {
        let events: Events = Arc::default();
        let sink = events.clone();
        let callback: RadarCallbackFn = Arc::new(move |event: Arc<RadarEvent>| {
            sink.lock().unwrap().push(event);
        });
        (callback, events)
    }

    pub fn spawn(
        episode: &Episode,
        kind: ActorKind,
        location: Vector3D,
        velocity: Vector3D,
    ) -> ActorId {
        episode.spawn_actor(
            "test.actor",
            kind,
            Transform::from_location(location),
            velocity,
        )
    }

    /// Spawn a radar on `parent` and wrap it the way clients do
    pub fn radar_on(episode: &Arc<Episode>, parent: ActorId) -> LongRangeRadarSensor<Episode> {
        let id = episode
            .spawn_sensor(radar::LONG_RANGE_RADAR_BLUEPRINT, Transform::default(), parent)
            .unwrap();
        let parent: Option<ParentRef> = episode.parent_of(id);
        LongRangeRadarSensor::new(id, parent, EpisodeProxy::new(episode))
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ActorKind, Vector3D};
    use radar::RadarError;
    use simulation::{Episode, Scenario};

    use crate::support::{collecting, radar_on, spawn};

    /// Vehicle at the origin sees an object at (3, 4, 0) moving at 5 m/s
    #[test]
    fn test_object_ahead_left() {
        let episode = Episode::with_defaults();
        // Both move together so the offset stays (3, 4, 0).
        let velocity = Vector3D::new(3.0, 4.0, 0.0);
        let ego = spawn(&episode, ActorKind::Vehicle, Vector3D::ZERO, velocity);
        spawn(&episode, ActorKind::Vehicle, Vector3D::new(3.0, 4.0, 0.0), velocity);

        let sensor = radar_on(&episode, ego);
        let (callback, events) = collecting();
        sensor.listen(callback).unwrap();

        episode.tick();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.parent(), ego);
        assert_eq!(event.frame(), 1);
        assert_eq!(event.len(), 1);

        let point = event.radar_data()[0];
        assert!((point.distance - 5.0).abs() < 1e-9);
        assert!((point.azimuth - 53.130_102_354).abs() < 1e-6);
        assert!((point.relative_velocity - 5.0).abs() < 1e-9);
    }

    /// Object directly behind reports +180 degrees
    #[test]
    fn test_object_behind() {
        let episode = Episode::with_defaults();
        let ego = spawn(&episode, ActorKind::Vehicle, Vector3D::ZERO, Vector3D::ZERO);
        spawn(
            &episode,
            ActorKind::Walker,
            Vector3D::new(-1.0, 0.0, 0.0),
            Vector3D::ZERO,
        );

        let sensor = radar_on(&episode, ego);
        let (callback, events) = collecting();
        sensor.listen(callback).unwrap();
        episode.tick();

        let events = events.lock().unwrap();
        let point = events[0].radar_data()[0];
        assert!((point.distance - 1.0).abs() < 1e-9);
        assert!((point.azimuth - 180.0).abs() < 1e-9);
        assert_eq!(point.relative_velocity, 0.0);
    }

    #[test]
    fn test_non_vehicle_parent_is_refused() {
        let episode = Episode::with_defaults();
        let ped = spawn(&episode, ActorKind::Walker, Vector3D::ZERO, Vector3D::ZERO);

        let sensor = radar_on(&episode, ped);
        let (callback, events) = collecting();

        let err = sensor.listen(callback).unwrap_err();
        assert!(matches!(err, RadarError::NotAttachedToVehicle { .. }));
        assert_eq!(episode.subscriber_count(), 0);

        sensor.stop();
        episode.tick();
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_listen_twice_keeps_one_subscription() {
        let episode = Episode::with_defaults();
        let ego = spawn(&episode, ActorKind::Vehicle, Vector3D::ZERO, Vector3D::ZERO);
        let sensor = radar_on(&episode, ego);

        let (first, first_events) = collecting();
        let (second, second_events) = collecting();
        sensor.listen(first).unwrap();
        sensor.listen(second).unwrap();
        assert_eq!(episode.subscriber_count(), 1);

        episode.tick();
        assert!(first_events.lock().unwrap().is_empty());
        assert_eq!(second_events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stop_is_idempotent_and_drop_unsubscribes() {
        let episode = Episode::with_defaults();
        let ego = spawn(&episode, ActorKind::Vehicle, Vector3D::ZERO, Vector3D::ZERO);

        let sensor = radar_on(&episode, ego);
        let (callback, events) = collecting();
        sensor.listen(callback.clone()).unwrap();
        sensor.stop();
        sensor.stop();
        assert_eq!(episode.subscriber_count(), 0);
        episode.tick();
        assert!(events.lock().unwrap().is_empty());

        sensor.listen(callback).unwrap();
        drop(sensor);
        assert_eq!(episode.subscriber_count(), 0);
    }

    #[test]
    fn test_destroyed_parent_is_skipped() {
        let episode = Episode::with_defaults();
        let ego = spawn(&episode, ActorKind::Vehicle, Vector3D::ZERO, Vector3D::ZERO);
        let sensor = radar_on(&episode, ego);
        let (callback, events) = collecting();
        sensor.listen(callback).unwrap();

        episode.tick();
        episode.destroy_actor(ego);
        episode.tick();

        assert_eq!(events.lock().unwrap().len(), 1);
        assert!(sensor.is_listening());
    }

    #[test]
    fn test_stop_after_episode_dropped() {
        let episode = Episode::with_defaults();
        let ego = spawn(&episode, ActorKind::Vehicle, Vector3D::ZERO, Vector3D::ZERO);
        let sensor = radar_on(&episode, ego);
        let (callback, _events) = collecting();
        sensor.listen(callback.clone()).unwrap();

        drop(episode);
        sensor.stop();
        assert!(!sensor.is_listening());

        let err = sensor.listen(callback).unwrap_err();
        assert!(matches!(
            err,
            RadarError::Contract(contracts::ContractError::EpisodeUnavailable)
        ));
    }

    #[test]
    fn test_panicking_callback_does_not_starve_others() {
        let episode = Episode::with_defaults();
        let ego = spawn(&episode, ActorKind::Vehicle, Vector3D::ZERO, Vector3D::ZERO);
        let faulty = radar_on(&episode, ego);
        let healthy = radar_on(&episode, ego);

        faulty
            .listen(Arc::new(|_event: Arc<contracts::RadarEvent>| {
                panic!("user callback exploded")
            }))
            .unwrap();
        let (callback, events) = collecting();
        healthy.listen(callback).unwrap();

        episode.tick();
        episode.tick();

        assert_eq!(events.lock().unwrap().len(), 2);
        assert!(faulty.is_listening());
    }

    #[test]
    fn test_scenario_from_config() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[[actors]]
id = "ego"
kind = "vehicle"

[[actors]]
id = "lead"
kind = "vehicle"
[actors.transform.location]
x = 3.0
y = 4.0
z = 0.0

[[actors]]
id = "ped"
kind = "walker"
[actors.transform.location]
x = -1.0
y = 0.0
z = 0.0

[[radars]]
id = "front"
parent = "ego"

[[radars]]
id = "odd"
parent = "ped"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let mut scenario = Scenario::spawn(&blueprint).unwrap();
        let episode = scenario.episode().clone();

        let sensors: Vec<_> = scenario
            .radars()
            .iter()
            .map(|p| {
                radar::LongRangeRadarSensor::new(
                    p.actor_id,
                    p.parent,
                    simulation::EpisodeProxy::new(&episode),
                )
            })
            .collect();

        let (callback, events) = collecting();
        assert!(sensors[0].listen(callback.clone()).is_ok());
        assert!(sensors[1].listen(callback).is_err());

        episode.tick();
        {
            let events = events.lock().unwrap();
            assert_eq!(events.len(), 1);
            let azimuths: Vec<f64> = events[0].iter().map(|p| p.azimuth.round()).collect();
            assert_eq!(azimuths, vec![53.0, 180.0]);
        }

        drop(sensors);
        scenario.teardown();
        assert_eq!(episode.subscriber_count(), 0);
        assert_eq!(episode.actor_count(), 0);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use contracts::{ActorKind, EpisodeConfig, RadarEvent, Vector3D};
    use radar::RadarCallbackFn;
    use simulation::Episode;
    use tokio::sync::mpsc;

    use crate::support::{radar_on, spawn};

    fn fast_episode() -> Arc<Episode> {
        Episode::new(EpisodeConfig {
            tick_interval_ms: 1,
            ..Default::default()
        })
    }

    /// listen / stop from two threads while the episode ticks in the background
    #[test]
    fn test_listen_stop_race_with_ticker() {
        let episode = fast_episode();
        let ego = spawn(&episode, ActorKind::Vehicle, Vector3D::ZERO, Vector3D::ZERO);
        let sensor = Arc::new(radar_on(&episode, ego));
        let delivered = Arc::new(AtomicUsize::new(0));

        let ticker = episode.start().unwrap();

        let workers: Vec<_> = (0..2)
            .map(|worker| {
                let sensor = sensor.clone();
                let delivered = delivered.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        if (i + worker) % 2 == 0 {
                            let delivered = delivered.clone();
                            let callback: RadarCallbackFn = Arc::new(move |_event: Arc<RadarEvent>| {
                                delivered.fetch_add(1, Ordering::Relaxed);
                            });
                            sensor.listen(callback).unwrap();
                        } else {
                            sensor.stop();
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // Whatever the interleaving, the registry matches the stored id.
        let expected = usize::from(sensor.is_listening());
        assert_eq!(episode.subscriber_count(), expected);

        sensor.stop();
        assert_eq!(episode.subscriber_count(), 0);
        ticker.stop();
    }

    /// Events cross into async code through a bounded channel
    #[tokio::test]
    async fn test_events_reach_async_consumer() {
        let episode = fast_episode();
        let ego = spawn(&episode, ActorKind::Vehicle, Vector3D::ZERO, Vector3D::ZERO);
        spawn(
            &episode,
            ActorKind::Other,
            Vector3D::new(0.0, 10.0, 0.0),
            Vector3D::ZERO,
        );
        let sensor = radar_on(&episode, ego);

        let (tx, mut rx) = mpsc::channel::<Arc<RadarEvent>>(16);
        let callback: RadarCallbackFn = Arc::new(move |event: Arc<RadarEvent>| {
            let _ = tx.try_send(event);
        });
        sensor.listen(callback).unwrap();

        let ticker = episode.start().unwrap();

        let mut frames = Vec::new();
        while frames.len() < 5 {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert!((event.radar_data()[0].azimuth - 90.0).abs() < 1e-9);
            frames.push(event.frame());
        }
        assert!(frames.windows(2).all(|w| w[0] < w[1]));

        sensor.stop();
        tokio::task::spawn_blocking(move || ticker.stop())
            .await
            .unwrap();
    }
}
