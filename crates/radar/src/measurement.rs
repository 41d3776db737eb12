//! Radar measurement synthesis
//!
//! Pure per-frame transform from a snapshot to a `RadarEvent`. The parent is
//! resolved by ID against the snapshot every time, never cached.

use contracts::{
    ActorId, ActorSnapshot, DetectedObject, Location, RadarDataPoint, RadarEvent, WorldSnapshot,
};
use tracing::trace;

use crate::error::{RadarError, Result};
use crate::geometry::azimuth;

/// Build the radar event for `parent` at `snapshot`
///
/// Returns `None` when the parent is not alive in this frame (not yet spawned
/// or already destroyed). That is an expected transient and is not logged.
/// A parent with a non-finite pose also yields `None`.
pub fn synthesize(snapshot: &WorldSnapshot, parent: ActorId) -> Option<RadarEvent> {
    let parent = snapshot.find(parent)?;
    synthesize_for(snapshot, parent).ok()
}

/// Build the radar event for an already-resolved parent
///
/// Fails with `MalformedParent` when the parent pose is not finite.
pub(crate) fn synthesize_for(
    snapshot: &WorldSnapshot,
    parent: &ActorSnapshot,
) -> Result<RadarEvent> {
    if !parent.transform.is_finite() {
        return Err(RadarError::MalformedParent {
            parent: parent.id,
            reason: format!("non-finite transform {:?}", parent.transform),
        });
    }
    let origin = parent.location();

    let data: Vec<RadarDataPoint> = parent
        .detected_objects
        .iter()
        .filter_map(|object| {
            let point = measure(object, origin);
            if point.is_none() {
                trace!(
                    parent = parent.id,
                    object = object.id,
                    frame = snapshot.frame(),
                    "skipping detection with non-finite state"
                );
            }
            point
        })
        .collect();

    Ok(RadarEvent::new(
        snapshot.frame(),
        snapshot.elapsed_seconds(),
        parent.transform,
        parent.id,
        data,
    ))
}

/// Measure a single detected object from `origin`
///
/// `relative_velocity` is the object's own speed; the parent's motion is not
/// subtracted. A non-finite object location, object velocity or `origin`
/// yields `None`.
pub fn measure(object: &DetectedObject, origin: Location) -> Option<RadarDataPoint> {
    if !object.location.is_finite() || !object.velocity.is_finite() || !origin.is_finite() {
        return None;
    }

    let offset = object.location - origin;
    Some(RadarDataPoint {
        location: object.location,
        relative_velocity: object.velocity.length(),
        distance: offset.length(),
        azimuth: azimuth(offset),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ActorKind, Rotation, Transform, Vector3D};
    use rand::Rng;

    const EPS: f64 = 1e-9;

    fn object(id: ActorId, location: Vector3D, velocity: Vector3D) -> DetectedObject {
        DetectedObject {
            id,
            location,
            velocity,
        }
    }

    fn vehicle(id: ActorId, location: Vector3D, detected: Vec<DetectedObject>) -> ActorSnapshot {
        ActorSnapshot {
            id,
            kind: ActorKind::Vehicle,
            transform: Transform::new(location, Rotation::new(0.0, 30.0, 0.0)),
            velocity: Vector3D::ZERO,
            detected_objects: detected,
        }
    }

    #[test]
    fn test_single_object_three_four_five() {
        let parent = vehicle(
            1,
            Vector3D::ZERO,
            vec![object(2, Vector3D::new(3.0, 4.0, 0.0), Vector3D::new(3.0, 4.0, 0.0))],
        );
        let snapshot = WorldSnapshot::new(10, 0.5, 0.05, [parent]);

        let event = synthesize(&snapshot, 1).expect("parent is alive");
        assert_eq!(event.len(), 1);

        let point = event.radar_data()[0];
        assert!((point.distance - 5.0).abs() < EPS);
        assert!((point.relative_velocity - 5.0).abs() < EPS);
        assert!((point.azimuth - 53.13).abs() < 0.01);
        assert_eq!(point.location, Vector3D::new(3.0, 4.0, 0.0));
    }

    #[test]
    fn test_object_behind_is_180_degrees() {
        let parent = vehicle(
            1,
            Vector3D::ZERO,
            vec![object(2, Vector3D::new(-1.0, 0.0, 0.0), Vector3D::ZERO)],
        );
        let snapshot = WorldSnapshot::new(1, 0.05, 0.05, [parent]);

        let event = synthesize(&snapshot, 1).unwrap();
        assert!((event.radar_data()[0].azimuth - 180.0).abs() < EPS);
        assert!((event.radar_data()[0].distance - 1.0).abs() < EPS);
    }

    #[test]
    fn test_event_metadata_from_snapshot_and_parent() {
        let parent = vehicle(7, Vector3D::new(1.0, 2.0, 0.0), Vec::new());
        let transform = parent.transform;
        let snapshot = WorldSnapshot::new(42, 2.1, 0.05, [parent]);

        let event = synthesize(&snapshot, 7).unwrap();
        assert_eq!(event.frame(), 42);
        assert!((event.timestamp() - 2.1).abs() < EPS);
        assert_eq!(event.parent(), 7);
        assert_eq!(*event.sensor_transform(), transform);
        assert!(event.is_empty());
    }

    #[test]
    fn test_non_finite_parent_yields_nothing() {
        let target = object(2, Vector3D::new(1.0, 0.0, 0.0), Vector3D::ZERO);
        for bad in [f64::NAN, f64::INFINITY] {
            let snapshot = WorldSnapshot::new(
                3,
                0.15,
                0.05,
                [vehicle(1, Vector3D::new(bad, 0.0, 0.0), vec![target])],
            );
            assert!(synthesize(&snapshot, 1).is_none());

            let parent = snapshot.find(1).unwrap();
            let err = synthesize_for(&snapshot, parent).unwrap_err();
            assert!(matches!(err, RadarError::MalformedParent { parent: 1, .. }));
        }
    }

    #[test]
    fn test_measure_rejects_non_finite_origin() {
        let target = object(2, Vector3D::new(1.0, 0.0, 0.0), Vector3D::ZERO);
        assert!(measure(&target, Vector3D::new(0.0, f64::NAN, 0.0)).is_none());
        assert!(measure(&target, Vector3D::ZERO).is_some());
    }

    #[test]
    fn test_missing_parent_yields_nothing() {
        let other = vehicle(
            2,
            Vector3D::ZERO,
            vec![object(3, Vector3D::new(1.0, 1.0, 0.0), Vector3D::ZERO)],
        );
        let snapshot = WorldSnapshot::new(5, 0.25, 0.05, [other]);
        assert!(synthesize(&snapshot, 1).is_none());
        assert!(synthesize(&WorldSnapshot::default(), 1).is_none());
    }

    #[test]
    fn test_count_and_order_preserved() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let n = rng.random_range(0..20);
            let detected: Vec<DetectedObject> = (0..n)
                .map(|i| {
                    object(
                        100 + i,
                        Vector3D::new(
                            rng.random_range(-200.0..200.0),
                            rng.random_range(-200.0..200.0),
                            rng.random_range(-5.0..5.0),
                        ),
                        Vector3D::new(rng.random_range(-30.0..30.0), 0.0, 0.0),
                    )
                })
                .collect();
            let origin = Vector3D::new(rng.random_range(-50.0..50.0), 0.0, 0.0);
            let snapshot =
                WorldSnapshot::new(1, 0.0, 0.05, [vehicle(1, origin, detected.clone())]);

            let event = synthesize(&snapshot, 1).unwrap();
            assert_eq!(event.len(), detected.len());
            for (point, object) in event.iter().zip(&detected) {
                assert_eq!(point.location, object.location);
                let expected = (object.location - origin).length();
                assert!((point.distance - expected).abs() < 1e-9);
                assert!(point.distance >= 0.0 && point.relative_velocity >= 0.0);
            }
        }
    }

    #[test]
    fn test_azimuth_uses_current_parent_location() {
        let target = object(2, Vector3D::new(10.0, 0.0, 0.0), Vector3D::ZERO);

        let first = WorldSnapshot::new(1, 0.05, 0.05, [vehicle(1, Vector3D::ZERO, vec![target])]);
        let moved = WorldSnapshot::new(
            2,
            0.10,
            0.05,
            [vehicle(1, Vector3D::new(10.0, -10.0, 0.0), vec![target])],
        );

        assert!(synthesize(&first, 1).unwrap().radar_data()[0].azimuth.abs() < EPS);
        assert!((synthesize(&moved, 1).unwrap().radar_data()[0].azimuth - 90.0).abs() < EPS);
    }

    #[test]
    fn test_non_finite_objects_are_excluded() {
        let detected = vec![
            object(2, Vector3D::new(1.0, 0.0, 0.0), Vector3D::ZERO),
            object(3, Vector3D::new(f64::NAN, 0.0, 0.0), Vector3D::ZERO),
            object(4, Vector3D::new(0.0, 1.0, 0.0), Vector3D::new(f64::INFINITY, 0.0, 0.0)),
            object(5, Vector3D::new(0.0, 2.0, 0.0), Vector3D::ZERO),
        ];
        let snapshot = WorldSnapshot::new(1, 0.0, 0.05, [vehicle(1, Vector3D::ZERO, detected)]);

        let event = synthesize(&snapshot, 1).unwrap();
        let ys: Vec<f64> = event.iter().map(|p| p.location.y).collect();
        assert_eq!(ys, vec![0.0, 2.0]);
    }

    #[test]
    fn test_relative_velocity_is_raw_speed() {
        // Parent and object move together, the reported value is still the object's speed.
        let mut parent = vehicle(
            1,
            Vector3D::ZERO,
            vec![object(2, Vector3D::new(5.0, 0.0, 0.0), Vector3D::new(10.0, 0.0, 0.0))],
        );
        parent.velocity = Vector3D::new(10.0, 0.0, 0.0);
        let snapshot = WorldSnapshot::new(1, 0.0, 0.05, [parent]);

        let event = synthesize(&snapshot, 1).unwrap();
        assert!((event.radar_data()[0].relative_velocity - 10.0).abs() < EPS);
    }
}
