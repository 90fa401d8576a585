use approx::assert_relative_eq;
use marker_overlay_core::{rotation_from_euler, CalibrationModel, DetectionRecord, EulerAngles};
use marker_overlay_tracker::{
    default_role_specs, status_line, SceneNode, SceneObject, SlotState, SlotUpdate,
    TargetTracker, TrackerParams, NO_MARKERS,
};
use nalgebra::{Point2, Point3, Vector3};

fn session() -> TargetTracker<SceneNode> {
    let nodes: Vec<SceneNode> = default_role_specs()
        .iter()
        .map(|s| SceneNode::new(s.name.clone(), 5.0))
        .collect();
    TargetTracker::with_objects(
        CalibrationModel::default(),
        TrackerParams::default(),
        default_role_specs(),
        nodes,
    )
    .expect("default role table")
}

fn marker(id: i32, centroid: [f32; 2], depth: f32, angles: EulerAngles) -> DetectionRecord {
    DetectionRecord {
        id,
        raw_distance: depth,
        centroid: Point2::new(centroid[0], centroid[1]),
        translation: Vector3::new(0.1, -0.2, depth),
        orientation: rotation_from_euler(&angles).matrix().cast::<f32>(),
    }
}

#[test]
fn hide_after_show_parks_at_prior_depth() {
    let mut tracker = session();
    let angles = EulerAngles::new(5.0, 10.0, 15.0);
    tracker.update(&[marker(11, [400.0, 250.0], 3.0, angles)]);
    assert_eq!(tracker.slot_state(0), Some(SlotState::Visible));
    let shown_z = tracker.roles()[0].object.position().z;

    for _ in 0..3 {
        let update = tracker.update(&[]);
        assert_eq!(update.status, NO_MARKERS);
        assert_eq!(
            tracker.roles()[0].object.position(),
            Point3::new(-10.0, -10.0, shown_z)
        );
        assert_eq!(tracker.slot_state(0), Some(SlotState::Hidden));
    }
}

#[test]
fn hide_leaves_rotation_and_scale_alone() {
    let mut tracker = session();
    tracker.update(&[marker(1, [320.0, 198.7], 4.0, EulerAngles::new(20.0, 0.0, 0.0))]);
    let shown = tracker.roles()[0].object.clone();
    tracker.update(&[]);
    let hidden = &tracker.roles()[0].object;
    assert_eq!(hidden.rotation, shown.rotation);
    assert_eq!(hidden.scale, shown.scale);
}

#[test]
fn centred_marker_lands_on_forward_offset() {
    let mut tracker = session();
    let angles = EulerAngles::new(-15.0, 30.0, 0.0);
    let update = tracker.update(&[marker(4, [320.0, 198.7], 2.0, angles)]);
    let forward = rotation_from_euler(&angles) * Vector3::new(0.0, 0.0, -1.0);

    let SlotUpdate::Visible(placement) = update.slots[0].update else {
        panic!("slot 0 should be visible");
    };
    assert_relative_eq!(placement.position.x, forward.x, epsilon = 1e-5);
    assert_relative_eq!(placement.position.y, -forward.y, epsilon = 1e-5);
    assert_eq!(placement.position.z, 5.0);
}

#[test]
fn status_follows_slot_order_not_marker_id() {
    let mut tracker = session();
    let calib = CalibrationModel::default();
    let flat = EulerAngles::default();
    let update = tracker.update(&[
        marker(90, [300.0, 200.0], 6.0, flat),
        marker(3, [340.0, 200.0], 2.0, flat),
    ]);

    let expected = format!(
        "{}{}",
        status_line(90, calib.calibrated_distance(6.0)),
        status_line(3, calib.calibrated_distance(2.0))
    );
    assert_eq!(update.status, expected);
    assert_eq!(update.visible_count(), 2);
    assert_eq!(update.slots[0].role, "cube");
    assert_eq!(update.slots[1].role, "sphere");
}

#[test]
fn order_swap_swaps_roles() {
    let mut tracker = session();
    let flat = EulerAngles::default();
    let a = marker(1, [100.0, 100.0], 2.0, flat);
    let b = marker(2, [500.0, 300.0], 2.0, flat);

    tracker.update(&[a, b]);
    let cube_first = tracker.roles()[0].object.position;
    tracker.update(&[b, a]);
    let cube_second = tracker.roles()[0].object.position;
    assert!(cube_first.x < 0.0);
    assert!(cube_second.x > 0.0);
}

#[test]
fn half_height_roles_keep_aspect_at_any_depth() {
    let mut tracker = session();
    let flat = EulerAngles::default();
    for depth in [-3.0_f32, 0.0, 1.5, 8.0, 25.0] {
        let frame: Vec<_> = (0..4)
            .map(|i| marker(i, [320.0, 198.7], depth, flat))
            .collect();
        tracker.update(&frame);
        for slot in 0..4 {
            let scale = tracker.roles()[slot].object.scale;
            if slot < 2 {
                assert_eq!(scale.x, scale.y);
                assert_eq!(scale.y, scale.z);
            } else {
                assert_eq!(scale.x, scale.z);
                assert_relative_eq!(scale.y, scale.x / 2.0, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn partial_frame_hides_trailing_slots_only() {
    let mut tracker = session();
    let flat = EulerAngles::default();
    let full: Vec<_> = (0..4).map(|i| marker(i, [320.0, 198.7], 1.0, flat)).collect();
    tracker.update(&full);

    let update = tracker.update(&full[..2]);
    let states: Vec<SlotState> = update.slots.iter().map(|s| s.update.state()).collect();
    assert_eq!(
        states,
        [
            SlotState::Visible,
            SlotState::Visible,
            SlotState::Hidden,
            SlotState::Hidden
        ]
    );
}
