//! Per-slot placement rules.
//!
//! A slot is `Visible` when the detector returned a record at its index this
//! frame and `Hidden` otherwise. Both transitions keep the object's current
//! depth so a re-shown object does not jump along the view axis.

use marker_overlay_core::{decode_pose, CalibrationModel, DetectionRecord, EulerAngles};
use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Visibility of one slot after the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    #[default]
    Hidden,
    Visible,
}

/// Transform written to a visible slot's object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisiblePlacement {
    pub marker_id: i32,
    pub position: Point3<f64>,
    pub rotation: EulerAngles,
    pub scale: Vector3<f64>,
    /// Calibrated marker distance for the status text.
    pub distance: f64,
}

/// What happened to one slot this frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotUpdate {
    Visible(VisiblePlacement),
    Hidden { position: Point3<f64> },
}

impl SlotUpdate {
    #[inline]
    pub fn state(&self) -> SlotState {
        match self {
            SlotUpdate::Visible(_) => SlotState::Visible,
            SlotUpdate::Hidden { .. } => SlotState::Hidden,
        }
    }

    #[inline]
    pub fn position(&self) -> Point3<f64> {
        match self {
            SlotUpdate::Visible(p) => p.position,
            SlotUpdate::Hidden { position } => *position,
        }
    }
}

/// Placement of an object anchored to `record`.
///
/// Position is the calibrated screen offset of the marker centroid plus the
/// marker's forward direction, with forward Y negated for the screen's
/// downward Y axis. Yaw and roll are negated because the camera image is
/// mirrored relative to the scene.
pub fn place_visible(
    record: &DetectionRecord,
    scale_aspect: &Vector3<f64>,
    current_z: f64,
    calibration: &CalibrationModel,
) -> VisiblePlacement {
    let pose = decode_pose(&record.translation, &record.orientation);
    let offset = calibration.screen_offset(record.centroid.x as f64, record.centroid.y as f64);

    let position = Point3::new(
        offset.x + pose.forward.x,
        offset.y - pose.forward.y,
        current_z,
    );
    let rotation = EulerAngles::new(pose.euler.x, -pose.euler.y, -pose.euler.z);
    let scale = scale_aspect * calibration.visual_scale(pose.translation.z);

    VisiblePlacement {
        marker_id: record.id,
        position,
        rotation,
        scale,
        distance: calibration.calibrated_distance(record.raw_distance as f64),
    }
}

/// Off-stage position for a hidden object currently at depth `current_z`.
#[inline]
pub fn park(off_stage: &Vector2<f64>, current_z: f64) -> Point3<f64> {
    Point3::new(off_stage.x, off_stage.y, current_z)
}
