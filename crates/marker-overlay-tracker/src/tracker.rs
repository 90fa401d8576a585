use marker_overlay_core::{CalibrationModel, DetectionRecord};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::role::{Role, RoleSpec};
use crate::scene::SceneObject;
use crate::slot::{park, place_visible, SlotState, SlotUpdate};
use crate::status::StatusSummary;

/// Tracker settings that are not part of the camera calibration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// Screen-plane position hidden objects are moved to. Must lie outside
    /// the visible area.
    pub off_stage: Vector2<f64>,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            off_stage: Vector2::new(-10.0, -10.0),
        }
    }
}

/// Tracker construction errors.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TrackerError {
    #[error("role table is empty")]
    EmptyRoleTable,
    #[error("role `{role}` has a non-positive or non-finite scale aspect")]
    InvalidAspect { role: String },
    #[error("off-stage position must be finite")]
    InvalidOffStage,
    #[error("{roles} roles but {objects} scene objects")]
    RoleCountMismatch { roles: usize, objects: usize },
}

/// Outcome of one slot in one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlotReport {
    pub slot: usize,
    pub role: String,
    #[serde(flatten)]
    pub update: SlotUpdate,
}

/// Outcome of one tracker pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameUpdate {
    pub slots: Vec<SlotReport>,
    pub status: String,
}

impl FrameUpdate {
    pub fn visible_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.update.state() == SlotState::Visible)
            .count()
    }
}

/// Drives a fixed table of roles from the detections of each frame.
///
/// The N-th detection of a frame drives the N-th role, whatever its marker
/// id. A marker that changes position in the detector's output therefore
/// changes role.
#[derive(Debug)]
pub struct TargetTracker<O> {
    roles: Vec<Role<O>>,
    states: Vec<SlotState>,
    calibration: CalibrationModel,
    params: TrackerParams,
}

impl<O: SceneObject> TargetTracker<O> {
    /// Create a tracker over an already bound role table.
    pub fn new(
        calibration: CalibrationModel,
        params: TrackerParams,
        roles: Vec<Role<O>>,
    ) -> Result<Self, TrackerError> {
        if roles.is_empty() {
            return Err(TrackerError::EmptyRoleTable);
        }
        if let Some(bad) = roles.iter().find(|r| !r.spec.aspect_is_valid()) {
            return Err(TrackerError::InvalidAspect {
                role: bad.spec.name.clone(),
            });
        }
        if !params.off_stage.iter().all(|v| v.is_finite()) {
            return Err(TrackerError::InvalidOffStage);
        }

        let states = vec![SlotState::Hidden; roles.len()];
        Ok(Self {
            roles,
            states,
            calibration,
            params,
        })
    }

    /// Bind `specs[i]` to the i-th object and create the tracker.
    pub fn with_objects(
        calibration: CalibrationModel,
        params: TrackerParams,
        specs: Vec<RoleSpec>,
        objects: Vec<O>,
    ) -> Result<Self, TrackerError> {
        if specs.len() != objects.len() {
            return Err(TrackerError::RoleCountMismatch {
                roles: specs.len(),
                objects: objects.len(),
            });
        }
        let roles = specs.into_iter().zip(objects).map(|(s, o)| Role::new(s, o));
        Self::new(calibration, params, roles.collect())
    }

    /// Maximum number of detections consumed per frame.
    #[inline]
    pub fn max_targets(&self) -> usize {
        self.roles.len()
    }

    #[inline]
    pub fn roles(&self) -> &[Role<O>] {
        &self.roles
    }

    #[inline]
    pub fn role(&self, slot: usize) -> Option<&Role<O>> {
        self.roles.get(slot)
    }

    #[inline]
    pub fn slot_state(&self, slot: usize) -> Option<SlotState> {
        self.states.get(slot).copied()
    }

    #[inline]
    pub fn calibration(&self) -> &CalibrationModel {
        &self.calibration
    }

    #[inline]
    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Apply one frame of detections to every slot.
    ///
    /// Detections beyond the number of roles are ignored.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(detections = detections.len()))
    )]
    pub fn update(&mut self, detections: &[DetectionRecord]) -> FrameUpdate {
        if detections.len() > self.roles.len() {
            log::warn!(
                "{} detections for {} roles, ignoring the rest",
                detections.len(),
                self.roles.len()
            );
        }

        let mut summary = StatusSummary::new();
        let mut slots = Vec::with_capacity(self.roles.len());

        for (slot, (role, state)) in self.roles.iter_mut().zip(&mut self.states).enumerate() {
            let current_z = role.object.position().z;
            let update = match detections.get(slot) {
                Some(record) => {
                    let placement = place_visible(
                        record,
                        &role.spec.scale_aspect,
                        current_z,
                        &self.calibration,
                    );
                    role.object.set_position(placement.position);
                    role.object.set_rotation(placement.rotation);
                    role.object.set_scale(placement.scale);
                    summary.push(placement.marker_id, placement.distance);
                    SlotUpdate::Visible(placement)
                }
                None => {
                    let position = park(&self.params.off_stage, current_z);
                    role.object.set_position(position);
                    SlotUpdate::Hidden { position }
                }
            };

            let next = update.state();
            if *state != next {
                log::debug!("slot {slot} ({}) -> {:?}", role.spec.name, next);
                *state = next;
            }
            slots.push(SlotReport {
                slot,
                role: role.spec.name.clone(),
                update,
            });
        }

        FrameUpdate {
            slots,
            status: summary.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::default_role_specs;
    use crate::scene::SceneNode;
    use crate::status::NO_MARKERS;
    use nalgebra::{Matrix3, Point2, Point3, Vector3};

    fn tracker() -> TargetTracker<SceneNode> {
        let nodes: Vec<SceneNode> = default_role_specs()
            .iter()
            .enumerate()
            .map(|(i, s)| SceneNode::new(s.name.clone(), 1.0 + i as f64))
            .collect();
        TargetTracker::with_objects(
            CalibrationModel::default(),
            TrackerParams::default(),
            default_role_specs(),
            nodes,
        )
        .expect("tracker")
    }

    fn record(id: i32) -> DetectionRecord {
        DetectionRecord {
            id,
            raw_distance: 1.0,
            centroid: Point2::new(320.0, 198.7),
            translation: Vector3::new(0.0, 0.0, 2.0),
            orientation: Matrix3::identity(),
        }
    }

    #[test]
    fn no_detections_hides_everything() {
        let mut t = tracker();
        let update = t.update(&[]);
        assert_eq!(update.status, NO_MARKERS);
        assert_eq!(update.visible_count(), 0);
        for (i, role) in t.roles().iter().enumerate() {
            assert_eq!(role.object.position, Point3::new(-10.0, -10.0, 1.0 + i as f64));
        }
    }

    #[test]
    fn extra_detections_are_ignored() {
        let mut t = tracker();
        let many: Vec<_> = (0..6).map(record).collect();
        let update = t.update(&many);
        assert_eq!(update.slots.len(), 4);
        assert_eq!(update.visible_count(), 4);
    }

    #[test]
    fn slot_state_follows_detections() {
        let mut t = tracker();
        t.update(&[record(1), record(2)]);
        assert_eq!(t.slot_state(1), Some(SlotState::Visible));
        assert_eq!(t.slot_state(2), Some(SlotState::Hidden));
        t.update(&[record(1)]);
        assert_eq!(t.slot_state(1), Some(SlotState::Hidden));
        assert_eq!(t.slot_state(4), None);
    }

    #[test]
    fn construction_rejects_bad_tables() {
        let err = TargetTracker::<SceneNode>::new(
            CalibrationModel::default(),
            TrackerParams::default(),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, TrackerError::EmptyRoleTable);

        let err = TargetTracker::with_objects(
            CalibrationModel::default(),
            TrackerParams::default(),
            vec![RoleSpec::new("flat", Vector3::new(1.0, 0.0, 1.0))],
            vec![SceneNode::new("flat", 0.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TrackerError::InvalidAspect {
                role: "flat".into()
            }
        );

        let err = TargetTracker::with_objects(
            CalibrationModel::default(),
            TrackerParams::default(),
            default_role_specs(),
            vec![SceneNode::new("only", 0.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TrackerError::RoleCountMismatch {
                roles: 4,
                objects: 1
            }
        );

        let err = TargetTracker::with_objects(
            CalibrationModel::default(),
            TrackerParams {
                off_stage: nalgebra::Vector2::new(f64::NAN, 0.0),
            },
            vec![RoleSpec::uniform("cube")],
            vec![SceneNode::new("cube", 0.0)],
        )
        .unwrap_err();
        assert_eq!(err, TrackerError::InvalidOffStage);
    }
}
