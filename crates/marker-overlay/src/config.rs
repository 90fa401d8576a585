//! JSON session configuration.

use marker_overlay_core::{CalibrationConstants, CalibrationModel};
use marker_overlay_tracker::{
    default_role_specs, RoleSpec, SceneNode, SceneObject, TargetTracker, TrackerParams,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::OverlayError;

/// Everything needed to build a tracker for a session.
///
/// Every section is optional in the JSON form; missing sections take the
/// built-in defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default)]
    pub calibration: CalibrationConstants,
    #[serde(default)]
    pub tracker: TrackerParams,
    #[serde(default = "default_role_specs")]
    pub roles: Vec<RoleSpec>,
    /// Depth given to headless scene nodes when a session starts.
    #[serde(default)]
    pub initial_depth: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConstants::default(),
            tracker: TrackerParams::default(),
            roles: default_role_specs(),
            initial_depth: 0.0,
        }
    }
}

impl OverlayConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, OverlayError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), OverlayError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Validated calibration model.
    pub fn calibration_model(&self) -> Result<CalibrationModel, OverlayError> {
        Ok(CalibrationModel::new(self.calibration)?)
    }

    /// Bind the configured roles to `objects`, in order.
    pub fn build_tracker<O: SceneObject>(
        &self,
        objects: Vec<O>,
    ) -> Result<TargetTracker<O>, OverlayError> {
        let tracker = TargetTracker::with_objects(
            self.calibration_model()?,
            self.tracker,
            self.roles.clone(),
            objects,
        )?;
        Ok(tracker)
    }

    /// Tracker over in-memory scene nodes, one per role.
    pub fn headless_tracker(&self) -> Result<TargetTracker<SceneNode>, OverlayError> {
        let nodes: Vec<SceneNode> = self
            .roles
            .iter()
            .map(|r| SceneNode::new(r.name.clone(), self.initial_depth))
            .collect();
        self.build_tracker(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_takes_defaults() {
        let cfg: OverlayConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, OverlayConfig::default());
        assert_eq!(cfg.roles.len(), 4);
    }

    #[test]
    fn partial_calibration_keeps_other_defaults() {
        let cfg: OverlayConfig =
            serde_json::from_str(r#"{"calibration":{"center_x":640.0}}"#).expect("parse");
        assert_eq!(cfg.calibration.center_x, 640.0);
        assert_eq!(
            cfg.calibration.center_y,
            CalibrationConstants::default().center_y
        );
    }

    #[test]
    fn zero_divisor_is_rejected() {
        let mut cfg = OverlayConfig::default();
        cfg.calibration.pixels_per_unit_x = 0.0;
        assert!(matches!(
            cfg.headless_tracker(),
            Err(OverlayError::Calibration(_))
        ));
    }

    #[test]
    fn empty_role_table_is_rejected() {
        let cfg = OverlayConfig {
            roles: Vec::new(),
            ..OverlayConfig::default()
        };
        assert!(matches!(
            cfg.headless_tracker(),
            Err(OverlayError::Tracker(_))
        ));
    }

    #[test]
    fn headless_nodes_start_at_initial_depth() {
        let cfg = OverlayConfig {
            initial_depth: -4.0,
            ..OverlayConfig::default()
        };
        let tracker = cfg.headless_tracker().expect("tracker");
        for role in tracker.roles() {
            assert_eq!(role.object.position.z, -4.0);
            assert_eq!(role.object.name, role.spec.name);
        }
    }
}
