//! Fixed-role target tracker.
//!
//! Each frame the tracker receives the detector's records in output order and
//! walks its role table:
//! 1. slot `i` with a record at index `i` becomes `Visible` and its object is
//!    placed from the decoded, calibrated pose,
//! 2. slot `i` without a record becomes `Hidden` and its object is parked
//!    off-stage at its current depth,
//! 3. visible slots contribute one status entry each, in slot order.
//!
//! ```
//! use marker_overlay_core::CalibrationModel;
//! use marker_overlay_tracker::{default_role_specs, SceneNode, TargetTracker, TrackerParams};
//!
//! let specs = default_role_specs();
//! let nodes: Vec<SceneNode> = specs
//!     .iter()
//!     .map(|s| SceneNode::new(s.name.clone(), 0.0))
//!     .collect();
//! let mut tracker = TargetTracker::with_objects(
//!     CalibrationModel::default(),
//!     TrackerParams::default(),
//!     specs,
//!     nodes,
//! )
//! .expect("valid role table");
//!
//! let update = tracker.update(&[]);
//! assert_eq!(update.status, "No markers found");
//! ```

mod role;
mod scene;
mod slot;
mod status;
mod tracker;

pub use role::{default_role_specs, Role, RoleSpec};
pub use scene::{SceneNode, SceneObject};
pub use slot::{park, place_visible, SlotState, SlotUpdate, VisiblePlacement};
pub use status::{status_line, StatusSummary, NO_MARKERS};
pub use tracker::{FrameUpdate, SlotReport, TargetTracker, TrackerError, TrackerParams};
