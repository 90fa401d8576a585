//! Core types and numerics for marker-anchored overlays.
//!
//! This crate is intentionally small and purely numerical. It does *not*
//! depend on any concrete marker detector, camera or scene graph: it turns
//! raw detection records into decoded poses and calibrated presentation
//! quantities.

mod calibration;
mod frame;
mod logger;
mod pose;
mod record;

pub use calibration::{CalibrationConstants, CalibrationError, CalibrationModel};
pub use frame::{checked_pixel_count, FrameSizeError, Rgba, RgbaFrame, MAX_FRAME_PIXELS};
pub use pose::{decode_pose, facing, nearest_rotation, rotation_from_euler, EulerAngles, Pose};
pub use record::{DetectionRecord, RawMarkerRecord, RecordLayoutError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
