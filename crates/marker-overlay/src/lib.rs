//! Marker-anchored AR overlay pipeline.
//!
//! This crate ties the workspace together:
//! - re-exports of the numerical core (`marker_overlay::core`) and the
//!   fixed-role tracker (`marker_overlay::tracker`),
//! - the per-frame [`FrameDriver`] and the detector, frame source, display
//!   and status boundaries it is generic over,
//! - JSON session configuration ([`OverlayConfig`]) and recorded detector
//!   output for offline replay ([`Recording`]),
//! - (feature `image`) PNG frame sinks and image-folder frame sources.
//!
//! ## Quickstart
//!
//! ```
//! use marker_overlay::{FrameDriver, NullDisplay, OverlayConfig};
//! use marker_overlay::core::{DetectionRecord, RgbaFrame};
//!
//! # fn main() -> Result<(), marker_overlay::OverlayError> {
//! let tracker = OverlayConfig::default().headless_tracker()?;
//!
//! // Any `FnMut(&mut RgbaFrame, &mut [DetectionRecord]) -> usize` is a detector.
//! let detector = |_: &mut RgbaFrame, out: &mut [DetectionRecord]| {
//!     out[0] = DetectionRecord::from_rows(
//!         7,
//!         2.5,
//!         [320.0, 198.7],
//!         [0.0, 0.0, 2.5],
//!         [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
//!     );
//!     1
//! };
//!
//! let mut driver = FrameDriver::new(detector, tracker, String::new(), NullDisplay);
//! let report = driver.tick(&mut RgbaFrame::new(640, 400));
//! assert_eq!(report.update.visible_count(), 1);
//! assert!(driver.status_sink().starts_with("Marker ID: 7\n"));
//! # Ok(())
//! # }
//! ```

pub use marker_overlay_core as core;
pub use marker_overlay_tracker as tracker;

pub use marker_overlay_core::{init_with_level, CalibrationModel, DetectionRecord, RgbaFrame};
pub use marker_overlay_tracker::{SceneNode, SceneObject, TargetTracker, NO_MARKERS};

#[cfg(feature = "tracing")]
pub use marker_overlay_core::init_tracing;

mod config;
mod driver;
mod error;
mod replay;

pub use config::OverlayConfig;
pub use driver::{
    DisplaySink, FrameDriver, FrameReport, FrameSource, MarkerDetector, NullDisplay, StatusSink,
};
pub use error::OverlayError;
pub use replay::{RecordedFrame, Recording, ReplayDetector, ReplaySource};

#[cfg(feature = "image")]
pub mod frames;
