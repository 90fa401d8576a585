use marker_overlay_core::{CalibrationError, FrameSizeError, RecordLayoutError};
use marker_overlay_tracker::TrackerError;

/// Errors surfaced while setting up or replaying an overlay session.
#[derive(thiserror::Error, Debug)]
pub enum OverlayError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid calibration: {0}")]
    Calibration(#[from] CalibrationError),
    #[error("invalid role table: {0}")]
    Tracker(#[from] TrackerError),
    #[error("invalid recording: frame {index}: {source}")]
    InvalidFrameSize {
        index: usize,
        source: FrameSizeError,
    },
    #[error("malformed record buffer: {0}")]
    RecordLayout(#[from] RecordLayoutError),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
