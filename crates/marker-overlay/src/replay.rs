//! Recorded detector output, replayed through the pipeline.
//!
//! A recording is a JSON document listing, per frame, the frame size and the
//! records the detector produced. Splitting it yields a [`ReplaySource`] that
//! emits blank frames of the recorded size and a [`ReplayDetector`] that
//! hands back the recorded records, one frame per call.

use marker_overlay_core::{
    checked_pixel_count, DetectionRecord, RawMarkerRecord, Rgba, RgbaFrame,
};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fs, path::Path};

use crate::driver::{FrameSource, MarkerDetector};
use crate::OverlayError;

const CENTROID_MARK: Rgba = Rgba::new(0, 255, 0, 255);
const MARK_HALF_SIZE: i64 = 3;

/// Detector output for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub detections: Vec<DetectionRecord>,
}

impl RecordedFrame {
    /// Decode the first `count` records of a native detector output buffer.
    pub fn from_raw(
        width: usize,
        height: usize,
        bytes: &[u8],
        count: usize,
    ) -> Result<Self, OverlayError> {
        checked_pixel_count(width, height)
            .map_err(|source| OverlayError::InvalidFrameSize { index: 0, source })?;
        Ok(Self {
            width,
            height,
            detections: RawMarkerRecord::read_records(bytes, count)?,
        })
    }
}

/// Ordered sequence of recorded frames.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    /// Load and validate a recording.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, OverlayError> {
        let raw = fs::read_to_string(path)?;
        let recording: Self = serde_json::from_str(&raw)?;
        recording.validate()?;
        Ok(recording)
    }

    /// Reject frames whose size cannot be allocated.
    pub fn validate(&self) -> Result<(), OverlayError> {
        for (index, frame) in self.frames.iter().enumerate() {
            checked_pixel_count(frame.width, frame.height)
                .map_err(|source| OverlayError::InvalidFrameSize { index, source })?;
        }
        Ok(())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), OverlayError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Frame source and detector that walk the recording in lockstep.
    pub fn split(self) -> Result<(ReplaySource, ReplayDetector), OverlayError> {
        self.validate()?;
        let mut sizes = VecDeque::with_capacity(self.frames.len());
        let mut detections = VecDeque::with_capacity(self.frames.len());
        for frame in self.frames {
            sizes.push_back((frame.width, frame.height));
            detections.push_back(frame.detections);
        }
        Ok((
            ReplaySource { sizes },
            ReplayDetector {
                frames: detections,
                annotate: false,
            },
        ))
    }
}

/// Emits one cleared frame per recorded frame.
#[derive(Clone, Debug)]
pub struct ReplaySource {
    sizes: VecDeque<(usize, usize)>,
}

impl ReplaySource {
    pub fn remaining(&self) -> usize {
        self.sizes.len()
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self, frame: &mut RgbaFrame) -> bool {
        let Some((width, height)) = self.sizes.pop_front() else {
            return false;
        };
        if let Err(err) = frame.reshape(width, height) {
            log::warn!("ending replay: {err}");
            return false;
        }
        frame.data.fill(Rgba::new(0, 0, 0, 255));
        true
    }
}

/// Replays recorded records, honouring the caller's maximum count.
#[derive(Clone, Debug)]
pub struct ReplayDetector {
    frames: VecDeque<Vec<DetectionRecord>>,
    annotate: bool,
}

impl ReplayDetector {
    /// Draw a small cross at each reported centroid.
    pub fn with_annotation(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl MarkerDetector for ReplayDetector {
    fn detect(&mut self, frame: &mut RgbaFrame, out: &mut [DetectionRecord]) -> usize {
        let Some(recorded) = self.frames.pop_front() else {
            return 0;
        };
        if recorded.len() > out.len() {
            log::debug!(
                "recording holds {} markers, reporting the first {}",
                recorded.len(),
                out.len()
            );
        }
        let count = recorded.len().min(out.len());
        out[..count].copy_from_slice(&recorded[..count]);
        if self.annotate {
            for record in &out[..count] {
                mark_centroid(frame, record.centroid.x, record.centroid.y);
            }
        }
        count
    }
}

fn mark_centroid(frame: &mut RgbaFrame, x: f32, y: f32) {
    if !x.is_finite() || !y.is_finite() {
        return;
    }
    let (cx, cy) = (x.round() as i64, y.round() as i64);
    for d in -MARK_HALF_SIZE..=MARK_HALF_SIZE {
        for (px, py) in [(cx + d, cy), (cx, cy + d)] {
            if px < 0 || py < 0 {
                continue;
            }
            if let Some(p) = frame.pixel_mut(px as usize, py as usize) {
                *p = CENTROID_MARK;
            }
        }
    }
}
