//! Per-frame orchestration: detector call, tracker pass, presentation.

use marker_overlay_core::{DetectionRecord, RgbaFrame};
use marker_overlay_tracker::{FrameUpdate, SceneObject, TargetTracker, NO_MARKERS};
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Fiducial detector boundary.
///
/// `out.len()` is the maximum number of markers to report. The detector
/// fills `out[..n]`, returns `n`, and may draw into `frame` before
/// returning. Records past `n` are never read.
pub trait MarkerDetector {
    fn detect(&mut self, frame: &mut RgbaFrame, out: &mut [DetectionRecord]) -> usize;
}

impl<F> MarkerDetector for F
where
    F: FnMut(&mut RgbaFrame, &mut [DetectionRecord]) -> usize,
{
    fn detect(&mut self, frame: &mut RgbaFrame, out: &mut [DetectionRecord]) -> usize {
        self(frame, out)
    }
}

/// Source of camera frames. Returns `false` once the stream has ended.
pub trait FrameSource {
    fn next_frame(&mut self, frame: &mut RgbaFrame) -> bool;
}

/// Receives the (possibly annotated) frame once per tick.
pub trait DisplaySink {
    fn present(&mut self, frame: &RgbaFrame);
}

/// Receives the status text once per tick.
pub trait StatusSink {
    fn set_status(&mut self, text: &str);
}

impl StatusSink for String {
    fn set_status(&mut self, text: &str) {
        self.clear();
        self.push_str(text);
    }
}

/// Display sink that drops every frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn present(&mut self, _frame: &RgbaFrame) {}
}

/// Summary of one tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub tick: u64,
    /// Count returned by the detector, before clamping.
    pub reported: usize,
    /// Records actually handed to the tracker.
    pub detected: usize,
    #[serde(flatten)]
    pub update: FrameUpdate,
}

/// Runs the full pipeline once per rendering tick.
///
/// The driver owns the role bindings (through the tracker) and the record
/// storage handed to the detector. Frames are borrowed for one tick only.
pub struct FrameDriver<D, O, S, V> {
    detector: D,
    tracker: TargetTracker<O>,
    status: S,
    display: V,
    records: Vec<DetectionRecord>,
    ticks: u64,
}

impl<D, O, S, V> FrameDriver<D, O, S, V>
where
    D: MarkerDetector,
    O: SceneObject,
    S: StatusSink,
    V: DisplaySink,
{
    /// Wire the pipeline and publish the initial placeholder status.
    pub fn new(detector: D, tracker: TargetTracker<O>, mut status: S, display: V) -> Self {
        status.set_status(NO_MARKERS);
        let records = vec![DetectionRecord::default(); tracker.max_targets()];
        Self {
            detector,
            tracker,
            status,
            display,
            records,
            ticks: 0,
        }
    }

    /// Maximum marker count passed to the detector.
    #[inline]
    pub fn max_count(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn tracker(&self) -> &TargetTracker<O> {
        &self.tracker
    }

    #[inline]
    pub fn detector(&self) -> &D {
        &self.detector
    }

    #[inline]
    pub fn status_sink(&self) -> &S {
        &self.status
    }

    #[inline]
    pub fn display(&self) -> &V {
        &self.display
    }

    /// Process one frame: detect, track, publish status, present.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip_all,
            fields(tick = self.ticks, width = frame.width, height = frame.height)
        )
    )]
    pub fn tick(&mut self, frame: &mut RgbaFrame) -> FrameReport {
        self.records.fill(DetectionRecord::default());
        let reported = self.detector.detect(frame, &mut self.records);
        let detected = if reported > self.records.len() {
            log::warn!(
                "detector reported {reported} markers, max is {}; discarding the rest",
                self.records.len()
            );
            self.records.len()
        } else {
            reported
        };

        let update = self.tracker.update(&self.records[..detected]);
        self.status.set_status(&update.status);
        self.display.present(frame);

        let tick = self.ticks;
        self.ticks += 1;
        log::debug!(
            "tick {tick}: {detected} markers, {} visible",
            update.visible_count()
        );

        FrameReport {
            tick,
            reported,
            detected,
            update,
        }
    }

    /// Tick once per frame until `source` runs dry. Returns the number of
    /// frames processed.
    pub fn run<F, R>(&mut self, source: &mut F, frame: &mut RgbaFrame, mut on_report: R) -> u64
    where
        F: FrameSource,
        R: FnMut(&FrameReport),
    {
        let mut processed = 0;
        while source.next_frame(frame) {
            let report = self.tick(frame);
            on_report(&report);
            processed += 1;
        }
        processed
    }

    /// Tear the driver down, returning its collaborators.
    pub fn into_parts(self) -> (D, TargetTracker<O>, S, V) {
        (self.detector, self.tracker, self.status, self.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_overlay_core::CalibrationModel;
    use marker_overlay_tracker::{default_role_specs, SceneNode, TrackerParams};
    use nalgebra::{Matrix3, Point2, Vector3};

    fn tracker() -> TargetTracker<SceneNode> {
        let nodes: Vec<SceneNode> = default_role_specs()
            .iter()
            .map(|s| SceneNode::new(s.name.clone(), 0.0))
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
            raw_distance: 2.0,
            centroid: Point2::new(320.0, 198.7),
            translation: Vector3::new(0.0, 0.0, 2.0),
            orientation: Matrix3::identity(),
        }
    }

    #[derive(Default)]
    struct CountingDisplay {
        presented: usize,
    }

    impl DisplaySink for CountingDisplay {
        fn present(&mut self, _frame: &RgbaFrame) {
            self.presented += 1;
        }
    }

    #[test]
    fn placeholder_is_published_before_first_tick() {
        let detector = |_: &mut RgbaFrame, _: &mut [DetectionRecord]| 0;
        let driver = FrameDriver::new(detector, tracker(), String::from("stale"), NullDisplay);
        assert_eq!(driver.status_sink(), NO_MARKERS);
        assert_eq!(driver.max_count(), 4);
    }

    #[test]
    fn over_reporting_detector_is_clamped() {
        let detector = |_: &mut RgbaFrame, out: &mut [DetectionRecord]| {
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = record(i as i32);
            }
            out.len() + 3
        };
        let mut driver = FrameDriver::new(detector, tracker(), String::new(), NullDisplay);
        let report = driver.tick(&mut RgbaFrame::new(4, 4));
        assert_eq!(report.reported, 7);
        assert_eq!(report.detected, 4);
        assert_eq!(report.update.visible_count(), 4);
    }

    #[test]
    fn storage_is_cleared_between_ticks() {
        let mut calls = 0;
        let detector = move |_: &mut RgbaFrame, out: &mut [DetectionRecord]| {
            calls += 1;
            if calls == 1 {
                out[0] = record(5);
                1
            } else {
                // a detector that forgets to write still sees fresh storage
                assert_eq!(out[0], DetectionRecord::default());
                0
            }
        };
        let mut driver = FrameDriver::new(detector, tracker(), String::new(), NullDisplay);
        let mut frame = RgbaFrame::new(2, 2);
        driver.tick(&mut frame);
        let report = driver.tick(&mut frame);
        assert_eq!(report.detected, 0);
        assert_eq!(driver.status_sink(), NO_MARKERS);
    }

    #[test]
    fn every_tick_presents_the_frame() {
        struct Frames(usize);
        impl FrameSource for Frames {
            fn next_frame(&mut self, frame: &mut RgbaFrame) -> bool {
                if self.0 == 0 {
                    return false;
                }
                self.0 -= 1;
                frame.reshape(8, 6).expect("small frame");
                true
            }
        }

        let detector = |_: &mut RgbaFrame, out: &mut [DetectionRecord]| {
            out[0] = record(1);
            1
        };
        let mut driver =
            FrameDriver::new(detector, tracker(), String::new(), CountingDisplay::default());
        let mut ticks = Vec::new();
        let processed = driver.run(&mut Frames(3), &mut RgbaFrame::new(0, 0), |r| {
            ticks.push(r.tick)
        });
        assert_eq!(processed, 3);
        assert_eq!(ticks, [0, 1, 2]);
        assert_eq!(driver.display().presented, 3);
        assert_eq!(driver.ticks(), 3);
    }
}
