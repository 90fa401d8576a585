use marker_overlay_core::{FrameSizeError, Rgba, RgbaFrame};
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::driver::{DisplaySink, FrameSource};
use crate::OverlayError;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Copy a frame into an `image::RgbaImage`. Returns `None` when the frame
/// dimensions do not fit `u32`.
pub fn rgba_image(frame: &RgbaFrame) -> Option<::image::RgbaImage> {
    let width = u32::try_from(frame.width).ok()?;
    let height = u32::try_from(frame.height).ok()?;
    ::image::RgbaImage::from_raw(width, height, frame.as_bytes().to_vec())
}

/// Copy an `image::RgbaImage` into `frame`, resizing it as needed.
pub fn load_into_frame(
    img: &::image::RgbaImage,
    frame: &mut RgbaFrame,
) -> Result<(), FrameSizeError> {
    frame.reshape(img.width() as usize, img.height() as usize)?;
    for (dst, src) in frame.data.iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = Rgba::new(r, g, b, a);
    }
    Ok(())
}

/// Writes each presented frame as `frame_NNNNN.png` into a directory.
///
/// Write failures are logged and counted; the session keeps running.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    written: usize,
    failed: usize,
}

impl PngSequenceSink {
    /// Create the sink, creating `dir` if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, OverlayError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: 0,
            failed: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    #[inline]
    pub fn failed(&self) -> usize {
        self.failed
    }

    fn next_path(&self) -> PathBuf {
        self.dir
            .join(format!("frame_{:05}.png", self.written + self.failed))
    }

    fn save(&self, frame: &RgbaFrame, path: &Path) -> Result<(), OverlayError> {
        let Some(img) = rgba_image(frame) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("frame {}x{} cannot be encoded", frame.width, frame.height),
            )
            .into());
        };
        img.save(path)?;
        Ok(())
    }
}

impl DisplaySink for PngSequenceSink {
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn present(&mut self, frame: &RgbaFrame) {
        let path = self.next_path();
        match self.save(frame, &path) {
            Ok(()) => self.written += 1,
            Err(err) => {
                log::warn!("failed to write {}: {err}", path.display());
                self.failed += 1;
            }
        }
    }
}

/// Reads image files from a directory in file name order.
///
/// Files that fail to decode are skipped with a warning.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequenceSource {
    /// Collect the image files directly inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, OverlayError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if path.is_file() && is_image {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self, frame: &mut RgbaFrame) -> bool {
        while let Some(path) = self.paths.get(self.next) {
            self.next += 1;
            match ::image::open(path) {
                Ok(img) => match load_into_frame(&img.to_rgba8(), frame) {
                    Ok(()) => return true,
                    Err(err) => log::warn!("skipping {}: {err}", path.display()),
                },
                Err(err) => log::warn!("skipping {}: {err}", path.display()),
            }
        }
        false
    }
}
