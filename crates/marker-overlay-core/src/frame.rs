use bytemuck::{Pod, Zeroable};

/// One RGBA8 pixel, laid out as the camera delivers it.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Largest pixel count a frame may hold (512 MiB of RGBA8).
pub const MAX_FRAME_PIXELS: usize = 1 << 27;

/// Frame dimensions that overflow or exceed [`MAX_FRAME_PIXELS`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("frame size {width}x{height} overflows or exceeds the frame pixel limit")]
pub struct FrameSizeError {
    pub width: usize,
    pub height: usize,
}

/// Pixel count of a `width` x `height` frame, if it is allowed.
pub fn checked_pixel_count(width: usize, height: usize) -> Result<usize, FrameSizeError> {
    width
        .checked_mul(height)
        .filter(|&n| n <= MAX_FRAME_PIXELS)
        .ok_or(FrameSizeError { width, height })
}

/// Tick-scoped RGBA8 pixel buffer.
///
/// A detector may annotate the buffer in place before it is presented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Rgba>, // row-major, len = w*h
}

impl RgbaFrame {
    /// Transparent black frame of the given size.
    ///
    /// # Panics
    ///
    /// When the size is rejected by [`checked_pixel_count`]; use
    /// [`RgbaFrame::try_new`] for untrusted sizes.
    pub fn new(width: usize, height: usize) -> Self {
        match Self::try_new(width, height) {
            Ok(frame) => frame,
            Err(err) => panic!("{err}"),
        }
    }

    /// Transparent black frame, or an error for an oversized request.
    pub fn try_new(width: usize, height: usize) -> Result<Self, FrameSizeError> {
        let pixels = checked_pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![Rgba::default(); pixels],
        })
    }

    /// Wrap an interleaved RGBA8 byte buffer. Returns `None` when the length
    /// does not match `width * height * 4`.
    pub fn from_raw(width: usize, height: usize, bytes: Vec<u8>) -> Option<Self> {
        let expected = checked_pixel_count(width, height).ok()? * 4;
        if bytes.len() != expected {
            return None;
        }
        let data = bytemuck::pod_collect_to_vec::<u8, Rgba>(&bytes);
        Some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Interleaved RGBA8 view of the pixels.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> Option<&mut Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get_mut(y * self.width + x)
    }

    /// Resize in place, discarding previous contents when the size changes.
    /// A rejected size leaves the frame untouched.
    pub fn reshape(&mut self, width: usize, height: usize) -> Result<(), FrameSizeError> {
        if self.width != width || self.height != height {
            let pixels = checked_pixel_count(width, height)?;
            self.width = width;
            self.height = height;
            self.data.clear();
            self.data.resize(pixels, Rgba::default());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_bytes_must_match_dimensions() {
        assert!(RgbaFrame::from_raw(2, 2, vec![0; 15]).is_none());
        let frame = RgbaFrame::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).expect("frame");
        assert_eq!(frame.pixel(1, 0), Some(Rgba::new(5, 6, 7, 8)));
        assert_eq!(frame.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn out_of_bounds_pixels_are_none() {
        let mut frame = RgbaFrame::new(3, 2);
        assert!(frame.pixel(3, 0).is_none());
        assert!(frame.pixel_mut(0, 2).is_none());
        *frame.pixel_mut(2, 1).expect("in bounds") = Rgba::new(0, 255, 0, 255);
        assert_eq!(frame.data[5], Rgba::new(0, 255, 0, 255));
    }

    #[test]
    fn reshape_keeps_length_consistent() {
        let mut frame = RgbaFrame::new(4, 4);
        frame.reshape(2, 3).expect("small size");
        assert_eq!(frame.data.len(), 6);
        assert!(!frame.is_empty());
    }

    #[test]
    fn oversized_dimensions_are_rejected_without_touching_the_frame() {
        let huge = 1usize << 32;
        let mut frame = RgbaFrame::new(2, 3);
        assert_eq!(
            frame.reshape(huge, huge),
            Err(FrameSizeError {
                width: huge,
                height: huge
            })
        );
        assert_eq!((frame.width, frame.height, frame.data.len()), (2, 3, 6));

        assert!(frame.reshape(100_000, 100_000).is_err());
        assert!(RgbaFrame::try_new(usize::MAX, 2).is_err());
        assert!(RgbaFrame::from_raw(huge, huge, Vec::new()).is_none());
        assert_eq!(checked_pixel_count(MAX_FRAME_PIXELS, 1), Ok(MAX_FRAME_PIXELS));
    }
}
