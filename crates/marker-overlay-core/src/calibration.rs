//! Calibration model: raw detector units into presentation-space quantities.
//!
//! The constants are empirical fits for one camera at one resolution. A
//! different camera, lens or capture size needs a re-fit.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Fitted coefficients of the calibration model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConstants {
    /// Image-centre x in pixels.
    pub center_x: f64,
    /// Image-centre y in pixels.
    pub center_y: f64,
    /// Pixels per screen unit along x.
    pub pixels_per_unit_x: f64,
    /// Pixels per screen unit along y.
    pub pixels_per_unit_y: f64,
    /// Leading multiplier `k` of the double-exponential scale fit.
    pub scale_gain: f64,
    /// `a1`, `b1`: first exponential term.
    pub scale_a1: f64,
    pub scale_b1: f64,
    /// `a2`, `b2`: second exponential term.
    pub scale_a2: f64,
    pub scale_b2: f64,
    /// Slope `m` of the affine range fit.
    pub distance_slope: f64,
    /// Intercept `c` of the affine range fit.
    pub distance_offset: f64,
}

impl Default for CalibrationConstants {
    fn default() -> Self {
        Self {
            center_x: 320.0,
            center_y: 198.7,
            pixels_per_unit_x: 40.7,
            pixels_per_unit_y: 40.2,
            scale_gain: 0.8,
            scale_a1: 3.189,
            scale_b1: 0.03107,
            scale_a2: 7.557,
            scale_b2: 0.1924,
            distance_slope: 1.8622,
            distance_offset: 0.4143,
        }
    }
}

/// Calibration constants rejected at construction time.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CalibrationError {
    #[error("calibration constant `{name}` must be finite (got {value})")]
    NonFinite { name: &'static str, value: f64 },
    #[error("calibration divisor `{name}` must be non-zero")]
    ZeroDivisor { name: &'static str },
}

impl CalibrationConstants {
    fn named(&self) -> [(&'static str, f64); 11] {
        [
            ("center_x", self.center_x),
            ("center_y", self.center_y),
            ("pixels_per_unit_x", self.pixels_per_unit_x),
            ("pixels_per_unit_y", self.pixels_per_unit_y),
            ("scale_gain", self.scale_gain),
            ("scale_a1", self.scale_a1),
            ("scale_b1", self.scale_b1),
            ("scale_a2", self.scale_a2),
            ("scale_b2", self.scale_b2),
            ("distance_slope", self.distance_slope),
            ("distance_offset", self.distance_offset),
        ]
    }

    /// Check every constant is finite and the pixel divisors are usable.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if let Some((name, value)) = self.named().into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(CalibrationError::NonFinite { name, value });
        }
        if self.pixels_per_unit_x.abs() < f64::EPSILON {
            return Err(CalibrationError::ZeroDivisor {
                name: "pixels_per_unit_x",
            });
        }
        if self.pixels_per_unit_y.abs() < f64::EPSILON {
            return Err(CalibrationError::ZeroDivisor {
                name: "pixels_per_unit_y",
            });
        }
        Ok(())
    }
}

/// Validated, immutable calibration model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationModel {
    constants: CalibrationConstants,
}

impl CalibrationModel {
    /// Validate and wrap the constants. Misconfiguration fails here, never in
    /// the per-frame path.
    pub fn new(constants: CalibrationConstants) -> Result<Self, CalibrationError> {
        constants.validate()?;
        Ok(Self { constants })
    }

    #[inline]
    pub fn constants(&self) -> &CalibrationConstants {
        &self.constants
    }

    /// Image centroid in pixels to a screen offset from the image centre.
    #[inline]
    pub fn screen_offset(&self, centroid_x: f64, centroid_y: f64) -> Vector2<f64> {
        let c = &self.constants;
        Vector2::new(
            (centroid_x - c.center_x) / c.pixels_per_unit_x,
            (centroid_y - c.center_y) / c.pixels_per_unit_y,
        )
    }

    /// Uniform object scale for a marker at camera-space `depth`.
    ///
    /// Double-exponential fit compensating perspective foreshortening between
    /// the measured depth and the rendered object's apparent size.
    ///
    /// With the default constants the fit leaves the `f64` range above a
    /// depth of roughly 3685; the result saturates at `f64::MAX` there
    /// instead of becoming infinite.
    #[inline]
    pub fn visual_scale(&self, depth: f64) -> f64 {
        let c = &self.constants;
        let scale = c.scale_gain
            * (c.scale_a1 * (c.scale_b1 * depth).exp() + c.scale_a2 * (c.scale_b2 * depth).exp());
        scale.clamp(-f64::MAX, f64::MAX)
    }

    /// Raw detector range to a calibrated real-world distance.
    #[inline]
    pub fn calibrated_distance(&self, raw_distance: f64) -> f64 {
        let c = &self.constants;
        c.distance_slope * raw_distance + c.distance_offset
    }
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self {
            constants: CalibrationConstants::default(),
        }
    }
}
