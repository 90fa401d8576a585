//! Pose decoding: raw camera-space orientation and translation into a
//! normalized rotation, Euler angles and a facing direction.
//!
//! ## Euler convention
//!
//! Angles are in degrees and compose as `R = Ry(y) * Rx(x) * Rz(z)`: a vector
//! is rolled about Z first, then pitched about X, then yawed about Y. This is
//! the order most game engines use for `Euler(x, y, z)`. Extraction returns
//! `x` in `[-90, 90]` and `y`, `z` in `(-180, 180]`. At gimbal lock
//! (`|x| = 90`) the roll is folded into the yaw and `z` is reported as `0`.

use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Matrices with a smaller Frobenius norm carry no usable orientation.
const MIN_MATRIX_NORM: f64 = 1e-6;
/// `|r12|` above this is treated as gimbal lock.
const GIMBAL_LOCK: f64 = 1.0 - 1e-9;

/// Direction a marker-anchored object faces in its own frame.
#[inline]
pub fn facing() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, -1.0)
}

/// Euler angles in degrees, see the module docs for the axis order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EulerAngles {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Extract angles from a proper rotation.
    pub fn from_rotation(rotation: &Rotation3<f64>) -> Self {
        let r = rotation.matrix();
        let sin_x = (-r[(1, 2)]).clamp(-1.0, 1.0);
        let x = sin_x.asin();
        let (y, z) = if sin_x.abs() > GIMBAL_LOCK {
            ((-r[(2, 0)]).atan2(r[(0, 0)]), 0.0)
        } else {
            (r[(0, 2)].atan2(r[(2, 2)]), r[(1, 0)].atan2(r[(1, 1)]))
        };
        Self {
            x: x.to_degrees(),
            y: y.to_degrees(),
            z: z.to_degrees(),
        }
    }

    #[inline]
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Rebuild the rotation described by `angles`.
pub fn rotation_from_euler(angles: &EulerAngles) -> Rotation3<f64> {
    let yaw = Rotation3::from_axis_angle(&Vector3::y_axis(), angles.y.to_radians());
    let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), angles.x.to_radians());
    let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), angles.z.to_radians());
    yaw * pitch * roll
}

/// Project an arbitrary 3x3 matrix onto the nearest proper rotation.
///
/// Uses `U * V^T` from the SVD, flipping the weakest singular direction when
/// the result would be a reflection. Zero, non-finite or otherwise unusable
/// input yields the identity.
pub fn nearest_rotation(m: &Matrix3<f64>) -> Rotation3<f64> {
    if !m.iter().all(|v| v.is_finite()) || m.norm() < MIN_MATRIX_NORM {
        return Rotation3::identity();
    }

    let svd = m.svd(true, true);
    let (Some(mut u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Rotation3::identity();
    };

    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let weakest = svd.singular_values.imin();
        u.column_mut(weakest).neg_mut();
        r = u * v_t;
    }

    if !r.iter().all(|v| v.is_finite()) {
        return Rotation3::identity();
    }
    Rotation3::from_matrix_unchecked(r)
}

/// Decoded marker pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Camera-space translation; zeroed when the detector sent garbage.
    pub translation: Vector3<f64>,
    /// Orthonormalized orientation.
    pub rotation: Rotation3<f64>,
    pub euler: EulerAngles,
    /// `rotation * (0, 0, -1)`.
    pub forward: Vector3<f64>,
}

impl Pose {
    /// Homogeneous camera-from-marker transform with the normalized rotation.
    pub fn transform(&self) -> Matrix4<f64> {
        let mut t = self.rotation.to_homogeneous();
        t.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        t
    }
}

/// Decode a detector's translation and orientation matrix.
///
/// Never fails: degenerate input decodes to the identity rotation and a zero
/// translation, so the caller can run this on every frame of noisy data.
#[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
pub fn decode_pose(translation: &Vector3<f32>, orientation: &Matrix3<f32>) -> Pose {
    let mut transform = Matrix4::<f64>::identity();
    transform
        .fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&orientation.cast::<f64>());
    transform
        .fixed_view_mut::<3, 1>(0, 3)
        .copy_from(&translation.cast::<f64>());

    let rotation = nearest_rotation(&transform.fixed_view::<3, 3>(0, 0).into_owned());
    let raw_translation = transform.fixed_view::<3, 1>(0, 3).into_owned();
    let translation = if raw_translation.iter().all(|v| v.is_finite()) {
        raw_translation
    } else {
        Vector3::zeros()
    };

    let euler = EulerAngles::from_rotation(&rotation);
    let forward = rotation * facing();
    log::trace!(
        "decoded pose: euler=({:.2}, {:.2}, {:.2}) forward=({:.3}, {:.3}, {:.3})",
        euler.x,
        euler.y,
        euler.z,
        forward.x,
        forward.y,
        forward.z
    );

    Pose {
        translation,
        rotation,
        euler,
        forward,
    }
}
