use marker_overlay_core::EulerAngles;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Handle to an object owned by the rendering substrate.
///
/// The tracker reads the current position (to keep its depth) and writes
/// position, Euler orientation in degrees and scale.
pub trait SceneObject {
    fn position(&self) -> Point3<f64>;
    fn set_position(&mut self, position: Point3<f64>);
    fn set_rotation(&mut self, rotation: EulerAngles);
    fn set_scale(&mut self, scale: Vector3<f64>);
}

impl<T: SceneObject + ?Sized> SceneObject for Box<T> {
    fn position(&self) -> Point3<f64> {
        (**self).position()
    }

    fn set_position(&mut self, position: Point3<f64>) {
        (**self).set_position(position)
    }

    fn set_rotation(&mut self, rotation: EulerAngles) {
        (**self).set_rotation(rotation)
    }

    fn set_scale(&mut self, scale: Vector3<f64>) {
        (**self).set_scale(scale)
    }
}

/// Plain in-memory transform, for headless sessions and tests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub position: Point3<f64>,
    pub rotation: EulerAngles,
    pub scale: Vector3<f64>,
}

impl SceneNode {
    /// Node at the origin of the screen plane, at depth `z`.
    pub fn new(name: impl Into<String>, z: f64) -> Self {
        Self {
            name: name.into(),
            position: Point3::new(0.0, 0.0, z),
            rotation: EulerAngles::default(),
            scale: Vector3::repeat(1.0),
        }
    }
}

impl SceneObject for SceneNode {
    fn position(&self) -> Point3<f64> {
        self.position
    }

    fn set_position(&mut self, position: Point3<f64>) {
        self.position = position;
    }

    fn set_rotation(&mut self, rotation: EulerAngles) {
        self.rotation = rotation;
    }

    fn set_scale(&mut self, scale: Vector3<f64>) {
        self.scale = scale;
    }
}
