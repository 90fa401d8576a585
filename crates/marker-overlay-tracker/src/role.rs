//! Role table: which virtual object each detection slot drives.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Static description of one role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,
    /// Per-axis multiplier applied to the uniform visual scale.
    pub scale_aspect: Vector3<f64>,
}

impl RoleSpec {
    pub fn new(name: impl Into<String>, scale_aspect: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            scale_aspect,
        }
    }

    /// Role scaled equally on all three axes.
    pub fn uniform(name: impl Into<String>) -> Self {
        Self::new(name, Vector3::repeat(1.0))
    }

    /// Role whose Y axis is drawn at half the height of the other two.
    pub fn half_height(name: impl Into<String>) -> Self {
        Self::new(name, Vector3::new(1.0, 0.5, 1.0))
    }

    pub(crate) fn aspect_is_valid(&self) -> bool {
        self.scale_aspect.iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

/// The four roles of the reference scene, in slot order.
pub fn default_role_specs() -> Vec<RoleSpec> {
    vec![
        RoleSpec::uniform("cube"),
        RoleSpec::uniform("sphere"),
        RoleSpec::half_height("cylinder"),
        RoleSpec::half_height("capsule"),
    ]
}

/// A role bound to its scene object for the whole session.
#[derive(Debug)]
pub struct Role<O> {
    pub spec: RoleSpec,
    pub object: O,
}

impl<O> Role<O> {
    pub fn new(spec: RoleSpec, object: O) -> Self {
        Self { spec, object }
    }
}
