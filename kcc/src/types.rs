/*!
Math aliases and the movement transform shared by every controller module.

Conventions
- Units are meters, seconds and radians.
- +Y is up. "Horizontal" always means the XZ plane.
- Heading is the rotation about +Y.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// World up axis.
#[inline]
pub fn up() -> Vec3 {
    Vec3::y()
}

/// Drop the vertical component of `v`.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// The agent's movement transform (feet position + orientation) in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Quat::identity())
    }
}

impl Transform {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Rotation about +Y in radians, in `(-PI, PI]`.
    pub fn heading(&self) -> f32 {
        // Read back through the rotated forward axis; a forward pointing straight up/down has no heading.
        let forward = self.rotation * Vec3::z();
        if forward.x.abs() <= f32::EPSILON && forward.z.abs() <= f32::EPSILON {
            return 0.0;
        }
        forward.x.atan2(forward.z)
    }

    /// Replace the rotation with a pure heading about +Y.
    pub fn with_heading(mut self, heading: f32) -> Self {
        self.rotation = Quat::from_axis_angle(&Vec3::y_axis(), heading);
        self
    }

    /// Rotate by `delta` radians about +Y, keeping any existing tilt.
    pub fn turn(&mut self, delta: f32) {
        self.rotation = Quat::from_axis_angle(&Vec3::y_axis(), delta) * self.rotation;
    }
}
