//! Static scene geometry definitions and their rapier colliders.

use rapier3d::prelude::*;

use crate::types::{Iso, Quat, Vec3};

/// One immutable piece of level geometry.
///
/// Conventions
/// - Units are meters; `rotation` is a unit quaternion.
/// - Shapes are defined in the local frame of a fixed body posed at
///   `translation`/`rotation`, so Y-aligned shapes follow the pose.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable identifier; `RapierWorld::build` inserts in ascending id order.
    pub id: u32,
    pub translation: Vec3,
    pub rotation: Quat,
    pub shape: ColliderShapeDef,
    /// Trigger volume: reported by probes as a ghost and never collides.
    pub sensor: bool,
}

impl WorldStaticDef {
    pub fn new(id: u32, translation: Vec3, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: Quat::identity(),
            shape,
            sensor: false,
        }
    }

    /// Axis-aligned slab centered on `(x, z)` whose top face is at `top`.
    pub fn floor(id: u32, x: f32, z: f32, top: f32, half_x: f32, half_z: f32, thickness: f32) -> Self {
        let half_y = thickness * 0.5;
        Self::new(
            id,
            Vec3::new(x, top - half_y, z),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(half_x, half_y, half_z),
            },
        )
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    /// Pose of the fixed body carrying the collider.
    pub fn pose(&self) -> Iso {
        Iso::from_parts(self.translation.into(), self.rotation)
    }
}

/// Supported static shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColliderShapeDef {
    /// Infinite ground plane. Its normal is the pose's +Y, shifted along it by the offset.
    Plane { offset_along_normal: f32 },
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    CapsuleY { radius: f32, half_height: f32 },
    CylinderY { radius: f32, half_height: f32 },
    ConeY { radius: f32, half_height: f32 },
    RoundCuboid { half_extents: Vec3, border_radius: f32 },
    RoundCylinderY { radius: f32, half_height: f32, border_radius: f32 },
    RoundConeY { radius: f32, half_height: f32, border_radius: f32 },
}

impl ColliderShapeDef {
    fn shared_shape(&self) -> SharedShape {
        match *self {
            ColliderShapeDef::Plane { .. } => SharedShape::halfspace(Vector::y_axis()),
            ColliderShapeDef::Cuboid { half_extents: h } => SharedShape::cuboid(h.x, h.y, h.z),
            ColliderShapeDef::Sphere { radius } => SharedShape::ball(radius),
            ColliderShapeDef::CapsuleY {
                radius,
                half_height,
            } => SharedShape::capsule_y(half_height, radius),
            ColliderShapeDef::CylinderY {
                radius,
                half_height,
            } => SharedShape::cylinder(half_height, radius),
            ColliderShapeDef::ConeY {
                radius,
                half_height,
            } => SharedShape::cone(half_height, radius),
            ColliderShapeDef::RoundCuboid {
                half_extents: h,
                border_radius,
            } => SharedShape::round_cuboid(h.x, h.y, h.z, border_radius),
            ColliderShapeDef::RoundCylinderY {
                radius,
                half_height,
                border_radius,
            } => SharedShape::round_cylinder(half_height, radius, border_radius),
            ColliderShapeDef::RoundConeY {
                radius,
                half_height,
                border_radius,
            } => SharedShape::round_cone(half_height, radius, border_radius),
        }
    }

    /// Offset of the shape relative to its body, in the body frame.
    fn local_offset(&self) -> Vec3 {
        match *self {
            ColliderShapeDef::Plane {
                offset_along_normal,
            } => Vec3::y() * offset_along_normal,
            _ => Vec3::zeros(),
        }
    }
}

/// Build the rapier collider for `def`, relative to its fixed parent body.
pub fn collider_from_def(def: &WorldStaticDef) -> Collider {
    ColliderBuilder::new(def.shape.shared_shape())
        .translation(def.shape.local_offset())
        .sensor(def.sensor)
        .build()
}
