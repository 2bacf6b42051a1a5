//! Demo level: a ground slab, a raised ledge, a low tunnel and a trigger volume.

use kcc::{ColliderShapeDef, RapierWorld, Vec3, WorldStaticDef};

/// Top of the raised ledge the walker jumps onto.
pub const LEDGE_TOP: f32 = 0.8;

/// Underside of the tunnel roof; too low to walk under standing.
pub const TUNNEL_ROOF: f32 = 1.6;

/// The tunnel roof covers z in `[TUNNEL_END_Z, TUNNEL_START_Z]`.
pub const TUNNEL_START_Z: f32 = -4.0;
pub const TUNNEL_END_Z: f32 = -8.0;

pub fn statics() -> Vec<WorldStaticDef> {
    vec![
        WorldStaticDef::floor(1, 0.0, 0.0, 0.0, 30.0, 30.0, 1.0),
        WorldStaticDef::floor(2, 0.0, 8.0, LEDGE_TOP, 3.0, 2.0, LEDGE_TOP),
        // Tunnel roof slab spanning x in [-2, 2].
        WorldStaticDef::new(
            3,
            Vec3::new(0.0, TUNNEL_ROOF + 0.25, (TUNNEL_START_Z + TUNNEL_END_Z) * 0.5),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, 0.25, (TUNNEL_START_Z - TUNNEL_END_Z) * 0.5),
            },
        ),
        WorldStaticDef::new(
            4,
            Vec3::new(6.0, 1.0, 0.0),
            ColliderShapeDef::Sphere { radius: 1.0 },
        )
        .as_sensor(),
    ]
}

pub fn build() -> RapierWorld {
    let mut world = RapierWorld::build(statics());
    world.insert_dynamic_ball(Vec3::new(-4.0, 0.5, 0.0), 0.5, 1.0);
    world
}
