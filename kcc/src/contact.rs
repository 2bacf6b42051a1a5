//! Ray-based contact sensing for the foot and head probes.

use crate::{
    types::Vec3,
    world::{PhysicsWorld, RayHit},
};

/// The first solid surface found by a probe this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactSample<H> {
    pub point: Vec3,
    pub body: H,
    pub normal: Vec3,
    /// Distance from the probe origin.
    pub distance: f32,
}

impl<H> From<RayHit<H>> for ContactSample<H> {
    fn from(hit: RayHit<H>) -> Self {
        Self {
            point: hit.point,
            body: hit.collider,
            normal: hit.normal,
            distance: hit.distance,
        }
    }
}

impl<H> ContactSample<H> {
    /// Height of the contact point.
    #[inline]
    pub fn height(&self) -> f32 {
        self.point.y
    }
}

/// Cast a probe and return the nearest hit that is not a ghost.
///
/// Other agents' sensing volumes are skipped; only solid bodies count. No
/// qualifying hit yields `None`.
pub fn sense<W: PhysicsWorld>(
    world: &W,
    origin: Vec3,
    dir: Vec3,
    max_distance: f32,
    exclude: W::Handle,
) -> Option<ContactSample<W::Handle>> {
    if !(max_distance > 0.0) {
        return None;
    }

    let mut hits = world.cast_ray(origin, dir, max_distance, exclude);
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits.into_iter().find(|h| !h.ghost).map(ContactSample::from)
}

/// Nearest hit of any kind, ghosts included.
pub fn closest<W: PhysicsWorld>(
    world: &W,
    origin: Vec3,
    dir: Vec3,
    max_distance: f32,
    exclude: W::Handle,
) -> Option<RayHit<W::Handle>> {
    if !(max_distance > 0.0) {
        return None;
    }

    world
        .cast_ray(origin, dir, max_distance, exclude)
        .into_iter()
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
