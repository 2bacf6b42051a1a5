/*!
The physics-world seam the controller talks to.

The controller never owns the world. Every operation that needs it borrows it
for the duration of the call, so the host keeps full control over when the
world is stepped. `RapierWorld` is the production implementation.

Everything here is synchronous and single-threaded: the controller must be
driven from the same tick that advances the world.
*/

use std::fmt::Debug;

use crate::types::Vec3;

/// One ray hit reported by [`PhysicsWorld::cast_ray`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit<H> {
    /// Collider that was hit.
    pub collider: H,
    /// World-space hit point.
    pub point: Vec3,
    /// World-space surface normal at the hit point.
    pub normal: Vec3,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
    /// Sensing-only volume (e.g. another agent's trigger) that never blocks movement.
    pub ghost: bool,
    /// Whether the collider belongs to a simulated (dynamic) body.
    pub dynamic: bool,
}

/// Contact manifold between two colliders as of the world's last step.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactManifold<H> {
    pub first: H,
    pub second: H,
    /// World-space contact normal pointing from `first` toward `second`.
    pub normal: Vec3,
    /// Signed separation of every contact point; negative means interpenetration.
    pub distances: Vec<f32>,
}

impl<H: Copy + Eq> ContactManifold<H> {
    /// Whether `collider` is one of the two participants.
    #[inline]
    pub fn involves(&self, collider: H) -> bool {
        self.first == collider || self.second == collider
    }

    /// The participant that is not `collider`.
    #[inline]
    pub fn other(&self, collider: H) -> H {
        if self.first == collider {
            self.second
        } else {
            self.first
        }
    }
}

/// Query and registration interface of a shared rigid-body world.
pub trait PhysicsWorld {
    /// Opaque collider handle.
    type Handle: Copy + Eq + Debug;

    /// Global gravity acceleration.
    fn gravity(&self) -> Vec3;

    /// Create a kinematic Y-aligned capsule centered at `center`.
    ///
    /// The capsule starts detached; call [`PhysicsWorld::attach`] to register it.
    fn create_capsule(&mut self, half_height: f32, radius: f32, center: Vec3) -> Self::Handle;

    /// Register a previously created capsule with the world.
    fn attach(&mut self, collider: Self::Handle);

    /// Unregister a capsule while keeping it around for reuse.
    fn detach(&mut self, collider: Self::Handle);

    fn is_attached(&self, collider: Self::Handle) -> bool;

    /// Move a capsule so its center is at `center`.
    fn set_capsule_center(&mut self, collider: Self::Handle, center: Vec3);

    /// Every hit along `origin + dir * t` for `t` in `[0, max_distance]`, in any order.
    ///
    /// `dir` is unit length. `exclude` is never reported.
    fn cast_ray(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_distance: f32,
        exclude: Self::Handle,
    ) -> Vec<RayHit<Self::Handle>>;

    /// Manifolds with at least one contact point that involve `collider`.
    fn contact_manifolds(&self, collider: Self::Handle) -> Vec<ContactManifold<Self::Handle>>;

    /// Mass of the body owning `collider`, only if that body is dynamic.
    fn dynamic_mass(&self, collider: Self::Handle) -> Option<f32>;

    /// Apply an instantaneous impulse to the body owning `collider`.
    fn apply_impulse(&mut self, collider: Self::Handle, impulse: Vec3);
}
