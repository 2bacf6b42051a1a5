//! `PhysicsWorld` backed by a full rapier3d simulation.
//!
//! Level geometry is inserted from `WorldStaticDef`s as fixed bodies. Character
//! capsules are kinematic position-based bodies the controller moves directly;
//! they collide with every body type so the narrow phase reports manifolds
//! against fixed geometry too. Dynamic props can be added for the controller to
//! push around.
//!
//! Design goals
//! - Deterministic: statics are inserted in ascending `id` order.
//! - One owner: the host steps the world; controllers only borrow it.

// Re-export so hosts can build their own bodies without depending on `rapier3d` directly.
pub use rapier3d;

use log::{debug, warn};
use rapier3d::prelude::*;

use crate::{
    rapier::{WorldStaticDef, collider_from_def},
    types::Vec3,
    world::{ContactManifold, PhysicsWorld, RayHit},
};

/// Everything rapier needs to simulate and query one scene.
pub struct RapierWorld {
    pub gravity: Vector<f32>,
    pub integration_parameters: IntegrationParameters,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    pub islands: IslandManager,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pipeline: PhysicsPipeline,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self {
            gravity: Vector::new(0.0, -9.81, 0.0),
            integration_parameters: IntegrationParameters::default(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            islands: IslandManager::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pipeline: PhysicsPipeline::new(),
        }
    }
}

impl RapierWorld {
    /// Build a world from static definitions.
    ///
    /// The broad and narrow phases are primed with one step so ray casts work
    /// before the host steps the world.
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let mut world = Self::default();
        for def in &defs {
            world.insert_static(def);
        }
        world.prime();

        debug!("rapier world built with {} statics", defs.len());
        world
    }

    /// Replace the world gravity; controllers without their own override adopt it.
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Insert one fixed body plus its collider.
    pub fn insert_static(&mut self, def: &WorldStaticDef) -> ColliderHandle {
        let body = self
            .bodies
            .insert(RigidBodyBuilder::fixed().pose(def.pose()).build());
        self.colliders
            .insert_with_parent(collider_from_def(def), body, &mut self.bodies)
    }

    /// Insert a dynamic ball that controllers can push.
    pub fn insert_dynamic_ball(&mut self, center: Vec3, radius: f32, density: f32) -> ColliderHandle {
        let body = self
            .bodies
            .insert(RigidBodyBuilder::dynamic().translation(center).build());
        let collider = ColliderBuilder::ball(radius).density(density).build();
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies)
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            warn!("skipping world step with dt {dt}");
            return;
        }
        self.integration_parameters.dt = dt;
        self.run_pipeline();
    }

    /// Translation of the body carrying `collider`.
    pub fn body_translation(&self, collider: ColliderHandle) -> Option<Vec3> {
        let parent = self.colliders.get(collider)?.parent()?;
        self.bodies.get(parent).map(|b| *b.translation())
    }

    fn prime(&mut self) {
        // Only fixed bodies exist yet, so a regular step moves nothing.
        self.run_pipeline();
    }

    fn run_pipeline(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    fn body_of(&self, collider: ColliderHandle) -> Option<&RigidBody> {
        let parent = self.colliders.get(collider)?.parent()?;
        self.bodies.get(parent)
    }

    fn body_of_mut(&mut self, collider: ColliderHandle) -> Option<&mut RigidBody> {
        let parent = self.colliders.get(collider)?.parent()?;
        self.bodies.get_mut(parent)
    }

    fn set_capsule_enabled(&mut self, collider: ColliderHandle, enabled: bool) {
        if let Some(body) = self.body_of_mut(collider) {
            body.set_enabled(enabled);
        }
        match self.colliders.get_mut(collider) {
            Some(c) => c.set_enabled(enabled),
            None => warn!("unknown capsule collider {collider:?}"),
        }
    }
}

impl PhysicsWorld for RapierWorld {
    type Handle = ColliderHandle;

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn create_capsule(&mut self, half_height: f32, radius: f32, center: Vec3) -> ColliderHandle {
        let body = self.bodies.insert(
            RigidBodyBuilder::kinematic_position_based()
                .translation(center)
                .enabled(false)
                .build(),
        );
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .active_collision_types(ActiveCollisionTypes::all())
            .enabled(false)
            .build();
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies)
    }

    fn attach(&mut self, collider: ColliderHandle) {
        self.set_capsule_enabled(collider, true);
    }

    fn detach(&mut self, collider: ColliderHandle) {
        self.set_capsule_enabled(collider, false);
    }

    fn is_attached(&self, collider: ColliderHandle) -> bool {
        self.colliders.get(collider).is_some_and(|c| c.is_enabled())
    }

    fn set_capsule_center(&mut self, collider: ColliderHandle, center: Vec3) {
        let Some(body) = self.body_of_mut(collider) else {
            warn!("unknown capsule collider {collider:?}");
            return;
        };
        // Contacts are computed before kinematic targets apply; teleport so the
        // next update reads manifolds for this pose.
        let wake = body.is_enabled();
        body.set_translation(center, wake);
    }

    fn cast_ray(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_distance: f32,
        exclude: ColliderHandle,
    ) -> Vec<RayHit<ColliderHandle>> {
        // Detached capsules stay in the collider set; never report them.
        let enabled_only = |_: ColliderHandle, c: &Collider| c.is_enabled();
        let filter = QueryFilter::default()
            .exclude_collider(exclude)
            .predicate(&enabled_only);
        let query = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        );

        let ray = Ray::new(origin.into(), dir);
        query
            .intersect_ray(ray, max_distance, true)
            .map(|(handle, collider, hit)| RayHit {
                collider: handle,
                point: ray.point_at(hit.time_of_impact).coords,
                normal: hit.normal,
                distance: hit.time_of_impact,
                ghost: collider.is_sensor(),
                dynamic: collider
                    .parent()
                    .and_then(|p| self.bodies.get(p))
                    .is_some_and(|b| b.is_dynamic()),
            })
            .collect()
    }

    fn contact_manifolds(&self, collider: ColliderHandle) -> Vec<ContactManifold<ColliderHandle>> {
        self.narrow_phase
            .contact_pairs_with(collider)
            .flat_map(|pair| {
                pair.manifolds
                    .iter()
                    .filter(|m| !m.points.is_empty())
                    .map(|m| ContactManifold {
                        first: pair.collider1,
                        second: pair.collider2,
                        normal: m.data.normal,
                        distances: m.points.iter().map(|p| p.dist).collect(),
                    })
            })
            .collect()
    }

    fn dynamic_mass(&self, collider: ColliderHandle) -> Option<f32> {
        self.body_of(collider)
            .filter(|b| b.is_dynamic())
            .map(|b| b.mass())
    }

    fn apply_impulse(&mut self, collider: ColliderHandle, impulse: Vec3) {
        match self.body_of_mut(collider) {
            Some(body) if body.is_dynamic() => body.apply_impulse(impulse, true),
            _ => warn!("impulse on non-dynamic collider {collider:?} ignored"),
        }
    }
}
