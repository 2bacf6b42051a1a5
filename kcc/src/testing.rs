//! Deterministic in-memory world for controller tests.
//!
//! Geometry is a list of infinite (or XZ-bounded) horizontal slabs. Rays hit a
//! slab where they cross its height; the reported normal is whatever the slab
//! was given, which lets tests fake slopes without real geometry. Contact
//! manifolds are scripted directly.

use crate::{
    types::Vec3,
    world::{ContactManifold, PhysicsWorld, RayHit},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MockHandle {
    Slab(usize),
    Capsule(usize),
}

#[derive(Clone, Copy, Debug)]
pub struct Slab {
    pub height: f32,
    pub normal: Vec3,
    /// `(min_x, max_x, min_z, max_z)`; `None` is unbounded.
    pub bounds: Option<(f32, f32, f32, f32)>,
    pub ghost: bool,
    pub mass: Option<f32>,
    pub enabled: bool,
}

impl Slab {
    pub fn floor(height: f32) -> Self {
        Self {
            height,
            normal: Vec3::y(),
            bounds: None,
            ghost: false,
            mass: None,
            enabled: true,
        }
    }

    pub fn ceiling(height: f32) -> Self {
        Self {
            normal: -Vec3::y(),
            ..Self::floor(height)
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal.normalize();
        self
    }

    pub fn within(mut self, min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        self.bounds = Some((min_x, max_x, min_z, max_z));
        self
    }

    pub fn ghost(mut self) -> Self {
        self.ghost = true;
        self
    }

    pub fn dynamic(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    fn covers(&self, x: f32, z: f32) -> bool {
        match self.bounds {
            None => true,
            Some((min_x, max_x, min_z, max_z)) => {
                x >= min_x && x <= max_x && z >= min_z && z <= max_z
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MockCapsule {
    pub half_height: f32,
    pub radius: f32,
    pub center: Vec3,
    pub attached: bool,
}

#[derive(Debug)]
pub struct MockWorld {
    pub gravity: Vec3,
    pub slabs: Vec<Slab>,
    pub capsules: Vec<MockCapsule>,
    pub manifolds: Vec<ContactManifold<MockHandle>>,
    pub impulses: Vec<(MockHandle, Vec3)>,
}

impl Default for MockWorld {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            slabs: Vec::new(),
            capsules: Vec::new(),
            manifolds: Vec::new(),
            impulses: Vec::new(),
        }
    }
}

impl MockWorld {
    /// World with an unbounded floor at `height`.
    pub fn with_floor(height: f32) -> Self {
        let mut world = Self::default();
        world.add(Slab::floor(height));
        world
    }

    pub fn add(&mut self, slab: Slab) -> MockHandle {
        self.slabs.push(slab);
        MockHandle::Slab(self.slabs.len() - 1)
    }

    pub fn slab_mut(&mut self, handle: MockHandle) -> &mut Slab {
        match handle {
            MockHandle::Slab(i) => &mut self.slabs[i],
            MockHandle::Capsule(_) => panic!("not a slab: {handle:?}"),
        }
    }

    pub fn capsule(&self, handle: MockHandle) -> &MockCapsule {
        match handle {
            MockHandle::Capsule(i) => &self.capsules[i],
            MockHandle::Slab(_) => panic!("not a capsule: {handle:?}"),
        }
    }

    pub fn attached_capsules(&self) -> usize {
        self.capsules.iter().filter(|c| c.attached).count()
    }

    fn capsule_mut(&mut self, handle: MockHandle) -> &mut MockCapsule {
        match handle {
            MockHandle::Capsule(i) => &mut self.capsules[i],
            MockHandle::Slab(_) => panic!("not a capsule: {handle:?}"),
        }
    }
}

impl PhysicsWorld for MockWorld {
    type Handle = MockHandle;

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn create_capsule(&mut self, half_height: f32, radius: f32, center: Vec3) -> MockHandle {
        self.capsules.push(MockCapsule {
            half_height,
            radius,
            center,
            attached: false,
        });
        MockHandle::Capsule(self.capsules.len() - 1)
    }

    fn attach(&mut self, collider: MockHandle) {
        self.capsule_mut(collider).attached = true;
    }

    fn detach(&mut self, collider: MockHandle) {
        self.capsule_mut(collider).attached = false;
    }

    fn is_attached(&self, collider: MockHandle) -> bool {
        self.capsule(collider).attached
    }

    fn set_capsule_center(&mut self, collider: MockHandle, center: Vec3) {
        self.capsule_mut(collider).center = center;
    }

    fn cast_ray(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_distance: f32,
        exclude: MockHandle,
    ) -> Vec<RayHit<MockHandle>> {
        if dir.y.abs() <= f32::EPSILON {
            return Vec::new();
        }

        self.slabs
            .iter()
            .enumerate()
            .filter(|(i, s)| s.enabled && MockHandle::Slab(*i) != exclude)
            .filter_map(|(i, s)| {
                let t = (s.height - origin.y) / dir.y;
                if !(0.0..=max_distance).contains(&t) {
                    return None;
                }
                let point = origin + dir * t;
                if !s.covers(point.x, point.z) {
                    return None;
                }
                Some(RayHit {
                    collider: MockHandle::Slab(i),
                    point: Vec3::new(point.x, s.height, point.z),
                    normal: s.normal,
                    distance: t,
                    ghost: s.ghost,
                    dynamic: s.mass.is_some(),
                })
            })
            .collect()
    }

    fn contact_manifolds(&self, collider: MockHandle) -> Vec<ContactManifold<MockHandle>> {
        self.manifolds
            .iter()
            .filter(|m| m.involves(collider) && !m.distances.is_empty())
            .cloned()
            .collect()
    }

    fn dynamic_mass(&self, collider: MockHandle) -> Option<f32> {
        match collider {
            MockHandle::Slab(i) => self.slabs.get(i).and_then(|s| s.mass),
            MockHandle::Capsule(_) => None,
        }
    }

    fn apply_impulse(&mut self, collider: MockHandle, impulse: Vec3) {
        self.impulses.push((collider, impulse));
    }
}
