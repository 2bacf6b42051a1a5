pub mod capsule;
pub mod constants;
pub mod contact;
pub mod controller;
pub mod error;
pub mod motion;
pub mod penetration;
pub mod rapier;
pub mod rapier_world;
pub mod roster;
pub mod settings;
pub mod slope;
pub mod types;
pub mod utils;
pub mod world;

#[cfg(test)]
mod testing;

pub use capsule::{CapsuleProfile, CapsuleSize, Stance, size_capsule};
pub use contact::ContactSample;
pub use controller::CharacterController;
pub use error::KccError;
pub use motion::{FallArc, JumpArc, MotionState, VerticalMotion};
pub use penetration::PenetrationResponse;
pub use rapier::{ColliderShapeDef, WorldStaticDef, collider_from_def};
pub use rapier_world::RapierWorld;
pub use roster::{AgentId, CharacterRoster};
pub use settings::ControllerSettings;
pub use slope::SlopeLimit;
pub use types::{Quat, Transform, Vec3};
pub use utils::heading_from_xz;
pub use world::{ContactManifold, PhysicsWorld, RayHit};
