//! Capsule sizing and the stand/crouch profile pair.

use crate::{
    constants::DEGENERATE_CAPSULE_HEIGHT,
    types::{Vec3, up},
};

/// Capsule dimensions derived from a body height, step height and radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleSize {
    /// Cylinder length between the two hemisphere centers.
    pub capsule_height: f32,
    /// Rest gap kept between the feet and the capsule center line.
    pub levitation: f32,
    /// Hemisphere radius (reduced for short bodies).
    pub radius: f32,
}

/// Size a capsule so its lower hemisphere floats `step_height` above the feet.
///
/// Bodies too short for a regular capsule collapse to a degenerate cylinder of
/// `DEGENERATE_CAPSULE_HEIGHT` with a reduced radius.
pub fn size_capsule(body_height: f32, step_height: f32, radius: f32) -> CapsuleSize {
    let room = body_height - step_height;
    if room <= radius * 2.0 {
        let radius = room * 0.5;
        CapsuleSize {
            capsule_height: DEGENERATE_CAPSULE_HEIGHT,
            levitation: step_height + radius,
            radius,
        }
    } else {
        let capsule_height = room - radius * 2.0;
        CapsuleSize {
            capsule_height,
            levitation: body_height - radius - capsule_height * 0.5,
            radius,
        }
    }
}

/// Which of the two capsule profiles is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stance {
    #[default]
    Stand,
    Crouch,
}

impl Stance {
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Stance::Stand => 0,
            Stance::Crouch => 1,
        }
    }
}

/// One immutable capsule profile plus the collider built for it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleProfile<H> {
    /// Full body height this profile was sized from.
    pub height: f32,
    pub capsule_height: f32,
    pub radius: f32,
    pub levitation: f32,
    pub collider: H,
}

impl<H> CapsuleProfile<H> {
    pub fn new(height: f32, size: CapsuleSize, collider: H) -> Self {
        Self {
            height,
            capsule_height: size.capsule_height,
            radius: size.radius,
            levitation: size.levitation,
            collider,
        }
    }

    /// Height of the collider center above the feet.
    #[inline]
    pub fn capsule_offset(&self) -> f32 {
        self.capsule_height * 0.5 + self.levitation
    }

    /// Length of the downward ground probe cast from the collider center.
    #[inline]
    pub fn foot_distance(&self) -> f32 {
        self.capsule_offset() + self.levitation
    }

    /// Collider center for an agent whose feet are at `feet`.
    #[inline]
    pub fn center(&self, feet: Vec3) -> Vec3 {
        feet + up() * self.capsule_offset()
    }

    /// Top reference height used against ceiling contacts.
    #[inline]
    pub fn top(&self, feet_y: f32) -> f32 {
        feet_y + self.levitation + self.capsule_height * 2.0
    }
}
