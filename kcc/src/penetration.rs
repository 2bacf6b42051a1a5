//! Penetration resolution against other bodies' contact manifolds.

use crate::{
    constants::{PENETRATION_GAIN, REFLECTION_GAIN},
    types::{Vec3, horizontal},
    world::ContactManifold,
};

/// How the controller reacts when its capsule interpenetrates another body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PenetrationResponse {
    /// Move the controller out horizontally.
    #[default]
    Correct,
    /// Push penetrated dynamic bodies away instead of moving the controller.
    Reflect,
    /// Both of the above, computed independently from the same manifolds.
    CorrectAndReflect,
}

impl PenetrationResponse {
    #[inline]
    pub fn corrects(self) -> bool {
        matches!(
            self,
            PenetrationResponse::Correct | PenetrationResponse::CorrectAndReflect
        )
    }

    #[inline]
    pub fn reflects(self) -> bool {
        matches!(
            self,
            PenetrationResponse::Reflect | PenetrationResponse::CorrectAndReflect
        )
    }
}

/// Side factor that turns the manifold normal into "away from the other body" for `own`.
#[inline]
fn away_sign<H: Copy + Eq>(manifold: &ContactManifold<H>, own: H) -> f32 {
    // The normal points from `first` to `second`.
    if manifold.first == own { -1.0 } else { 1.0 }
}

/// Sum of negative separations as a positive depth.
#[inline]
fn depth(distances: &[f32]) -> f32 {
    distances.iter().filter(|d| **d < 0.0).map(|d| -d).sum()
}

/// Horizontal correction that pushes `own` out of everything it penetrates.
///
/// Each penetrating point contributes `normal * depth * PENETRATION_GAIN`,
/// oriented away from the other body. The vertical component is always
/// zero; vertical overlap is left to the state machine.
pub fn correction<H: Copy + Eq>(manifolds: &[ContactManifold<H>], own: H) -> Vec3 {
    let total = manifolds
        .iter()
        .filter(|m| m.involves(own) && m.first != m.second)
        .fold(Vec3::zeros(), |acc, m| {
            acc + m.normal * depth(&m.distances) * PENETRATION_GAIN * away_sign(m, own)
        });

    horizontal(total)
}

/// Mass-weighted impulses pushing penetrated dynamic bodies away from `own`.
///
/// `dynamic_mass` returns the body mass for dynamic bodies and `None` for
/// everything that must not be pushed.
pub fn reflection_impulses<H: Copy + Eq>(
    manifolds: &[ContactManifold<H>],
    own: H,
    dynamic_mass: impl Fn(H) -> Option<f32>,
) -> Vec<(H, Vec3)> {
    manifolds
        .iter()
        .filter(|m| m.involves(own) && m.first != m.second)
        .filter_map(|m| {
            let other = m.other(own);
            let mass = dynamic_mass(other)?;
            let depth = depth(&m.distances);
            if depth <= 0.0 || mass <= 0.0 {
                return None;
            }
            let toward_other = -m.normal * away_sign(m, own);
            Some((other, toward_other * depth * mass * REFLECTION_GAIN))
        })
        .collect()
}
