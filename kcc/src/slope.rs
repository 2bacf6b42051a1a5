//! Slope-aware adjustment of the per-frame motion vector.

use crate::{
    constants::{SLOPE_GRAVITY_FACTOR, SLOPE_PUSHBACK_ALIGNMENT},
    types::{Vec3, horizontal, up},
    utils::{angle_deg, round_cmp, try_normalize},
};

/// Walkable-slope threshold expressed as a minimum floor-normal dot with up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlopeLimit {
    /// Rounded `cos(max_slope)`; floors whose rounded dot is at or below it are steep.
    pub min_dot: f32,
    /// Whether walkable slopes still pull the agent downhill while it moves.
    pub affects_speed: bool,
}

impl SlopeLimit {
    /// `None` when `degrees` is zero (or not a usable angle), which disables slope limiting.
    pub fn from_degrees(degrees: f32, affects_speed: bool) -> Option<Self> {
        if !(degrees > 0.0) || !degrees.is_finite() {
            return None;
        }
        Some(Self {
            min_dot: round_cmp(degrees.to_radians().cos()),
            affects_speed,
        })
    }

    /// Boundary inclusive: a floor exactly at the limit is steep.
    #[inline]
    pub fn is_steep(&self, floor_normal: Vec3) -> bool {
        round_cmp(floor_normal.dot(&up())) <= self.min_dot
    }
}

/// Adjust this frame's world-space `motion` for the floor under the agent.
///
/// Returns the full displacement to apply: the (possibly deflected) motion
/// plus any downhill pull. `gravity` is the signed vertical gravity.
pub fn adjust_for_slope(
    motion: Vec3,
    floor_normal: Vec3,
    limit: SlopeLimit,
    gravity: f32,
    dt: f32,
) -> Vec3 {
    let downhill = horizontal(floor_normal);
    let pull = -downhill * gravity * dt * SLOPE_GRAVITY_FACTOR;
    let moving = motion != Vec3::zeros();

    if limit.is_steep(floor_normal) {
        let mut displacement = pull;
        let mut motion = motion;

        if moving {
            // Degenerate directions leave the motion untouched.
            if let (Some(dir), Some(angle)) = (try_normalize(downhill), angle_deg(motion, downhill))
            {
                let alignment = 1.0 - angle / 180.0;
                if alignment < SLOPE_PUSHBACK_ALIGNMENT {
                    displacement -= Vec3::new(dir.x * motion.x, 0.0, dir.z * motion.z) * alignment;
                }
                motion *= alignment;
            }
        }

        displacement + motion
    } else if limit.affects_speed && moving {
        pull + motion
    } else {
        motion
    }
}
