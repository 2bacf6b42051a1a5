use crate::{
    constants::{DIST_EPS, ROUNDING_DECIMALS},
    types::Vec3,
};

/// Round `value` to `decimals` decimal places (half away from zero).
#[inline]
pub fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}

/// Round to the precision used for height and slope comparisons.
#[inline]
pub fn round_cmp(value: f32) -> f32 {
    round_to(value, ROUNDING_DECIMALS)
}

/// Normalize `v`, or `None` when it is too short to have a direction.
#[inline]
pub fn try_normalize(v: Vec3) -> Option<Vec3> {
    v.try_normalize(DIST_EPS)
}

/// Unsigned angle between two directions in degrees, `None` if either is degenerate.
pub fn angle_deg(a: Vec3, b: Vec3) -> Option<f32> {
    let a = try_normalize(a)?;
    let b = try_normalize(b)?;
    Some(a.dot(&b).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Heading (radians about +Y) that faces the planar direction `(x, z)`.
///
/// Returns `None` if the planar vector is too small.
pub fn heading_from_xz(x: f32, z: f32) -> Option<f32> {
    if x * x + z * z <= DIST_EPS * DIST_EPS {
        return None;
    }
    Some(x.atan2(z))
}
