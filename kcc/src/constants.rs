/*!
Kinematic character controller (KCC) defaults and tolerances.

These constants centralize the parameters used by capsule sizing, contact
sensing, the vertical state machine, slope handling and penetration
resolution. Keeping them together makes tuning easier.

Notes
- Distances are in meters, time in seconds, angles in degrees unless noted.
- Per-agent values (heights, radius, slope limit) are only defaults here;
  override them through `ControllerSettings`.
*/

/// Default standing body height (meters).
pub const DEFAULT_WALK_HEIGHT: f32 = 1.75;

/// Default crouching body height (meters).
pub const DEFAULT_CROUCH_HEIGHT: f32 = 1.3;

/// Default step height: obstacles lower than this are walked over (meters).
pub const DEFAULT_STEP_HEIGHT: f32 = 0.3;

/// Default capsule radius (meters).
pub const DEFAULT_RADIUS: f32 = 0.4;

/// Default maximum walkable slope (degrees).
pub const DEFAULT_MAX_SLOPE_DEG: f32 = 50.0;

/// Default requested jump height when the caller has no preference (meters).
pub const DEFAULT_JUMP_HEIGHT: f32 = 3.0;

/// Gravity used when neither the settings nor the world provide one (m/s², negative is down).
pub const DEFAULT_GRAVITY: f32 = -9.81;

/// Capsule cylinder length used when the body is too short for a regular capsule (meters).
pub const DEGENERATE_CAPSULE_HEIGHT: f32 = 0.1;

/// Extra elevation above the foot contact still counted as grounded while in `Ground` (meters).
pub const GROUND_TOLERANCE: f32 = 0.02;

/// Head probe length as a multiple of the active capsule height.
pub const HEAD_PROBE_FACTOR: f32 = 20.0;

/// Margin factor applied to the body half-height when the jump limiter lowers an apex.
pub const JUMP_LIMITER_MARGIN: f32 = 1.2;

/// Scale of the continuous downhill pull on slopes, relative to gravity.
pub const SLOPE_GRAVITY_FACTOR: f32 = 0.1;

/// Below this intent/slope alignment the controller is pushed further downhill.
pub const SLOPE_PUSHBACK_ALIGNMENT: f32 = 0.5;

/// Multiplier applied to penetration depth when pushing the controller out.
pub const PENETRATION_GAIN: f32 = 2.0;

/// Multiplier applied to penetration depth × mass for the reflection impulse.
pub const REFLECTION_GAIN: f32 = 2.0;

/// Default look-ahead (in frames of motion) for forward-space prediction.
pub const DEFAULT_FUTURE_SPACE_DISTANCE: f32 = 10.0;

/// Decimal places used when comparing heights and slope dots.
pub const ROUNDING_DECIMALS: i32 = 2;

/// Practical small length for guarding normalizations (meters).
pub const DIST_EPS: f32 = 1.0e-6;
