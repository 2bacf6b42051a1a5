/*!
Per-controller configuration.

`ControllerSettings` is the static body description a controller is built
from plus the tunables that can also be changed later through the controller's
setters. Defaults come from `constants`.
*/

use crate::{
    KccError,
    constants::{
        DEFAULT_CROUCH_HEIGHT, DEFAULT_MAX_SLOPE_DEG, DEFAULT_RADIUS, DEFAULT_STEP_HEIGHT,
        DEFAULT_WALK_HEIGHT,
    },
    penetration::PenetrationResponse,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerSettings {
    /// Standing body height (meters).
    pub walk_height: f32,
    /// Crouching body height (meters).
    pub crouch_height: f32,
    /// Obstacles lower than this are walked over (meters).
    pub step_height: f32,
    /// Capsule radius (meters). May be reduced for short bodies.
    pub radius: f32,
    /// Vertical gravity (m/s², negative is down). `None` uses the world's gravity.
    pub gravity: Option<f32>,
    /// Maximum walkable slope in degrees. `0.0` disables slope limiting.
    pub max_slope_deg: f32,
    /// Whether slopes within the limit still pull the agent downhill while moving.
    pub slope_affects_speed: bool,
    /// Lower the jump apex when a ceiling is in the way.
    pub jump_limiter: bool,
    /// Look-ahead distance for forward-space prediction; `None` disables it.
    pub future_space_distance: Option<f32>,
    /// How penetrations against other bodies are resolved.
    pub penetration_response: PenetrationResponse,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            walk_height: DEFAULT_WALK_HEIGHT,
            crouch_height: DEFAULT_CROUCH_HEIGHT,
            step_height: DEFAULT_STEP_HEIGHT,
            radius: DEFAULT_RADIUS,
            gravity: None,
            max_slope_deg: DEFAULT_MAX_SLOPE_DEG,
            slope_affects_speed: true,
            jump_limiter: true,
            future_space_distance: None,
            penetration_response: PenetrationResponse::default(),
        }
    }
}

impl ControllerSettings {
    /// Settings with a custom body and default tunables.
    pub fn with_body(walk_height: f32, crouch_height: f32, step_height: f32, radius: f32) -> Self {
        Self {
            walk_height,
            crouch_height,
            step_height,
            radius,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), KccError> {
        positive("walk_height", self.walk_height)?;
        positive("crouch_height", self.crouch_height)?;
        positive("radius", self.radius)?;
        if !self.step_height.is_finite() || self.step_height < 0.0 {
            return Err(KccError::InvalidDimension {
                name: "step_height",
                value: self.step_height,
            });
        }
        if self.crouch_height > self.walk_height {
            return Err(KccError::CrouchTallerThanWalk {
                crouch: self.crouch_height,
                walk: self.walk_height,
            });
        }
        if self.step_height >= self.crouch_height {
            return Err(KccError::StepTooTall {
                step: self.step_height,
                crouch: self.crouch_height,
            });
        }
        match self.gravity {
            Some(g) if !g.is_finite() => return Err(KccError::InvalidGravity(g)),
            _ => {}
        }
        if !(0.0..90.0).contains(&self.max_slope_deg) {
            return Err(KccError::InvalidSlope(self.max_slope_deg));
        }
        if let Some(d) = self.future_space_distance {
            positive("future_space_distance", d)?;
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), KccError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(KccError::InvalidDimension { name, value })
    }
}
