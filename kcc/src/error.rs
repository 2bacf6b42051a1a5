use thiserror::Error;

/// Errors raised while building a controller.
///
/// Per-frame operations never fail; requests that cannot apply are dropped and
/// reported through their boolean return value and the log.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KccError {
    #[error("`{name}` must be finite and positive, got {value}")]
    InvalidDimension { name: &'static str, value: f32 },

    #[error("crouch height {crouch} exceeds walk height {walk}")]
    CrouchTallerThanWalk { crouch: f32, walk: f32 },

    #[error("step height {step} leaves no body below crouch height {crouch}")]
    StepTooTall { step: f32, crouch: f32 },

    #[error("gravity override must be finite, got {0}")]
    InvalidGravity(f32),

    #[error("max slope must be within [0, 90) degrees, got {0}")]
    InvalidSlope(f32),
}
