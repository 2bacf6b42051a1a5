/*!
Vertical motion: the controller's state machine and the exact kinematic arcs
used while jumping and falling.

Heights are computed in closed form from a fixed start height and the time
accumulated since the state was entered, never by integrating a velocity.
This keeps arcs identical regardless of frame rate.

Note the coefficient convention: the arcs use `g * t²` (not `½ g t²`) and the
launch speed is solved against that same convention, so an arc planned for
an apex reaches exactly that apex.
*/

use crate::utils::round_cmp;

/// Which vertical behavior is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MotionState {
    #[default]
    Ground,
    Jumping,
    Falling,
    Flying,
}

impl MotionState {
    /// Transition table consulted by state requests.
    ///
    /// Flying is entered and left through dedicated requests only, so it allows nothing here.
    pub fn allows(self, next: MotionState) -> bool {
        use MotionState::*;
        matches!(
            (self, next),
            (Ground, Ground | Jumping | Falling)
                | (Jumping, Ground | Falling)
                | (Falling, Ground | Jumping)
        )
    }
}

/// Scratch of an active jump.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpArc {
    pub start_height: f32,
    pub elapsed: f32,
    pub launch_speed: f32,
    /// Target apex, rounded to comparison precision.
    pub apex: f32,
}

impl JumpArc {
    /// Solve the launch speed that peaks at `apex`.
    ///
    /// Returns `None` when the equation has no real solution (the apex is
    /// below the start for a downward gravity, or inputs are not finite).
    pub fn plan(start_height: f32, apex: f32, gravity: f32) -> Option<Self> {
        let apex = round_cmp(apex);
        let discriminant = -4.0 * gravity * (apex - start_height);
        if !discriminant.is_finite() || discriminant < 0.0 {
            return None;
        }

        Some(Self {
            start_height,
            elapsed: 0.0,
            launch_speed: discriminant.sqrt(),
            apex,
        })
    }

    #[inline]
    pub fn height_at(&self, t: f32, gravity: f32) -> f32 {
        gravity * t * t + self.launch_speed * t + self.start_height
    }

    /// Rate of change of `height_at` at the current elapsed time.
    #[inline]
    pub fn vertical_speed(&self, gravity: f32) -> f32 {
        2.0 * gravity * self.elapsed + self.launch_speed
    }

    /// Advance by `dt`; returns the new height and whether the jump is over.
    ///
    /// The jump is over once the rounded height reaches the apex, or once the
    /// arc has turned downward (a large frame stepped past the peak).
    pub fn advance(&mut self, dt: f32, gravity: f32) -> (f32, bool) {
        self.elapsed += dt;
        let height = self.height_at(self.elapsed, gravity);
        let done = round_cmp(height) >= self.apex || self.vertical_speed(gravity) <= 0.0;
        (height, done)
    }
}

/// Scratch of an active fall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallArc {
    pub start_height: f32,
    pub elapsed: f32,
}

impl FallArc {
    pub fn new(start_height: f32) -> Self {
        Self {
            start_height,
            elapsed: 0.0,
        }
    }

    #[inline]
    pub fn height_at(&self, t: f32, gravity: f32) -> f32 {
        self.start_height + gravity * t * t
    }

    /// Advance by `dt` and return the new height.
    pub fn advance(&mut self, dt: f32, gravity: f32) -> f32 {
        self.elapsed += dt;
        self.height_at(self.elapsed, gravity)
    }
}

/// The active state together with its scratch record.
///
/// Entering a state replaces the previous record, so stale jump or fall data
/// can never be read from another state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum VerticalMotion {
    #[default]
    Ground,
    Jumping(JumpArc),
    Falling(FallArc),
    Flying,
}

impl VerticalMotion {
    pub fn state(&self) -> MotionState {
        match self {
            VerticalMotion::Ground => MotionState::Ground,
            VerticalMotion::Jumping(_) => MotionState::Jumping,
            VerticalMotion::Falling(_) => MotionState::Falling,
            VerticalMotion::Flying => MotionState::Flying,
        }
    }
}
