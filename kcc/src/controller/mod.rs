/*!
Kinematic character controller.

`CharacterController` moves a capsule-shaped agent through a shared physics
world by direct position assignment. It owns two pre-built capsules (stand and
crouch, only one registered with the world at a time), the agent's movement
transform and a vertical state machine.

One `update` performs, in order:
1. heading integration from the angular intent
2. foot/head contact refresh
3. the active state's vertical physics
4. slope-aware horizontal integration
5. penetration resolution
6. commit of the transform and collider pose
7. the deferred crouch-to-stand attempt

The controller never owns the world: every call that needs it borrows it. It
is not thread-safe and is meant to be updated once per tick, right around the
world's own step.
*/

use std::fmt;

use log::{debug, trace, warn};

use crate::{
    KccError,
    capsule::{CapsuleProfile, Stance, size_capsule},
    constants::{
        DEFAULT_GRAVITY, DEFAULT_JUMP_HEIGHT, GROUND_TOLERANCE, HEAD_PROBE_FACTOR,
        JUMP_LIMITER_MARGIN,
    },
    contact::{ContactSample, closest, sense},
    motion::{FallArc, JumpArc, MotionState, VerticalMotion},
    penetration::{PenetrationResponse, correction, reflection_impulses},
    settings::ControllerSettings,
    slope::{SlopeLimit, adjust_for_slope},
    types::{Quat, Transform, Vec3, up},
    world::PhysicsWorld,
};

#[cfg(test)]
mod tests;

type LandedCallback = Box<dyn FnMut(f32)>;
type StoodUpCallback = Box<dyn FnMut()>;

pub struct CharacterController<H> {
    /// Committed movement transform (feet position + orientation).
    transform: Transform,
    /// Working kinematic position; equals `transform.translation` outside `update`.
    position: Vec3,

    profiles: [CapsuleProfile<H>; 2],
    stance: Stance,
    crouch_wanted: bool,

    motion: VerticalMotion,
    linear_intent: Vec3,
    angular_intent: f32,

    foot: Option<ContactSample<H>>,
    head: Option<ContactSample<H>>,

    gravity: f32,
    slope: Option<SlopeLimit>,
    jump_limiter: bool,
    future_space_distance: Option<f32>,
    penetration: PenetrationResponse,

    on_landed: Option<LandedCallback>,
    on_stood_up: Option<StoodUpCallback>,
}

impl<H: Copy + Eq + fmt::Debug> CharacterController<H> {
    /// Build a controller standing with its feet at `feet`.
    ///
    /// Both capsules are created in `world`; only the standing one is attached.
    pub fn new<W>(world: &mut W, settings: ControllerSettings, feet: Vec3) -> Result<Self, KccError>
    where
        W: PhysicsWorld<Handle = H>,
    {
        settings.validate()?;

        let profile = |world: &mut W, height: f32| {
            let size = size_capsule(height, settings.step_height, settings.radius);
            let center = feet + up() * (size.capsule_height * 0.5 + size.levitation);
            let collider = world.create_capsule(size.capsule_height * 0.5, size.radius, center);
            CapsuleProfile::new(height, size, collider)
        };
        let stand = profile(world, settings.walk_height);
        let crouch = profile(world, settings.crouch_height);
        world.attach(stand.collider);

        let gravity = settings.gravity.unwrap_or_else(|| {
            let g = world.gravity().y;
            if g.is_finite() {
                g
            } else {
                warn!("world gravity {g} is not finite, using {DEFAULT_GRAVITY}");
                DEFAULT_GRAVITY
            }
        });

        debug!(
            "controller created: stand={:?} crouch={:?} gravity={gravity}",
            stand.collider, crouch.collider
        );

        Ok(Self {
            transform: Transform::new(feet, Quat::identity()),
            position: feet,
            profiles: [stand, crouch],
            stance: Stance::Stand,
            crouch_wanted: false,
            motion: VerticalMotion::Ground,
            linear_intent: Vec3::zeros(),
            angular_intent: 0.0,
            foot: None,
            head: None,
            gravity,
            slope: SlopeLimit::from_degrees(settings.max_slope_deg, settings.slope_affects_speed),
            jump_limiter: settings.jump_limiter,
            future_space_distance: settings.future_space_distance,
            penetration: settings.penetration_response,
            on_landed: None,
            on_stood_up: None,
        })
    }

    // ---------------------------------------------------------------------
    // Intents and requests
    // ---------------------------------------------------------------------

    /// Local-space velocity (meters/second) applied on the next updates.
    ///
    /// The vertical component is only honored while flying.
    pub fn set_linear_movement(&mut self, velocity: Vec3) {
        self.linear_intent = velocity;
    }

    /// Turn rate about +Y in radians/second applied on the next updates.
    pub fn set_angular_movement(&mut self, omega: f32) {
        self.angular_intent = omega;
    }

    /// Start a jump reaching `max_height` above the current feet height.
    ///
    /// Returns `false` (and changes nothing) if the current state does not
    /// allow jumping or the requested apex cannot be reached.
    pub fn start_jump(&mut self, max_height: f32) -> bool {
        let state = self.movement_state();
        if !state.allows(MotionState::Jumping) {
            debug!("jump dropped: not allowed while {state:?}");
            return false;
        }

        let start = self.position.y;
        let mut apex = start + max_height;

        let half_body = self.profile().height * 0.5;
        if self.jump_limiter {
            if let Some(head) = self.head {
                if head.height() < apex + half_body {
                    apex = head.height() - half_body * JUMP_LIMITER_MARGIN;
                    trace!("jump apex limited by ceiling at {}", head.height());
                }
            }
        }

        let Some(arc) = JumpArc::plan(start, apex, self.gravity) else {
            debug!("jump dropped: apex {apex} unreachable from {start}");
            return false;
        };

        debug!("jump: {start} -> {}", arc.apex);
        self.motion = VerticalMotion::Jumping(arc);
        true
    }

    /// `start_jump` with `DEFAULT_JUMP_HEIGHT`.
    pub fn start_default_jump(&mut self) -> bool {
        self.start_jump(DEFAULT_JUMP_HEIGHT)
    }

    /// Swap to the crouch capsule. Returns `false` if already crouching.
    pub fn start_crouch<W>(&mut self, world: &mut W) -> bool
    where
        W: PhysicsWorld<Handle = H>,
    {
        // Re-arm the request so a pending stand-up is cancelled.
        self.crouch_wanted = true;
        if self.stance == Stance::Crouch {
            return false;
        }

        self.swap_stance(world, Stance::Crouch);
        true
    }

    /// Ask to stand up. Standing happens in a later `update` once there is headroom.
    pub fn stop_crouch(&mut self) {
        self.crouch_wanted = false;
    }

    pub fn start_fly(&mut self) {
        if self.motion != VerticalMotion::Flying {
            debug!("fly: start from {:?}", self.movement_state());
            self.motion = VerticalMotion::Flying;
        }
    }

    /// Stop flying and start falling. Returns `false` if not flying.
    pub fn stop_fly(&mut self) -> bool {
        if self.motion != VerticalMotion::Flying {
            return false;
        }
        self.enter_falling();
        true
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    /// `degrees == 0.0` disables slope limiting.
    pub fn set_max_slope(&mut self, degrees: f32, affects_speed: bool) {
        self.slope = SlopeLimit::from_degrees(degrees, affects_speed);
    }

    pub fn set_active_jump_limiter(&mut self, enabled: bool) {
        self.jump_limiter = enabled;
    }

    /// Signed vertical gravity (negative is down).
    pub fn set_gravity(&mut self, gravity: f32) {
        if gravity.is_finite() {
            self.gravity = gravity;
        } else {
            warn!("ignoring non-finite gravity {gravity}");
        }
    }

    /// Look-ahead distance for forward-space prediction; `None` disables it.
    ///
    /// The prediction is experimental: it only blocks motion into gaps that
    /// are too low and never slides along them.
    pub fn set_future_space_prediction(&mut self, distance: Option<f32>) {
        self.future_space_distance = distance.filter(|d| d.is_finite() && *d > 0.0);
    }

    pub fn set_penetration_response(&mut self, response: PenetrationResponse) {
        self.penetration = response;
    }

    /// Called on landing with the height at which the fall began.
    pub fn set_fall_callback(&mut self, callback: impl FnMut(f32) + 'static) {
        self.on_landed = Some(Box::new(callback));
    }

    /// Called once each time a deferred stand-up completes.
    pub fn set_stand_up_callback(&mut self, callback: impl FnMut() + 'static) {
        self.on_stood_up = Some(Box::new(callback));
    }

    // ---------------------------------------------------------------------
    // Transform
    // ---------------------------------------------------------------------

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    pub fn heading(&self) -> f32 {
        self.transform.heading()
    }

    /// Teleport the feet to `position`. The collider follows on the next `update`.
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.translation = position;
        self.position = position;
    }

    pub fn set_x(&mut self, x: f32) {
        self.set_position(Vec3::new(x, self.position.y, self.position.z));
    }

    pub fn set_y(&mut self, y: f32) {
        self.set_position(Vec3::new(self.position.x, y, self.position.z));
    }

    pub fn set_z(&mut self, z: f32) {
        self.set_position(Vec3::new(self.position.x, self.position.y, z));
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }

    pub fn set_heading(&mut self, heading: f32) {
        self.transform = self.transform.with_heading(heading);
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn movement_state(&self) -> MotionState {
        self.motion.state()
    }

    pub fn vertical_motion(&self) -> VerticalMotion {
        self.motion
    }

    /// Target apex of the active jump.
    pub fn jump_apex(&self) -> Option<f32> {
        match self.motion {
            VerticalMotion::Jumping(arc) => Some(arc.apex),
            _ => None,
        }
    }

    pub fn is_crouching(&self) -> bool {
        self.stance == Stance::Crouch
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    /// The active capsule profile.
    pub fn profile(&self) -> &CapsuleProfile<H> {
        &self.profiles[self.stance.index()]
    }

    pub fn stand_profile(&self) -> &CapsuleProfile<H> {
        &self.profiles[Stance::Stand.index()]
    }

    pub fn crouch_profile(&self) -> &CapsuleProfile<H> {
        &self.profiles[Stance::Crouch.index()]
    }

    /// The collider currently registered with the world.
    pub fn active_collider(&self) -> H {
        self.profile().collider
    }

    pub fn foot_contact(&self) -> Option<&ContactSample<H>> {
        self.foot.as_ref()
    }

    pub fn head_contact(&self) -> Option<&ContactSample<H>> {
        self.head.as_ref()
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Height compared against ceiling contacts.
    pub fn capsule_top(&self) -> f32 {
        self.profile().top(self.position.y)
    }

    /// Whether the agent stands on its foot contact.
    ///
    /// While grounded this tolerates a small elevation above the contact;
    /// in every other state the feet must be at or below it.
    pub fn is_on_ground(&self) -> bool {
        let Some(foot) = self.foot else {
            return false;
        };

        match self.motion {
            VerticalMotion::Ground => {
                self.position.y - foot.height() <= self.profile().levitation + GROUND_TOLERANCE
            }
            _ => self.position.y <= foot.height(),
        }
    }

    // ---------------------------------------------------------------------
    // Tick
    // ---------------------------------------------------------------------

    /// Advance one tick of `dt` seconds.
    pub fn update<W>(&mut self, world: &mut W, dt: f32)
    where
        W: PhysicsWorld<Handle = H>,
    {
        let dt = if dt.is_finite() {
            dt.max(0.0)
        } else {
            warn!("non-finite dt {dt}, treating as 0");
            0.0
        };

        self.transform.turn(self.angular_intent * dt);

        self.refresh_contacts(world);
        self.process_state(dt);
        self.apply_linear_motion(world, dt);
        self.prevent_penetration(world);
        self.commit(world);

        if self.stance == Stance::Crouch && !self.crouch_wanted {
            self.try_stand_up(world);
        }
    }

    /// Detach whichever capsule is registered. The controller should be dropped afterwards.
    pub fn despawn<W>(&mut self, world: &mut W)
    where
        W: PhysicsWorld<Handle = H>,
    {
        for profile in &self.profiles {
            if world.is_attached(profile.collider) {
                world.detach(profile.collider);
            }
        }
    }

    fn refresh_contacts<W>(&mut self, world: &W)
    where
        W: PhysicsWorld<Handle = H>,
    {
        let profile = *self.profile();
        let center = profile.center(self.position);

        self.foot = sense(world, center, -up(), profile.foot_distance(), profile.collider);
        self.head = sense(
            world,
            center,
            up(),
            profile.capsule_height * HEAD_PROBE_FACTOR,
            profile.collider,
        );
    }

    fn process_state(&mut self, dt: f32) {
        match self.motion {
            VerticalMotion::Ground => match self.foot {
                Some(foot) if self.is_on_ground() => self.position.y = foot.height(),
                _ => self.enter_falling(),
            },

            VerticalMotion::Jumping(mut arc) => {
                if let Some(head) = self.head {
                    if self.capsule_top() >= head.height() {
                        trace!("jump hit ceiling at {}", head.height());
                        self.enter_falling();
                        return;
                    }
                }

                let (height, done) = arc.advance(dt, self.gravity);
                self.position.y = height;
                self.motion = VerticalMotion::Jumping(arc);
                if done {
                    self.enter_falling();
                }
            }

            VerticalMotion::Falling(mut arc) => {
                self.position.y = arc.advance(dt, self.gravity);
                self.motion = VerticalMotion::Falling(arc);
                if self.is_on_ground() {
                    self.land(arc.start_height);
                }
            }

            // Flying has no vertical physics; its floor/ceiling clamps act on motion.
            VerticalMotion::Flying => {}
        }
    }

    fn enter_falling(&mut self) {
        debug!("fall: from {:?} at {}", self.movement_state(), self.position.y);
        self.motion = VerticalMotion::Falling(FallArc::new(self.position.y));
    }

    fn land(&mut self, fall_start: f32) {
        self.motion = VerticalMotion::Ground;
        if let Some(foot) = self.foot {
            self.position.y = foot.height();
        }
        debug!("landed at {} after falling from {fall_start}", self.position.y);

        if let Some(callback) = self.on_landed.as_mut() {
            callback(fall_start);
        }
    }

    fn apply_linear_motion<W>(&mut self, world: &W, dt: f32)
    where
        W: PhysicsWorld<Handle = H>,
    {
        let mut motion = self.transform.rotation * self.linear_intent * dt;
        let flying = self.motion == VerticalMotion::Flying;

        if flying {
            self.clamp_flying_motion(&mut motion);
        } else {
            motion.y = 0.0;
        }

        if let Some(distance) = self.future_space_distance {
            if !self.has_future_space(world, motion, distance) {
                trace!("motion blocked by forward-space prediction");
                return;
            }
        }

        let displacement = match (self.foot, self.slope) {
            (Some(foot), Some(limit)) if !flying => {
                adjust_for_slope(motion, foot.normal, limit, self.gravity, dt)
            }
            _ => motion,
        };

        self.position += displacement;
    }

    /// Stop descending into the floor and rising into the ceiling.
    fn clamp_flying_motion(&self, motion: &mut Vec3) {
        if let Some(foot) = self.foot {
            if motion.y < 0.0 {
                // Never sink past the floor contact, however fast the descent.
                motion.y = motion.y.max((foot.height() - self.position.y).min(0.0));
            }
        }
        if let Some(head) = self.head {
            if motion.y > 0.0 && self.capsule_top() >= head.height() {
                motion.y = 0.0;
            }
        }
    }

    /// Probe the space `motion * distance` ahead for a gap too low to fit in.
    ///
    /// A gap exactly as tall as the body passes. Missing probes, and ceilings
    /// that belong to dynamic bodies, never block.
    fn has_future_space<W>(&self, world: &W, motion: Vec3, distance: f32) -> bool
    where
        W: PhysicsWorld<Handle = H>,
    {
        let profile = self.profile();
        let from = profile.center(self.position) + motion * distance;
        let reach = profile.capsule_height * 2.0;

        let above = closest(world, from, up(), reach, profile.collider);
        let below = closest(
            world,
            from,
            -up(),
            reach + profile.levitation,
            profile.collider,
        );

        match (above, below) {
            (Some(above), Some(below)) => {
                if above.dynamic {
                    return true;
                }
                let space = (above.point.y - below.point.y).abs();
                space >= profile.levitation + profile.capsule_height + profile.radius
            }
            _ => true,
        }
    }

    fn prevent_penetration<W>(&mut self, world: &mut W)
    where
        W: PhysicsWorld<Handle = H>,
    {
        let own = self.active_collider();
        let manifolds = world.contact_manifolds(own);
        if manifolds.is_empty() {
            return;
        }

        if self.penetration.corrects() {
            let push = correction(&manifolds, own);
            if push != Vec3::zeros() {
                trace!("penetration correction {push:?}");
            }
            self.position += push;
        }

        if self.penetration.reflects() {
            let impulses = reflection_impulses(&manifolds, own, |h| world.dynamic_mass(h));
            for (body, impulse) in impulses {
                trace!("reflection impulse {impulse:?} on {body:?}");
                world.apply_impulse(body, impulse);
            }
        }
    }

    fn commit<W>(&mut self, world: &mut W)
    where
        W: PhysicsWorld<Handle = H>,
    {
        self.transform.translation = self.position;
        let profile = self.profile();
        world.set_capsule_center(profile.collider, profile.center(self.position));
    }

    /// Stand up if the standing capsule fits under the head contact.
    fn try_stand_up<W>(&mut self, world: &mut W) -> bool
    where
        W: PhysicsWorld<Handle = H>,
    {
        let crouch = *self.crouch_profile();
        let stand = *self.stand_profile();

        self.head = sense(
            world,
            crouch.center(self.position),
            up(),
            crouch.capsule_height * HEAD_PROBE_FACTOR,
            crouch.collider,
        );

        if let Some(head) = self.head {
            if self.position.y + stand.levitation + stand.capsule_height >= head.height() {
                trace!("stand-up deferred: ceiling at {}", head.height());
                return false;
            }
        }

        self.swap_stance(world, Stance::Stand);
        if let Some(callback) = self.on_stood_up.as_mut() {
            callback();
        }
        true
    }

    fn swap_stance<W>(&mut self, world: &mut W, next: Stance)
    where
        W: PhysicsWorld<Handle = H>,
    {
        let from = *self.profile();
        let to = self.profiles[next.index()];

        world.detach(from.collider);
        world.set_capsule_center(to.collider, to.center(self.position));
        world.attach(to.collider);

        self.stance = next;
        debug!("stance: {next:?}");
    }
}

impl<H: fmt::Debug> fmt::Debug for CharacterController<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterController")
            .field("transform", &self.transform)
            .field("stance", &self.stance)
            .field("crouch_wanted", &self.crouch_wanted)
            .field("motion", &self.motion)
            .field("foot", &self.foot)
            .field("head", &self.head)
            .field("gravity", &self.gravity)
            .finish_non_exhaustive()
    }
}
