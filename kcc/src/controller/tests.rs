use std::{cell::Cell, f32::consts::FRAC_PI_2, rc::Rc};

use approx::assert_relative_eq;

use super::*;
use crate::testing::{MockHandle, MockWorld, Slab};
use crate::world::ContactManifold;

const DT: f32 = 0.1;

fn spawn_at(world: &mut MockWorld, feet: Vec3) -> CharacterController<MockHandle> {
    CharacterController::new(world, ControllerSettings::default(), feet).unwrap()
}

fn spawn(world: &mut MockWorld) -> CharacterController<MockHandle> {
    spawn_at(world, Vec3::zeros())
}

/// Run until `done` holds or `max_frames` elapse; returns the frame count.
fn run_until(
    kcc: &mut CharacterController<MockHandle>,
    world: &mut MockWorld,
    dt: f32,
    max_frames: usize,
    mut done: impl FnMut(&CharacterController<MockHandle>) -> bool,
) -> usize {
    for frame in 1..=max_frames {
        kcc.update(world, dt);
        if done(kcc) {
            return frame;
        }
    }
    panic!("condition not reached in {max_frames} frames: {kcc:?}");
}

#[test]
fn new_attaches_only_the_standing_capsule() {
    let mut world = MockWorld::with_floor(0.0);
    let kcc = spawn(&mut world);

    assert_eq!(world.attached_capsules(), 1);
    assert!(world.is_attached(kcc.stand_profile().collider));
    assert!(!world.is_attached(kcc.crouch_profile().collider));
    assert_eq!(kcc.movement_state(), MotionState::Ground);

    let center = world.capsule(kcc.active_collider()).center;
    assert_relative_eq!(center.y, kcc.profile().capsule_offset());
}

#[test]
fn new_rejects_invalid_settings() {
    let mut world = MockWorld::with_floor(0.0);
    let settings = ControllerSettings::with_body(1.0, 1.5, 0.3, 0.4);
    let result = CharacterController::new(&mut world, settings, Vec3::zeros());
    assert!(matches!(result, Err(KccError::CrouchTallerThanWalk { .. })));
    assert!(world.capsules.is_empty());
}

#[test]
fn gravity_comes_from_world_unless_overridden() {
    let mut world = MockWorld::with_floor(0.0);
    world.gravity = Vec3::new(0.0, -5.0, 0.0);
    assert_eq!(spawn(&mut world).gravity(), -5.0);

    let settings = ControllerSettings {
        gravity: Some(-20.0),
        ..Default::default()
    };
    let kcc = CharacterController::new(&mut world, settings, Vec3::zeros()).unwrap();
    assert_eq!(kcc.gravity(), -20.0);
}

#[test]
fn grounded_agent_snaps_to_foot_contact() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn_at(&mut world, Vec3::new(0.0, 0.3, 0.0));

    kcc.update(&mut world, DT);
    assert_eq!(kcc.movement_state(), MotionState::Ground);
    assert!(kcc.is_on_ground());
    assert_eq!(kcc.position().y, 0.0);

    kcc.set_linear_movement(Vec3::new(0.0, 0.0, 1.0));
    for _ in 0..5 {
        kcc.update(&mut world, DT);
        assert_eq!(kcc.position().y, kcc.foot_contact().unwrap().height());
    }
}

#[test]
fn walking_follows_heading_and_ignores_vertical_intent() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.set_heading(FRAC_PI_2);
    kcc.set_linear_movement(Vec3::new(0.0, 5.0, 2.0));

    for _ in 0..10 {
        kcc.update(&mut world, DT);
    }

    let p = kcc.position();
    assert_relative_eq!(p.x, 2.0, epsilon = 1.0e-4);
    assert_relative_eq!(p.z, 0.0, epsilon = 1.0e-4);
    assert_eq!(p.y, 0.0);
}

#[test]
fn angular_intent_turns_heading() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.set_angular_movement(1.0);

    kcc.update(&mut world, 0.25);
    kcc.update(&mut world, 0.25);
    assert_relative_eq!(kcc.heading(), 0.5, epsilon = 1.0e-5);
}

#[test]
fn fall_follows_parabola_and_lands() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn_at(&mut world, Vec3::new(0.0, 3.0, 0.0));

    let landed_from = Rc::new(Cell::new(None));
    let sink = landed_from.clone();
    kcc.set_fall_callback(move |h| sink.set(Some(h)));

    let dt = 0.05;
    kcc.update(&mut world, dt);
    assert_eq!(kcc.movement_state(), MotionState::Falling);
    assert_eq!(kcc.position().y, 3.0);

    let mut prev = 3.0;
    for advances in 1..100 {
        kcc.update(&mut world, dt);
        let y = kcc.position().y;
        if kcc.movement_state() == MotionState::Ground {
            break;
        }
        let t = advances as f32 * dt;
        assert_relative_eq!(y, 3.0 - 9.81 * t * t, epsilon = 1.0e-3);
        assert!(y < prev, "fall must be strictly decreasing");
        prev = y;
    }

    assert_eq!(kcc.movement_state(), MotionState::Ground);
    assert_eq!(kcc.position().y, 0.0);
    assert_eq!(landed_from.get(), Some(3.0));
}

#[test]
fn gravity_override_shapes_the_fall() {
    let mut world = MockWorld::with_floor(0.0);
    let settings = ControllerSettings {
        gravity: Some(-20.0),
        ..Default::default()
    };
    let mut kcc = CharacterController::new(&mut world, settings, Vec3::new(0.0, 3.0, 0.0)).unwrap();

    kcc.update(&mut world, DT);
    kcc.update(&mut world, DT);
    assert_relative_eq!(kcc.position().y, 3.0 - 20.0 * DT * DT, epsilon = 1.0e-5);
}

#[test]
fn walking_off_a_ledge_starts_a_fall() {
    let mut world = MockWorld::default();
    world.add(Slab::floor(0.0).within(-1.0, 1.0, -1.0, 1.0));
    world.add(Slab::floor(-5.0));
    let mut kcc = spawn(&mut world);
    kcc.set_heading(FRAC_PI_2);
    kcc.set_linear_movement(Vec3::new(0.0, 0.0, 1.0));

    run_until(&mut kcc, &mut world, DT, 30, |k| {
        k.movement_state() == MotionState::Falling
    });
    assert!(kcc.position().x > 1.0);

    run_until(&mut kcc, &mut world, DT, 100, |k| {
        k.movement_state() == MotionState::Ground
    });
    assert_eq!(kcc.position().y, -5.0);
}

#[test]
fn jump_reaches_apex_then_falls_back() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.update(&mut world, DT);

    let landed_from = Rc::new(Cell::new(None));
    let sink = landed_from.clone();
    kcc.set_fall_callback(move |h| sink.set(Some(h)));

    assert!(kcc.start_jump(1.0));
    assert_eq!(kcc.movement_state(), MotionState::Jumping);
    assert_eq!(kcc.jump_apex(), Some(1.0));

    let dt = 1.0 / 60.0;
    let mut peak = 0.0_f32;
    let mut fell = false;
    for _ in 0..600 {
        kcc.update(&mut world, dt);
        peak = peak.max(kcc.position().y);
        fell |= kcc.movement_state() == MotionState::Falling;
        if fell && kcc.movement_state() == MotionState::Ground {
            break;
        }
    }

    assert!(fell);
    assert_eq!(kcc.movement_state(), MotionState::Ground);
    assert_relative_eq!(peak, 1.0, epsilon = 0.02);
    assert_eq!(kcc.position().y, 0.0);
    assert_relative_eq!(landed_from.get().unwrap(), peak, epsilon = 1.0e-6);
}

#[test]
fn jump_limiter_lowers_apex_under_a_ceiling() {
    let mut world = MockWorld::with_floor(0.0);
    world.add(Slab::ceiling(3.0));
    let mut kcc = spawn(&mut world);
    kcc.update(&mut world, DT);
    assert_eq!(kcc.head_contact().map(|h| h.height()), Some(3.0));

    assert!(kcc.start_jump(3.0));
    let apex = kcc.jump_apex().unwrap();
    // Walk height 1.75 -> half height 0.875, times the 1.2 margin.
    assert_relative_eq!(apex, 3.0 - 0.875 * 1.2, epsilon = 1.0e-5);
    assert!(apex < 3.0);
}

#[test]
fn disabled_jump_limiter_keeps_requested_apex() {
    let mut world = MockWorld::with_floor(0.0);
    world.add(Slab::ceiling(3.0));
    let mut kcc = spawn(&mut world);
    kcc.set_active_jump_limiter(false);
    kcc.update(&mut world, DT);

    assert!(kcc.start_jump(3.0));
    assert_eq!(kcc.jump_apex(), Some(3.0));
}

#[test]
fn ceiling_contact_ends_the_jump_early() {
    let mut world = MockWorld::with_floor(0.0);
    world.add(Slab::ceiling(3.0));
    let mut kcc = spawn(&mut world);
    kcc.set_active_jump_limiter(false);
    kcc.update(&mut world, DT);

    assert!(kcc.start_jump(3.0));
    run_until(&mut kcc, &mut world, 1.0 / 60.0, 120, |k| {
        k.movement_state() == MotionState::Falling
    });

    // Top is feet + 2.325, so the ceiling is reached long before the 3.0 apex.
    let y = kcc.position().y;
    assert!(kcc.capsule_top() >= 3.0);
    assert!(y < 1.0, "fell from {y}");
    match kcc.vertical_motion() {
        VerticalMotion::Falling(arc) => assert_eq!(arc.start_height, y),
        other => panic!("expected a fall, got {other:?}"),
    }
}

#[test]
fn default_jump_uses_default_height() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.update(&mut world, DT);

    assert!(kcc.start_default_jump());
    assert_eq!(kcc.jump_apex(), Some(DEFAULT_JUMP_HEIGHT));
    assert!(matches!(kcc.vertical_motion(), VerticalMotion::Jumping(_)));
}

#[test]
fn jump_requests_respect_the_transition_table() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.update(&mut world, DT);

    assert!(kcc.start_jump(1.0));
    assert!(!kcc.start_jump(1.0), "no jump while jumping");

    let mut flyer = spawn(&mut world);
    flyer.start_fly();
    assert!(!flyer.start_jump(1.0));
    assert_eq!(flyer.movement_state(), MotionState::Flying);

    let mut faller = spawn_at(&mut world, Vec3::new(0.0, 3.0, 0.0));
    faller.update(&mut world, DT);
    assert_eq!(faller.movement_state(), MotionState::Falling);
    assert!(faller.start_jump(1.0));
    assert_eq!(faller.movement_state(), MotionState::Jumping);
}

#[test]
fn unreachable_apex_drops_the_jump() {
    let mut world = MockWorld::with_floor(0.0);
    // Wide capsule whose center sits below the limiter margin.
    let settings = ControllerSettings::with_body(2.0, 1.5, 0.1, 0.85);
    let mut kcc = CharacterController::new(&mut world, settings, Vec3::zeros()).unwrap();
    world.add(Slab::ceiling(1.16));
    kcc.update(&mut world, DT);

    assert!(!kcc.start_jump(1.0));
    assert_eq!(kcc.movement_state(), MotionState::Ground);
    assert_eq!(kcc.jump_apex(), None);
}

#[test]
fn flying_moves_vertically_without_gravity() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.update(&mut world, DT);

    kcc.start_fly();
    kcc.set_linear_movement(Vec3::new(0.0, 1.0, 0.0));
    for _ in 0..5 {
        kcc.update(&mut world, DT);
    }
    assert_eq!(kcc.movement_state(), MotionState::Flying);
    assert_relative_eq!(kcc.position().y, 0.5, epsilon = 1.0e-5);

    kcc.set_linear_movement(Vec3::new(0.0, -1.0, 0.0));
    for _ in 0..10 {
        kcc.update(&mut world, DT);
    }
    let y = kcc.position().y;
    assert!((-1.0e-4..=0.1 + 1.0e-4).contains(&y), "stopped above floor, got {y}");
}

#[test]
fn fast_flying_descent_stops_on_the_floor() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn_at(&mut world, Vec3::new(0.0, 0.5, 0.0));
    kcc.start_fly();
    kcc.set_linear_movement(Vec3::new(0.0, -40.0, 0.0));

    for _ in 0..5 {
        kcc.update(&mut world, DT);
        assert_eq!(kcc.position().y, 0.0);
        assert_eq!(kcc.movement_state(), MotionState::Flying);
    }

    kcc.set_linear_movement(Vec3::new(0.0, 1.0, 0.0));
    kcc.update(&mut world, DT);
    assert_relative_eq!(kcc.position().y, 0.1, epsilon = 1.0e-6);
}

#[test]
fn flying_stops_rising_at_the_ceiling() {
    let mut world = MockWorld::with_floor(0.0);
    world.add(Slab::ceiling(2.5));
    let mut kcc = spawn(&mut world);
    kcc.start_fly();
    kcc.set_linear_movement(Vec3::new(0.0, 1.0, 0.0));

    for _ in 0..10 {
        kcc.update(&mut world, DT);
    }
    // Capsule top is feet + 2.325; rising stops once it reaches 2.5.
    let y = kcc.position().y;
    assert!(y > 0.15 && y < 0.25, "got {y}");
}

#[test]
fn stop_fly_starts_a_fall() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);

    assert!(!kcc.stop_fly());
    kcc.start_fly();
    assert!(kcc.stop_fly());
    assert_eq!(kcc.movement_state(), MotionState::Falling);
    assert!(!kcc.stop_fly());
}

#[test]
fn steep_slope_pushes_back_downhill() {
    let mut world = MockWorld::default();
    // Downhill is +X, 60 degrees from up.
    world.add(Slab::floor(0.0).with_normal(Vec3::new(3.0_f32.sqrt() * 0.5, 0.5, 0.0)));
    let mut kcc = spawn(&mut world);
    kcc.update(&mut world, DT);
    kcc.set_linear_movement(Vec3::new(-1.0, 0.0, 0.0));

    kcc.update(&mut world, DT);
    assert!(kcc.position().x > 0.0, "uphill motion must be cancelled");

    kcc.set_position(Vec3::zeros());
    kcc.set_max_slope(0.0, true);
    kcc.update(&mut world, DT);
    assert_relative_eq!(kcc.position().x, -DT, epsilon = 1.0e-5);
}

#[test]
fn walkable_slope_only_slows_uphill_motion() {
    let mut world = MockWorld::default();
    let n = Vec3::new(3.0_f32.sqrt() * 0.5, 0.5, 0.0);
    world.add(Slab::floor(0.0).with_normal(n));
    let mut kcc = spawn(&mut world);
    kcc.set_max_slope(70.0, true);
    kcc.update(&mut world, DT);
    kcc.set_linear_movement(Vec3::new(-1.0, 0.0, 0.0));

    kcc.update(&mut world, DT);
    let pull = n.x * 9.81 * DT * 0.1;
    assert_relative_eq!(kcc.position().x, -DT + pull, epsilon = 1.0e-5);
}

#[test]
fn crouch_swaps_capsules() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.update(&mut world, DT);

    assert!(kcc.start_crouch(&mut world));
    assert!(kcc.is_crouching());
    assert_eq!(kcc.stance(), Stance::Crouch);
    assert_eq!(world.attached_capsules(), 1);
    assert!(world.is_attached(kcc.crouch_profile().collider));
    assert_eq!(kcc.active_collider(), kcc.crouch_profile().collider);

    let center = world.capsule(kcc.active_collider()).center;
    assert_relative_eq!(center.y, kcc.crouch_profile().capsule_offset());

    assert!(!kcc.start_crouch(&mut world));
    assert_eq!(world.attached_capsules(), 1);
}

#[test]
fn stand_up_waits_for_headroom() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.update(&mut world, DT);
    kcc.start_crouch(&mut world);

    let ceiling = world.add(Slab::ceiling(1.5));
    let stood = Rc::new(Cell::new(0));
    let sink = stood.clone();
    kcc.set_stand_up_callback(move || sink.set(sink.get() + 1));

    kcc.stop_crouch();
    for _ in 0..3 {
        kcc.update(&mut world, DT);
        assert!(kcc.is_crouching());
        assert_eq!(stood.get(), 0);
    }

    world.slab_mut(ceiling).enabled = false;
    kcc.update(&mut world, DT);
    assert!(!kcc.is_crouching());
    assert!(world.is_attached(kcc.stand_profile().collider));
    assert_eq!(world.attached_capsules(), 1);
    assert_eq!(stood.get(), 1);

    kcc.update(&mut world, DT);
    assert_eq!(stood.get(), 1);
}

#[test]
fn crouching_again_cancels_pending_stand_up() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.update(&mut world, DT);
    kcc.start_crouch(&mut world);

    let ceiling = world.add(Slab::ceiling(1.5));
    kcc.stop_crouch();
    kcc.update(&mut world, DT);
    assert!(!kcc.start_crouch(&mut world));

    world.slab_mut(ceiling).enabled = false;
    kcc.update(&mut world, DT);
    assert!(kcc.is_crouching());
}

#[test]
fn penetration_is_corrected_horizontally() {
    let mut world = MockWorld::with_floor(0.0);
    let wall = world.add(Slab::floor(-100.0).within(50.0, 51.0, 50.0, 51.0));
    let mut kcc = spawn(&mut world);
    world.manifolds.push(ContactManifold {
        first: wall,
        second: kcc.active_collider(),
        normal: Vec3::new(0.6, 0.8, 0.0),
        distances: vec![-0.1, 0.05],
    });

    kcc.update(&mut world, DT);
    assert_relative_eq!(kcc.position().x, 0.6 * 0.1 * 2.0, epsilon = 1.0e-6);
    assert_eq!(kcc.position().y, 0.0);
    assert!(world.impulses.is_empty());
}

#[test]
fn reflection_pushes_dynamic_bodies_instead() {
    let mut world = MockWorld::with_floor(0.0);
    let crate_body = world.add(Slab::floor(-100.0).within(50.0, 51.0, 50.0, 51.0).dynamic(4.0));
    let mut kcc = spawn(&mut world);
    kcc.set_penetration_response(PenetrationResponse::Reflect);
    world.manifolds.push(ContactManifold {
        first: kcc.active_collider(),
        second: crate_body,
        normal: Vec3::x(),
        distances: vec![-0.05],
    });

    kcc.update(&mut world, DT);
    assert_eq!(kcc.position(), Vec3::zeros());
    assert_eq!(world.impulses.len(), 1);
    let (body, impulse) = world.impulses[0];
    assert_eq!(body, crate_body);
    assert_relative_eq!(impulse.x, 0.05 * 4.0 * 2.0, epsilon = 1.0e-6);

    kcc.set_penetration_response(PenetrationResponse::CorrectAndReflect);
    kcc.update(&mut world, DT);
    assert!(kcc.position().x < 0.0);
    assert_eq!(world.impulses.len(), 2);
}

#[test]
fn future_space_blocks_low_gaps() {
    let mut world = MockWorld::with_floor(0.0);
    world.add(Slab::ceiling(2.0).within(0.5, 5.0, -5.0, 5.0));
    let mut kcc = spawn(&mut world);
    kcc.set_future_space_prediction(Some(10.0));
    kcc.set_linear_movement(Vec3::new(1.0, 0.0, 0.0));

    kcc.update(&mut world, DT);
    assert_eq!(kcc.position().x, 0.0);

    kcc.set_future_space_prediction(None);
    kcc.update(&mut world, DT);
    assert_relative_eq!(kcc.position().x, DT, epsilon = 1.0e-6);
}

#[test]
fn future_space_passes_gaps_tall_enough() {
    let mut world = MockWorld::with_floor(0.0);
    world.add(Slab::ceiling(2.1).within(0.5, 5.0, -5.0, 5.0));
    let mut kcc = spawn(&mut world);
    kcc.set_future_space_prediction(Some(10.0));
    kcc.set_linear_movement(Vec3::new(1.0, 0.0, 0.0));

    kcc.update(&mut world, DT);
    assert_relative_eq!(kcc.position().x, DT, epsilon = 1.0e-6);
}

#[test]
fn setters_keep_collider_in_sync() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);

    kcc.set_position(Vec3::new(1.0, 0.0, 2.0));
    assert_eq!(kcc.position(), Vec3::new(1.0, 0.0, 2.0));
    assert_eq!(kcc.transform().translation, kcc.position());

    kcc.set_x(4.0);
    kcc.set_z(-1.0);
    kcc.update(&mut world, DT);

    let center = world.capsule(kcc.active_collider()).center;
    assert_relative_eq!(center.x, 4.0);
    assert_relative_eq!(center.z, -1.0);
    assert_relative_eq!(center.y, kcc.profile().capsule_offset());
}

#[test]
fn non_finite_dt_is_treated_as_zero() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.set_linear_movement(Vec3::new(0.0, 0.0, 1.0));

    kcc.update(&mut world, f32::NAN);
    assert_eq!(kcc.position(), Vec3::zeros());
    assert_eq!(kcc.movement_state(), MotionState::Ground);
}

#[test]
fn despawn_detaches_the_active_capsule() {
    let mut world = MockWorld::with_floor(0.0);
    let mut kcc = spawn(&mut world);
    kcc.start_crouch(&mut world);

    kcc.despawn(&mut world);
    assert_eq!(world.attached_capsules(), 0);
}
