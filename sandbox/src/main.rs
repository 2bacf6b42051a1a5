//! Headless demo: two agents walk, jump and crouch through a small rapier scene.
//!
//! Run with `RUST_LOG=debug` to see state transitions, `trace` for per-frame detail.

mod scene;

use kcc::{
    AgentId, CharacterRoster, ControllerSettings, PhysicsWorld, RapierWorld, Vec3,
    constants::{DEFAULT_JUMP_HEIGHT, DEFAULT_RADIUS}, heading_from_xz,
};
use log::{error, info};

/// Simulation tick frequency (Hz).
const TICK_HZ: u32 = 30;

/// Max dt (seconds) handed to controllers after a stall.
const MAX_DT_S: f32 = 0.10;

const TICKS: u32 = 360;

/// Walking speed (m/s).
const WALK_SPEED: f32 = 2.5;

/// Roster is suspended for this tick range to show the pause gate.
const SUSPENDED_TICKS: std::ops::Range<u32> = 200..230;

type Roster = CharacterRoster<<RapierWorld as PhysicsWorld>::Handle>;

fn main() {
    env_logger::init();

    let mut world = scene::build();
    let mut roster = Roster::new();

    let (walker, crawler) = match spawn_agents(&mut roster, &mut world) {
        Ok(ids) => ids,
        Err(e) => {
            error!("failed to spawn agents: {e}");
            return;
        }
    };

    let dt = (1.0 / TICK_HZ as f32).min(MAX_DT_S);
    for tick in 0..TICKS {
        if tick == SUSPENDED_TICKS.start {
            roster.suspend();
        } else if tick == SUSPENDED_TICKS.end {
            roster.resume();
        }

        drive_walker(&mut roster, walker, tick);
        drive_crawler(&mut roster, &mut world, crawler);

        roster.step(&mut world, dt);
        world.step(dt);

        if tick % TICK_HZ == 0 {
            for (id, agent) in roster.iter() {
                info!(
                    "t={:>5.2}s {id}: {:?} at {:?} crouching={}",
                    tick as f32 * dt,
                    agent.movement_state(),
                    agent.position(),
                    agent.is_crouching()
                );
            }
        }
    }
}

fn spawn_agents(
    roster: &mut Roster,
    world: &mut RapierWorld,
) -> Result<(AgentId, AgentId), kcc::KccError> {
    let walker = roster.spawn(world, ControllerSettings::default(), Vec3::new(0.0, 0.5, 0.0))?;
    let crawler = roster.spawn(
        world,
        ControllerSettings {
            future_space_distance: Some(kcc::constants::DEFAULT_FUTURE_SPACE_DISTANCE),
            ..Default::default()
        },
        Vec3::new(1.0, 0.5, -2.0),
    )?;

    for id in [walker, crawler] {
        if let Some(agent) = roster.get_mut(id) {
            agent.set_fall_callback(move |from| info!("{id} landed after falling from {from:.2}"));
            agent.set_stand_up_callback(move || info!("{id} stood up"));
        }
    }
    Ok((walker, crawler))
}

/// Walk toward the ledge, hop onto it, then stop.
fn drive_walker(roster: &mut Roster, id: AgentId, tick: u32) {
    let Some(agent) = roster.get_mut(id) else {
        return;
    };

    let target = Vec3::new(0.0, 0.0, 7.0);
    let to_target = target - agent.position();
    if let Some(heading) = heading_from_xz(to_target.x, to_target.z) {
        agent.set_heading(heading);
    }

    let near = to_target.x.hypot(to_target.z) < 0.2;
    agent.set_linear_movement(if near {
        Vec3::zeros()
    } else {
        Vec3::new(0.0, 0.0, WALK_SPEED)
    });

    if tick == TICK_HZ * 2 {
        agent.start_jump(DEFAULT_JUMP_HEIGHT * 0.5);
    }
}

/// Crouch through the tunnel; standing up waits until the roof is cleared.
fn drive_crawler(roster: &mut Roster, world: &mut RapierWorld, id: AgentId) {
    let Some(agent) = roster.get_mut(id) else {
        return;
    };

    agent.set_heading(std::f32::consts::PI);
    let z = agent.position().z;
    if z > -11.0 {
        agent.set_linear_movement(Vec3::new(0.0, 0.0, WALK_SPEED * 0.5));
    } else {
        agent.set_linear_movement(Vec3::zeros());
    }

    // The head probe only sees the roof above the capsule center, so standing
    // waits until the whole capsule has left the roof.
    let clear_of_roof = scene::TUNNEL_END_Z - DEFAULT_RADIUS - 0.2;
    if (-3.5..-3.0).contains(&z) {
        agent.start_crouch(world);
    } else if z < clear_of_roof {
        agent.stop_crouch();
    }
}
