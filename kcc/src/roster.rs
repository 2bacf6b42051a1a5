/*!
A set of controllers sharing one world, updated together.

`CharacterRoster` replaces a process-wide pause flag: suspension is per
roster, so two scenes (or two tests) never freeze each other. While
suspended, `step` leaves every controller untouched; positions and states
resume exactly where they stopped.
*/

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, trace};

use crate::{
    KccError, controller::CharacterController, settings::ControllerSettings, types::Vec3,
    world::PhysicsWorld,
};

/// Stable key of a controller within its roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

pub struct CharacterRoster<H> {
    agents: BTreeMap<AgentId, CharacterController<H>>,
    next_id: u32,
    suspended: bool,
}

impl<H> Default for CharacterRoster<H> {
    fn default() -> Self {
        Self {
            agents: BTreeMap::new(),
            next_id: 0,
            suspended: false,
        }
    }
}

impl<H: Copy + Eq + fmt::Debug> CharacterRoster<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a controller in `world` and register it.
    pub fn spawn<W>(
        &mut self,
        world: &mut W,
        settings: ControllerSettings,
        feet: Vec3,
    ) -> Result<AgentId, KccError>
    where
        W: PhysicsWorld<Handle = H>,
    {
        let controller = CharacterController::new(world, settings, feet)?;
        Ok(self.insert(controller))
    }

    pub fn insert(&mut self, controller: CharacterController<H>) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        self.agents.insert(id, controller);
        debug!("{id} joined roster ({} agents)", self.agents.len());
        id
    }

    /// Unregister an agent and detach its capsule from `world`.
    pub fn despawn<W>(&mut self, world: &mut W, id: AgentId) -> Option<CharacterController<H>>
    where
        W: PhysicsWorld<Handle = H>,
    {
        let mut controller = self.agents.remove(&id)?;
        controller.despawn(world);
        debug!("{id} left roster");
        Some(controller)
    }

    pub fn get(&self, id: AgentId) -> Option<&CharacterController<H>> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut CharacterController<H>> {
        self.agents.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &CharacterController<H>)> {
        self.agents.iter().map(|(id, c)| (*id, c))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn suspend(&mut self) {
        if !self.suspended {
            debug!("roster suspended");
            self.suspended = true;
        }
    }

    pub fn resume(&mut self) {
        if self.suspended {
            debug!("roster resumed");
            self.suspended = false;
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Update every agent in id order, unless suspended.
    pub fn step<W>(&mut self, world: &mut W, dt: f32)
    where
        W: PhysicsWorld<Handle = H>,
    {
        if self.suspended {
            trace!("roster suspended, skipping {} agents", self.agents.len());
            return;
        }
        for controller in self.agents.values_mut() {
            controller.update(world, dt);
        }
    }
}
