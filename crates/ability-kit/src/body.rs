use std::collections::BTreeMap;

use ability_core::{WorldMut, WorldView};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BodyWorldMut, BodyWorldView, MoveInput, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub heading: f32,
    pub grounded: bool,
}

/// Point bodies over an infinite ground plane at `y = 0`, integrated with explicit Euler.
///
/// Input is whatever the driver last set with [`KinematicWorld::set_input`].
#[derive(Debug, Clone)]
pub struct KinematicWorld {
    pub gravity: f32,
    bodies: BTreeMap<u64, Body>,
    inputs: BTreeMap<u64, MoveInput>,
}

impl KinematicWorld {
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            bodies: BTreeMap::new(),
            inputs: BTreeMap::new(),
        }
    }

    pub fn spawn(&mut self, agent: u64, position: Vec3) {
        let grounded = position.y <= 0.0;
        self.bodies.insert(
            agent,
            Body {
                position: position.with_y(position.y.max(0.0)),
                grounded,
                ..Body::default()
            },
        );
    }

    pub fn body(&self, agent: u64) -> Option<&Body> {
        self.bodies.get(&agent)
    }

    pub fn set_input(&mut self, agent: u64, input: MoveInput) {
        self.inputs.insert(agent, input);
    }

    pub fn step(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for body in self.bodies.values_mut() {
            body.velocity.y -= self.gravity * dt;
            body.position += body.velocity * dt;
            if body.position.y <= 0.0 {
                body.position.y = 0.0;
                body.velocity.y = body.velocity.y.max(0.0);
                body.grounded = true;
            } else {
                body.grounded = false;
            }
        }
    }
}

impl Default for KinematicWorld {
    fn default() -> Self {
        Self::new(9.81)
    }
}

impl WorldView for KinematicWorld {
    type Agent = u64;
}

impl WorldMut for KinematicWorld {}

impl BodyWorldView for KinematicWorld {
    fn velocity(&self, agent: u64) -> Option<Vec3> {
        self.bodies.get(&agent).map(|b| b.velocity)
    }

    fn heading(&self, agent: u64) -> Option<f32> {
        self.bodies.get(&agent).map(|b| b.heading)
    }

    fn is_grounded(&self, agent: u64) -> bool {
        self.bodies.get(&agent).is_some_and(|b| b.grounded)
    }

    fn move_input(&self, agent: u64) -> MoveInput {
        self.inputs.get(&agent).copied().unwrap_or_default()
    }
}

impl BodyWorldMut for KinematicWorld {
    fn set_velocity(&mut self, agent: u64, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.velocity = velocity;
        }
    }

    fn set_heading(&mut self, agent: u64, yaw: f32) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.heading = yaw;
        }
    }

    fn apply_impulse(&mut self, agent: u64, impulse: Vec3) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.velocity += impulse;
        }
    }
}
