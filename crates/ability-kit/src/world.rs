use ability_core::{WorldMut, WorldView};

use crate::Vec3;

/// Movement input sampled for an agent this frame, each axis in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveInput {
    pub forward: f32,
    pub strafe: f32,
    pub turn: f32,
}

pub trait BodyWorldView: WorldView {
    fn velocity(&self, agent: Self::Agent) -> Option<Vec3>;
    /// Yaw in radians around the up axis.
    fn heading(&self, agent: Self::Agent) -> Option<f32>;
    fn is_grounded(&self, agent: Self::Agent) -> bool;
    fn move_input(&self, agent: Self::Agent) -> MoveInput;
}

pub trait BodyWorldMut: WorldMut + BodyWorldView {
    fn set_velocity(&mut self, agent: Self::Agent, velocity: Vec3);
    fn set_heading(&mut self, agent: Self::Agent, yaw: f32);
    /// Instant change of velocity (unit mass).
    fn apply_impulse(&mut self, agent: Self::Agent, impulse: Vec3);
}
