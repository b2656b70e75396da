use ability_core::{
    AbilityBehavior, AbilityCx, AbilityDefinition, AbilityFlags, AbilityKind, AbilityRequest,
    AbilityTag, InputAction, TickContext,
};

use crate::{BodyWorldMut, Vec3};

pub const JUMP_INPUT: InputAction = InputAction("jump");

/// Upward impulse while grounded; runs until the body lands again.
#[derive(Debug, Clone)]
pub struct JumpAbility {
    force: f32,
    left_ground: bool,
}

impl JumpAbility {
    pub const KIND: AbilityKind = AbilityKind("jump");

    pub fn new(force: f32) -> Self {
        Self {
            force,
            left_ground: false,
        }
    }

    /// Definition with a short input buffer so presses slightly before landing still count.
    pub fn definition(name: impl Into<String>, tag: AbilityTag) -> AbilityDefinition {
        AbilityDefinition::new(name, tag).with_input_buffer(0.2)
    }
}

impl Default for JumpAbility {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl<W> AbilityBehavior<W> for JumpAbility
where
    W: BodyWorldMut + 'static,
{
    fn kind(&self) -> AbilityKind {
        Self::KIND
    }

    fn input_binding(&self) -> Option<InputAction> {
        Some(JUMP_INPUT)
    }

    fn condition(&self, agent: W::Agent, world: &W) -> bool {
        world.is_grounded(agent)
    }

    fn on_started(&mut self, agent: W::Agent, world: &mut W) {
        self.left_ground = false;
        world.apply_impulse(agent, Vec3::UP * self.force);
    }

    fn update(
        &mut self,
        _ctx: &TickContext,
        cx: &mut AbilityCx<'_, W>,
    ) -> anyhow::Result<AbilityRequest> {
        if !cx.running {
            return Ok(AbilityRequest::None);
        }
        if !cx.world.is_grounded(cx.agent) {
            self.left_ground = true;
            return Ok(AbilityRequest::None);
        }
        if self.left_ground {
            tracing::trace!(tag = cx.tag.id(), "landed");
            return Ok(AbilityRequest::Finish);
        }
        Ok(AbilityRequest::None)
    }
}

/// Turns and walks the body from move input; runs exactly while there is a direction.
#[derive(Debug, Clone)]
pub struct MoveAbility {
    speed: f32,
    turn_speed: f32,
    direction: Vec3,
}

impl MoveAbility {
    pub const KIND: AbilityKind = AbilityKind("move");

    pub fn new(speed: f32, turn_speed: f32) -> Self {
        Self {
            speed,
            turn_speed,
            direction: Vec3::ZERO,
        }
    }

    /// Definition with `fixed_update` enabled and `update` dispatched even when gated, so a
    /// blocked move still notices released input.
    pub fn definition(name: impl Into<String>, tag: AbilityTag) -> AbilityDefinition {
        AbilityDefinition::new(name, tag).with_flags(AbilityFlags {
            need_fixed_update: true,
            run_update_anyway: true,
            ..AbilityFlags::default()
        })
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }
}

impl Default for MoveAbility {
    fn default() -> Self {
        Self::new(6.0, 3.0)
    }
}

impl<W> AbilityBehavior<W> for MoveAbility
where
    W: BodyWorldMut + 'static,
{
    fn kind(&self) -> AbilityKind {
        Self::KIND
    }

    fn on_finished(&mut self, agent: W::Agent, world: &mut W) {
        if let Some(velocity) = world.velocity(agent) {
            world.set_velocity(agent, Vec3::new(0.0, velocity.y, 0.0));
        }
    }

    fn update(
        &mut self,
        ctx: &TickContext,
        cx: &mut AbilityCx<'_, W>,
    ) -> anyhow::Result<AbilityRequest> {
        let Some(heading) = cx.world.heading(cx.agent) else {
            anyhow::bail!("agent has no body");
        };
        let input = cx.world.move_input(cx.agent);

        let heading = heading + input.turn * self.turn_speed * ctx.dt_seconds.max(0.0);
        cx.world.set_heading(cx.agent, heading);
        self.direction = Vec3::forward(heading) * input.forward + Vec3::right(heading) * input.strafe;

        Ok(match (self.direction.is_near_zero(), cx.running) {
            (false, false) if cx.allowed => AbilityRequest::Run,
            (true, true) => AbilityRequest::Finish,
            _ => AbilityRequest::None,
        })
    }

    fn fixed_update(
        &mut self,
        _ctx: &TickContext,
        cx: &mut AbilityCx<'_, W>,
    ) -> anyhow::Result<AbilityRequest> {
        if !cx.running {
            return Ok(AbilityRequest::None);
        }
        let vertical = cx.world.velocity(cx.agent).map_or(0.0, |v| v.y);
        let horizontal = self.direction * self.speed;
        cx.world.set_velocity(cx.agent, horizontal.with_y(vertical));
        Ok(AbilityRequest::None)
    }
}
