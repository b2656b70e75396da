use std::borrow::Cow;

use crate::{AbilityKind, AbilityTag, GameState, TickContext, WorldMut};

/// What a tick hook asks the system to do once it returns.
///
/// Hooks cannot reach the system directly; the request is applied synchronously right after the
/// hook returns, before the next ability is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbilityRequest {
    #[default]
    None,
    /// Start the ability. Not gated: the hook decides when starting makes sense.
    Run,
    /// Finish the ability if it is running.
    Finish,
}

/// Name of a discrete "performed" input an ability listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputAction(pub &'static str);

/// View handed to tick hooks.
pub struct AbilityCx<'a, W>
where
    W: WorldMut,
{
    pub agent: W::Agent,
    pub tag: AbilityTag,
    pub running: bool,
    pub allowed: bool,
    pub world: &'a mut W,
}

/// Domain behavior of an ability.
///
/// Gating, cooldowns, cost, tags and finish cascades are handled by the system; implementors only
/// supply the gameplay side. Lifecycle hooks (`on_started`, `on_finished`, ...) cannot start or
/// finish abilities; tick hooks do so through [`AbilityRequest`]. Tick hooks may fail: the error
/// is logged and the pass continues with the next ability.
pub trait AbilityBehavior<W>: BehaviorClone<W> + 'static
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> AbilityKind;

    /// Called once when the ability is initialized for an agent.
    fn on_initialized(&mut self, _agent: W::Agent, _world: &mut W) {}

    /// Input routed to `buffer_input` for this ability. Registered once at initialization.
    fn input_binding(&self) -> Option<InputAction> {
        None
    }

    /// Last gate, evaluated after cooldown, cost and tags all pass.
    fn condition(&self, _agent: W::Agent, _world: &W) -> bool {
        true
    }

    fn on_started(&mut self, _agent: W::Agent, _world: &mut W) {}

    fn on_finished(&mut self, _agent: W::Agent, _world: &mut W) {}

    /// Called every unlocked `tick`, before gating, for every initialized ability.
    fn raw_update(
        &mut self,
        _ctx: &TickContext,
        _cx: &mut AbilityCx<'_, W>,
    ) -> anyhow::Result<AbilityRequest> {
        Ok(AbilityRequest::None)
    }

    fn update(
        &mut self,
        _ctx: &TickContext,
        _cx: &mut AbilityCx<'_, W>,
    ) -> anyhow::Result<AbilityRequest> {
        Ok(AbilityRequest::None)
    }

    fn fixed_update(
        &mut self,
        _ctx: &TickContext,
        _cx: &mut AbilityCx<'_, W>,
    ) -> anyhow::Result<AbilityRequest> {
        Ok(AbilityRequest::None)
    }

    fn on_state_changed(&mut self, _state: GameState, _agent: W::Agent, _world: &mut W) {}

    /// Status line for debug overlays; only asked while the ability runs. The system records it
    /// as a [`TraceKind::Debug`](crate::TraceKind::Debug) event.
    fn draw_debug(&self, _agent: W::Agent, _world: &W) -> Option<Cow<'static, str>> {
        None
    }
}

/// Object-safe cloning for boxed behaviors, used when an agent possesses a private copy.
pub trait BehaviorClone<W>
where
    W: WorldMut + 'static,
{
    fn clone_box(&self) -> Box<dyn AbilityBehavior<W>>;
}

impl<W, T> BehaviorClone<W> for T
where
    W: WorldMut + 'static,
    T: AbilityBehavior<W> + Clone,
{
    fn clone_box(&self) -> Box<dyn AbilityBehavior<W>> {
        Box::new(self.clone())
    }
}
