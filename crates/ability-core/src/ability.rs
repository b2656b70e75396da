use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::{AbilityBehavior, AbilityDefinition, AbilityKind, AbilityTag, Timer, WorldMut};

/// An ability possessed by reference.
///
/// Possessing the same `AbilityRef` from several systems shares its runtime state (cooldown,
/// running flag) between them; use [`crate::AbilitySystem::acquire_copy`] to isolate agents.
pub type AbilityRef<W> = Rc<RefCell<Ability<W>>>;

/// Mutable runtime state of an ability.
#[derive(Debug, Clone, Default)]
pub struct AbilityState {
    pub(crate) running: bool,
    pub(crate) allowed: bool,
    pub(crate) cooldown: Timer,
    /// Id of the system that started the current run. Only that system finishes it.
    pub(crate) running_owner: Option<u64>,
    /// Id of the system that started the cooldown and advances it.
    pub(crate) cooldown_driver: Option<u64>,
}

impl AbilityState {
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Result of the most recent gate evaluation.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn cooldown_time_left(&self) -> f32 {
        self.cooldown.remaining()
    }
}

/// Why an ability can or cannot start right now. Gates are checked in declaration order and the
/// first failing one is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Ready,
    Uninitialized,
    OnCooldown,
    InsufficientResource,
    Blocked(AbilityTag),
    NotAllowed,
    ConditionFailed,
}

impl GateVerdict {
    pub fn is_ready(self) -> bool {
        self == GateVerdict::Ready
    }
}

/// Definition, runtime state and behavior of one ability.
pub struct Ability<W>
where
    W: WorldMut + 'static,
{
    definition: AbilityDefinition,
    pub(crate) state: AbilityState,
    pub(crate) behavior: Box<dyn AbilityBehavior<W>>,
}

impl<W> Ability<W>
where
    W: WorldMut + 'static,
{
    pub fn new(definition: AbilityDefinition, behavior: impl AbilityBehavior<W>) -> Self {
        Self::from_boxed(definition, Box::new(behavior))
    }

    pub fn from_boxed(definition: AbilityDefinition, behavior: Box<dyn AbilityBehavior<W>>) -> Self {
        Self {
            definition,
            state: AbilityState::default(),
            behavior,
        }
    }

    pub fn shared(definition: AbilityDefinition, behavior: impl AbilityBehavior<W>) -> AbilityRef<W> {
        Self::new(definition, behavior).into_shared()
    }

    pub fn into_shared(self) -> AbilityRef<W> {
        Rc::new(RefCell::new(self))
    }

    /// Private copy with the same definition and behavior and fresh runtime state.
    pub fn fresh_copy(&self) -> Self {
        Self {
            definition: self.definition.clone(),
            state: AbilityState::default(),
            behavior: self.behavior.clone_box(),
        }
    }

    pub fn definition(&self) -> &AbilityDefinition {
        &self.definition
    }

    pub fn tag(&self) -> AbilityTag {
        self.definition.tag
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn kind(&self) -> AbilityKind {
        self.behavior.kind()
    }

    pub fn state(&self) -> &AbilityState {
        &self.state
    }

    pub fn behavior(&self) -> &dyn AbilityBehavior<W> {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> &mut dyn AbilityBehavior<W> {
        self.behavior.as_mut()
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn cooldown_time_left(&self) -> f32 {
        self.state.cooldown_time_left()
    }

    /// Full gate, short-circuiting: cooldown, resource, blocked tags, allowed tags, condition.
    pub(crate) fn evaluate(
        &self,
        running_tags: &BTreeSet<AbilityTag>,
        resource_level: f32,
        agent: W::Agent,
        world: &W,
    ) -> GateVerdict {
        if self.state.cooldown_time_left() > 0.0 {
            return GateVerdict::OnCooldown;
        }
        if !has_enough_resource(&self.definition, resource_level) {
            return GateVerdict::InsufficientResource;
        }
        if let Some(tag) = blocking_tag(&self.definition, running_tags) {
            return GateVerdict::Blocked(tag);
        }
        if !allowed_by_tags(&self.definition, running_tags) {
            return GateVerdict::NotAllowed;
        }
        if !self.behavior.condition(agent, world) {
            return GateVerdict::ConditionFailed;
        }
        GateVerdict::Ready
    }
}

impl<W> fmt::Debug for Ability<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ability")
            .field("kind", &self.behavior.kind())
            .field("definition", &self.definition)
            .field("state", &self.state)
            .finish()
    }
}

pub fn has_enough_resource(definition: &AbilityDefinition, level: f32) -> bool {
    definition.energy_cost <= 0.0 || level >= definition.energy_cost
}

/// First tag of the blocked list that is currently running.
pub fn blocking_tag(
    definition: &AbilityDefinition,
    running_tags: &BTreeSet<AbilityTag>,
) -> Option<AbilityTag> {
    definition
        .blocked_by
        .iter()
        .copied()
        .find(|tag| running_tags.contains(tag))
}

pub fn allowed_by_tags(definition: &AbilityDefinition, running_tags: &BTreeSet<AbilityTag>) -> bool {
    let allowed = &definition.allowed_by;
    if definition.flags.need_all_allowed_tags {
        allowed.iter().all(|tag| running_tags.contains(tag))
    } else {
        allowed.is_empty() || allowed.iter().any(|tag| running_tags.contains(tag))
    }
}
