#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::AbilityTag;

/// Dispatch and gating switches of an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AbilityFlags {
    /// Invoke `update` from `tick` while allowed or running.
    pub need_update: bool,
    /// Invoke `fixed_update` from `fixed_tick` while allowed or running.
    pub need_fixed_update: bool,
    /// Invoke `update` even while neither allowed nor running.
    pub run_update_anyway: bool,
    /// Initialize as part of acquisition. When false the owner calls `initialize` later.
    pub initialize_after_acquire: bool,
    /// Allowed-tag gate requires every listed tag instead of any.
    pub need_all_allowed_tags: bool,
}

impl Default for AbilityFlags {
    fn default() -> Self {
        Self {
            need_update: true,
            need_fixed_update: false,
            run_update_anyway: false,
            initialize_after_acquire: true,
            need_all_allowed_tags: false,
        }
    }
}

/// Immutable configuration of an ability.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AbilityDefinition {
    pub name: String,
    pub tag: AbilityTag,
    /// Seconds before the ability may start again, counted from `run`.
    pub base_cooldown: f32,
    /// Seconds a buffered input keeps retrying before it is dropped.
    pub input_buffer_duration: f32,
    pub energy_cost: f32,
    /// Cannot start while any of these tags is running.
    pub blocked_by: Vec<AbilityTag>,
    /// Can only start while any (or all, see flags) of these tags is running. Empty = no gate.
    pub allowed_by: Vec<AbilityTag>,
    /// Running abilities with these tags are finished when this one starts.
    pub finish_on_start: Vec<AbilityTag>,
    /// Running abilities with these tags are finished when this one ends.
    pub finish_on_end: Vec<AbilityTag>,
    pub flags: AbilityFlags,
}

impl AbilityDefinition {
    pub fn new(name: impl Into<String>, tag: AbilityTag) -> Self {
        Self {
            name: name.into(),
            tag,
            base_cooldown: 0.0,
            input_buffer_duration: 0.0,
            energy_cost: 0.0,
            blocked_by: Vec::new(),
            allowed_by: Vec::new(),
            finish_on_start: Vec::new(),
            finish_on_end: Vec::new(),
            flags: AbilityFlags::default(),
        }
    }

    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.base_cooldown = seconds;
        self
    }

    pub fn with_input_buffer(mut self, seconds: f32) -> Self {
        self.input_buffer_duration = seconds;
        self
    }

    pub fn with_energy_cost(mut self, cost: f32) -> Self {
        self.energy_cost = cost;
        self
    }

    pub fn blocked_by(mut self, tags: impl IntoIterator<Item = AbilityTag>) -> Self {
        self.blocked_by.extend(tags);
        self
    }

    pub fn allowed_by(mut self, tags: impl IntoIterator<Item = AbilityTag>) -> Self {
        self.allowed_by.extend(tags);
        self
    }

    pub fn finish_on_start(mut self, tags: impl IntoIterator<Item = AbilityTag>) -> Self {
        self.finish_on_start.extend(tags);
        self
    }

    pub fn finish_on_end(mut self, tags: impl IntoIterator<Item = AbilityTag>) -> Self {
        self.finish_on_end.extend(tags);
        self
    }

    pub fn with_flags(mut self, flags: AbilityFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn require_all_allowed(mut self) -> Self {
        self.flags.need_all_allowed_tags = true;
        self
    }

    pub fn deferred_initialize(mut self) -> Self {
        self.flags.initialize_after_acquire = false;
        self
    }
}
