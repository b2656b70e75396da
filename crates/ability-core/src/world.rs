use core::fmt::Debug;

/// Key of the agent an [`AbilitySystem`](crate::AbilitySystem) belongs to.
///
/// Handed to every behavior hook so the behavior can find its body in the world.
pub trait AgentId: Copy + Eq + Debug {
    /// Numeric form recorded as the `agent` field of log and trace events.
    fn log_id(self) -> u64;
}

impl AgentId for u64 {
    fn log_id(self) -> u64 {
        self
    }
}

impl AgentId for u32 {
    fn log_id(self) -> u64 {
        u64::from(self)
    }
}

/// State abilities read from: bodies, input axes, ground contacts.
///
/// Gates and `condition` only ever see `&W`. Ability crates put their queries on extension
/// traits (`BodyWorldView` in `ability-kit`) rather than here.
pub trait WorldView {
    type Agent: AgentId;
}

/// State abilities act on from their lifecycle and tick hooks.
pub trait WorldMut: WorldView {}
