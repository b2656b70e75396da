//! Deterministic ability gating and lifecycle engine.
//!
//! An agent owns an [`AbilitySystem`] holding the abilities it possesses. Every frame the
//! driver calls [`AbilitySystem::tick`] (and, at its own cadence, [`AbilitySystem::fixed_tick`]);
//! the system re-evaluates each ability's gates (cooldown, resource cost, blocked/allowed tags,
//! custom condition), dispatches behavior hooks, and keeps the running-tag registry consistent
//! while abilities start and force-finish each other.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod ability;
pub mod behavior;
pub mod catalog;
pub mod definition;
pub mod error;
#[cfg(feature = "serde")]
pub mod roster;
pub mod signal;
pub mod stats;
pub mod system;
pub mod tag;
pub mod tick;
pub mod timer;
pub mod trace;
pub mod world;

pub use ability::{Ability, AbilityRef, AbilityState, GateVerdict};
pub use behavior::{AbilityBehavior, AbilityCx, AbilityRequest, BehaviorClone, InputAction};
pub use catalog::AbilityCatalog;
pub use definition::{AbilityDefinition, AbilityFlags};
pub use error::AbilityError;
#[cfg(feature = "serde")]
pub use roster::{BehaviorLibrary, Roster, RosterError};
pub use signal::{GameState, GameStateManager, QuitRequested, Signal, Subscription};
pub use stats::{AbilityStats, ResourcePool};
pub use system::{AbilityHandle, AbilitySystem};
pub use tag::{AbilityKind, AbilityTag, TagRegistry};
pub use tick::TickContext;
pub use timer::{Timer, TimerState};
pub use trace::{TraceEvent, TraceKind, TraceLog, TraceSink};
pub use world::{AgentId, WorldMut, WorldView};
