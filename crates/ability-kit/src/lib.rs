//! Reference abilities for `ability-core`: a grounded jump and input-driven movement, written
//! against the body extension traits in [`world`], plus a small kinematic world to drive them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod abilities;
pub mod body;
pub mod math;
pub mod world;

pub use abilities::{JumpAbility, MoveAbility, JUMP_INPUT};
pub use body::{Body, KinematicWorld};
pub use math::Vec3;
pub use world::{BodyWorldMut, BodyWorldView, MoveInput};

/// Behavior library resolving the `jump` and `move` roster kinds with default tuning.
#[cfg(feature = "serde")]
pub fn behavior_library<W>() -> ability_core::BehaviorLibrary<W>
where
    W: BodyWorldMut + 'static,
{
    ability_core::BehaviorLibrary::new()
        .with(JumpAbility::KIND.0, JumpAbility::default)
        .with(MoveAbility::KIND.0, MoveAbility::default)
}
