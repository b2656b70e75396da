use thiserror::Error;

use crate::AbilityTag;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbilityError {
    #[error("ability {tag} is already initialized")]
    AlreadyInitialized { tag: AbilityTag },
    #[error("ability {tag} must be initialized first")]
    NotInitialized { tag: AbilityTag },
    #[error("tag {tag} is already registered by another ability ({existing})")]
    DuplicateTag { tag: AbilityTag, existing: String },
    #[error("ability {tag} is running under another agent")]
    RunningElsewhere { tag: AbilityTag },
    #[error("no possessed ability at index {0}")]
    UnknownHandle(usize),
}
