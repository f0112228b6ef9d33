use crate::source::Slot;

pub type Result<T, E = ModelError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("{0} is frozen and cannot be modified")]
    ReadOnly(String),
    #[error("`{key}` is already declared in {container}")]
    Duplicate { container: String, key: String },
    #[error("`{key}` is not declared in {container}")]
    NotFound { container: String, key: String },
    #[error("`{0}` cannot declare itself as a super-type")]
    SelfSupertype(String),
    #[error("`{owner}` cannot declare `{supertype}` as a super-type: {reason}")]
    IllegalSupertype { owner: String, supertype: String, reason: &'static str },
    #[error("inheritance cycle: {}", .0.join(" -> "))]
    InheritanceCycle(Vec<String>),
    #[error("`{0}` is not a legal name")]
    InvalidName(String),
    #[error("{0} already has a parent")]
    AlreadyAttached(String),
    #[error("{0} cannot contain {1}")]
    Misplaced(String, String),
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("cannot merge {0} with {1}")]
    KindMismatch(String, String),
}

impl ModelError {
    pub(crate) fn duplicate(owner: String, slot: Slot, key: impl Into<String>) -> Self {
        Self::Duplicate { container: format!("{} of {owner}", slot.label()), key: key.into() }
    }

    pub(crate) fn not_found(owner: String, slot: Slot, key: impl Into<String>) -> Self {
        Self::NotFound { container: format!("{} of {owner}", slot.label()), key: key.into() }
    }
}
