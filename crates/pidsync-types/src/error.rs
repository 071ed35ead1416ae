use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A legacy identifier could not be split into factory PID and name.
    #[error("cannot decode legacy id {old_id:?} (alias {alias:?}): {reason}")]
    AmbiguousLegacyId {
        old_id: String,
        alias: Option<String>,
        reason: String,
    },

    /// A canonical identifier was empty or otherwise unusable.
    #[error("invalid configuration id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },
}
