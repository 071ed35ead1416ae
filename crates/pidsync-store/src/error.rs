/// Errors from configuration store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed configuration does not exist.
    #[error("configuration not found: {0}")]
    NotFound(String),

    /// A lookup filter could not be parsed.
    #[error("invalid filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },

    /// Persistence is temporarily unavailable; the operation may be retried.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether the failure is expected to clear on its own.
    ///
    /// Transient failures are retried later by the caller's scheduler;
    /// everything else is reported as a failed operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Io(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::Unavailable("down".into()).is_transient());
        assert!(StoreError::Io(std::io::Error::other("disk")).is_transient());
        assert!(!StoreError::NotFound("x".into()).is_transient());
        assert!(!StoreError::InvalidFilter {
            filter: "(".into(),
            reason: "unbalanced".into()
        }
        .is_transient());
    }
}
