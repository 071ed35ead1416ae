use thiserror::Error;

/// Errors raised while configuring the merge engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("merge scheme list is empty")]
    EmptySchemeList,

    #[error("invalid merge scheme '{scheme}': {reason}")]
    InvalidScheme { scheme: String, reason: String },
}

pub type MergeResult<T> = Result<T, MergeError>;
