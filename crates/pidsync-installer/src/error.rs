use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("merge configuration error: {0}")]
    Merge(#[from] pidsync_merge::MergeError),

    #[error("invalid installer configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type InstallerResult<T> = Result<T, InstallerError>;
