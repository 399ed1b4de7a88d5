use thiserror::Error;

/// Errors raised while recording or reporting a profile.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("a profiling session is already active on this thread")]
    SessionActive,

    #[error("unrecognized sort key: {0:?}")]
    UnknownSortKey(String),

    #[error("invalid print restriction: {0}")]
    InvalidRestriction(String),

    #[error("failed to encode profile statistics: {0}")]
    Encode(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
