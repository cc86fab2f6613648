use thiserror::Error;

/// Infrastructure failures raised by the storage collaborator.
///
/// Business-rule rejections (unknown ids, capacity, bad input) never use
/// this type; they come back as `false` or a rejected `Validation`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("revision conflict: expected {expected}, store is at {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
