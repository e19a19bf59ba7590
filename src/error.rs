#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("pairing constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("score out of range: {0}")]
    InvalidScore(i64),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Stable code string used by the IPC layer.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::ConstraintViolation(_) => "constraint_violation",
            CoreError::InvalidScore(_) => "invalid_score",
            CoreError::NotFound(_) => "not_found",
            CoreError::Conflict(_) => "conflict",
            CoreError::Storage(_) => "storage_error",
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(e: rusqlite::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}
