/// Errors produced by team membership operations.
#[derive(Debug, thiserror::Error)]
pub enum TeamError {
    #[error("forbidden: {action}: {reason}")]
    Forbidden { action: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl TeamError {
    pub fn forbidden(action: &str, reason: impl Into<String>) -> Self {
        TeamError::Forbidden {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, TeamError::Forbidden { .. })
    }
}

pub type Result<T> = std::result::Result<T, TeamError>;
