use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Request '{request_id}' is already {status} and cannot be reviewed again")]
    InvalidState { request_id: String, status: String },

    #[error("Upstream collaborator '{collaborator}' failed: {reason}")]
    Upstream { collaborator: &'static str, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlanError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn upstream(collaborator: &'static str, reason: impl ToString) -> Self {
        Self::Upstream { collaborator, reason: reason.to_string() }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
