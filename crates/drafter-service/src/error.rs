use thiserror::Error;

use drafter_core::types::DraftStatus;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] drafter_db::error::DbError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Draft {draft_id} is {status} and cannot be changed this way")]
    InvalidState {
        draft_id: uuid::Uuid,
        status: DraftStatus,
    },

    #[error("Draft is incomplete; missing {}", .missing_fields.join(", "))]
    Incomplete { missing_fields: Vec<&'static str> },
}

impl ServiceError {
    pub(crate) fn draft_not_found(draft_id: uuid::Uuid) -> Self {
        Self::NotFound(format!("draft {draft_id}"))
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
