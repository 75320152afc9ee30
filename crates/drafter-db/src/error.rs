use thiserror::Error;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error("Document serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed document in {collection}/{id}: {reason}")]
    MalformedDocument {
        collection: String,
        id: String,
        reason: String,
    },
}

pub type DbResult<T> = std::result::Result<T, DbError>;
