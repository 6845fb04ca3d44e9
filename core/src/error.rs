use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Batch contains no player rows")]
    EmptyBatch,

    #[error("No player identifier column found (expected one of: {expected})")]
    MissingIdColumn { expected: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type HealthResult<T> = Result<T, HealthError>;
