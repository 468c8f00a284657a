use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl StatsError {
    pub fn storage(msg: impl Into<String>) -> Self {
        StatsError::Storage(msg.into())
    }
}
