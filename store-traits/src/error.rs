use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store operation `{operation}` exceeded its {budget:?} budget")]
    Timeout {
        operation: &'static str,
        budget: Duration,
    },

    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Document serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
