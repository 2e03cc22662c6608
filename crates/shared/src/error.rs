//! Error types for Gatehouse

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatehouseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type GatehouseResult<T> = Result<T, GatehouseError>;
