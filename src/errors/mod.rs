//! Errors raised by the crate itself.
//!
//! Data-source failures are never wrapped: they travel as the `anyhow::Error`
//! the source returned. Only failures owned by this crate use [`QueryError`].

pub mod codes;

pub use codes::ErrorCode;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Webhook request failed: {0}")]
    Webhook(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl QueryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PresetNotFound(_) => ErrorCode::PresetNotFound,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Serialization(_) => ErrorCode::SerializationError,
            Self::Webhook(_) => ErrorCode::WebhookError,
            Self::Cache(_) => ErrorCode::CacheError,
        }
    }
}
