use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes attached to failures the crate reports as data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No preset stored under the requested name
    PresetNotFound,

    /// Raw query parameters failed validation
    ValidationError,

    /// JSON encoding or decoding failed
    SerializationError,

    /// Webhook delivery failed
    WebhookError,

    /// Cache store failure
    CacheError,

    /// Failure raised by the data-access layer
    DataSourceError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PresetNotFound => write!(f, "PRESET_NOT_FOUND"),
            Self::ValidationError => write!(f, "VALIDATION_ERROR"),
            Self::SerializationError => write!(f, "SERIALIZATION_ERROR"),
            Self::WebhookError => write!(f, "WEBHOOK_ERROR"),
            Self::CacheError => write!(f, "CACHE_ERROR"),
            Self::DataSourceError => write!(f, "DATA_SOURCE_ERROR"),
        }
    }
}

impl ErrorCode {
    /// Classify an arbitrary error; anything not raised by this crate is
    /// attributed to the data source.
    pub fn of(error: &anyhow::Error) -> Self {
        error
            .downcast_ref::<super::QueryError>()
            .map(super::QueryError::code)
            .unwrap_or(Self::DataSourceError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QueryError;

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::PresetNotFound).unwrap();
        assert_eq!(json, "\"PRESET_NOT_FOUND\"");
        assert_eq!(ErrorCode::DataSourceError.to_string(), "DATA_SOURCE_ERROR");
    }

    #[test]
    fn test_error_code_of() {
        let crate_error = anyhow::Error::from(QueryError::PresetNotFound("recent".into()));
        assert_eq!(ErrorCode::of(&crate_error), ErrorCode::PresetNotFound);

        let foreign = anyhow::anyhow!("connection reset");
        assert_eq!(ErrorCode::of(&foreign), ErrorCode::DataSourceError);
    }
}
