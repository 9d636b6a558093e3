//! Error types for reports operations

use thiserror::Error;

/// Codec (binary stream and structured text) errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Stream truncated: needed {needed} more bytes while reading {context}")]
    Truncated { context: &'static str, needed: usize },

    #[error("Invalid UTF-8 in stream string")]
    InvalidUtf8,

    #[error("Invalid {kind} tag {tag}")]
    InvalidTag { kind: &'static str, tag: u8 },

    #[error("Varint overflow while reading {context}")]
    VarintOverflow { context: &'static str },

    #[error("{remaining} trailing bytes after decode")]
    TrailingBytes { remaining: usize },

    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{field} field absent")]
    MissingField { field: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Validation errors raised while constructing requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Search backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Search backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Search backend timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Search backend rejected request on {index}: {reason}")]
    Rejected { index: String, reason: String },
}

/// Master error type for domain handlers.
#[derive(Debug, Clone, Error)]
pub enum ReportsError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Permission denied for {entity} {id}")]
    Forbidden { entity: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Stored {entity} document could not be parsed: {source}")]
    Adaptation {
        entity: &'static str,
        #[source]
        source: CodecError,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl ReportsError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn forbidden(entity: &'static str, id: impl Into<String>) -> Self {
        Self::Forbidden {
            entity,
            id: id.into(),
        }
    }

    pub fn adaptation(entity: &'static str, source: CodecError) -> Self {
        Self::Adaptation { entity, source }
    }
}

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type alias for domain operations.
pub type ReportsResult<T> = Result<T, ReportsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_missing_field_names_field() {
        let err = CodecError::MissingField {
            field: "reportInstanceList",
        };
        assert_eq!(err.to_string(), "reportInstanceList field absent");
    }

    #[test]
    fn test_adaptation_keeps_cause() {
        let err = ReportsError::adaptation(
            "report instance",
            CodecError::MissingField { field: "status" },
        );
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("status field absent"));
    }

    #[test]
    fn test_validation_converts() {
        let err: ReportsError = ValidationError::RequiredFieldMissing {
            field: "reportDefinitionId".to_string(),
        }
        .into();
        assert!(matches!(err, ReportsError::Validation(_)));
    }
}
