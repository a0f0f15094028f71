//! Domain Errors
//!
//! Error types for domain operations. Every variant names the operation that
//! was attempted so failures at the pipeline boundary stay traceable.

use serde::Serialize;
use thiserror::Error;

/// Serializable error category, exposed to API callers as `kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Upstream,
    Validation,
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::InvalidInput => write!(f, "invalid_input"),
            ErrorKind::Upstream => write!(f, "upstream"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{operation}: {entity_type} '{id}' not found")]
    NotFound {
        operation: String,
        entity_type: String,
        id: String,
    },

    #[error("{operation}: invalid input for '{field}': {message}")]
    InvalidInput {
        operation: String,
        field: String,
        message: String,
    },

    #[error("{operation}: {service} call failed: {cause}")]
    Upstream {
        operation: String,
        service: String,
        cause: String,
    },

    #[error("{operation}: validation failed for '{field}': {message}")]
    Validation {
        operation: String,
        field: String,
        message: String,
    },

    #[error("{operation}: cancelled")]
    Cancelled { operation: String },
}

impl DomainError {
    pub fn not_found(
        operation: impl Into<String>,
        entity_type: impl Into<String>,
        id: impl ToString,
    ) -> Self {
        Self::NotFound {
            operation: operation.into(),
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_input(
        operation: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            operation: operation.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn upstream(
        operation: impl Into<String>,
        service: impl Into<String>,
        cause: impl ToString,
    ) -> Self {
        Self::Upstream {
            operation: operation.into(),
            service: service.into(),
            cause: cause.to_string(),
        }
    }

    pub fn validation(
        operation: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            operation: operation.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::InvalidInput { .. } => ErrorKind::InvalidInput,
            DomainError::Upstream { .. } => ErrorKind::Upstream,
            DomainError::Validation { .. } => ErrorKind::Validation,
            DomainError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Only upstream failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Upstream { .. })
    }
}
