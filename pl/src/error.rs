//! Inbound event validation errors

use thiserror::Error;

/// Reasons an inbound event is rejected at the ingestion boundary.
///
/// These never propagate through the ingestion path: the panel logs them and
/// drops the offending event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Event payload is not a JSON object")]
    NotAnObject,

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Field {field} must be {expected}, got {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("Field {field} is not a finite number")]
    NotFinite { field: &'static str },

    #[error("Duration must be >= 0, got {duration}")]
    NegativeDuration { duration: f64 },

    #[error("Unknown entryType '{value}' (expected 'mark' or 'measure')")]
    InvalidEntryType { value: String },

    #[error("Unknown event method: {method}")]
    UnknownMethod { method: String },
}

impl ValidationError {
    /// The payload field this error refers to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::WrongType { field, .. }
            | ValidationError::NotFinite { field } => Some(*field),
            ValidationError::NegativeDuration { .. } => Some("duration"),
            ValidationError::InvalidEntryType { .. } => Some("entryType"),
            ValidationError::NotAnObject | ValidationError::UnknownMethod { .. } => None,
        }
    }
}
