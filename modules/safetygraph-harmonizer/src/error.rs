use safetygraph_common::{RawFieldError, SafetyGraphError};
use thiserror::Error;

/// Why a single raw record could not be harmonized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarmonizeError {
    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("field {field} has an unusable value: {value}")]
    InvalidField { field: String, value: String },
}

impl From<RawFieldError> for HarmonizeError {
    fn from(e: RawFieldError) -> Self {
        match e {
            RawFieldError::NotAMapping(kind) => {
                Self::Malformed(format!("expected a key/value mapping, got {kind}"))
            }
            RawFieldError::InvalidValue { field, value } => Self::InvalidField { field, value },
        }
    }
}

impl From<HarmonizeError> for SafetyGraphError {
    fn from(e: HarmonizeError) -> Self {
        SafetyGraphError::MalformedRecord(e.to_string())
    }
}
