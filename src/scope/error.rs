use thiserror::Error;

use super::context::ScopeDimension;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("No managed tenant selected for {operation}")]
    MissingScope { operation: String },

    #[error("Requested {dimension} does not match selected {dimension} context")]
    ScopeMismatch {
        dimension: ScopeDimension,
        requested: i64,
        pinned: i64,
    },

    #[error("Invalid SQL identifier: {0}")]
    InvalidIdentifier(String),
}

impl ScopeError {
    pub fn missing(operation: impl Into<String>) -> Self {
        ScopeError::MissingScope { operation: operation.into() }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            ScopeError::MissingScope { .. } => 400,
            ScopeError::ScopeMismatch { .. } => 403,
            ScopeError::InvalidIdentifier(_) => 500,
        }
    }
}
