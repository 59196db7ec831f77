use thiserror::Error;

/// Domain-level errors shared across application components.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced course instance or person does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested write would break a registration invariant. The payload
    /// is a stable code callers translate into a user-facing message.
    #[error("validation error: {0}")]
    Validation(String),

    /// Catch-all for storage-related failures we don't want to leak directly.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Any other unexpected failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(code: impl Into<String>) -> Self {
        Self::Validation(code.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Validation code carried by the error, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Validation(code) => Some(code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
