//! Error types for the progression engine.
//!
//! Four-way taxonomy: validation (bad input, rejected before any write),
//! not-found (unknown user/relationship), conflict (concurrent-write
//! collision at the store boundary, retried by the orchestrator), and
//! store (collaborator I/O failure, propagated unchanged).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            what,
            id: id.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }

    /// Whether the orchestrator may retry the failed step.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(Error::conflict("version moved").is_retryable());
        assert!(!Error::validation("bad amount").is_retryable());
        assert!(!Error::not_found("user", "u1").is_retryable());
        assert!(!Error::store("io").is_retryable());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("user", "u42");
        assert_eq!(err.to_string(), "user not found: u42");
    }
}
