//! Error type for the draw engine.
//!
//! Duplicate declarations and duplicate claims are *not* errors; they come
//! back as typed outcomes (`DrawOutcome::AlreadyDeclared`,
//! `ClaimOutcome::AlreadyClaimed`). Everything here aborts the enclosing
//! transaction.

use rust_decimal::Decimal;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // ── Caller errors ───────────────────────────────────────────
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Insufficient balance: {available} < {required}")]
    InsufficientBalance {
        available: Decimal,
        required: Decimal,
    },

    // ── Internal failures ───────────────────────────────────────
    #[error("Consistency violation: {0}")]
    Consistency(String),

    #[error("Corrupt stored record: {0}")]
    Corrupt(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Storage failures roll back cleanly and may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Database(_)
            ),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Corrupt(e.to_string())
    }
}

impl From<rust_decimal::Error> for EngineError {
    fn from(e: rust_decimal::Error) -> Self {
        Self::Corrupt(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InsufficientBalance {
            available: Decimal::new(1050, 2),
            required: Decimal::new(2000, 2),
        };
        assert_eq!(err.to_string(), "Insufficient balance: 10.50 < 20.00");

        let err = EngineError::NotFound {
            entity: "account",
            id: 7,
        };
        assert_eq!(err.to_string(), "account 7 not found");
    }

    #[test]
    fn test_retryable() {
        assert!(EngineError::Storage(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!EngineError::validation("x").is_retryable());
        assert!(!EngineError::Consistency("x".into()).is_retryable());
    }
}
