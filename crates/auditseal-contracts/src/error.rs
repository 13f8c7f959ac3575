//! Error taxonomy for the AuditSeal pipeline.
//!
//! All fallible operations return `AuditSealResult<T>`.  Tamper detection is
//! deliberately absent here: a failed integrity check is a result value, not
//! an error.

use thiserror::Error;
use uuid::Uuid;

/// The unified error type for AuditSeal crates.
#[derive(Debug, Error)]
pub enum AuditSealError {
    /// The request failed structural or enumeration checks.  Nothing was stored.
    #[error("event validation failed: {}", violations.join("; "))]
    ValidationFailed { violations: Vec<String> },

    /// The tenant head moved between reading it and appending.
    ///
    /// Retried internally by the store; only seen by callers of a repository.
    #[error("chain conflict for tenant '{tenant_id}': expected head {expected}, found {actual}")]
    ChainConflict {
        tenant_id: String,
        expected: String,
        actual: String,
    },

    /// Chain conflicts persisted through every retry.  Transient; safe to retry.
    #[error("chain for tenant '{tenant_id}' still contended after {attempts} attempts")]
    ChainContention { tenant_id: String, attempts: u32 },

    /// The durable write did not complete.  No partial record exists.
    #[error("persistence failed: {reason}")]
    PersistenceFailed { reason: String },

    /// An event with this id is already stored.
    #[error("event {id} already exists")]
    DuplicateEvent { id: Uuid },

    /// The signing operation itself failed.
    #[error("signing failed: {reason}")]
    SigningFailed { reason: String },

    /// Signing key material could not be loaded, decoded, or written.
    #[error("key material error: {reason}")]
    KeyMaterial { reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl AuditSealError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuditSealError::ChainContention { .. } | AuditSealError::PersistenceFailed { .. }
        )
    }
}

/// Convenience alias used throughout the AuditSeal crates.
pub type AuditSealResult<T> = Result<T, AuditSealError>;
