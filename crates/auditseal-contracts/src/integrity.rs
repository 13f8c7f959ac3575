//! Results of integrity checks.

use serde::{Deserialize, Serialize};

/// Outcome of checking one stored event.
///
/// `NotFound` means the check could not run; the other non-intact variants
/// mean it ran and detected tampering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    /// Recomputed hash matches and the signature verifies.
    Intact,
    /// A hashed field or `previous_hash` no longer matches the stored hash.
    ContentTampered,
    /// The hash is consistent but the signature does not verify.
    SignatureInvalid,
    /// No event with the requested id exists.
    NotFound,
}

impl IntegrityStatus {
    pub fn is_intact(&self) -> bool {
        matches!(self, IntegrityStatus::Intact)
    }
}

/// Outcome of checking a tenant's whole chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub tenant_id: String,
    /// Number of events in the chain.
    pub length: usize,
    /// Linkage and hash recomputation passed for every event.
    pub chain_valid: bool,
    /// Ids of events whose signature failed to verify.
    pub invalid_signatures: Vec<uuid::Uuid>,
}

impl ChainReport {
    pub fn is_valid(&self) -> bool {
        self.chain_valid && self.invalid_signatures.is_empty()
    }
}
