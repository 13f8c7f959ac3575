//! Trait seams of the AuditSeal pipeline.
//!
//! - `Validator`: rejects malformed requests before any state changes
//! - `Enricher`: fills defaults and derived metadata, never rejects
//! - `SignatureAuthority`: signs and verifies chain hashes
//! - `EventRepository`: durable, append-only persistence
//!
//! `ImmutableStore` wires the last two together with the hash chain; the
//! ingestion service puts the first two in front of it.

use uuid::Uuid;

use auditseal_contracts::{AuditSealResult, Event, EventDraft, EventRequest, SecuredEvent};

/// Structural and enumeration checks on an inbound request.
pub trait Validator: Send + Sync {
    /// Return every violation found.  An empty list means the request may be
    /// ingested.  Must not have side effects.
    fn validate(&self, request: &EventRequest) -> Vec<String>;
}

/// Completes a draft into an `Event`.
pub trait Enricher: Send + Sync {
    /// Assign missing id, timestamp, and metadata, and add derived actor
    /// attributes.  Enrichment failures degrade to "not applied"; this never
    /// rejects an event.
    fn enrich(&self, draft: EventDraft) -> Event;
}

/// Holder of the process signing key.
///
/// Implementations are shared by all concurrent writers without locking, so
/// `sign` and `verify` must be safe to call from many threads at once.
pub trait SignatureAuthority: Send + Sync {
    /// Sign the hash string.  Returns an encoded signature.
    fn sign(&self, hash: &str) -> AuditSealResult<String>;

    /// Return false for empty, malformed, or non-verifying signatures.
    /// Never errors.
    fn verify(&self, hash: &str, signature: &str) -> bool;

    /// Stable identifier of the public key, recorded on every sealed event.
    fn key_id(&self) -> &str;
}

/// Append-only event persistence.
///
/// Implementations never update or delete a stored event.  `append` doubles
/// as a compare-and-swap on the tenant head: if the current head hash for
/// `tenant_id` is not `event.previous_hash`, it must fail with
/// `AuditSealError::ChainConflict` and write nothing.
pub trait EventRepository: Send + Sync {
    /// Durably append a sealed event to the tenant's chain.
    fn append(&self, tenant_id: &str, event: &SecuredEvent) -> AuditSealResult<()>;

    /// Look up one event by id.
    fn find_by_id(&self, id: Uuid) -> AuditSealResult<Option<SecuredEvent>>;

    /// The most recently appended event for the tenant.  Must reflect every
    /// append that has returned `Ok`.
    fn latest_for_tenant(&self, tenant_id: &str) -> AuditSealResult<Option<SecuredEvent>>;

    /// Every event for the tenant, in append order.
    fn list_by_tenant(&self, tenant_id: &str) -> AuditSealResult<Vec<SecuredEvent>>;
}
