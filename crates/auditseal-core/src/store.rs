//! The immutable store: seals events into per-tenant hash chains.
//!
//! The write path for one event is
//!
//!   resolve tenant → [lock tenant] → read head → hash → sign → append → [unlock]
//!
//! and the bracketed region is exclusive per tenant.  The repository append is
//! also a compare-and-swap on the head, so a writer outside this process (or a
//! locking bug inside it) surfaces as `ChainConflict` instead of a forked
//! chain.  Conflicts are retried a bounded number of times.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use auditseal_contracts::{
    AuditSealError, AuditSealResult, ChainReport, Event, IntegrityStatus, SecuredEvent,
};

use crate::{
    chain::HashChainEngine,
    tenant::{lock_tenant, TenantLocks},
    traits::{EventRepository, SignatureAuthority},
};

/// Tunables for `ImmutableStore`.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Extra attempts after a `ChainConflict` before giving up with
    /// `ChainContention`.
    pub max_chain_retries: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            max_chain_retries: 3,
        }
    }
}

/// Orchestrates hashing, signing, and persistence of audit events.
///
/// One store is shared by every writer in the process.  It owns the
/// per-tenant locks; the repository and signing authority are shared handles.
pub struct ImmutableStore {
    repository: Arc<dyn EventRepository>,
    authority: Arc<dyn SignatureAuthority>,
    chain: HashChainEngine,
    locks: TenantLocks,
    settings: StoreSettings,
}

impl ImmutableStore {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        authority: Arc<dyn SignatureAuthority>,
    ) -> Self {
        Self::with_settings(repository, authority, StoreSettings::default())
    }

    pub fn with_settings(
        repository: Arc<dyn EventRepository>,
        authority: Arc<dyn SignatureAuthority>,
        settings: StoreSettings,
    ) -> Self {
        let chain = HashChainEngine::new(Arc::clone(&repository));
        Self {
            repository,
            authority,
            chain,
            locks: TenantLocks::new(),
            settings,
        }
    }

    pub fn chain(&self) -> &HashChainEngine {
        &self.chain
    }

    pub fn authority(&self) -> &dyn SignatureAuthority {
        self.authority.as_ref()
    }

    /// Seal `event` into its tenant chain and persist it.
    ///
    /// Either the returned event is durably stored, or the call fails and the
    /// tenant head is unchanged.
    ///
    /// # Errors
    ///
    /// - `SigningFailed` if the authority cannot sign (nothing is written)
    /// - `PersistenceFailed` / `DuplicateEvent` from the repository
    /// - `ChainContention` if conflicts outlast the retry budget
    pub fn store(&self, event: Event) -> AuditSealResult<SecuredEvent> {
        let tenant_id = event.tenant_id().to_string();
        let handle = self.locks.handle(&tenant_id)?;
        let _guard = lock_tenant(&handle);
        self.seal_locked(&tenant_id, event)
    }

    /// Store `events` in order, holding every involved tenant lock for the
    /// whole batch.
    ///
    /// Within one tenant, batch order is chain order.  Stops at the first
    /// failure; events before it remain stored (batches are not
    /// transactional).
    pub fn store_batch(&self, events: Vec<Event>) -> AuditSealResult<Vec<SecuredEvent>> {
        let tenants: Vec<String> = events.iter().map(|e| e.tenant_id().to_string()).collect();
        let handles = self.locks.handles(tenants.iter().map(String::as_str))?;
        let _guards: Vec<_> = handles.iter().map(|h| lock_tenant(h)).collect();

        events
            .into_iter()
            .zip(&tenants)
            .map(|(event, tenant_id)| self.seal_locked(tenant_id, event))
            .collect()
    }

    /// Like `store_batch`, but keeps going after a failure and reports one
    /// result per input position.
    pub fn store_each(&self, events: Vec<Event>) -> Vec<AuditSealResult<SecuredEvent>> {
        let tenants: Vec<String> = events.iter().map(|e| e.tenant_id().to_string()).collect();
        let handles = match self.locks.handles(tenants.iter().map(String::as_str)) {
            Ok(handles) => handles,
            Err(e) => {
                let reason = e.to_string();
                return tenants
                    .iter()
                    .map(|_| {
                        Err(AuditSealError::PersistenceFailed {
                            reason: reason.clone(),
                        })
                    })
                    .collect();
            }
        };
        let _guards: Vec<_> = handles.iter().map(|h| lock_tenant(h)).collect();

        events
            .into_iter()
            .zip(&tenants)
            .map(|(event, tenant_id)| self.seal_locked(tenant_id, event))
            .collect()
    }

    /// Look up a stored event.  Never mutates.
    pub fn find_by_id(&self, id: Uuid) -> AuditSealResult<Option<SecuredEvent>> {
        self.repository.find_by_id(id)
    }

    /// Re-check one stored event.
    ///
    /// Returns `NotFound` for an unknown id; repository failures are errors,
    /// not integrity results.
    pub fn verify_integrity(&self, id: Uuid) -> AuditSealResult<IntegrityStatus> {
        let status = match self.repository.find_by_id(id)? {
            Some(secured) => self.check_integrity(&secured),
            None => IntegrityStatus::NotFound,
        };

        match status {
            IntegrityStatus::Intact => debug!(event_id = %id, "integrity verified"),
            IntegrityStatus::NotFound => debug!(event_id = %id, "integrity check on unknown event"),
            tampered => warn!(event_id = %id, status = ?tampered, "tamper detected"),
        }
        Ok(status)
    }

    /// Recompute the hash of `secured` and verify its signature.
    pub fn check_integrity(&self, secured: &SecuredEvent) -> IntegrityStatus {
        let recomputed = self
            .chain
            .calculate_hash(&secured.event, Some(secured.previous_hash.as_str()));
        if recomputed != secured.hash {
            return IntegrityStatus::ContentTampered;
        }
        if !self.authority.verify(&secured.hash, &secured.signature) {
            return IntegrityStatus::SignatureInvalid;
        }
        IntegrityStatus::Intact
    }

    /// Verify linkage, hashes, and signatures across a tenant's whole chain.
    pub fn verify_tenant_chain(&self, tenant_id: &str) -> AuditSealResult<ChainReport> {
        let events = self.repository.list_by_tenant(tenant_id)?;
        let chain_valid = self.chain.verify_chain(&events);
        let invalid_signatures: Vec<Uuid> = events
            .iter()
            .filter(|e| !self.authority.verify(&e.hash, &e.signature))
            .map(|e| e.event.id)
            .collect();

        let report = ChainReport {
            tenant_id: tenant_id.to_string(),
            length: events.len(),
            chain_valid,
            invalid_signatures,
        };
        if !report.is_valid() {
            warn!(
                tenant_id = %tenant_id,
                length = report.length,
                chain_valid = report.chain_valid,
                invalid_signatures = report.invalid_signatures.len(),
                "tenant chain failed verification"
            );
        }
        Ok(report)
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    /// Read head, hash, sign, append.  Caller must hold the tenant lock.
    fn seal_locked(&self, tenant_id: &str, event: Event) -> AuditSealResult<SecuredEvent> {
        let attempts = self.settings.max_chain_retries + 1;

        for attempt in 1..=attempts {
            let previous_hash = self.chain.get_last_hash(tenant_id)?;
            let hash = self.chain.calculate_hash(&event, Some(previous_hash.as_str()));
            let signature = self.authority.sign(&hash)?;

            let secured = SecuredEvent {
                event: event.clone(),
                previous_hash,
                hash,
                signature,
                key_id: self.authority.key_id().to_string(),
                created_at: Utc::now(),
            };

            match self.repository.append(tenant_id, &secured) {
                Ok(()) => {
                    debug!(
                        tenant_id = %tenant_id,
                        event_id = %secured.event.id,
                        hash = %secured.hash,
                        previous_hash = %secured.previous_hash,
                        "event sealed"
                    );
                    return Ok(secured);
                }
                Err(AuditSealError::ChainConflict {
                    expected, actual, ..
                }) => {
                    // The tenant lock should make this unreachable for writers
                    // in this process.
                    error!(
                        tenant_id = %tenant_id,
                        event_id = %event.id,
                        attempt,
                        expected = %expected,
                        actual = %actual,
                        "chain conflict while holding tenant lock; retrying"
                    );
                }
                Err(e) => {
                    error!(
                        tenant_id = %tenant_id,
                        event_id = %event.id,
                        error = %e,
                        "failed to persist sealed event"
                    );
                    return Err(e);
                }
            }
        }

        Err(AuditSealError::ChainContention {
            tenant_id: tenant_id.to_string(),
            attempts,
        })
    }
}

impl std::fmt::Debug for ImmutableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImmutableStore")
            .field("key_id", &self.authority.key_id())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
