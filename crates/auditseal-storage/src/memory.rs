//! In-memory implementation of `EventRepository`.
//!
//! Events live in a single `Vec` in append order, with per-tenant index lists
//! on the side.  Everything sits behind one `Mutex`, so the head check and the
//! push in `append` happen atomically.  Contents are lost when the process
//! exits; use the SQLite repository for anything that must survive a restart.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

use auditseal_contracts::{AuditSealError, AuditSealResult, SecuredEvent, GENESIS_HASH};
use auditseal_core::traits::EventRepository;

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct InMemoryState {
    /// Every stored event, in global append order.
    pub(crate) events: Vec<SecuredEvent>,

    /// Event id → position in `events`.
    by_id: HashMap<Uuid, usize>,

    /// Tenant id → positions in `events`, in chain order.
    by_tenant: HashMap<String, Vec<usize>>,
}

impl InMemoryState {
    fn head_hash(&self, tenant_id: &str) -> &str {
        self.by_tenant
            .get(tenant_id)
            .and_then(|positions| positions.last())
            .map(|&pos| self.events[pos].hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }
}

// ── Public repository ─────────────────────────────────────────────────────────

/// A process-local, append-only event repository.
#[derive(Default)]
pub struct InMemoryEventRepository {
    pub(crate) state: Mutex<InMemoryState>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored events across all tenants.
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tenants with at least one stored event, sorted.
    pub fn tenants(&self) -> AuditSealResult<Vec<String>> {
        let state = self.lock()?;
        let mut tenants: Vec<String> = state.by_tenant.keys().cloned().collect();
        tenants.sort();
        Ok(tenants)
    }

    fn lock(&self) -> AuditSealResult<std::sync::MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| AuditSealError::PersistenceFailed {
            reason: format!("repository state lock poisoned: {}", e),
        })
    }
}

// ── EventRepository impl ──────────────────────────────────────────────────────

impl EventRepository for InMemoryEventRepository {
    fn append(&self, tenant_id: &str, event: &SecuredEvent) -> AuditSealResult<()> {
        let mut state = self.lock()?;

        if state.by_id.contains_key(&event.event.id) {
            return Err(AuditSealError::DuplicateEvent { id: event.event.id });
        }

        let head = state.head_hash(tenant_id);
        if head != event.previous_hash {
            return Err(AuditSealError::ChainConflict {
                tenant_id: tenant_id.to_string(),
                expected: event.previous_hash.clone(),
                actual: head.to_string(),
            });
        }

        let pos = state.events.len();
        state.events.push(event.clone());
        state.by_id.insert(event.event.id, pos);
        state
            .by_tenant
            .entry(tenant_id.to_string())
            .or_default()
            .push(pos);

        debug!(tenant_id = %tenant_id, event_id = %event.event.id, position = pos, "event appended");
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> AuditSealResult<Option<SecuredEvent>> {
        let state = self.lock()?;
        Ok(state.by_id.get(&id).map(|&pos| state.events[pos].clone()))
    }

    fn latest_for_tenant(&self, tenant_id: &str) -> AuditSealResult<Option<SecuredEvent>> {
        let state = self.lock()?;
        Ok(state
            .by_tenant
            .get(tenant_id)
            .and_then(|positions| positions.last())
            .map(|&pos| state.events[pos].clone()))
    }

    fn list_by_tenant(&self, tenant_id: &str) -> AuditSealResult<Vec<SecuredEvent>> {
        let state = self.lock()?;
        Ok(state
            .by_tenant
            .get(tenant_id)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&pos| state.events[pos].clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for InMemoryEventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventRepository")
            .field("events", &self.len())
            .finish()
    }
}
