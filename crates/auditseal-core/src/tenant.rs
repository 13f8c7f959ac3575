//! Per-tenant serialization of chain-mutating operations.
//!
//! Each tenant gets its own `Mutex<()>`.  Holding it means no other writer in
//! this process can read the tenant head, seal, and append concurrently, so
//! two events can never claim the same predecessor.  Different tenants never
//! contend.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use auditseal_contracts::{AuditSealError, AuditSealResult};

/// Registry of per-tenant locks.  Entries are created on first use.
///
/// An entry whose handle nobody else holds is idle and can be recreated on
/// demand, so idle entries are dropped whenever a new tenant is registered.
/// The registry stays proportional to the tenants currently writing.
#[derive(Debug, Default)]
pub struct TenantLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the lock handle for `tenant_id`, creating it if needed.
    ///
    /// The registry mutex is only held while looking up the entry, never
    /// while the tenant lock itself is held.
    pub fn handle(&self, tenant_id: &str) -> AuditSealResult<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|e| AuditSealError::PersistenceFailed {
            reason: format!("tenant lock registry poisoned: {e}"),
        })?;
        if let Some(existing) = locks.get(tenant_id) {
            return Ok(Arc::clone(existing));
        }

        // Only the registry holds an idle handle, and handing one out needs
        // the registry mutex, so dropping it here cannot split a tenant.
        locks.retain(|_, handle| Arc::strong_count(handle) > 1);

        let handle = Arc::new(Mutex::new(()));
        locks.insert(tenant_id.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Handles for several tenants, deduplicated and sorted by tenant id.
    ///
    /// Acquiring them in the returned order keeps multi-tenant batches from
    /// deadlocking against each other.
    pub fn handles<'a>(
        &self,
        tenant_ids: impl IntoIterator<Item = &'a str>,
    ) -> AuditSealResult<Vec<Arc<Mutex<()>>>> {
        let ordered: BTreeSet<&str> = tenant_ids.into_iter().collect();
        ordered.into_iter().map(|tenant| self.handle(tenant)).collect()
    }

    /// Number of registered tenant entries.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock one tenant handle, mapping poisoning to a persistence failure.
///
/// A poisoned tenant lock means a writer panicked mid-store.  The repository
/// append is atomic, so the head is still consistent and the guard is
/// recovered rather than wedging the tenant forever.
pub fn lock_tenant(handle: &Mutex<()>) -> MutexGuard<'_, ()> {
    handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
