//! The ingestion pipeline:
//!
//!   request → Validator → map to draft → Enricher → ImmutableStore
//!
//! A request that fails validation never reaches the store.  Batches are
//! not transactional: each item succeeds or fails on its own and failures are
//! reported by position.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use auditseal_contracts::{AuditSealError, AuditSealResult, Event, EventRequest, SecuredEvent};
use auditseal_core::{
    traits::{Enricher, Validator},
    ImmutableStore,
};

/// Default upper bound on batch size.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Why one batch item was not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemError {
    /// Position of the item in the submitted batch.
    pub index: usize,
    pub message: String,
    /// Validation violations; empty for non-validation failures.
    pub violations: Vec<String>,
}

/// Outcome of `ingest_batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Stored events, in submission order.
    pub stored: Vec<SecuredEvent>,
    /// Failures, ordered by index.
    pub errors: Vec<BatchItemError>,
}

impl BatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

pub struct IngestionService {
    validator: Arc<dyn Validator>,
    enricher: Arc<dyn Enricher>,
    store: Arc<ImmutableStore>,
    max_batch_size: usize,
}

impl IngestionService {
    pub fn new(
        validator: Arc<dyn Validator>,
        enricher: Arc<dyn Enricher>,
        store: Arc<ImmutableStore>,
    ) -> Self {
        Self {
            validator,
            enricher,
            store,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn store(&self) -> &ImmutableStore {
        &self.store
    }

    /// Validate, enrich, and store one event.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` with every violation found, or any error from
    /// `ImmutableStore::store`.
    pub fn ingest(&self, request: EventRequest) -> AuditSealResult<SecuredEvent> {
        let event = self.prepare(request)?;
        self.store.store(event)
    }

    /// Ingest up to `max_batch_size` events, reporting failures per index.
    ///
    /// Valid items are stored in submission order while every involved
    /// tenant is locked, so items of one tenant chain in batch order.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` if the batch is empty or too large.  Per-item
    /// failures are reported in the returned `BatchReport`, not as `Err`.
    pub fn ingest_batch(&self, requests: Vec<EventRequest>) -> AuditSealResult<BatchReport> {
        let total = requests.len();
        if total == 0 || total > self.max_batch_size {
            return Err(AuditSealError::ValidationFailed {
                violations: vec![format!(
                    "batch must contain between 1 and {} events, got {}",
                    self.max_batch_size, total
                )],
            });
        }

        let mut errors = Vec::new();
        let mut positions = Vec::with_capacity(total);
        let mut events = Vec::with_capacity(total);
        for (index, request) in requests.into_iter().enumerate() {
            match self.prepare(request) {
                Ok(event) => {
                    positions.push(index);
                    events.push(event);
                }
                Err(e) => errors.push(item_error(index, e)),
            }
        }

        let mut stored = Vec::with_capacity(events.len());
        for (index, result) in positions.into_iter().zip(self.store.store_each(events)) {
            match result {
                Ok(secured) => stored.push(secured),
                Err(e) => errors.push(item_error(index, e)),
            }
        }
        errors.sort_by_key(|e| e.index);

        let report = BatchReport {
            total,
            succeeded: stored.len(),
            failed: errors.len(),
            stored,
            errors,
        };
        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            "batch ingested"
        );
        Ok(report)
    }

    /// Validate and enrich without storing.
    pub fn prepare(&self, request: EventRequest) -> AuditSealResult<Event> {
        let violations = self.validator.validate(&request);
        if !violations.is_empty() {
            warn!(count = violations.len(), "event rejected by validation");
            return Err(AuditSealError::ValidationFailed { violations });
        }
        let draft = request
            .into_draft()
            .map_err(|violations| AuditSealError::ValidationFailed { violations })?;
        Ok(self.enricher.enrich(draft))
    }
}

fn item_error(index: usize, error: AuditSealError) -> BatchItemError {
    let message = error.to_string();
    let violations = match error {
        AuditSealError::ValidationFailed { violations } => violations,
        _ => Vec::new(),
    };
    BatchItemError {
        index,
        message,
        violations,
    }
}

impl std::fmt::Debug for IngestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionService")
            .field("store", &self.store)
            .field("max_batch_size", &self.max_batch_size)
            .finish_non_exhaustive()
    }
}
