//! # auditseal-ingest
//!
//! The front half of the AuditSeal pipeline: [`DefaultEnricher`] and the
//! [`IngestionService`] that runs validate → enrich → store for single events
//! and batches.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auditseal_ingest::{DefaultEnricher, IngestionService};
//! use auditseal_validate::SchemaValidator;
//!
//! let service = IngestionService::new(
//!     Arc::new(SchemaValidator::new()?),
//!     Arc::new(DefaultEnricher::default()),
//!     store,
//! );
//! let sealed = service.ingest(request)?;
//! let report = service.ingest_batch(requests)?;
//! ```

pub mod enrich;
pub mod pipeline;

pub use enrich::{DefaultEnricher, EnrichmentOptions};
pub use pipeline::{BatchItemError, BatchReport, IngestionService, DEFAULT_MAX_BATCH_SIZE};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use auditseal_contracts::{AuditSealError, EventRequest, DEFAULT_TENANT, GENESIS_HASH};
    use auditseal_core::ImmutableStore;
    use auditseal_crypto::EcdsaSignatureAuthority;
    use auditseal_storage::InMemoryEventRepository;
    use auditseal_validate::SchemaValidator;

    use super::{DefaultEnricher, IngestionService};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn service() -> IngestionService {
        let store = ImmutableStore::new(
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(EcdsaSignatureAuthority::generate()),
        );
        IngestionService::new(
            Arc::new(SchemaValidator::new().unwrap()),
            Arc::new(DefaultEnricher::default()),
            Arc::new(store),
        )
    }

    fn request(tenant: &str, action: &str, resource_id: &str) -> EventRequest {
        serde_json::from_value(json!({
            "actor": { "id": "u1", "type": "USER", "ip": "127.0.0.1", "userAgent": "Firefox/121.0" },
            "action": { "type": action },
            "resource": { "id": resource_id, "type": "DOCUMENT" },
            "metadata": { "source": "web", "tenantId": tenant }
        }))
        .unwrap()
    }

    // ── Single events ─────────────────────────────────────────────────────────

    #[test]
    fn test_ingest_seals_enriched_event() {
        let service = service();
        let sealed = service.ingest(request("t1", "create", "doc-1")).unwrap();

        assert_eq!(sealed.previous_hash, GENESIS_HASH);
        assert!(!sealed.hash.is_empty());
        assert!(!sealed.signature.is_empty());
        assert_eq!(sealed.tenant_id(), "t1");
        assert_eq!(
            sealed.event.actor.attributes.get("browserInfo").map(String::as_str),
            Some("Firefox")
        );
        assert!(sealed.event.metadata.as_ref().unwrap().correlation_id.is_some());
        assert!(service.store().verify_integrity(sealed.id()).unwrap().is_intact());
    }

    /// A rejected request reports every violation and stores nothing.
    #[test]
    fn test_invalid_request_is_not_stored() {
        let service = service();
        match service.ingest(request("t1", "SMASH", "")) {
            Err(AuditSealError::ValidationFailed { violations }) => {
                assert_eq!(violations.len(), 2, "{violations:?}");
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
        assert_eq!(service.store().verify_tenant_chain("t1").unwrap().length, 0);
    }

    #[test]
    fn test_missing_metadata_goes_to_default_tenant() {
        let service = service();
        let mut req = request("ignored", "READ", "doc-1");
        req.metadata = None;
        let sealed = service.ingest(req).unwrap();

        assert_eq!(sealed.tenant_id(), DEFAULT_TENANT);
        assert_eq!(sealed.event.metadata.as_ref().unwrap().source, "api");
        assert_eq!(
            service.store().verify_tenant_chain(DEFAULT_TENANT).unwrap().length,
            1
        );
    }

    // ── Batches ───────────────────────────────────────────────────────────────

    /// Valid items are stored and chained in order; invalid ones are reported
    /// by index without stopping the batch.
    #[test]
    fn test_batch_partial_success() {
        let service = service();
        let report = service
            .ingest_batch(vec![
                request("t1", "CREATE", "doc-1"),
                request("t1", "EXPLODE", "doc-2"),
                request("t1", "UPDATE", "doc-3"),
                request("t2", "DELETE", "doc-4"),
            ])
            .unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 1);
        assert!(!report.is_complete_success());

        let error = &report.errors[0];
        assert_eq!(error.index, 1);
        assert!(error.message.contains("validation failed"));
        assert!(error.violations[0].starts_with("Invalid action type: EXPLODE"));

        let stored = &report.stored;
        assert_eq!(stored[0].previous_hash, GENESIS_HASH);
        assert_eq!(stored[1].previous_hash, stored[0].hash);
        assert_eq!(stored[2].tenant_id(), "t2");
        assert_eq!(stored[2].previous_hash, GENESIS_HASH);
        assert!(service.store().verify_tenant_chain("t1").unwrap().is_valid());
    }

    #[test]
    fn test_batch_size_bounds() {
        let service = service().with_max_batch_size(2);

        assert!(matches!(
            service.ingest_batch(Vec::new()),
            Err(AuditSealError::ValidationFailed { .. })
        ));

        let too_many = (0..3)
            .map(|i| request("t1", "CREATE", &format!("doc-{i}")))
            .collect();
        match service.ingest_batch(too_many) {
            Err(AuditSealError::ValidationFailed { violations }) => {
                assert!(violations[0].contains("between 1 and 2"), "{violations:?}");
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
        assert_eq!(service.store().verify_tenant_chain("t1").unwrap().length, 0);

        let report = service
            .ingest_batch(vec![request("t1", "CREATE", "a"), request("t1", "READ", "a")])
            .unwrap();
        assert!(report.is_complete_success());
    }

    /// Concurrent batches for one tenant still form a single valid chain.
    #[test]
    fn test_concurrent_batches_single_chain() {
        let service = service();
        std::thread::scope(|s| {
            for w in 0..4 {
                let service = &service;
                s.spawn(move || {
                    let batch = (0..5)
                        .map(|i| request("shared", "CREATE", &format!("w{w}-doc-{i}")))
                        .collect();
                    let report = service.ingest_batch(batch).unwrap();
                    assert!(report.is_complete_success());
                });
            }
        });
        let report = service.store().verify_tenant_chain("shared").unwrap();
        assert_eq!(report.length, 20);
        assert!(report.is_valid());
    }
}
