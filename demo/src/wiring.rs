//! Builds the ingestion pipeline from an `AuditSealConfig`.

use std::sync::Arc;

use tracing::info;

use auditseal_config::{AuditSealConfig, StorageBackend};
use auditseal_contracts::{AuditSealError, AuditSealResult};
use auditseal_core::{
    traits::{EventRepository, SignatureAuthority},
    ImmutableStore, StoreSettings,
};
use auditseal_crypto::{EcdsaSignatureAuthority, SigningKeypair};
use auditseal_ingest::{DefaultEnricher, EnrichmentOptions, IngestionService};
use auditseal_storage::{InMemoryEventRepository, SqliteEventRepository};
use auditseal_validate::SchemaValidator;

pub fn repository(config: &AuditSealConfig) -> AuditSealResult<Arc<dyn EventRepository>> {
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryEventRepository::new())),
        StorageBackend::Sqlite => {
            let path = config
                .storage
                .path
                .as_ref()
                .ok_or_else(|| AuditSealError::ConfigError {
                    reason: "storage.path is required when backend = \"sqlite\"".to_string(),
                })?;
            Ok(Arc::new(SqliteEventRepository::open(path)?))
        }
    }
}

pub fn authority(config: &AuditSealConfig) -> AuditSealResult<Arc<dyn SignatureAuthority>> {
    let authority = match &config.signing.key_file {
        Some(path) => EcdsaSignatureAuthority::from_keypair(&SigningKeypair::load_or_generate(path)?),
        None => {
            let authority = EcdsaSignatureAuthority::generate();
            info!(key_id = %authority.key_id(), "using ephemeral signing key");
            authority
        }
    };
    Ok(Arc::new(authority))
}

pub fn ingestion_service(config: &AuditSealConfig) -> AuditSealResult<IngestionService> {
    let store = ImmutableStore::with_settings(
        repository(config)?,
        authority(config)?,
        StoreSettings {
            max_chain_retries: config.store.max_chain_retries,
        },
    );
    let enricher = DefaultEnricher::new(EnrichmentOptions {
        geo_location: config.enrichment.geo_location,
        user_agent: config.enrichment.user_agent,
        default_source: config.enrichment.default_source.clone(),
    });

    Ok(IngestionService::new(
        Arc::new(SchemaValidator::new()?),
        Arc::new(enricher),
        Arc::new(store),
    )
    .with_max_batch_size(config.ingest.max_batch_size))
}
