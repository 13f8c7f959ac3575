//! # auditseal-config
//!
//! TOML configuration for an AuditSeal deployment.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use auditseal_config::AuditSealConfig;
//!
//! let config = AuditSealConfig::from_file(Path::new("auditseal.toml"))?;
//! println!("batches up to {}", config.ingest.max_batch_size);
//! ```
//!
//! ## Example document
//!
//! ```toml
//! [store]
//! max_chain_retries = 3
//!
//! [ingest]
//! max_batch_size = 1000
//!
//! [enrichment]
//! geo_location = true
//! user_agent = true
//! default_source = "api"
//!
//! [signing]
//! key_file = "keys/auditseal.key"
//!
//! [storage]
//! backend = "sqlite"
//! path = "data/auditseal.db"
//!
//! [logging]
//! filter = "info,auditseal_core=debug"
//! ```

pub mod loader;
pub mod section;

pub use section::{
    AuditSealConfig, EnrichmentSection, IngestSection, LoggingSection, SigningSection,
    StorageBackend, StorageSection, StoreSection,
};

// ── Tests ─────────────────────────────────────────────────────────────────────
