//! Configuration sections and their defaults.
//!
//! Every section and every key is optional in the TOML document; missing
//! values take the defaults below.  Unknown keys are rejected so that a typo
//! does not silently fall back to a default.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level AuditSeal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSealConfig {
    pub store: StoreSection,
    pub ingest: IngestSection,
    pub enrichment: EnrichmentSection,
    pub signing: SigningSection,
    pub storage: StorageSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    /// Extra attempts after a chain conflict before the store gives up.
    pub max_chain_retries: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            max_chain_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestSection {
    /// Largest accepted batch.  Empty batches are always rejected.
    pub max_batch_size: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentSection {
    /// Tag actors with a coarse `geoLocation` attribute.
    pub geo_location: bool,
    /// Tag actors with a `browserInfo` user-agent family attribute.
    pub user_agent: bool,
    /// `source` of synthesized metadata when a request carries none.
    pub default_source: String,
}

impl Default for EnrichmentSection {
    fn default() -> Self {
        Self {
            geo_location: true,
            user_agent: true,
            default_source: "api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SigningSection {
    /// Where the signing key is kept.  `None` means a fresh key per process.
    pub key_file: Option<PathBuf>,
}

/// Which `EventRepository` implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    pub backend: StorageBackend,
    /// Database file.  Required for `sqlite`, ignored for `memory`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// `tracing-subscriber` env-filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
