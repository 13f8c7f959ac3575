//! Loading and checking `AuditSealConfig`.

use std::path::Path;

use tracing::debug;

use auditseal_contracts::{AuditSealError, AuditSealResult};

use crate::section::{AuditSealConfig, StorageBackend};

impl AuditSealConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `AuditSealError::ConfigError` if the TOML is malformed, has
    /// unknown keys, or fails `validate`.
    pub fn from_toml_str(s: &str) -> AuditSealResult<Self> {
        let config: AuditSealConfig = toml::from_str(s).map_err(|e| AuditSealError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it with `from_toml_str`.
    pub fn from_file(path: &Path) -> AuditSealResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AuditSealError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), backend = ?config.storage.backend, "configuration loaded");
        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> AuditSealResult<()> {
        if self.ingest.max_batch_size == 0 {
            return Err(config_error("ingest.max_batch_size must be at least 1"));
        }
        if self.enrichment.default_source.trim().is_empty() {
            return Err(config_error("enrichment.default_source must not be blank"));
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.is_none() {
            return Err(config_error("storage.path is required when backend = \"sqlite\""));
        }
        Ok(())
    }
}

fn config_error(reason: &str) -> AuditSealError {
    AuditSealError::ConfigError {
        reason: reason.to_string(),
    }
}
