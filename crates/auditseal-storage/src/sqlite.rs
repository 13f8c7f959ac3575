//! SQLite implementation of `EventRepository`.
//!
//! One row per sealed event, with the nested event fields flattened into
//! columns.  `seq` is assigned by SQLite and gives append order; the
//! `(tenant_id, seq)` index serves both "latest for tenant" and chain listing.
//!
//! The head check and the insert share one transaction, so `append` is a
//! compare-and-swap on the tenant head even across processes sharing the file.
//! Rows are never updated or deleted by this type.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

use auditseal_contracts::{
    Action, Actor, AuditSealError, AuditSealResult, Event, EventMetadata, Resource, SecuredEvent,
    GENESIS_HASH,
};
use auditseal_core::traits::EventRepository;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audit_events (
    seq                     INTEGER PRIMARY KEY AUTOINCREMENT,
    id                      TEXT NOT NULL UNIQUE,
    tenant_id               TEXT NOT NULL,
    timestamp               TEXT NOT NULL,
    actor_id                TEXT NOT NULL,
    actor_type              TEXT NOT NULL,
    actor_name              TEXT NOT NULL,
    actor_ip                TEXT,
    actor_user_agent        TEXT,
    actor_attributes        TEXT NOT NULL,
    action_type             TEXT NOT NULL,
    action_description      TEXT,
    action_category         TEXT,
    resource_id             TEXT NOT NULL,
    resource_type           TEXT NOT NULL,
    resource_name           TEXT NOT NULL,
    resource_before         TEXT,
    resource_after          TEXT,
    metadata_source         TEXT,
    metadata_tenant_id      TEXT,
    metadata_correlation_id TEXT,
    metadata_session_id     TEXT,
    metadata_tags           TEXT,
    metadata_extra          TEXT,
    previous_hash           TEXT NOT NULL,
    hash                    TEXT NOT NULL,
    signature               TEXT NOT NULL,
    key_id                  TEXT NOT NULL,
    created_at              TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_events_tenant_seq ON audit_events(tenant_id, seq);
"#;

const COLUMNS: &str = "id, timestamp, \
    actor_id, actor_type, actor_name, actor_ip, actor_user_agent, actor_attributes, \
    action_type, action_description, action_category, \
    resource_id, resource_type, resource_name, resource_before, resource_after, \
    metadata_source, metadata_tenant_id, metadata_correlation_id, metadata_session_id, \
    metadata_tags, metadata_extra, \
    previous_hash, hash, signature, key_id, created_at";

fn db_err(e: rusqlite::Error) -> AuditSealError {
    AuditSealError::PersistenceFailed {
        reason: format!("sqlite: {e}"),
    }
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> AuditSealError {
    AuditSealError::PersistenceFailed {
        reason: format!("corrupt stored column '{column}': {detail}"),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> AuditSealResult<String> {
    serde_json::to_string(value).map_err(|e| AuditSealError::PersistenceFailed {
        reason: format!("failed to encode column: {e}"),
    })
}

fn from_json<T: serde::de::DeserializeOwned>(column: &str, raw: &str) -> AuditSealResult<T> {
    serde_json::from_str(raw).map_err(|e| corrupt(column, e))
}

fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(column: &str, raw: &str) -> AuditSealResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| corrupt(column, e))
}

// ── Row mapping ───────────────────────────────────────────────────────────────

/// A raw `audit_events` row, before parsing.
struct EventRow {
    id: String,
    timestamp: String,
    actor_id: String,
    actor_type: String,
    actor_name: String,
    actor_ip: Option<String>,
    actor_user_agent: Option<String>,
    actor_attributes: String,
    action_type: String,
    action_description: Option<String>,
    action_category: Option<String>,
    resource_id: String,
    resource_type: String,
    resource_name: String,
    resource_before: Option<String>,
    resource_after: Option<String>,
    metadata_source: Option<String>,
    metadata_tenant_id: Option<String>,
    metadata_correlation_id: Option<String>,
    metadata_session_id: Option<String>,
    metadata_tags: Option<String>,
    metadata_extra: Option<String>,
    previous_hash: String,
    hash: String,
    signature: String,
    key_id: String,
    created_at: String,
}

impl EventRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            timestamp: row.get("timestamp")?,
            actor_id: row.get("actor_id")?,
            actor_type: row.get("actor_type")?,
            actor_name: row.get("actor_name")?,
            actor_ip: row.get("actor_ip")?,
            actor_user_agent: row.get("actor_user_agent")?,
            actor_attributes: row.get("actor_attributes")?,
            action_type: row.get("action_type")?,
            action_description: row.get("action_description")?,
            action_category: row.get("action_category")?,
            resource_id: row.get("resource_id")?,
            resource_type: row.get("resource_type")?,
            resource_name: row.get("resource_name")?,
            resource_before: row.get("resource_before")?,
            resource_after: row.get("resource_after")?,
            metadata_source: row.get("metadata_source")?,
            metadata_tenant_id: row.get("metadata_tenant_id")?,
            metadata_correlation_id: row.get("metadata_correlation_id")?,
            metadata_session_id: row.get("metadata_session_id")?,
            metadata_tags: row.get("metadata_tags")?,
            metadata_extra: row.get("metadata_extra")?,
            previous_hash: row.get("previous_hash")?,
            hash: row.get("hash")?,
            signature: row.get("signature")?,
            key_id: row.get("key_id")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Parse the raw columns into a sealed event.
    fn into_secured(self) -> AuditSealResult<SecuredEvent> {
        let row = self;
        let id = Uuid::parse_str(&row.id).map_err(|e| corrupt("id", e))?;

        let metadata = match row.metadata_source {
            Some(source) => Some(EventMetadata {
                source,
                tenant_id: row.metadata_tenant_id.unwrap_or_default(),
                correlation_id: row.metadata_correlation_id,
                session_id: row.metadata_session_id,
                tags: match row.metadata_tags {
                    Some(raw) => from_json("metadata_tags", &raw)?,
                    None => BTreeMap::new(),
                },
                extra: match row.metadata_extra {
                    Some(raw) => from_json("metadata_extra", &raw)?,
                    None => BTreeMap::new(),
                },
            }),
            None => None,
        };

        let event = Event {
            id,
            timestamp: parse_timestamp("timestamp", &row.timestamp)?,
            actor: Actor {
                id: row.actor_id,
                actor_type: row
                    .actor_type
                    .parse()
                    .map_err(|e| corrupt("actor_type", e))?,
                name: row.actor_name,
                ip: row.actor_ip,
                user_agent: row.actor_user_agent,
                attributes: from_json("actor_attributes", &row.actor_attributes)?,
            },
            action: Action {
                action_type: row
                    .action_type
                    .parse()
                    .map_err(|e| corrupt("action_type", e))?,
                description: row.action_description,
                category: row.action_category,
            },
            resource: Resource {
                id: row.resource_id,
                resource_type: row
                    .resource_type
                    .parse()
                    .map_err(|e| corrupt("resource_type", e))?,
                name: row.resource_name,
                before: row
                    .resource_before
                    .map(|raw| from_json("resource_before", &raw))
                    .transpose()?,
                after: row
                    .resource_after
                    .map(|raw| from_json("resource_after", &raw))
                    .transpose()?,
            },
            metadata,
        };

        Ok(SecuredEvent {
            event,
            previous_hash: row.previous_hash,
            hash: row.hash,
            signature: row.signature,
            key_id: row.key_id,
            created_at: parse_timestamp("created_at", &row.created_at)?,
        })
    }
}

// ── Public repository ─────────────────────────────────────────────────────────

/// A durable, append-only event repository backed by one SQLite database.
pub struct SqliteEventRepository {
    pub(crate) conn: Mutex<Connection>,
}

impl SqliteEventRepository {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> AuditSealResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening sqlite event repository");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AuditSealError::PersistenceFailed {
                reason: format!("failed to create '{}': {}", parent.display(), e),
            })?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        conn.pragma_update(None, "synchronous", "FULL")
            .map_err(db_err)?;

        Self::with_connection(conn)
    }

    /// A private in-memory database, for tests and ephemeral runs.
    pub fn in_memory() -> AuditSealResult<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(db_err)?)
    }

    fn with_connection(conn: Connection) -> AuditSealResult<Self> {
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Total number of stored events across all tenants.
    pub fn count(&self) -> AuditSealResult<u64> {
        let conn = self.lock()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM audit_events", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(n as u64)
    }

    fn lock(&self) -> AuditSealResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| AuditSealError::PersistenceFailed {
            reason: format!("sqlite connection lock poisoned: {}", e),
        })
    }

    fn query_one(
        conn: &Connection,
        sql: &str,
        param: &str,
    ) -> AuditSealResult<Option<SecuredEvent>> {
        conn.query_row(sql, [param], EventRow::read)
            .optional()
            .map_err(db_err)?
            .map(EventRow::into_secured)
            .transpose()
    }
}

// ── EventRepository impl ──────────────────────────────────────────────────────

impl EventRepository for SqliteEventRepository {
    fn append(&self, tenant_id: &str, event: &SecuredEvent) -> AuditSealResult<()> {
        let e = &event.event;
        let meta = e.metadata.as_ref();

        // Encode before taking the lock; nothing below can fail on content.
        let actor_attributes = to_json(&e.actor.attributes)?;
        let resource_before = e.resource.before.as_ref().map(to_json).transpose()?;
        let resource_after = e.resource.after.as_ref().map(to_json).transpose()?;
        let metadata_tags = meta.map(|m| to_json(&m.tags)).transpose()?;
        let metadata_extra = meta.map(|m| to_json(&m.extra)).transpose()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let duplicate = tx
            .query_row(
                "SELECT 1 FROM audit_events WHERE id = ?1",
                [e.id.to_string()],
                |_| Ok(()),
            )
            .optional()
            .map_err(db_err)?;
        if duplicate.is_some() {
            return Err(AuditSealError::DuplicateEvent { id: e.id });
        }

        let head: String = tx
            .query_row(
                "SELECT hash FROM audit_events WHERE tenant_id = ?1 ORDER BY seq DESC LIMIT 1",
                [tenant_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        if head != event.previous_hash {
            return Err(AuditSealError::ChainConflict {
                tenant_id: tenant_id.to_string(),
                expected: event.previous_hash.clone(),
                actual: head,
            });
        }

        tx.execute(
            &format!(
                "INSERT INTO audit_events (tenant_id, {COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
                  ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)"
            ),
            params![
                tenant_id,
                e.id.to_string(),
                timestamp_text(&e.timestamp),
                e.actor.id,
                e.actor.actor_type.as_str(),
                e.actor.name,
                e.actor.ip,
                e.actor.user_agent,
                actor_attributes,
                e.action.action_type.as_str(),
                e.action.description,
                e.action.category,
                e.resource.id,
                e.resource.resource_type.as_str(),
                e.resource.name,
                resource_before,
                resource_after,
                meta.map(|m| m.source.as_str()),
                meta.map(|m| m.tenant_id.as_str()),
                meta.and_then(|m| m.correlation_id.as_deref()),
                meta.and_then(|m| m.session_id.as_deref()),
                metadata_tags,
                metadata_extra,
                event.previous_hash,
                event.hash,
                event.signature,
                event.key_id,
                timestamp_text(&event.created_at),
            ],
        )
        .map_err(db_err)?;
        let seq = tx.last_insert_rowid();
        tx.commit().map_err(db_err)?;

        debug!(tenant_id = %tenant_id, event_id = %e.id, seq, "event appended");
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> AuditSealResult<Option<SecuredEvent>> {
        let conn = self.lock()?;
        Self::query_one(
            &conn,
            &format!("SELECT {COLUMNS} FROM audit_events WHERE id = ?1"),
            &id.to_string(),
        )
    }

    fn latest_for_tenant(&self, tenant_id: &str) -> AuditSealResult<Option<SecuredEvent>> {
        let conn = self.lock()?;
        Self::query_one(
            &conn,
            &format!(
                "SELECT {COLUMNS} FROM audit_events WHERE tenant_id = ?1 \
                 ORDER BY seq DESC LIMIT 1"
            ),
            tenant_id,
        )
    }

    fn list_by_tenant(&self, tenant_id: &str) -> AuditSealResult<Vec<SecuredEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM audit_events WHERE tenant_id = ?1 ORDER BY seq ASC"
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map([tenant_id], EventRow::read)
            .map_err(db_err)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(db_err)?.into_secured()?);
        }
        Ok(events)
    }
}

impl std::fmt::Debug for SqliteEventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEventRepository").finish_non_exhaustive()
    }
}
