//! The audit event model.
//!
//! An event moves through three shapes:
//!
//! - `EventDraft`: mapped from an inbound request; `id`, `timestamp`, and
//!   `metadata` may still be absent.
//! - `Event`: enriched and complete, but not yet bound into a tenant chain.
//! - `SecuredEvent`: an `Event` plus `previous_hash`, `hash`, and
//!   `signature`.  This is the only shape that is ever persisted, and it is
//!   never mutated afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::{ActionType, ActorType, ResourceType};

/// `previous_hash` of the first event in every tenant chain.
pub const GENESIS_HASH: &str = "GENESIS";

/// Tenant used when an event carries no metadata or a blank tenant id.
pub const DEFAULT_TENANT: &str = "default";

/// The party that performed the action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    #[serde(rename = "type")]
    pub actor_type: ActorType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Free-form attributes.  Enrichment adds keys here but never removes any.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// What the actor did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// The object the action was performed on, with optional before/after images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
}

/// Routing and correlation data.  `tenant_id` selects the hash chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub source: String,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// An event as mapped from a request, before enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub id: Option<Uuid>,
    pub timestamp: Option<DateTime<Utc>>,
    pub actor: Actor,
    pub action: Action,
    pub resource: Resource,
    pub metadata: Option<EventMetadata>,
}

/// A complete event, ready to be sealed into its tenant's chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub actor: Actor,
    pub action: Action,
    pub resource: Resource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
}

impl Event {
    /// The tenant whose chain this event belongs to.
    ///
    /// Falls back to `DEFAULT_TENANT` when metadata is absent or the tenant id
    /// is blank, so every event resolves to exactly one chain.
    pub fn tenant_id(&self) -> &str {
        match &self.metadata {
            Some(meta) if !meta.tenant_id.trim().is_empty() => &meta.tenant_id,
            _ => DEFAULT_TENANT,
        }
    }
}

/// An event bound into its tenant chain and signed.
///
/// Serialized flat: the `Event` fields appear at the top level next to the
/// chain fields, matching the persisted record layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuredEvent {
    #[serde(flatten)]
    pub event: Event,

    /// Hash of the preceding event in this tenant's chain, or `GENESIS_HASH`.
    pub previous_hash: String,

    /// Lowercase hex SHA-256 over the canonical fields and `previous_hash`.
    pub hash: String,

    /// Base64 DER ECDSA signature over `hash`.
    pub signature: String,

    /// Identifier of the key that produced `signature`.
    pub key_id: String,

    /// Wall-clock time (UTC) the event was sealed.
    pub created_at: DateTime<Utc>,
}

impl SecuredEvent {
    pub fn id(&self) -> Uuid {
        self.event.id
    }

    pub fn tenant_id(&self) -> &str {
        self.event.tenant_id()
    }
}
