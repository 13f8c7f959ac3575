//! Hash-chain primitives: hashing, chain verification, and head lookup.
//!
//! Hash input layout (UTF-8, concatenated in order, no separators):
//!   1. timestamp as ISO-8601 UTC (`Z` suffix, fractional seconds only when
//!      non-zero)
//!   2. actor.id
//!   3. action type symbolic name (e.g. `CREATE`)
//!   4. resource.id
//!   5. previous_hash, or `GENESIS_HASH` when absent
//!
//! The digest is SHA-256, rendered as 64 lowercase hex characters.

use std::sync::Arc;

use chrono::SecondsFormat;
use sha2::{Digest, Sha256};
use tracing::debug;

use auditseal_contracts::{AuditSealResult, Event, SecuredEvent, GENESIS_HASH};

use crate::traits::EventRepository;

/// Compute the chain hash for `event` linked to `previous_hash`.
///
/// Pure and deterministic: the only time-dependent input is the event's own
/// `timestamp`.
pub fn calculate_hash(event: &Event, previous_hash: Option<&str>) -> String {
    let timestamp = event
        .timestamp
        .to_rfc3339_opts(SecondsFormat::AutoSi, true);

    let mut hasher = Sha256::new();
    hasher.update(timestamp.as_bytes());
    hasher.update(event.actor.id.as_bytes());
    hasher.update(event.action.action_type.as_str().as_bytes());
    hasher.update(event.resource.id.as_bytes());
    hasher.update(previous_hash.unwrap_or(GENESIS_HASH).as_bytes());

    hex::encode(hasher.finalize())
}

/// Verify linkage and hash correctness of an ordered chain.
///
/// The first event must link to `GENESIS_HASH`, each later event to the hash
/// of its predecessor, and every stored hash must match its recomputation.
/// Stops at the first mismatch.  An empty chain is valid.
pub fn verify_chain(events: &[SecuredEvent]) -> bool {
    let mut expected_previous = GENESIS_HASH;

    for secured in events {
        if secured.previous_hash != expected_previous {
            debug!(
                event_id = %secured.event.id,
                expected = %expected_previous,
                actual = %secured.previous_hash,
                "chain linkage mismatch"
            );
            return false;
        }

        let recomputed = calculate_hash(&secured.event, Some(secured.previous_hash.as_str()));
        if recomputed != secured.hash {
            debug!(event_id = %secured.event.id, "stored hash does not match content");
            return false;
        }

        expected_previous = secured.hash.as_str();
    }

    true
}

/// Chain operations bound to a repository.
///
/// `get_last_hash` reads the tenant head from the repository on every call;
/// there is no cache that could drift from what has actually been committed.
#[derive(Clone)]
pub struct HashChainEngine {
    repository: Arc<dyn EventRepository>,
}

impl HashChainEngine {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }

    /// See [`calculate_hash`].
    pub fn calculate_hash(&self, event: &Event, previous_hash: Option<&str>) -> String {
        calculate_hash(event, previous_hash)
    }

    /// See [`verify_chain`].
    pub fn verify_chain(&self, events: &[SecuredEvent]) -> bool {
        verify_chain(events)
    }

    /// Hash of the tenant's most recently committed event, or `GENESIS_HASH`.
    pub fn get_last_hash(&self, tenant_id: &str) -> AuditSealResult<String> {
        Ok(self
            .repository
            .latest_for_tenant(tenant_id)?
            .map(|latest| latest.hash)
            .unwrap_or_else(|| GENESIS_HASH.to_string()))
    }
}

impl std::fmt::Debug for HashChainEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashChainEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use auditseal_contracts::{Action, ActionType, Actor, ActorType, Resource, ResourceType};

    use super::*;

    fn event() -> Event {
        Event {
            id: Uuid::new_v4(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            actor: Actor {
                id: "u1".to_string(),
                actor_type: ActorType::User,
                name: "Ursula".to_string(),
                ip: None,
                user_agent: None,
                attributes: Default::default(),
            },
            action: Action {
                action_type: ActionType::Create,
                description: Some("created".to_string()),
                category: None,
            },
            resource: Resource {
                id: "doc-1".to_string(),
                resource_type: ResourceType::Document,
                name: "Quarterly report".to_string(),
                before: None,
                after: None,
            },
            metadata: None,
        }
    }

    #[test]
    fn hash_matches_canonical_layout() {
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"2024-03-01T12:30:00Zu1CREATEdoc-1GENESIS");
            hex::encode(hasher.finalize())
        };
        assert_eq!(calculate_hash(&event(), None), expected);
        assert_eq!(calculate_hash(&event(), Some(GENESIS_HASH)), expected);
    }

    #[test]
    fn hash_is_deterministic() {
        let e = event();
        assert_eq!(calculate_hash(&e, Some("abc")), calculate_hash(&e, Some("abc")));
        assert_eq!(calculate_hash(&e, None).len(), 64);
    }

    #[test]
    fn hash_ignores_non_canonical_fields() {
        let a = event();
        let mut b = a.clone();
        b.id = Uuid::new_v4();
        b.actor.name = "someone else".to_string();
        b.resource.after = Some(serde_json::json!({ "status": "final" }));
        assert_eq!(calculate_hash(&a, None), calculate_hash(&b, None));
    }

    #[test]
    fn each_canonical_field_changes_the_hash() {
        let base = event();
        let original = calculate_hash(&base, Some("prev"));

        let mut m = base.clone();
        m.timestamp = m.timestamp + chrono::Duration::milliseconds(1);
        assert_ne!(calculate_hash(&m, Some("prev")), original, "timestamp");

        let mut m = base.clone();
        m.actor.id = "u2".to_string();
        assert_ne!(calculate_hash(&m, Some("prev")), original, "actor.id");

        let mut m = base.clone();
        m.action.action_type = ActionType::Delete;
        assert_ne!(calculate_hash(&m, Some("prev")), original, "action.type");

        let mut m = base.clone();
        m.resource.id = "doc-2".to_string();
        assert_ne!(calculate_hash(&m, Some("prev")), original, "resource.id");

        assert_ne!(calculate_hash(&base, Some("other")), original, "previous_hash");
    }

    #[test]
    fn fractional_seconds_are_rendered() {
        let mut e = event();
        e.timestamp = Utc.timestamp_opt(1_709_296_200, 123_000_000).unwrap();
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"2024-03-01T12:30:00.123Zu1CREATEdoc-1GENESIS");
            hex::encode(hasher.finalize())
        };
        assert_eq!(calculate_hash(&e, None), expected);
    }

    #[test]
    fn empty_chain_is_valid() {
        assert!(verify_chain(&[]));
    }
}
