//! # auditseal-contracts
//!
//! Shared types and contracts for the AuditSeal tamper-evident event store.
//!
//! Every other crate in the workspace imports from here.  No business logic
//! lives in this crate: only the event model, inbound request shapes, the
//! closed type enumerations, and the error taxonomy.

pub mod error;
pub mod event;
pub mod integrity;
pub mod kind;
pub mod request;

pub use error::{AuditSealError, AuditSealResult};
pub use event::{
    Action, Actor, Event, EventDraft, EventMetadata, Resource, SecuredEvent, DEFAULT_TENANT,
    GENESIS_HASH,
};
pub use integrity::{ChainReport, IntegrityStatus};
pub use kind::{ActionType, ActorType, KindParseError, ResourceType};
pub use request::{ActionRequest, ActorRequest, EventMetadataRequest, EventRequest, ResourceRequest};

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn request(actor_type: &str, action_type: &str, resource_type: &str) -> EventRequest {
        serde_json::from_value(json!({
            "actor": { "id": "u1", "type": actor_type },
            "action": { "type": action_type, "description": "created a document" },
            "resource": { "id": "doc-1", "type": resource_type },
            "metadata": { "source": "web", "tenantId": "t1" }
        }))
        .unwrap()
    }

    fn event(metadata: Option<EventMetadata>) -> Event {
        Event {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor: Actor {
                id: "u1".to_string(),
                actor_type: ActorType::User,
                name: "u1".to_string(),
                ip: None,
                user_agent: None,
                attributes: Default::default(),
            },
            action: Action {
                action_type: ActionType::Create,
                description: None,
                category: None,
            },
            resource: Resource {
                id: "doc-1".to_string(),
                resource_type: ResourceType::Document,
                name: "doc-1".to_string(),
                before: None,
                after: None,
            },
            metadata,
        }
    }

    fn metadata(tenant: &str) -> EventMetadata {
        EventMetadata {
            source: "api".to_string(),
            tenant_id: tenant.to_string(),
            correlation_id: None,
            session_id: None,
            tags: Default::default(),
            extra: Default::default(),
        }
    }

    // ── Kinds ─────────────────────────────────────────────────────────────────

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("user".parse::<ActorType>().unwrap(), ActorType::User);
        assert_eq!("Service".parse::<ActorType>().unwrap(), ActorType::Service);
        assert_eq!("approve".parse::<ActionType>().unwrap(), ActionType::Approve);
        assert_eq!("dataBASE".parse::<ResourceType>().unwrap(), ResourceType::Database);
    }

    #[test]
    fn kinds_with_surrounding_whitespace_are_rejected() {
        let err = " user ".parse::<ActorType>().unwrap_err();
        assert_eq!(err.value, " user ");
        assert!("CREATE\n".parse::<ActionType>().is_err());
    }

    #[test]
    fn unknown_kind_is_a_typed_error_not_a_default() {
        let err = "robot".parse::<ActorType>().unwrap_err();
        assert_eq!(err.kind, "actor");
        assert_eq!(err.value, "robot");
        let msg = err.to_string();
        assert!(msg.contains("Invalid actor type: robot"), "got: {msg}");
        assert!(msg.contains("USER, SYSTEM, SERVICE"), "got: {msg}");
    }

    #[test]
    fn action_symbolic_name_is_upper_case() {
        assert_eq!(ActionType::Create.as_str(), "CREATE");
        assert_eq!(ActionType::Restore.to_string(), "RESTORE");
        assert_eq!(serde_json::to_value(ActionType::Logout).unwrap(), json!("LOGOUT"));
    }

    // ── Request mapping ───────────────────────────────────────────────────────

    #[test]
    fn into_draft_defaults_names_to_ids() {
        let draft = request("user", "create", "document").into_draft().unwrap();
        assert_eq!(draft.actor.name, "u1");
        assert_eq!(draft.resource.name, "doc-1");
        assert_eq!(draft.action.action_type, ActionType::Create);
        assert!(draft.id.is_none());
        assert!(draft.timestamp.is_none());
        assert_eq!(draft.metadata.unwrap().tenant_id, "t1");
    }

    #[test]
    fn into_draft_reports_every_bad_kind() {
        let violations = request("robot", "explode", "planet").into_draft().unwrap_err();
        assert_eq!(violations.len(), 3);
        assert!(violations[0].contains("actor"));
        assert!(violations[1].contains("action"));
        assert!(violations[2].contains("resource"));
    }

    // ── Tenant resolution ─────────────────────────────────────────────────────

    #[test]
    fn tenant_falls_back_to_default() {
        assert_eq!(event(None).tenant_id(), DEFAULT_TENANT);
        assert_eq!(event(Some(metadata("  "))).tenant_id(), DEFAULT_TENANT);
        assert_eq!(event(Some(metadata("acme"))).tenant_id(), "acme");
    }

    #[test]
    fn secured_event_serializes_flat() {
        let secured = SecuredEvent {
            event: event(Some(metadata("acme"))),
            previous_hash: GENESIS_HASH.to_string(),
            hash: "ab".repeat(32),
            signature: "c2ln".to_string(),
            key_id: "0011223344556677".to_string(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&secured).unwrap();
        assert_eq!(value["previousHash"], json!("GENESIS"));
        assert_eq!(value["actor"]["id"], json!("u1"));
        assert_eq!(value["metadata"]["tenantId"], json!("acme"));

        let decoded: SecuredEvent = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, secured);
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    #[test]
    fn validation_error_lists_violations() {
        let err = AuditSealError::ValidationFailed {
            violations: vec!["first".to_string(), "second".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("first; second"), "got: {msg}");
        assert!(!err.is_retryable());
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(AuditSealError::ChainContention {
            tenant_id: "t".to_string(),
            attempts: 3
        }
        .is_retryable());
        assert!(AuditSealError::PersistenceFailed {
            reason: "disk full".to_string()
        }
        .is_retryable());
        assert!(!AuditSealError::SigningFailed {
            reason: "no key".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn integrity_status_distinguishes_not_found() {
        assert!(IntegrityStatus::Intact.is_intact());
        assert!(!IntegrityStatus::NotFound.is_intact());
        assert_ne!(IntegrityStatus::NotFound, IntegrityStatus::ContentTampered);
    }
}
