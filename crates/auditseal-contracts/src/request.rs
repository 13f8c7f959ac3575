//! Inbound event requests, as received from the ingestion front-end.
//!
//! Type discriminants are plain strings here.  `EventRequest::into_draft`
//! performs the typed parse; callers run the validator first so that every
//! violation is reported at once rather than only the first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    event::{Action, Actor, EventDraft, EventMetadata, Resource},
    kind::{ActionType, ActorType, ResourceType},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub actor_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub before: Option<serde_json::Value>,
    #[serde(default)]
    pub after: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadataRequest {
    pub source: String,
    pub tenant_id: String,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One event as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    pub actor: ActorRequest,
    pub action: ActionRequest,
    pub resource: ResourceRequest,
    #[serde(default)]
    pub metadata: Option<EventMetadataRequest>,
}

impl EventRequest {
    /// Convert into an `EventDraft`, parsing the three type discriminants.
    ///
    /// Returns every parse failure as a violation message.  Missing display
    /// names default to the corresponding id.  `id` and `timestamp` are left
    /// empty for the enricher to assign.
    pub fn into_draft(self) -> Result<EventDraft, Vec<String>> {
        let mut violations = Vec::new();

        let actor_type = self
            .actor
            .actor_type
            .parse::<ActorType>()
            .map_err(|e| violations.push(e.to_string()))
            .ok();
        let action_type = self
            .action
            .action_type
            .parse::<ActionType>()
            .map_err(|e| violations.push(e.to_string()))
            .ok();
        let resource_type = self
            .resource
            .resource_type
            .parse::<ResourceType>()
            .map_err(|e| violations.push(e.to_string()))
            .ok();

        let (Some(actor_type), Some(action_type), Some(resource_type)) =
            (actor_type, action_type, resource_type)
        else {
            return Err(violations);
        };

        let actor = Actor {
            name: non_blank(self.actor.name).unwrap_or_else(|| self.actor.id.clone()),
            id: self.actor.id,
            actor_type,
            ip: self.actor.ip,
            user_agent: self.actor.user_agent,
            attributes: self.actor.attributes,
        };

        let action = Action {
            action_type,
            description: self.action.description,
            category: self.action.category,
        };

        let resource = Resource {
            name: non_blank(self.resource.name).unwrap_or_else(|| self.resource.id.clone()),
            id: self.resource.id,
            resource_type,
            before: self.resource.before,
            after: self.resource.after,
        };

        let metadata = self.metadata.map(|m| EventMetadata {
            source: m.source,
            tenant_id: m.tenant_id,
            correlation_id: m.correlation_id,
            session_id: m.session_id,
            tags: m.tags,
            extra: m.extra,
        });

        Ok(EventDraft {
            id: None,
            timestamp: None,
            actor,
            action,
            resource,
            metadata,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
