//! Default enrichment: identity, time, metadata, and derived actor tags.
//!
//! Enrichment never rejects an event.  A derived tag that cannot be computed
//! is simply not added.

use std::net::IpAddr;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use auditseal_contracts::{Actor, Event, EventDraft, EventMetadata, DEFAULT_TENANT};
use auditseal_core::traits::Enricher;

/// Actor attribute holding the coarse location class.
pub const GEO_LOCATION_ATTRIBUTE: &str = "geoLocation";

/// Actor attribute holding the user-agent family.
pub const BROWSER_INFO_ATTRIBUTE: &str = "browserInfo";

/// Which enrichments to apply.
#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    pub geo_location: bool,
    pub user_agent: bool,
    /// `source` of metadata synthesized for requests that carry none.
    pub default_source: String,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            geo_location: true,
            user_agent: true,
            default_source: "api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DefaultEnricher {
    options: EnrichmentOptions,
}

impl DefaultEnricher {
    pub fn new(options: EnrichmentOptions) -> Self {
        Self { options }
    }

    /// Add derived tags to an actor with a network address.  Actors without
    /// one are returned unchanged.  Existing attributes are kept; a derived
    /// tag replaces an attribute of the same name.
    fn enrich_actor(&self, mut actor: Actor) -> Actor {
        let Some(ip) = actor.ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty()) else {
            return actor;
        };

        if self.options.geo_location {
            let location = geo_location(ip);
            actor
                .attributes
                .insert(GEO_LOCATION_ATTRIBUTE.to_string(), location.to_string());
        }

        if self.options.user_agent {
            if let Some(family) = actor.user_agent.as_deref().and_then(browser_family) {
                actor
                    .attributes
                    .insert(BROWSER_INFO_ATTRIBUTE.to_string(), family.to_string());
            }
        }

        actor
    }

    fn enrich_metadata(&self, metadata: Option<EventMetadata>) -> EventMetadata {
        match metadata {
            None => EventMetadata {
                source: self.options.default_source.clone(),
                tenant_id: DEFAULT_TENANT.to_string(),
                correlation_id: Some(Uuid::new_v4().to_string()),
                session_id: None,
                tags: Default::default(),
                extra: Default::default(),
            },
            Some(mut metadata) => {
                let blank = metadata
                    .correlation_id
                    .as_deref()
                    .map_or(true, |id| id.trim().is_empty());
                if blank {
                    metadata.correlation_id = Some(Uuid::new_v4().to_string());
                }
                metadata
            }
        }
    }
}

impl Enricher for DefaultEnricher {
    fn enrich(&self, draft: EventDraft) -> Event {
        let event = Event {
            id: draft.id.unwrap_or_else(Uuid::new_v4),
            timestamp: draft.timestamp.unwrap_or_else(Utc::now),
            actor: self.enrich_actor(draft.actor),
            action: draft.action,
            resource: draft.resource,
            metadata: Some(self.enrich_metadata(draft.metadata)),
        };
        debug!(event_id = %event.id, tenant_id = %event.tenant_id(), "event enriched");
        event
    }
}

/// "Local" for loopback addresses and `localhost`, "Unknown" otherwise.
pub fn geo_location(ip: &str) -> &'static str {
    let loopback = ip.eq_ignore_ascii_case("localhost")
        || ip.parse::<IpAddr>().map_or(false, |addr| addr.is_loopback());
    if loopback {
        "Local"
    } else {
        "Unknown"
    }
}

/// Coarse browser family from a user-agent string, or `None` when empty.
///
/// Edge and Chrome both advertise "Chrome", and Chrome advertises "Safari",
/// so the more specific tokens are checked first.
pub fn browser_family(user_agent: &str) -> Option<&'static str> {
    if user_agent.trim().is_empty() {
        return None;
    }
    let family = if user_agent.contains("Edg") {
        "Edge"
    } else if user_agent.contains("Chrome") {
        "Chrome"
    } else if user_agent.contains("Firefox") {
        "Firefox"
    } else if user_agent.contains("Safari") {
        "Safari"
    } else {
        "Other"
    };
    Some(family)
}
