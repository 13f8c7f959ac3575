//! Closed enumerations for actor, action, and resource types.
//!
//! Inbound requests carry these as free-form strings. Parsing is
//! case-insensitive but otherwise exact: surrounding whitespace is not
//! stripped.  No match yields a `KindParseError`; an unknown value is never
//! coerced to a default variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string did not name any variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} type: {value}. Valid types: [{valid}]")]
pub struct KindParseError {
    /// Which enumeration was being parsed ("actor", "action", "resource").
    pub kind: &'static str,
    /// The rejected input, as received.
    pub value: String,
    /// Comma-separated list of accepted symbolic names.
    pub valid: String,
}

fn parse_variant<T: Copy>(
    kind: &'static str,
    value: &str,
    variants: &[(T, &'static str)],
) -> Result<T, KindParseError> {
    variants
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(value))
        .map(|(variant, _)| *variant)
        .ok_or_else(|| KindParseError {
            kind,
            value: value.to_string(),
            valid: variants
                .iter()
                .map(|(_, name)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

// ── ActorType ─────────────────────────────────────────────────────────────────

/// Who performed the audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
    User,
    System,
    Service,
}

impl ActorType {
    const VARIANTS: &'static [(ActorType, &'static str)] = &[
        (ActorType::User, "USER"),
        (ActorType::System, "SYSTEM"),
        (ActorType::Service, "SERVICE"),
    ];

    /// The canonical upper-case symbolic name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::User => "USER",
            ActorType::System => "SYSTEM",
            ActorType::Service => "SERVICE",
        }
    }
}

impl FromStr for ActorType {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("actor", s, Self::VARIANTS)
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ActionType ────────────────────────────────────────────────────────────────

/// What was done. The symbolic name participates in the event hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Create,
    Read,
    Update,
    Delete,
    Login,
    Logout,
    Export,
    Import,
    Approve,
    Reject,
    Archive,
    Restore,
}

impl ActionType {
    const VARIANTS: &'static [(ActionType, &'static str)] = &[
        (ActionType::Create, "CREATE"),
        (ActionType::Read, "READ"),
        (ActionType::Update, "UPDATE"),
        (ActionType::Delete, "DELETE"),
        (ActionType::Login, "LOGIN"),
        (ActionType::Logout, "LOGOUT"),
        (ActionType::Export, "EXPORT"),
        (ActionType::Import, "IMPORT"),
        (ActionType::Approve, "APPROVE"),
        (ActionType::Reject, "REJECT"),
        (ActionType::Archive, "ARCHIVE"),
        (ActionType::Restore, "RESTORE"),
    ];

    /// The canonical upper-case symbolic name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Create => "CREATE",
            ActionType::Read => "READ",
            ActionType::Update => "UPDATE",
            ActionType::Delete => "DELETE",
            ActionType::Login => "LOGIN",
            ActionType::Logout => "LOGOUT",
            ActionType::Export => "EXPORT",
            ActionType::Import => "IMPORT",
            ActionType::Approve => "APPROVE",
            ActionType::Reject => "REJECT",
            ActionType::Archive => "ARCHIVE",
            ActionType::Restore => "RESTORE",
        }
    }
}

impl FromStr for ActionType {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("action", s, Self::VARIANTS)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ResourceType ──────────────────────────────────────────────────────────────

/// The class of thing the action touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Document,
    User,
    Transaction,
    Config,
    File,
    Api,
    Database,
    System,
}

impl ResourceType {
    const VARIANTS: &'static [(ResourceType, &'static str)] = &[
        (ResourceType::Document, "DOCUMENT"),
        (ResourceType::User, "USER"),
        (ResourceType::Transaction, "TRANSACTION"),
        (ResourceType::Config, "CONFIG"),
        (ResourceType::File, "FILE"),
        (ResourceType::Api, "API"),
        (ResourceType::Database, "DATABASE"),
        (ResourceType::System, "SYSTEM"),
    ];

    /// The canonical upper-case symbolic name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Document => "DOCUMENT",
            ResourceType::User => "USER",
            ResourceType::Transaction => "TRANSACTION",
            ResourceType::Config => "CONFIG",
            ResourceType::File => "FILE",
            ResourceType::Api => "API",
            ResourceType::Database => "DATABASE",
            ResourceType::System => "SYSTEM",
        }
    }
}

impl FromStr for ResourceType {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("resource", s, Self::VARIANTS)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
