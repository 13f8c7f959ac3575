//! Two-phase validator for inbound event requests.
//!
//! The structural phase runs the embedded JSON Schema over the request as
//! JSON.  The enumeration phase parses each type discriminant that is present
//! and non-blank; blank or missing ones were already reported structurally,
//! so they are not reported twice.

use std::str::FromStr;

use serde_json::{json, Value};
use tracing::{debug, warn};

use auditseal_contracts::{
    ActionType, ActorType, AuditSealError, AuditSealResult, EventRequest, KindParseError,
    ResourceType,
};
use auditseal_core::traits::Validator;

/// A required string that must contain at least one non-whitespace character.
fn required_text() -> Value {
    json!({ "type": "string", "pattern": "\\S" })
}

fn optional_text() -> Value {
    json!({ "type": ["string", "null"] })
}

/// JSON Schema for an inbound `EventRequest`.
fn request_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["actor", "action", "resource"],
        "properties": {
            "actor": {
                "type": "object",
                "required": ["id", "type"],
                "properties": {
                    "id": required_text(),
                    "type": required_text(),
                    "name": optional_text(),
                    "ip": optional_text(),
                    "userAgent": optional_text(),
                    "attributes": {
                        "type": "object",
                        "additionalProperties": { "type": "string" }
                    }
                }
            },
            "action": {
                "type": "object",
                "required": ["type"],
                "properties": {
                    "type": required_text(),
                    "description": optional_text(),
                    "category": optional_text()
                }
            },
            "resource": {
                "type": "object",
                "required": ["id", "type"],
                "properties": {
                    "id": required_text(),
                    "type": required_text(),
                    "name": optional_text()
                }
            },
            "metadata": {
                "type": ["object", "null"],
                "required": ["source", "tenantId"],
                "properties": {
                    "source": required_text(),
                    "tenantId": required_text(),
                    "correlationId": optional_text(),
                    "sessionId": optional_text(),
                    "tags": {
                        "type": "object",
                        "additionalProperties": { "type": "string" }
                    },
                    "extra": { "type": "object" }
                }
            }
        }
    })
}

/// The AuditSeal request validator.
pub struct SchemaValidator {
    schema: jsonschema::Validator,
}

impl SchemaValidator {
    /// Compile the embedded request schema.
    pub fn new() -> AuditSealResult<Self> {
        let schema =
            jsonschema::validator_for(&request_schema()).map_err(|e| AuditSealError::ConfigError {
                reason: format!("invalid request schema: {e}"),
            })?;
        Ok(Self { schema })
    }

    /// Validate a request given as raw JSON.
    ///
    /// Returns every violation found; an empty list means the value is a
    /// well-formed request.
    pub fn validate_value(&self, value: &Value) -> Vec<String> {
        let mut violations: Vec<String> = self
            .schema
            .iter_errors(value)
            .map(|error| format!("{} at '{}'", error, error.instance_path))
            .collect();

        enum_violation::<ActorType>(value, "/actor/type", &mut violations);
        enum_violation::<ActionType>(value, "/action/type", &mut violations);
        enum_violation::<ResourceType>(value, "/resource/type", &mut violations);

        if violations.is_empty() {
            debug!("request passed validation");
        } else {
            warn!(count = violations.len(), violations = ?violations, "request rejected");
        }
        violations
    }
}

/// Parse the string at `pointer` as `T` and record the failure, if any.
fn enum_violation<T>(value: &Value, pointer: &str, violations: &mut Vec<String>)
where
    T: FromStr<Err = KindParseError>,
{
    let Some(raw) = value.pointer(pointer).and_then(Value::as_str) else {
        return;
    };
    if raw.trim().is_empty() {
        return;
    }
    if let Err(e) = raw.parse::<T>() {
        violations.push(e.to_string());
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, request: &EventRequest) -> Vec<String> {
        match serde_json::to_value(request) {
            Ok(value) => self.validate_value(&value),
            Err(e) => vec![format!("request is not representable as JSON: {e}")],
        }
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use auditseal_contracts::EventRequest;
    use auditseal_core::traits::Validator;

    use super::SchemaValidator;

    // ── Builder helpers ───────────────────────────────────────────────────────

    fn raw(actor_type: &str, action_type: &str, resource_type: &str) -> Value {
        json!({
            "actor": { "id": "u1", "type": actor_type, "ip": "127.0.0.1" },
            "action": { "type": action_type },
            "resource": { "id": "doc-1", "type": resource_type },
            "metadata": { "source": "web", "tenantId": "t1" }
        })
    }

    fn request(value: Value) -> EventRequest {
        serde_json::from_value(value).unwrap()
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_valid_request_passes() {
        let validator = SchemaValidator::new().unwrap();
        let violations = validator.validate(&request(raw("USER", "CREATE", "DOCUMENT")));
        assert!(violations.is_empty(), "unexpected violations: {violations:?}");
    }

    /// Type discriminants match regardless of case.
    #[test]
    fn test_case_insensitive_types() {
        let validator = SchemaValidator::new().unwrap();
        let violations = validator.validate(&request(raw("service", "Approve", "config")));
        assert!(violations.is_empty(), "unexpected violations: {violations:?}");
    }

    /// Every unknown type is reported, not only the first.
    #[test]
    fn test_unknown_types_each_reported() {
        let validator = SchemaValidator::new().unwrap();
        let violations = validator.validate(&request(raw("ROBOT", "SMASH", "SPACESHIP")));
        assert_eq!(violations.len(), 3, "{violations:?}");
        assert!(violations[0].starts_with("Invalid actor type: ROBOT"));
        assert!(violations[1].starts_with("Invalid action type: SMASH"));
        assert!(violations[2].starts_with("Invalid resource type: SPACESHIP"));
        assert!(violations[1].contains("CREATE, READ, UPDATE"));
    }

    #[test]
    fn test_blank_identifiers_rejected() {
        let validator = SchemaValidator::new().unwrap();
        let mut value = raw("USER", "CREATE", "DOCUMENT");
        value["actor"]["id"] = json!("   ");
        value["resource"]["id"] = json!("");

        let violations = validator.validate(&request(value));
        assert_eq!(violations.len(), 2, "{violations:?}");
        assert!(violations.iter().any(|v| v.contains("/actor/id")));
        assert!(violations.iter().any(|v| v.contains("/resource/id")));
    }

    /// A blank type is a structural violation only; the enum phase skips it.
    #[test]
    fn test_blank_type_reported_once() {
        let validator = SchemaValidator::new().unwrap();
        let violations = validator.validate(&request(raw("", "CREATE", "DOCUMENT")));
        assert_eq!(violations.len(), 1, "{violations:?}");
        assert!(violations[0].contains("/actor/type"));
    }

    #[test]
    fn test_metadata_optional_but_checked_when_present() {
        let validator = SchemaValidator::new().unwrap();

        let mut value = raw("USER", "CREATE", "DOCUMENT");
        value["metadata"] = Value::Null;
        assert!(validator.validate(&request(value)).is_empty());

        let mut value = raw("USER", "CREATE", "DOCUMENT");
        value["metadata"]["tenantId"] = json!(" ");
        let violations = validator.validate(&request(value));
        assert_eq!(violations.len(), 1, "{violations:?}");
        assert!(violations[0].contains("/metadata/tenantId"));
    }

    /// Raw JSON missing whole sections is rejected without panicking.
    #[test]
    fn test_raw_value_missing_sections() {
        let validator = SchemaValidator::new().unwrap();
        let violations = validator.validate_value(&json!({
            "actor": { "id": "u1", "type": "USER" }
        }));
        assert!(violations.iter().any(|v| v.contains("action")), "{violations:?}");
        assert!(violations.iter().any(|v| v.contains("resource")), "{violations:?}");

        let violations = validator.validate_value(&json!("not an object"));
        assert!(!violations.is_empty());
    }
}
