//! Audit event envelope and the fire-and-forget sink it is handed to.
//!
//! The scheduling core only emits events. Where they end up (event bus,
//! `audit_logs` table) is decided by whoever implements [`AuditSink`].

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Action and entity constants
// ---------------------------------------------------------------------------

/// Known action names for presence audit events.
pub mod actions {
    pub const PRESENCE_PLAN_DAY: &str = "presence.plan_day";
    pub const PRESENCE_DEACTIVATE: &str = "presence.deactivate";
}

/// Entity type recorded on presence audit events.
pub const ENTITY_STAFF_PRESENCE: &str = "staff_presence";

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// How aggressively payloads are scrubbed before they are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionLevel {
    /// Store as-is.
    None,
    /// Replace values of keys listed in [`SENSITIVE_FIELDS`].
    #[default]
    Standard,
    /// Additionally drop free-text `notes` fields.
    Strict,
}

/// A structured audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub actor_email: Option<String>,
    pub new_values: serde_json::Value,
    pub metadata: serde_json::Value,
    pub redaction_level: RedactionLevel,
    pub occurred_at: Timestamp,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            actor_id: None,
            actor_email: None,
            new_values: serde_json::Value::Object(Default::default()),
            metadata: serde_json::Value::Object(Default::default()),
            redaction_level: RedactionLevel::default(),
            occurred_at: chrono::Utc::now(),
        }
    }

    pub fn with_entity(mut self, entity_id: DbId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, actor_id: DbId, email: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id);
        self.actor_email = Some(email.into());
        self
    }

    pub fn with_new_values(mut self, values: serde_json::Value) -> Self {
        self.new_values = values;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_redaction(mut self, level: RedactionLevel) -> Self {
        self.redaction_level = level;
        self
    }

    /// The `new_values` payload after applying this event's redaction level.
    pub fn redacted_values(&self) -> serde_json::Value {
        match self.redaction_level {
            RedactionLevel::None => self.new_values.clone(),
            RedactionLevel::Standard => redact_sensitive_fields(&self.new_values, false),
            RedactionLevel::Strict => redact_sensitive_fields(&self.new_values, true),
        }
    }
}

/// Receives audit events. Implementations must not block and must not fail
/// the caller; delivery problems are logged on their side.
pub trait AuditSink: Send + Sync {
    fn log_event(&self, event: AuditEvent);
}

// ---------------------------------------------------------------------------
// Redaction
// ---------------------------------------------------------------------------

/// Keys whose values never reach the audit store verbatim.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "authorization",
    "credential",
];

const REDACTED: &str = "[REDACTED]";

/// Redact sensitive keys at any depth. With `drop_notes`, free-text `notes`
/// values are redacted too.
pub fn redact_sensitive_fields(value: &serde_json::Value, drop_notes: bool) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                let sensitive = SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f))
                    || (drop_notes && lower_key == "notes");
                if sensitive {
                    redacted.insert(key.clone(), serde_json::Value::String(REDACTED.into()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val, drop_notes));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => serde_json::Value::Array(
            arr.iter()
                .map(|v| redact_sensitive_fields(v, drop_notes))
                .collect(),
        ),
        other => other.clone(),
    }
}
