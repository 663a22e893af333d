//! # Status Types
//!
//! Status sub-documents for both kinds and the shared `Condition` type.

use serde::{Deserialize, Serialize};

/// Status of a `Condition`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

/// Condition represents a typed observation about a resource
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g. `Ready`)
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,
    /// Machine-readable reason for the last transition
    pub reason: String,
    /// Human-readable detail
    #[serde(default)]
    pub message: String,
    /// Generation the condition was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Last time `status` changed (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Insert or replace the condition with the same type.
///
/// `last_transition_time` is carried over from the existing condition when the
/// status did not change, and stamped with the current time otherwise.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) {
    match conditions
        .iter_mut()
        .find(|existing| existing.r#type == condition.r#type)
    {
        Some(existing) => {
            if existing.status == condition.status {
                condition.last_transition_time = existing
                    .last_transition_time
                    .take()
                    .or(condition.last_transition_time);
            } else if condition.last_transition_time.is_none() {
                condition.last_transition_time = Some(chrono::Utc::now().to_rfc3339());
            }
            *existing = condition;
        }
        None => {
            if condition.last_transition_time.is_none() {
                condition.last_transition_time = Some(chrono::Utc::now().to_rfc3339());
            }
            conditions.push(condition);
        }
    }
}

/// Look up a condition by type
#[must_use]
pub fn find_condition<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Reachability of a `SchemaRegistry` as of the last probe
///
/// An absent value in status is the initial "unknown" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConnectionStatus {
    Connected,
    Unreachable,
}

/// Observed state of a `SchemaRegistry`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRegistryStatus {
    /// Outcome of the last connectivity probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_status: Option<ConnectionStatus>,
    /// Time of the last connectivity probe (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
    /// Generation of the spec the last probe was run against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Observed state of a `Schema`
///
/// Registration fields serialize `None` as `null` so a merge patch clears them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStatus {
    /// ID assigned by the registry
    #[serde(default)]
    pub schema_id: Option<i64>,
    /// Latest version under the subject at registration time
    #[serde(default)]
    pub version: Option<i64>,
    /// Time of the last successful registration (RFC3339)
    #[serde(default)]
    pub registered_at: Option<String>,
    /// Generation of the spec that was last registered
    #[serde(default)]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Whether the cleanup finalizer was attached when status was last written
    #[serde(default)]
    pub finalizer_present: bool,
}
