use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::token::CorrelationToken;

/// Resource type CloudFormation reports for the stack itself in its event
/// stream, as opposed to the resources it contains.
pub const STACK_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";

/// Reason CloudFormation attaches to resources whose update was cancelled
/// because a sibling resource failed.
pub const UPDATE_CANCELLED_REASON: &str = "Resource update cancelled";

// ---------------------------------------------------------------------------
// ParameterOverride
// ---------------------------------------------------------------------------

/// A requested `key=value` change. Key and value are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterOverride {
    pub key: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// StackParameter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    Explicit(String),
    UsePrevious,
}

/// One entry of the update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackParameter {
    pub key: String,
    pub value: ParameterValue,
}

impl StackParameter {
    pub fn explicit(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: ParameterValue::Explicit(value.into()),
        }
    }

    pub fn use_previous(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: ParameterValue::UsePrevious,
        }
    }

    pub fn is_use_previous(&self) -> bool {
        self.value == ParameterValue::UsePrevious
    }
}

impl fmt::Display for StackParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ParameterValue::Explicit(v) => write!(f, "{}: {}", self.key, v),
            ParameterValue::UsePrevious => write!(f, "{} (use the previous value)", self.key),
        }
    }
}

// ---------------------------------------------------------------------------
// StackSnapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentParameter {
    pub key: String,
    pub value: String,
}

/// The stack as described once at the start of a run. Never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackSnapshot {
    pub parameters: Vec<CurrentParameter>,
    pub capabilities: Vec<String>,
    pub notification_targets: Vec<String>,
}

impl StackSnapshot {
    pub fn current_value(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResourceStatus
// ---------------------------------------------------------------------------

/// The subset of CloudFormation resource statuses the monitor reacts to.
/// Everything else is carried through verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    UpdateInProgress,
    UpdateComplete,
    UpdateFailed,
    UpdateRollbackComplete,
    UpdateRollbackFailed,
    RollbackFailed,
    Other(String),
}

impl ResourceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceStatus::UpdateInProgress => "UPDATE_IN_PROGRESS",
            ResourceStatus::UpdateComplete => "UPDATE_COMPLETE",
            ResourceStatus::UpdateFailed => "UPDATE_FAILED",
            ResourceStatus::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            ResourceStatus::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            ResourceStatus::RollbackFailed => "ROLLBACK_FAILED",
            ResourceStatus::Other(s) => s,
        }
    }
}

impl From<&str> for ResourceStatus {
    fn from(s: &str) -> Self {
        match s {
            "UPDATE_IN_PROGRESS" => ResourceStatus::UpdateInProgress,
            "UPDATE_COMPLETE" => ResourceStatus::UpdateComplete,
            "UPDATE_FAILED" => ResourceStatus::UpdateFailed,
            "UPDATE_ROLLBACK_COMPLETE" => ResourceStatus::UpdateRollbackComplete,
            "UPDATE_ROLLBACK_FAILED" => ResourceStatus::UpdateRollbackFailed,
            "ROLLBACK_FAILED" => ResourceStatus::RollbackFailed,
            other => ResourceStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StackEvent / EventPage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StackEvent {
    /// Events without a timestamp are never treated as stale.
    pub timestamp: Option<DateTime<Utc>>,
    pub resource_type: String,
    pub logical_resource_id: String,
    pub resource_status: ResourceStatus,
    pub status_reason: String,
    pub correlation_token: Option<String>,
}

/// One page of describe-stack-events output.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<StackEvent>,
    pub next_token: Option<String>,
}

// ---------------------------------------------------------------------------
// UpdateRequest
// ---------------------------------------------------------------------------

/// Everything an update-stack call carries. The template is always reused.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub stack_name: String,
    pub token: CorrelationToken,
    pub parameters: Vec<StackParameter>,
    pub capabilities: Vec<String>,
    pub notification_targets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_status_round_trips_known_and_unknown() {
        for s in [
            "UPDATE_IN_PROGRESS",
            "UPDATE_COMPLETE",
            "UPDATE_FAILED",
            "UPDATE_ROLLBACK_COMPLETE",
            "UPDATE_ROLLBACK_FAILED",
            "ROLLBACK_FAILED",
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
        ] {
            assert_eq!(ResourceStatus::from(s).as_str(), s);
        }
        assert_eq!(
            ResourceStatus::from("CREATE_COMPLETE"),
            ResourceStatus::Other("CREATE_COMPLETE".into())
        );
    }

    #[test]
    fn stack_parameter_display() {
        assert_eq!(StackParameter::explicit("ImageTag", "v2").to_string(), "ImageTag: v2");
        assert_eq!(
            StackParameter::use_previous("Env").to_string(),
            "Env (use the previous value)"
        );
    }

    #[test]
    fn snapshot_current_value_lookup() {
        let snapshot = StackSnapshot {
            parameters: vec![CurrentParameter {
                key: "Env".into(),
                value: "prod".into(),
            }],
            ..Default::default()
        };
        assert_eq!(snapshot.current_value("Env"), Some("prod"));
        assert_eq!(snapshot.current_value("Missing"), None);
    }
}
