//! Types for the task store and entitlement source APIs

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Task store client configuration
#[derive(Debug, Clone)]
pub struct TaskStoreConfig {
    /// Base URL of the task store HTTP API
    pub base_url: String,
    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
}

impl Default for TaskStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Entitlement source client configuration
///
/// One client serves exactly one signed-in customer.
#[derive(Debug, Clone)]
pub struct EntitlementConfig {
    /// Base URL of the entitlement source HTTP API
    pub base_url: String,
    /// Customer the grants are resolved for
    pub customer_id: String,
    /// Optional API key, sent as a bearer token
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
    /// Health probes attempted by `wait_for_ready`
    pub ready_attempts: u32,
    /// Pause between health probes in milliseconds
    pub ready_backoff_ms: u64,
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            customer_id: String::new(),
            api_key: None,
            timeout_secs: 10,
            ready_attempts: 20,
            ready_backoff_ms: 500,
        }
    }
}

// ==================== Tasks ====================

/// A task record as owned by the task store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier
    pub id: u64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    /// Creation time, as a naive local timestamp from the store
    pub created_at: NaiveDateTime,
}

/// Body for `POST /tasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreate {
    pub title: String,
    pub description: String,
}

/// Body for `PUT /tasks/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskUpdate {
    /// Update that only sets the completion flag
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }
}

/// Response from `DELETE /tasks/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

// ==================== Entitlements ====================

/// Entitlement for one feature as reported by the source
///
/// The same shape carries numeric, boolean and metered grants; a field the
/// source does not set (or sets to something unreadable) comes back `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub has_access: Option<bool>,
    /// Numeric configuration value
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub usage_limit: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_unlimited: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_usage: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub usage_period_end: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub access_denied_reason: Option<String>,
}

/// Body for `POST /v1/usage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub customer_id: String,
    pub feature_id: String,
    pub value: u64,
}

/// Reads a field as `Some` only when it parses as `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_metered_response() {
        let json = r#"{"hasAccess": true, "currentUsage": 3}"#;
        let parsed: EntitlementResponse = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.has_access, Some(true));
        assert_eq!(parsed.current_usage, Some(3));
        assert_eq!(parsed.usage_limit, None);
        assert_eq!(parsed.usage_period_end, None);
    }

    #[test]
    fn test_malformed_fields_read_as_absent() {
        let json = r#"{
            "usageLimit": "lots",
            "currentUsage": -4,
            "usagePeriodEnd": "tomorrow",
            "hasAccess": null,
            "value": 120
        }"#;
        let parsed: EntitlementResponse = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.usage_limit, None);
        assert_eq!(parsed.current_usage, None);
        assert_eq!(parsed.usage_period_end, None);
        assert_eq!(parsed.has_access, None);
        assert_eq!(parsed.value, Some(120));
    }

    #[test]
    fn test_period_end_parses_rfc3339() {
        let json = r#"{"usagePeriodEnd": "2026-10-17T13:00:00Z"}"#;
        let parsed: EntitlementResponse = serde_json::from_str(json).unwrap();

        let end = parsed.usage_period_end.unwrap();
        assert_eq!(end.to_rfc3339(), "2026-10-17T13:00:00+00:00");
    }

    #[test]
    fn test_task_from_store_payload() {
        let json = r#"{
            "id": 7,
            "title": "Water plants",
            "description": "",
            "completed": false,
            "created_at": "2026-10-17T09:15:02.481516"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.id, 7);
        assert!(!task.completed);
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let body = serde_json::to_string(&TaskUpdate::completed(true)).unwrap();
        assert_eq!(body, r#"{"completed":true}"#);
    }
}
