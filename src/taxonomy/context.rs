//! Where and for whom an error happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Optional context attached to an [`ErrorRecord`](super::ErrorRecord).
///
/// Every field is optional. Context is merged rather than overwritten, so a
/// record raised with a component name keeps it when the handler later adds
/// the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Free-form debugging data (endpoint, field names, file metadata...).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>, role: Option<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.user_role = role;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add a metadata entry. Values that fail to serialize are skipped.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), v);
        }
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill every unset field from `fallback`. Fields already present win,
    /// including individual metadata keys.
    pub fn merged_with(mut self, fallback: &ErrorContext) -> Self {
        fn fill<T: Clone>(slot: &mut Option<T>, from: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(from);
            }
        }

        fill(&mut self.user_id, &fallback.user_id);
        fill(&mut self.user_role, &fallback.user_role);
        fill(&mut self.url, &fallback.url);
        fill(&mut self.action, &fallback.action);
        fill(&mut self.component, &fallback.component);
        fill(&mut self.timestamp, &fallback.timestamp);
        for (key, value) in &fallback.metadata {
            self.metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }
}
