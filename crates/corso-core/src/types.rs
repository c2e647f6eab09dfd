use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller identity, established by the host before invocation.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CallerId(pub String);

impl CallerId {
    pub fn from_str(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique conversation identifier.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_str(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reply from a capability invocation.
///
/// Providers signal expected failures with `success: false`; everything
/// beyond the flag (and the optional error text) is an opaque payload the
/// interpreter passes through untouched. Steps pull named fields out of
/// `data` via their `variables` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl CapabilityReply {
    /// A successful reply carrying the given payload.
    pub fn ok(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            success: true,
            error: None,
            data,
        }
    }

    /// A provider-level failure with an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: serde_json::Map::new(),
        }
    }

    /// Get a named field from the payload.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.data.get(name)
    }

    /// Flatten the reply into a single JSON object (`success`, optional
    /// `error`, plus the payload fields), for storage on the execution
    /// context.
    pub fn into_value(self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("success".into(), serde_json::Value::Bool(self.success));
        if let Some(error) = self.error {
            map.insert("error".into(), serde_json::Value::String(error));
        }
        map.extend(self.data);
        serde_json::Value::Object(map)
    }
}
