use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What the gateway hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: Value,
}

impl ProxyResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// `{"error": message}`. The message is usually a string but upstream
    /// details such as validation lists are relayed as they are.
    pub fn error(status: u16, message: impl Into<Value>) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message.into() }),
        }
    }
}

/// Raw reply from the upstream service. `body` is `None` when the payload
/// was not valid JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Option<Value>,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The upstream `detail`, unless it is missing or falsy (`null`, `false`,
    /// `0`, `""`). Arrays and objects count as present even when empty.
    pub fn detail(&self) -> Option<&Value> {
        self.body
            .as_ref()
            .and_then(|b| b.get("detail"))
            .filter(|d| is_truthy(d))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Per-installation settings owned by the upstream service. The gateway
/// never looks inside, so unknown keys survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserConfig(pub Map<String, Value>);

impl UserConfig {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Value> for UserConfig {
    type Error = crate::utils::error::GatewayError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(UserConfig(map)),
            other => Err(crate::utils::error::GatewayError::InvalidUserConfig {
                message: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub const UNKNOWN_EMAIL: &str = "unknown@example.com";

/// A verified Firebase ID token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedToken {
    pub uid: String,
    pub email: String,
    pub plan: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Every claim in the token, including custom ones.
    pub claims: Map<String, Value>,
}

impl DecodedToken {
    pub fn is_free_plan(&self) -> bool {
        match &self.plan {
            None => true,
            Some(plan) => plan.is_empty() || plan.eq_ignore_ascii_case("free"),
        }
    }
}
