//! HTTP-shaped chat responses
//!
//! Every response carries the same JSON and CORS headers and a JSON string
//! body. Both success and error bodies report the serving agent identity.

use crate::config::AgentTarget;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";
pub const PREFLIGHT_MESSAGE: &str = "CORS preflight successful";

/// Headers attached to every chat response
pub fn cors_headers() -> BTreeMap<String, String> {
    [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Methods", "POST, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type, Authorization"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Agent identity echoed in response bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentIdentity {
    pub name: String,
    pub id: String,
    pub alias_id: String,
}

impl From<&AgentTarget> for AgentIdentity {
    fn from(target: &AgentTarget) -> Self {
        Self {
            name: target.name.clone(),
            id: target.id.clone(),
            alias_id: target.alias_id.clone(),
        }
    }
}

/// Proxy-style response: status, headers and a JSON string body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    fn new(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            headers: cors_headers(),
            body: body.to_string(),
        }
    }

    pub fn preflight() -> Self {
        Self::new(200, json!({ "message": PREFLIGHT_MESSAGE }))
    }

    pub fn success(message: &str, session_id: &str, agent: &AgentIdentity) -> Self {
        Self::new(
            200,
            json!({
                "response": message,
                "sessionId": session_id,
                "timestamp": timestamp(),
                "status": "success",
                "agent": agent,
            }),
        )
    }

    pub fn error(message: &str, status_code: u16, agent: &AgentIdentity) -> Self {
        Self::new(
            status_code,
            json!({
                "error": message,
                "timestamp": timestamp(),
                "status": "error",
                "agent": agent,
            }),
        )
    }

    pub fn internal_error(agent: &AgentIdentity) -> Self {
        Self::error(INTERNAL_ERROR_MESSAGE, 500, agent)
    }

    /// Decode the JSON body
    pub fn json_body(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
