//! Action-group invocation event and response envelope
//!
//! The agent platform calls the course service as a tool. It sends an
//! action event (path plus named parameters) and expects the result JSON
//! encoded as a string inside a fixed envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

pub const MESSAGE_VERSION: &str = "1.0";
pub const DEFAULT_ACTION_GROUP: &str = "CourseActionGroup";
pub const DEFAULT_HTTP_METHOD: &str = "GET";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Inbound action invocation
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    #[serde(default)]
    pub action_group: Option<String>,
    #[serde(default)]
    pub api_path: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub parameters: Option<Vec<ActionParameter>>,
}

/// Named parameter. Values normally arrive as strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ActionParameter {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl ActionEvent {
    pub fn action_group(&self) -> &str {
        self.action_group.as_deref().unwrap_or(DEFAULT_ACTION_GROUP)
    }

    pub fn api_path(&self) -> &str {
        self.api_path.as_deref().unwrap_or("")
    }

    pub fn http_method(&self) -> &str {
        self.http_method.as_deref().unwrap_or(DEFAULT_HTTP_METHOD)
    }

    /// Parameters as a name to value map. A repeated name keeps its last value.
    pub fn parameter_map(&self) -> HashMap<String, String> {
        self.parameters
            .iter()
            .flatten()
            .map(|param| {
                let value = match &param.value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (param.name.clone(), value)
            })
            .collect()
    }
}

/// Routing fields echoed back in the envelope, read leniently from a raw
/// event that may not decode as an [`ActionEvent`]
pub fn echo_fields(event: &Value) -> (String, String, String) {
    let field = |name: &str, default: &str| {
        event
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    (
        field("actionGroup", DEFAULT_ACTION_GROUP),
        field("apiPath", ""),
        field("httpMethod", DEFAULT_HTTP_METHOD),
    )
}

/// Outbound envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub message_version: String,
    pub response: ActionResponseBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponseBody {
    pub action_group: String,
    pub api_path: String,
    pub http_method: String,
    pub http_status_code: u16,
    pub response_body: BTreeMap<String, EncodedBody>,
}

/// Result JSON encoded as a string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncodedBody {
    pub body: String,
}

impl ActionResponse {
    /// Wrap a result document. Status is 200 iff the result's `success` flag is true.
    pub fn new(action_group: &str, api_path: &str, http_method: &str, result: &Value) -> Self {
        let succeeded = result
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let status = if succeeded { 200 } else { 400 };
        Self::with_status(action_group, api_path, http_method, status, result)
    }

    /// Envelope for a store that could not be reached at all
    pub fn connection_failure(details: &str) -> Self {
        let result = json!({
            "success": false,
            "error": "Database connection failed",
            "details": details,
            "suggestion": "Check network access to the course table and the worker's credentials",
        });
        Self::with_status(DEFAULT_ACTION_GROUP, "/error", DEFAULT_HTTP_METHOD, 500, &result)
    }

    fn with_status(
        action_group: &str,
        api_path: &str,
        http_method: &str,
        status: u16,
        result: &Value,
    ) -> Self {
        let response_body = BTreeMap::from([(
            JSON_CONTENT_TYPE.to_string(),
            EncodedBody {
                body: result.to_string(),
            },
        )]);

        Self {
            message_version: MESSAGE_VERSION.to_string(),
            response: ActionResponseBody {
                action_group: action_group.to_string(),
                api_path: api_path.to_string(),
                http_method: http_method.to_string(),
                http_status_code: status,
                response_body,
            },
        }
    }

    pub fn status_code(&self) -> u16 {
        self.response.http_status_code
    }

    /// Decode the embedded result document
    pub fn result(&self) -> Result<Value, serde_json::Error> {
        let body = self
            .response
            .response_body
            .get(JSON_CONTENT_TYPE)
            .map(|content| content.body.as_str())
            .unwrap_or("null");
        serde_json::from_str(body)
    }
}
