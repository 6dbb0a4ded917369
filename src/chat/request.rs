//! Chat request extraction and validation
//!
//! Accepts three event shapes: an API-gateway proxy event with a JSON string
//! `body`, a function-URL event (`requestContext.http`) with the same body,
//! and a direct event that carries `prompt` itself.

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Lower-cased substrings that mark a prompt as unsafe
pub const HARMFUL_PATTERNS: &[&str] = &["<script", "javascript:", "data:", "vbscript:"];

/// Client-facing validation failures. Display text is returned verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Invalid request format")]
    InvalidFormat,
    #[error("Prompt is required")]
    MissingPrompt,
    #[error("Prompt must be a string")]
    PromptNotString,
    #[error("Prompt cannot be empty")]
    EmptyPrompt,
    #[error("Prompt too long (max {max} characters)")]
    PromptTooLong { max: usize },
    #[error("Invalid content detected in prompt")]
    UnsafeContent,
}

/// A validated chat request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Prompt with surrounding whitespace removed
    pub prompt: String,
    pub session_id: String,
    /// True when the caller sent no session id
    pub session_generated: bool,
}

impl ChatRequest {
    /// Extract and validate a request from a raw event
    pub fn from_event(event: &Value, max_prompt_length: usize) -> Result<Self, RequestError> {
        let body = extract_body(event)?;
        validate_request(&body, max_prompt_length)
    }
}

/// True for a CORS preflight in either event style
pub fn is_preflight(event: &Value) -> bool {
    let method = event.get("httpMethod").and_then(Value::as_str).or_else(|| {
        event
            .pointer("/requestContext/http/method")
            .and_then(Value::as_str)
    });
    method.is_some_and(|m| m.eq_ignore_ascii_case("OPTIONS"))
}

/// Locate the request body document inside an event
pub fn extract_body(event: &Value) -> Result<Value, RequestError> {
    let body = if let Some(raw) = event.get("body") {
        parse_body(raw)?
    } else if event.pointer("/requestContext/http").is_some() {
        return Err(RequestError::InvalidFormat);
    } else if event.get("prompt").is_some() {
        event.clone()
    } else {
        return Err(RequestError::InvalidFormat);
    };

    // An empty document counts as no body at all
    if body.as_object().is_some_and(|map| !map.is_empty()) {
        Ok(body)
    } else {
        Err(RequestError::InvalidFormat)
    }
}

fn parse_body(raw: &Value) -> Result<Value, RequestError> {
    match raw {
        Value::String(text) if !text.is_empty() => {
            serde_json::from_str(text).map_err(|e| {
                tracing::error!("JSON decode error: {}", e);
                RequestError::InvalidFormat
            })
        }
        Value::Object(_) => Ok(raw.clone()),
        _ => Err(RequestError::InvalidFormat),
    }
}

/// Validate a body document. Length is measured in characters after trimming.
pub fn validate_request(body: &Value, max_prompt_length: usize) -> Result<ChatRequest, RequestError> {
    let prompt = match body.get("prompt") {
        None | Some(Value::Null) => return Err(RequestError::MissingPrompt),
        Some(Value::String(prompt)) => prompt.trim(),
        Some(_) => return Err(RequestError::PromptNotString),
    };

    if prompt.is_empty() {
        return Err(RequestError::EmptyPrompt);
    }
    if prompt.chars().count() > max_prompt_length {
        return Err(RequestError::PromptTooLong {
            max: max_prompt_length,
        });
    }

    let prompt_lower = prompt.to_lowercase();
    if HARMFUL_PATTERNS.iter().any(|p| prompt_lower.contains(p)) {
        return Err(RequestError::UnsafeContent);
    }

    let supplied = body
        .get("sessionId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty());

    Ok(ChatRequest {
        prompt: prompt.to_string(),
        session_id: supplied.map(str::to_string).unwrap_or_else(generate_session_id),
        session_generated: supplied.is_none(),
    })
}

/// Fresh correlation token for a caller that sent none
pub fn generate_session_id() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preflight_detection() {
        assert!(is_preflight(&json!({"httpMethod": "OPTIONS"})));
        assert!(is_preflight(
            &json!({"requestContext": {"http": {"method": "OPTIONS"}}})
        ));
        assert!(!is_preflight(&json!({"httpMethod": "POST", "body": "{}"})));
        assert!(!is_preflight(&json!({"prompt": "hi"})));
    }

    #[test]
    fn test_gateway_body() {
        let event = json!({"httpMethod": "POST", "body": "{\"prompt\": \" learn rust \"}"});
        let request = ChatRequest::from_event(&event, 4000).unwrap();

        assert_eq!(request.prompt, "learn rust");
        assert!(request.session_generated);
        assert!(request.session_id.starts_with("session_"));
    }

    #[test]
    fn test_function_url_without_body_is_invalid() {
        let event = json!({"requestContext": {"http": {"method": "POST"}}});
        assert_eq!(
            ChatRequest::from_event(&event, 4000),
            Err(RequestError::InvalidFormat)
        );
    }

    #[test]
    fn test_direct_invocation() {
        let event = json!({"prompt": "what is devops", "sessionId": "abc"});
        let request = ChatRequest::from_event(&event, 4000).unwrap();

        assert_eq!(request.session_id, "abc");
        assert!(!request.session_generated);
    }

    #[test]
    fn test_unparseable_or_empty_body() {
        for event in [
            json!({"body": "{not json"}),
            json!({"body": ""}),
            json!({"body": null}),
            json!({"body": "{}"}),
            json!({"body": "[1, 2]"}),
            json!({"unrelated": true}),
        ] {
            assert_eq!(
                ChatRequest::from_event(&event, 4000),
                Err(RequestError::InvalidFormat),
                "event: {event}"
            );
        }
    }

    #[test]
    fn test_validation_messages() {
        let cases = [
            (json!({"sessionId": "s"}), "Prompt is required"),
            (json!({"prompt": 42}), "Prompt must be a string"),
            (json!({"prompt": "   "}), "Prompt cannot be empty"),
            (json!({"prompt": "abcdef"}), "Prompt too long (max 5 characters)"),
            (
                json!({"prompt": "<SCRIPT>x"}),
                "Invalid content detected in prompt",
            ),
        ];

        for (body, expected) in cases {
            let err = validate_request(&body, 5).unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let body = json!({"prompt": "ééééé"});
        assert!(validate_request(&body, 5).is_ok());
    }

    #[test]
    fn test_generated_session_ids_are_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
