//! Chat request handler
//!
//! Validates the request, applies the topic gate, invokes the selected agent
//! and turns its streamed reply into a single response. Downstream agent
//! failures never reach the client: they degrade to the fallback message.

use crate::agent_runtime::{AgentRuntime, AgentServiceError, InvokeAgentRequest, ServiceErrorCode};
use crate::chat::aggregator::{aggregate_stream, AggregatedResponse, ReplyOutcome};
use crate::chat::request::{is_preflight, ChatRequest};
use crate::chat::response::{AgentIdentity, HttpResponse};
use crate::config::{AgentTarget, AgentsSection, CoachConfig, ConfigError};
use crate::error::panic_message;
use crate::observability::metrics;
use crate::routing::{off_topic_response, AgentChoice, PromptRouter, RoutingDecision};
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn, Instrument};

/// Routes chat prompts to one of two hosted agents
#[derive(Clone)]
pub struct AgentRouter {
    agents: AgentsSection,
    max_prompt_length: usize,
    runtime: Arc<dyn AgentRuntime>,
    router: PromptRouter,
}

impl AgentRouter {
    /// Build a router. Fails if either agent identity is malformed.
    pub fn new(config: &CoachConfig, runtime: Arc<dyn AgentRuntime>) -> Result<Self, ConfigError> {
        config.agents.validate()?;

        Ok(Self {
            agents: config.agents.clone(),
            max_prompt_length: config.chat.max_prompt_length,
            runtime,
            router: PromptRouter::default(),
        })
    }

    pub fn with_router(mut self, router: PromptRouter) -> Self {
        self.router = router;
        self
    }

    /// Identity reported in every response body
    pub fn identity(&self) -> AgentIdentity {
        AgentIdentity::from(&self.agents.general)
    }

    /// Handle one raw event. Never fails: panics become a 500 envelope.
    pub async fn handle(&self, event: &Value) -> HttpResponse {
        let started = Instant::now();
        let session = event_session_hint(event);
        let span = crate::chat_span!(session_id = %session, runtime = self.runtime.name());

        async move {
            info!("Received event: {}", event);

            match AssertUnwindSafe(self.process(event)).catch_unwind().await {
                Ok(response) => response,
                Err(panic) => {
                    error!(
                        "Function failed after {:.2} seconds: {}",
                        started.elapsed().as_secs_f64(),
                        panic_message(&*panic)
                    );
                    metrics().chat_failed();
                    HttpResponse::internal_error(&self.identity())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// The request pipeline without the panic boundary
    pub async fn process(&self, event: &Value) -> HttpResponse {
        if is_preflight(event) {
            return HttpResponse::preflight();
        }

        let started = Instant::now();
        metrics().chat_request_received();

        let request = match ChatRequest::from_event(event, self.max_prompt_length) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected chat request: {}", e);
                metrics().validation_failed();
                return HttpResponse::error(&e.to_string(), 400, &self.identity());
            }
        };

        info!(
            "Processing request for session: {} using agent: {}",
            request.session_id, self.agents.general.name
        );

        let reply = match self.router.decide(&request.prompt) {
            RoutingDecision::RejectOffTopic { keyword } => {
                info!(
                    "Off-topic query detected for session {} (keyword '{}')",
                    request.session_id, keyword
                );
                metrics().off_topic_rejected();
                off_topic_response(&request.prompt)
            }
            RoutingDecision::RouteToCourseAgent => {
                self.generate_reply(AgentChoice::Course, &request).await
            }
            RoutingDecision::RouteToGeneralAgent => {
                self.generate_reply(AgentChoice::General, &request).await
            }
        };

        info!(
            "Function executed successfully in {:.2} seconds for session {}",
            started.elapsed().as_secs_f64(),
            request.session_id
        );
        metrics().chat_completed(started.elapsed());

        HttpResponse::success(&reply, &request.session_id, &self.identity())
    }

    async fn generate_reply(&self, choice: AgentChoice, request: &ChatRequest) -> String {
        let target = choice.target(&self.agents);
        info!(
            "Invoking {} agent '{}' (ID: {}) with alias {} for session {}",
            choice.as_str(),
            target.name,
            target.id,
            target.alias_id,
            request.session_id
        );

        let started = Instant::now();
        let invocation = InvokeAgentRequest::new(
            &target.id,
            &target.alias_id,
            &request.session_id,
            &request.prompt,
        );

        let aggregated = match self.runtime.invoke_agent(invocation).await {
            Ok(stream) => aggregate_stream(stream, &request.session_id).await,
            Err(e) => {
                log_service_error(target, &request.session_id, &e);
                AggregatedResponse::fallback(e.to_string())
            }
        };

        metrics().agent_invoked(&target.name, started.elapsed(), !aggregated.is_fallback());
        match &aggregated.outcome {
            ReplyOutcome::Complete => info!(
                "Successfully generated AI response from agent '{}' for session {}",
                target.name, request.session_id
            ),
            ReplyOutcome::Partial { .. } => metrics().partial_returned(),
            ReplyOutcome::Fallback { reason } => {
                warn!(
                    "Returning fallback response for session {}: {}",
                    request.session_id, reason
                );
                metrics().fallback_returned();
            }
        }

        aggregated.text
    }
}

fn log_service_error(target: &AgentTarget, session_id: &str, err: &AgentServiceError) {
    let name = &target.name;
    match err.code() {
        Some(ServiceErrorCode::Throttling) => {
            warn!("Agent '{}' throttling for session {}", name, session_id)
        }
        Some(ServiceErrorCode::Validation) => error!(
            "Invalid request to agent '{}' for session {}: {}",
            name, session_id, err
        ),
        Some(ServiceErrorCode::AccessDenied) => {
            error!("Access denied to agent '{}' for session {}", name, session_id)
        }
        Some(ServiceErrorCode::ResourceNotFound) => error!(
            "Agent '{}' or alias not found for session {}: Agent ID {}, Alias ID {}",
            name, session_id, target.id, target.alias_id
        ),
        Some(ServiceErrorCode::ServiceQuotaExceeded) => error!(
            "Service quota exceeded for agent '{}' for session {}",
            name, session_id
        ),
        Some(ServiceErrorCode::Conflict) => error!(
            "Conflict with agent '{}' for session {}: {}",
            name, session_id, err
        ),
        Some(ServiceErrorCode::DependencyFailed) => error!(
            "Dependency failure for agent '{}' for session {}: {}",
            name, session_id, err
        ),
        Some(ServiceErrorCode::Other(code)) => error!(
            "Agent '{}' service error for session {}: {} - {}",
            name, session_id, code, err
        ),
        None => error!(
            "Unexpected error invoking agent '{}' for session {}: {}",
            name, session_id, err
        ),
    }
}

/// Best-effort session id for the log span, read before validation
fn event_session_hint(event: &Value) -> String {
    let from_body = event
        .get("body")
        .and_then(Value::as_str)
        .and_then(|body| serde_json::from_str::<Value>(body).ok())
        .and_then(|body| body.get("sessionId").and_then(Value::as_str).map(str::to_string));

    from_body
        .or_else(|| {
            event
                .get("sessionId")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_runtime::AgentEvent;
    use crate::chat::aggregator::FALLBACK_RESPONSE;
    use crate::testing::mocks::MockAgentRuntime;
    use serde_json::json;

    fn router(runtime: MockAgentRuntime) -> AgentRouter {
        AgentRouter::new(&CoachConfig::test_config(), Arc::new(runtime)).unwrap()
    }

    fn chat_event(prompt: &str) -> Value {
        json!({
            "httpMethod": "POST",
            "body": json!({"prompt": prompt, "sessionId": "s-1"}).to_string(),
        })
    }

    #[test]
    fn test_rejects_malformed_agent_ids() {
        let mut config = CoachConfig::test_config();
        config.agents.course.id = "bad id!".to_string();

        let result = AgentRouter::new(&config, Arc::new(MockAgentRuntime::new()));
        assert!(matches!(result, Err(ConfigError::InvalidIdentifier { .. })));
    }

    #[tokio::test]
    async fn test_course_prompt_invokes_course_agent() {
        let runtime = MockAgentRuntime::new()
            .with_events(vec![AgentEvent::Chunk(b"You have 3 courses".to_vec())]);
        let router = router(runtime.clone());

        let response = router.handle(&chat_event("list my courses")).await;
        let body = response.json_body().unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(body["response"], "You have 3 courses");
        assert_eq!(body["agent"]["id"], "GENERAL001");

        let calls = runtime.invocations().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].agent_id, "COURSE001");
        assert_eq!(calls[0].agent_alias_id, "ALIAS002");
        assert_eq!(calls[0].session_id, "s-1");
        assert!(!calls[0].enable_trace);
        assert!(!calls[0].end_session);
    }

    #[tokio::test]
    async fn test_off_topic_prompt_never_invokes_agent() {
        let runtime = MockAgentRuntime::new();
        let router = router(runtime.clone());

        let response = router.handle(&chat_event("best pizza recipe")).await;
        let body = response.json_body().unwrap();

        assert_eq!(response.status_code, 200);
        assert!(body["response"]
            .as_str()
            .unwrap()
            .contains("I can't help with cooking"));
        assert!(runtime.invocations().await.is_empty());
    }

    #[tokio::test]
    async fn test_service_error_degrades_to_fallback() {
        let runtime = MockAgentRuntime::new().with_error(AgentServiceError::service(
            ServiceErrorCode::Throttling,
            "Rate exceeded",
        ));
        let router = router(runtime);

        let response = router.handle(&chat_event("how to learn kubernetes")).await;
        let body = response.json_body().unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(body["response"], FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn test_validation_error_envelope() {
        let router = router(MockAgentRuntime::new());
        let event = json!({"body": json!({"prompt": ""}).to_string()});

        let response = router.handle(&event).await;
        let body = response.json_body().unwrap();

        assert_eq!(response.status_code, 400);
        assert_eq!(body["error"], "Prompt cannot be empty");
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_preflight_skips_validation() {
        let router = router(MockAgentRuntime::new());
        let response = router.handle(&json!({"httpMethod": "OPTIONS"})).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.json_body().unwrap()["message"],
            "CORS preflight successful"
        );
    }

    #[test]
    fn test_session_hint() {
        assert_eq!(event_session_hint(&chat_event("x")), "s-1");
        assert_eq!(event_session_hint(&json!({"sessionId": "direct"})), "direct");
        assert_eq!(event_session_hint(&json!({})), "-");
    }
}
