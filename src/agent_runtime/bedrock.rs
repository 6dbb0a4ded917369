//! Bedrock agent runtime implementation
//!
//! Wraps `aws-sdk-bedrockagentruntime`. The client is built once per worker
//! with adaptive retries (3 attempts); the SDK owns all retrying.

use crate::agent_runtime::runtime::{
    AgentEvent, AgentEventStream, AgentRuntime, AgentServiceError, InvokeAgentRequest,
    ServiceErrorCode, StreamError,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockagentruntime::config::retry::RetryConfig;
use aws_sdk_bedrockagentruntime::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_bedrockagentruntime::operation::invoke_agent::InvokeAgentError;
use aws_sdk_bedrockagentruntime::types::ResponseStream;
use aws_sdk_bedrockagentruntime::Client;
use futures::stream::{self, StreamExt};
use std::fmt::Debug;
use tracing::debug;

/// Maximum attempts per invocation, including the first
pub const AGENT_MAX_ATTEMPTS: u32 = 3;

/// Agent runtime backed by Amazon Bedrock Agents
#[derive(Debug, Clone)]
pub struct BedrockAgentRuntime {
    client: Client,
}

impl BedrockAgentRuntime {
    /// Wrap an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build the client from shared SDK configuration, adding adaptive retries
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        let config = aws_sdk_bedrockagentruntime::config::Builder::from(sdk_config)
            .retry_config(RetryConfig::adaptive().with_max_attempts(AGENT_MAX_ATTEMPTS))
            .build();
        Self::new(Client::from_conf(config))
    }
}

#[async_trait]
impl AgentRuntime for BedrockAgentRuntime {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn invoke_agent(
        &self,
        request: InvokeAgentRequest,
    ) -> Result<AgentEventStream, AgentServiceError> {
        debug!(
            "Invoking agent {} (alias {}) for session {}",
            request.agent_id, request.agent_alias_id, request.session_id
        );

        let output = self
            .client
            .invoke_agent()
            .agent_id(request.agent_id)
            .agent_alias_id(request.agent_alias_id)
            .session_id(request.session_id)
            .input_text(request.input_text)
            .enable_trace(request.enable_trace)
            .end_session(request.end_session)
            .send()
            .await
            .map_err(classify_invoke_error)?;

        // The receiver is dropped after the first fault so no events follow it.
        let events = stream::unfold(Some(output.completion), |receiver| async move {
            let mut receiver = receiver?;
            match receiver.recv().await {
                Ok(Some(event)) => Some((Ok(convert_event(event)), Some(receiver))),
                Ok(None) => None,
                Err(err) => Some((
                    Err(StreamError::new(DisplayErrorContext(&err).to_string())),
                    None,
                )),
            }
        });

        Ok(events.boxed())
    }
}

fn convert_event(event: ResponseStream) -> AgentEvent {
    match event {
        ResponseStream::Chunk(part) => AgentEvent::Chunk(
            part.bytes()
                .map(|blob| blob.as_ref().to_vec())
                .unwrap_or_default(),
        ),
        ResponseStream::Trace(trace) => AgentEvent::Trace(format!("{trace:?}")),
        ResponseStream::ReturnControl(payload) => AgentEvent::ReturnControl(format!("{payload:?}")),
        other => AgentEvent::Unknown(format!("{other:?}")),
    }
}

fn classify_invoke_error<R>(err: SdkError<InvokeAgentError, R>) -> AgentServiceError
where
    R: Debug + 'static,
{
    match &err {
        SdkError::ServiceError(service_err) => {
            let inner = service_err.err();
            AgentServiceError::Service {
                code: ServiceErrorCode::from_code(inner.code().unwrap_or("Unknown")),
                message: inner.message().unwrap_or_default().to_string(),
            }
        }
        _ => AgentServiceError::Transport(DisplayErrorContext(&err).to_string()),
    }
}
