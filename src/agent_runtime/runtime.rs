//! Agent runtime trait and event types
//!
//! A single agent reply arrives as a stream of typed events. Only chunk events
//! carry reply text; trace and return-control events are informational.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use thiserror::Error;

/// Parameters for one agent invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeAgentRequest {
    pub agent_id: String,
    pub agent_alias_id: String,
    pub session_id: String,
    pub input_text: String,
    pub enable_trace: bool,
    pub end_session: bool,
}

impl InvokeAgentRequest {
    /// Request that keeps the session open for follow-up questions, without traces
    pub fn new(
        agent_id: impl Into<String>,
        agent_alias_id: impl Into<String>,
        session_id: impl Into<String>,
        input_text: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_alias_id: agent_alias_id.into(),
            session_id: session_id.into(),
            input_text: input_text.into(),
            enable_trace: false,
            end_session: false,
        }
    }
}

/// One event of a streamed agent reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// Raw bytes of reply text
    Chunk(Vec<u8>),
    /// Reasoning trace, rendered for logging
    Trace(String),
    /// The agent handed control back to the caller (function calling)
    ReturnControl(String),
    /// Any event type this crate does not know about
    Unknown(String),
}

/// Fault raised while reading the event stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StreamError {
    pub message: String,
}

impl StreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Stream of events making up one agent reply
pub type AgentEventStream = BoxStream<'static, Result<AgentEvent, StreamError>>;

/// Service error codes reported by the agent runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceErrorCode {
    Throttling,
    Validation,
    AccessDenied,
    ResourceNotFound,
    ServiceQuotaExceeded,
    Conflict,
    DependencyFailed,
    Other(String),
}

impl ServiceErrorCode {
    /// Map a wire error code such as `ThrottlingException`
    pub fn from_code(code: &str) -> Self {
        match code {
            "ThrottlingException" => Self::Throttling,
            "ValidationException" => Self::Validation,
            "AccessDeniedException" => Self::AccessDenied,
            "ResourceNotFoundException" => Self::ResourceNotFound,
            "ServiceQuotaExceededException" => Self::ServiceQuotaExceeded,
            "ConflictException" => Self::Conflict,
            "DependencyFailedException" => Self::DependencyFailed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Throttling => "ThrottlingException",
            Self::Validation => "ValidationException",
            Self::AccessDenied => "AccessDeniedException",
            Self::ResourceNotFound => "ResourceNotFoundException",
            Self::ServiceQuotaExceeded => "ServiceQuotaExceededException",
            Self::Conflict => "ConflictException",
            Self::DependencyFailed => "DependencyFailedException",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ServiceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent invocation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentServiceError {
    /// The service answered with an error code
    #[error("{code}: {message}")]
    Service {
        code: ServiceErrorCode,
        message: String,
    },
    /// The request never produced a service answer (network, timeout, signing)
    #[error("Agent runtime unreachable: {0}")]
    Transport(String),
}

impl AgentServiceError {
    pub fn service(code: ServiceErrorCode, message: impl Into<String>) -> Self {
        Self::Service {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&ServiceErrorCode> {
        match self {
            Self::Service { code, .. } => Some(code),
            Self::Transport(_) => None,
        }
    }
}

/// Agent runtime trait for dependency injection and testing
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Runtime name for logging
    fn name(&self) -> &str;

    /// Start an agent invocation and return its reply event stream
    async fn invoke_agent(
        &self,
        request: InvokeAgentRequest,
    ) -> Result<AgentEventStream, AgentServiceError>;
}
