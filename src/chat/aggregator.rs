//! Streamed reply aggregation
//!
//! Chunk payloads are concatenated as raw bytes and decoded once at the end,
//! so a multi-byte character split across chunks survives intact.

use crate::agent_runtime::{AgentEvent, StreamError};
use futures::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

/// Returned whenever the agent produced no usable text
pub const FALLBACK_RESPONSE: &str = "I apologize, but I'm experiencing technical difficulties right now. However, I'm here to help with your technical career development!

Here are some ways I can assist you:

🚀 **Career Guidance**
• AI/ML career paths and opportunities
• Software engineering roles and progression
• Data science and analytics careers

💻 **Technical Skills**
• Programming languages to learn
• Frameworks and tools recommendations
• Best practices and coding standards

📚 **Learning Resources**
• Online courses and certifications
• Bootcamps and training programs
• Books and documentation

📝 **Professional Development**
• Resume and portfolio optimization
• Interview preparation strategies
• Networking and career growth tips

Please try asking your question again, or let me know what specific area you'd like to focus on!";

/// How the reply text was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Stream finished normally with text
    Complete,
    /// Stream faulted after some text arrived
    Partial { error: String },
    /// No usable text; the fallback message was substituted
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedResponse {
    pub text: String,
    pub outcome: ReplyOutcome,
}

impl AggregatedResponse {
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            text: FALLBACK_RESPONSE.to_string(),
            outcome: ReplyOutcome::Fallback {
                reason: reason.into(),
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, ReplyOutcome::Fallback { .. })
    }
}

/// Drain an agent event stream into reply text
pub async fn aggregate_stream<S>(mut stream: S, session_id: &str) -> AggregatedResponse
where
    S: Stream<Item = Result<AgentEvent, StreamError>> + Unpin,
{
    let mut bytes: Vec<u8> = Vec::new();

    while let Some(item) = stream.next().await {
        match item {
            Ok(AgentEvent::Chunk(payload)) => bytes.extend_from_slice(&payload),
            Ok(AgentEvent::Trace(trace)) => {
                debug!("Agent trace for session {}: {}", session_id, trace);
            }
            Ok(AgentEvent::ReturnControl(payload)) => {
                info!("Agent return control for session {}: {}", session_id, payload);
            }
            Ok(AgentEvent::Unknown(kind)) => {
                debug!("Ignoring unknown agent event for session {}: {}", session_id, kind);
            }
            Err(e) => {
                error!("Error processing stream for session {}: {}", session_id, e);
                let text = decode(&bytes);
                if text.is_empty() {
                    return AggregatedResponse::fallback(format!("stream failed: {e}"));
                }
                info!("Using partial response for session {}", session_id);
                return AggregatedResponse {
                    text,
                    outcome: ReplyOutcome::Partial {
                        error: e.to_string(),
                    },
                };
            }
        }
    }

    let text = decode(&bytes);
    if text.is_empty() {
        warn!("Empty response from agent for session {}", session_id);
        return AggregatedResponse::fallback("empty response");
    }

    AggregatedResponse {
        text,
        outcome: ReplyOutcome::Complete,
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
