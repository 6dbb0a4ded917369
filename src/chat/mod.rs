//! Chat handler: validation, topic gate, agent invocation and reply aggregation

pub mod aggregator;
pub mod handler;
pub mod request;
pub mod response;

pub use aggregator::{aggregate_stream, AggregatedResponse, ReplyOutcome, FALLBACK_RESPONSE};
pub use handler::AgentRouter;
pub use request::{ChatRequest, RequestError};
pub use response::{AgentIdentity, HttpResponse};
