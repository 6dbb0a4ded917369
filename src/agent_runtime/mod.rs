//! Managed agent runtime abstraction
//!
//! The chat handler talks to hosted conversational agents through the
//! [`AgentRuntime`] trait. The production implementation wraps the Bedrock
//! agent runtime client; tests inject scripted mocks.

pub mod bedrock;
pub mod runtime;

pub use bedrock::BedrockAgentRuntime;
pub use runtime::*;
