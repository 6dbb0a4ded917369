//! Prompt routing
//!
//! ## Topic gate (classifier.rs)
//!
//! Rejects prompts that mention non-technical subjects and accepts the rest.
//!
//! ## Agent selection (agent_selector.rs)
//!
//! Chooses between the course agent and the general coach for accepted prompts.
//!
//! ## Routing decision (router.rs)
//!
//! Combines both into one [`RoutingDecision`] per prompt.

pub mod agent_selector;
pub mod classifier;
pub mod router;

pub use agent_selector::{AgentChoice, AgentSelector, COURSE_PHRASES};
pub use classifier::{
    off_topic_label, off_topic_response, TopicClassifier, TopicVerdict, NON_TECHNICAL_KEYWORDS,
    TECHNICAL_KEYWORDS,
};
pub use router::{PromptRouter, RoutingDecision};
