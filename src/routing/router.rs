//! Prompt routing decision
//!
//! Composes the topic gate and the agent selector into a single pure
//! function of the prompt text. The gate always runs first.

use crate::routing::agent_selector::{AgentChoice, AgentSelector};
use crate::routing::classifier::{TopicClassifier, TopicVerdict};

/// Where an accepted or rejected prompt goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Answer with the redirect message; no agent is called
    RejectOffTopic { keyword: String },
    RouteToCourseAgent,
    RouteToGeneralAgent,
}

impl RoutingDecision {
    pub fn agent(&self) -> Option<AgentChoice> {
        match self {
            Self::RejectOffTopic { .. } => None,
            Self::RouteToCourseAgent => Some(AgentChoice::Course),
            Self::RouteToGeneralAgent => Some(AgentChoice::General),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromptRouter {
    classifier: TopicClassifier,
    selector: AgentSelector,
}

impl PromptRouter {
    pub fn new(classifier: TopicClassifier, selector: AgentSelector) -> Self {
        Self {
            classifier,
            selector,
        }
    }

    pub fn decide(&self, prompt: &str) -> RoutingDecision {
        if let TopicVerdict::OffTopic { keyword } = self.classifier.classify(prompt) {
            return RoutingDecision::RejectOffTopic { keyword };
        }

        match self.selector.select(prompt) {
            AgentChoice::Course => RoutingDecision::RouteToCourseAgent,
            AgentChoice::General => RoutingDecision::RouteToGeneralAgent,
        }
    }
}
