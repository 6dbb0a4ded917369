//! Agent selection
//!
//! Picks which downstream agent identity receives an accepted prompt. The
//! course agent owns questions about the user's own enrolments; everything
//! else goes to the general coach.

use crate::config::{AgentTarget, AgentsSection};
use tracing::debug;

/// Phrases that route to the course agent
pub const COURSE_PHRASES: &[&str] = &[
    "my course",
    "my all course",
    "my completed course",
    "my in progress course",
    "my ongoing course",
    "all my course",
    "my course list",
];

/// Which agent identity handles the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentChoice {
    Course,
    General,
}

impl AgentChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::General => "general",
        }
    }

    /// Resolve to the configured identity
    pub fn target<'a>(&self, agents: &'a AgentsSection) -> &'a AgentTarget {
        match self {
            Self::Course => &agents.course,
            Self::General => &agents.general,
        }
    }
}

/// Phrase-table selector
#[derive(Debug, Clone)]
pub struct AgentSelector {
    course_phrases: Vec<String>,
}

impl Default for AgentSelector {
    fn default() -> Self {
        Self::new(COURSE_PHRASES)
    }
}

impl AgentSelector {
    pub fn new(course_phrases: &[&str]) -> Self {
        Self {
            course_phrases: course_phrases.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    pub fn select(&self, prompt: &str) -> AgentChoice {
        let prompt_lower = prompt.to_lowercase();

        match self
            .course_phrases
            .iter()
            .find(|phrase| prompt_lower.contains(phrase.as_str()))
        {
            Some(phrase) => {
                debug!("Prompt matched course phrase '{}'", phrase);
                AgentChoice::Course
            }
            None => AgentChoice::General,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoachConfig;

    #[test]
    fn test_course_phrases_select_course_agent() {
        let selector = AgentSelector::default();

        assert_eq!(selector.select("Show MY COURSES please"), AgentChoice::Course);
        assert_eq!(selector.select("list all my courses"), AgentChoice::Course);
        assert_eq!(
            selector.select("what's in my in progress course list"),
            AgentChoice::Course
        );
    }

    #[test]
    fn test_other_prompts_select_general_agent() {
        let selector = AgentSelector::default();

        assert_eq!(selector.select("recommend a course on rust"), AgentChoice::General);
        assert_eq!(selector.select("my career plan"), AgentChoice::General);
    }

    #[test]
    fn test_choice_resolves_configured_identity() {
        let config = CoachConfig::test_config();

        assert_eq!(AgentChoice::Course.target(&config.agents).id, "COURSE001");
        assert_eq!(AgentChoice::General.target(&config.agents).id, "GENERAL001");
    }
}
