//! Configuration for the upskill coach handlers
//!
//! Settings come from an optional TOML file and from environment variables.
//! Environment variables always win over file values so a deployed worker can
//! be reconfigured without shipping a new file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable names understood by [`CoachConfig`]
pub mod env_vars {
    pub const REGION: &str = "AWS_REGION";
    pub const MAX_PROMPT_LENGTH: &str = "MAX_PROMPT_LENGTH";
    pub const SESSION_TIMEOUT: &str = "SESSION_TIMEOUT";
    pub const GENERAL_AGENT_NAME: &str = "BEDROCK_AGENT_NAME";
    pub const GENERAL_AGENT_ID: &str = "BEDROCK_AGENT_ID";
    pub const GENERAL_AGENT_ALIAS_ID: &str = "BEDROCK_AGENT_ALIAS_ID";
    pub const COURSE_AGENT_NAME: &str = "BEDROCK_COURSEAGENT_NAME";
    pub const COURSE_AGENT_ID: &str = "BEDROCK_COURSEAGENT_ID";
    pub const COURSE_AGENT_ALIAS_ID: &str = "BEDROCK_COURSEAGENT_ALIAS_ID";
    pub const COURSES_TABLE: &str = "COURSES_TABLE";
    pub const PORT: &str = "PORT";
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoachConfig {
    #[serde(default)]
    pub aws: AwsSection,
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub agents: AgentsSection,
    #[serde(default)]
    pub courses: CoursesSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwsSection {
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for AwsSection {
    fn default() -> Self {
        Self {
            region: default_region(),
        }
    }
}

/// Chat request limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatSection {
    /// Maximum prompt length in characters, measured after trimming
    #[serde(default = "default_max_prompt_length")]
    pub max_prompt_length: usize,
    /// Session lifetime hint in seconds. Sessions live in the agent service,
    /// so request handling does not consult this value.
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            max_prompt_length: default_max_prompt_length(),
            session_timeout_secs: default_session_timeout(),
        }
    }
}

/// A deployed agent: identifier plus the alias pointing at its configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentTarget {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub alias_id: String,
}

impl AgentTarget {
    pub fn new(name: impl Into<String>, id: impl Into<String>, alias_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            alias_id: alias_id.into(),
        }
    }
}

/// The two backend agents a chat prompt can be forwarded to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentsSection {
    #[serde(default = "default_general_agent")]
    pub general: AgentTarget,
    #[serde(default = "default_course_agent")]
    pub course: AgentTarget,
}

impl Default for AgentsSection {
    fn default() -> Self {
        Self {
            general: default_general_agent(),
            course: default_course_agent(),
        }
    }
}

impl AgentsSection {
    /// Both agents need usable identifiers before any prompt can be forwarded
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (role, target) in [("general", &self.general), ("course", &self.course)] {
            validate_identifier(&format!("agents.{role}.id"), &target.id)?;
            validate_identifier(&format!("agents.{role}.alias_id"), &target.alias_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoursesSection {
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

impl Default for CoursesSection {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_region() -> String {
    "ap-south-1".to_string()
}

fn default_max_prompt_length() -> usize {
    4000
}

fn default_session_timeout() -> u64 {
    3600 // 1 hour
}

fn default_general_agent() -> AgentTarget {
    AgentTarget::new("myagent-invoke-llm", "", "")
}

fn default_course_agent() -> AgentTarget {
    AgentTarget::new("CourseAgent", "", "")
}

fn default_table_name() -> String {
    "MyCourses".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvValue { name: String, value: String },
    #[error("Invalid identifier for {field}: '{value}' must match [a-zA-Z0-9]+")]
    InvalidIdentifier { field: String, value: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoachConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: CoachConfig = toml::from_str(&content)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from defaults and environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from defaults and an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CoachConfig::default();
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from a variable source onto this configuration
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(region) = text(env_vars::REGION) {
            self.aws.region = region;
        }
        if let Some(raw) = text(env_vars::MAX_PROMPT_LENGTH) {
            self.chat.max_prompt_length = parse_number(env_vars::MAX_PROMPT_LENGTH, &raw)?;
        }
        if let Some(raw) = text(env_vars::SESSION_TIMEOUT) {
            self.chat.session_timeout_secs = parse_number(env_vars::SESSION_TIMEOUT, &raw)?;
        }
        if let Some(name) = text(env_vars::GENERAL_AGENT_NAME) {
            self.agents.general.name = name;
        }
        if let Some(id) = text(env_vars::GENERAL_AGENT_ID) {
            self.agents.general.id = id;
        }
        if let Some(alias) = text(env_vars::GENERAL_AGENT_ALIAS_ID) {
            self.agents.general.alias_id = alias;
        }
        if let Some(name) = text(env_vars::COURSE_AGENT_NAME) {
            self.agents.course.name = name;
        }
        if let Some(id) = text(env_vars::COURSE_AGENT_ID) {
            self.agents.course.id = id;
        }
        if let Some(alias) = text(env_vars::COURSE_AGENT_ALIAS_ID) {
            self.agents.course.alias_id = alias;
        }
        if let Some(table) = text(env_vars::COURSES_TABLE) {
            self.courses.table_name = table;
        }
        if let Some(raw) = text(env_vars::PORT) {
            self.server.port = parse_number(env_vars::PORT, &raw)?;
        }

        Ok(())
    }

    /// Validate settings shared by both handlers.
    ///
    /// Agent identifiers are checked separately by [`AgentsSection::validate`]
    /// because the course lookup handler runs without them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aws.region.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "aws.region must not be empty".to_string(),
            ));
        }
        if self.chat.max_prompt_length == 0 {
            return Err(ConfigError::InvalidConfig(
                "chat.max_prompt_length must be greater than zero".to_string(),
            ));
        }
        if self.courses.table_name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "courses.table_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a fully populated configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[aws]
region = "us-east-1"

[agents.general]
name = "general-coach"
id = "GENERAL001"
alias_id = "ALIAS001"

[agents.course]
name = "course-coach"
id = "COURSE001"
alias_id = "ALIAS002"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvValue {
            name: name.to_string(),
            value: raw.to_string(),
        })
}

/// Agent and alias identifiers are short alphanumeric tokens
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CoachConfig::default();
        assert_eq!(config.aws.region, "ap-south-1");
        assert_eq!(config.chat.max_prompt_length, 4000);
        assert_eq!(config.chat.session_timeout_secs, 3600);
        assert_eq!(config.courses.table_name, "MyCourses");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.agents.general.name, "myagent-invoke-llm");
        assert!(config.agents.general.id.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let config = CoachConfig::from_lookup(lookup_from(&[
            ("AWS_REGION", "eu-west-1"),
            ("MAX_PROMPT_LENGTH", "120"),
            ("BEDROCK_AGENT_ID", "AGENT1"),
            ("BEDROCK_AGENT_ALIAS_ID", "ALIAS1"),
            ("BEDROCK_COURSEAGENT_ID", "AGENT2"),
            ("BEDROCK_COURSEAGENT_ALIAS_ID", "ALIAS2"),
            ("COURSES_TABLE", "OtherCourses"),
        ]))
        .unwrap();

        assert_eq!(config.aws.region, "eu-west-1");
        assert_eq!(config.chat.max_prompt_length, 120);
        assert_eq!(config.agents.general.id, "AGENT1");
        assert_eq!(config.agents.course.alias_id, "ALIAS2");
        assert_eq!(config.courses.table_name, "OtherCourses");
        assert!(config.agents.validate().is_ok());
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = CoachConfig::from_lookup(lookup_from(&[("AWS_REGION", "   ")])).unwrap();
        assert_eq!(config.aws.region, "ap-south-1");
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = CoachConfig::from_lookup(lookup_from(&[("MAX_PROMPT_LENGTH", "lots")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvValue { ref name, .. }) if name == "MAX_PROMPT_LENGTH"
        ));
    }

    #[test]
    fn test_zero_prompt_length_is_rejected() {
        let result = CoachConfig::from_lookup(lookup_from(&[("MAX_PROMPT_LENGTH", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_agent_ids_fail_agent_validation_only() {
        let config = CoachConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.agents.validate(),
            Err(ConfigError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_identifier_format() {
        assert!(validate_identifier("id", "TSTALIASID").is_ok());
        assert!(validate_identifier("id", "abc123").is_ok());
        assert!(validate_identifier("id", "").is_err());
        assert!(validate_identifier("id", "bad-id").is_err());
        assert!(validate_identifier("id", "bad id").is_err());
    }

    #[test]
    fn test_test_config_is_complete() {
        let config = CoachConfig::test_config();
        assert!(config.validate().is_ok());
        assert!(config.agents.validate().is_ok());
        assert_eq!(config.agents.course.name, "course-coach");
        assert_eq!(config.chat.max_prompt_length, 4000);
    }
}
