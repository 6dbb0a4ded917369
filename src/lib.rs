//! Upskill Coach - Rust Implementation
//!
//! Integration glue between an HTTP chat front end for an "AI Upskill Coach"
//! and managed cloud services: a hosted conversational agent runtime and a
//! key-value course table.
//!
//! # Overview
//!
//! Two independent, stateless handlers:
//! - [`chat::AgentRouter`] validates a chat prompt, keeps it on topic, picks
//!   one of two agent identities and aggregates the agent's streamed reply.
//! - [`courses::CourseQueryService`] answers the agent's course look-ups
//!   (six read operations) in the action-group envelope format.
//!
//! Service clients are injected as `Arc<dyn AgentRuntime>` and
//! `Arc<dyn CourseStore>`, so both handlers run against mocks in tests.
//!
//! # Quick Start
//!
//! ```rust
//! use upskill_coach::routing::{PromptRouter, RoutingDecision};
//!
//! let router = PromptRouter::default();
//! assert_eq!(
//!     router.decide("Show my completed courses"),
//!     RoutingDecision::RouteToCourseAgent
//! );
//! assert!(matches!(
//!     router.decide("Any good pasta recipe?"),
//!     RoutingDecision::RejectOffTopic { .. }
//! ));
//! ```

pub mod agent_runtime;
pub mod chat;
pub mod config;
pub mod courses;
pub mod error;
pub mod observability;
pub mod routing;
pub mod server;
pub mod testing;

pub use chat::AgentRouter;
pub use config::CoachConfig;
pub use courses::CourseQueryService;
pub use error::{CoachError, CoachResult};
