//! Testing utilities and mock implementations
//!
//! Mock agent runtimes and course stores for exercising both handlers
//! without Bedrock or DynamoDB.

pub mod mocks;

pub use mocks::*;
