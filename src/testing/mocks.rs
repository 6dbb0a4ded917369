//! Mock implementations for testing
//!
//! Provides a scripted AgentRuntime and misbehaving CourseStore
//! implementations so both handlers can be exercised without cloud services.

use crate::agent_runtime::{
    AgentEvent, AgentEventStream, AgentRuntime, AgentServiceError, InvokeAgentRequest, StreamError,
};
use crate::courses::{CourseStore, PageKey, RawCourseRecord, ScanPage, StoreError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Scripted agent runtime that records every invocation
#[derive(Debug, Clone, Default)]
pub struct MockAgentRuntime {
    pub invocations: Arc<Mutex<Vec<InvokeAgentRequest>>>,
    items: Vec<Result<AgentEvent, StreamError>>,
    error: Option<AgentServiceError>,
    should_panic: bool,
}

impl MockAgentRuntime {
    /// Runtime whose replies are empty streams
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with these events, then end the stream normally
    pub fn with_events(mut self, events: Vec<AgentEvent>) -> Self {
        self.items = events.into_iter().map(Ok).collect();
        self
    }

    /// Reply with a stream that may contain faults
    pub fn with_stream_items(mut self, items: Vec<Result<AgentEvent, StreamError>>) -> Self {
        self.items = items;
        self
    }

    /// Reply text as one chunk per piece
    pub fn with_text_chunks(self, chunks: &[&str]) -> Self {
        self.with_events(
            chunks
                .iter()
                .map(|chunk| AgentEvent::Chunk(chunk.as_bytes().to_vec()))
                .collect(),
        )
    }

    /// Fail every invocation before any stream is returned
    pub fn with_error(mut self, error: AgentServiceError) -> Self {
        self.error = Some(error);
        self
    }

    /// Panic inside every invocation
    pub fn panicking() -> Self {
        Self {
            should_panic: true,
            ..Default::default()
        }
    }

    pub async fn invocations(&self) -> Vec<InvokeAgentRequest> {
        self.invocations.lock().await.clone()
    }

    pub async fn clear_history(&self) {
        self.invocations.lock().await.clear();
    }
}

#[async_trait]
impl AgentRuntime for MockAgentRuntime {
    fn name(&self) -> &str {
        "mock"
    }

    async fn invoke_agent(
        &self,
        request: InvokeAgentRequest,
    ) -> Result<AgentEventStream, AgentServiceError> {
        self.invocations.lock().await.push(request);

        if self.should_panic {
            panic!("mock agent runtime panicked");
        }
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        Ok(stream::iter(self.items.clone()).boxed())
    }
}

/// Course store whose operations fail with a fixed error
#[derive(Debug, Clone)]
pub struct FailingCourseStore {
    table_name: String,
    probe_error: Option<StoreError>,
    query_error: StoreError,
}

impl FailingCourseStore {
    /// Every operation fails, including the table status probe
    pub fn new(error: StoreError) -> Self {
        Self {
            table_name: "MyCourses".to_string(),
            probe_error: Some(error.clone()),
            query_error: error,
        }
    }

    /// The probe succeeds; scans and lookups fail
    pub fn queries_only(error: StoreError) -> Self {
        Self {
            table_name: "MyCourses".to_string(),
            probe_error: None,
            query_error: error,
        }
    }
}

#[async_trait]
impl CourseStore for FailingCourseStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn table_status(&self) -> Result<String, StoreError> {
        match &self.probe_error {
            Some(error) => Err(error.clone()),
            None => Ok("ACTIVE".to_string()),
        }
    }

    async fn scan_page(
        &self,
        _state_filter: Option<&str>,
        _start_key: Option<PageKey>,
    ) -> Result<ScanPage, StoreError> {
        Err(self.query_error.clone())
    }

    async fn get_course(&self, _course_id: &str) -> Result<Option<RawCourseRecord>, StoreError> {
        Err(self.query_error.clone())
    }
}

/// Course store that panics on every read
#[derive(Debug, Clone, Default)]
pub struct PanickingCourseStore;

#[async_trait]
impl CourseStore for PanickingCourseStore {
    fn table_name(&self) -> &str {
        "MyCourses"
    }

    async fn table_status(&self) -> Result<String, StoreError> {
        panic!("course store panicked")
    }

    async fn scan_page(
        &self,
        _state_filter: Option<&str>,
        _start_key: Option<PageKey>,
    ) -> Result<ScanPage, StoreError> {
        panic!("course store panicked")
    }

    async fn get_course(&self, _course_id: &str) -> Result<Option<RawCourseRecord>, StoreError> {
        panic!("course store panicked")
    }
}
