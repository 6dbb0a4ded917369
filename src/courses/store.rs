//! Record store abstraction
//!
//! The course table is external and read-only from this crate's point of view.
//! Implementations expose one page of a scan at a time; the query service owns
//! the pagination loop.

use crate::courses::record::{RawCourseRecord, StoreValue};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Continuation key returned by a scan page
pub type PageKey = HashMap<String, StoreValue>;

/// One page of scan results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<RawCourseRecord>,
    /// Present while more data remains
    pub next_page: Option<PageKey>,
}

/// Record store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached at all
    #[error("Connection to course store failed: {0}")]
    Connection(String),
    /// The table is missing or the caller lacks permission to read it
    #[error("Table unavailable: {0}")]
    TableUnavailable(String),
    /// The store rejected or failed the request
    #[error("Store request failed: {0}")]
    Request(String),
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Read-only course store
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Name of the backing table
    fn table_name(&self) -> &str;

    /// Current table status (e.g. `ACTIVE`), used as an access probe
    async fn table_status(&self) -> Result<String, StoreError>;

    /// Scan one page, optionally keeping only records whose `State` equals
    /// `state_filter` exactly
    async fn scan_page(
        &self,
        state_filter: Option<&str>,
        start_key: Option<PageKey>,
    ) -> Result<ScanPage, StoreError>;

    /// Point lookup by course identifier
    async fn get_course(&self, course_id: &str) -> Result<Option<RawCourseRecord>, StoreError>;
}
