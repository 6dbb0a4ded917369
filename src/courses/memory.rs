//! In-memory course store
//!
//! Mimics scan semantics of a paginated key-value table: the page limit is
//! applied before the state filter, so a page may come back empty while a
//! continuation key is still present.

use crate::courses::record::{RawCourseRecord, StoreValue, COURSE_ID_FIELD, STATE_FIELD};
use crate::courses::store::{CourseStore, PageKey, ScanPage, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;

const DEFAULT_PAGE_SIZE: usize = 100;
const SCAN_OFFSET_ATTRIBUTE: &str = "__scan_offset";

/// Course store holding records in insertion order
#[derive(Debug, Clone)]
pub struct InMemoryCourseStore {
    table_name: String,
    records: Vec<RawCourseRecord>,
    page_size: usize,
}

impl InMemoryCourseStore {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            records: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Limit how many records one scan page examines (minimum 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_record(mut self, record: RawCourseRecord) -> Self {
        self.insert(record);
        self
    }

    /// Insert a record, replacing any record with the same identifier.
    /// Records without an identifier are always appended.
    pub fn insert(&mut self, record: RawCourseRecord) {
        let Some(id) = record.get(COURSE_ID_FIELD).cloned() else {
            self.records.push(record);
            return;
        };
        match self
            .records
            .iter_mut()
            .find(|existing| existing.get(COURSE_ID_FIELD) == Some(&id))
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index stored in a continuation key, past the end when unreadable
    fn resume_offset(&self, key: &PageKey) -> usize {
        match key.get(SCAN_OFFSET_ATTRIBUTE) {
            Some(StoreValue::Number(offset)) => offset.parse().unwrap_or(self.records.len()),
            _ => self.records.len(),
        }
    }
}

#[async_trait]
impl CourseStore for InMemoryCourseStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn table_status(&self) -> Result<String, StoreError> {
        Ok("ACTIVE".to_string())
    }

    async fn scan_page(
        &self,
        state_filter: Option<&str>,
        start_key: Option<PageKey>,
    ) -> Result<ScanPage, StoreError> {
        let start = start_key
            .as_ref()
            .map(|key| self.resume_offset(key))
            .unwrap_or(0);
        let start = start.min(self.records.len());
        let end = (start + self.page_size).min(self.records.len());
        let examined = &self.records[start..end];

        let items = examined
            .iter()
            .filter(|record| match state_filter {
                Some(state) => record.get(STATE_FIELD) == Some(&StoreValue::string(state)),
                None => true,
            })
            .cloned()
            .collect();

        // Positional so records without an identifier still advance the scan
        let next_page = (end < self.records.len()).then(|| {
            HashMap::from([(
                SCAN_OFFSET_ATTRIBUTE.to_string(),
                StoreValue::number(end.to_string()),
            )])
        });

        Ok(ScanPage { items, next_page })
    }

    async fn get_course(&self, course_id: &str) -> Result<Option<RawCourseRecord>, StoreError> {
        let wanted = StoreValue::string(course_id);
        Ok(self
            .records
            .iter()
            .find(|record| record.get(COURSE_ID_FIELD) == Some(&wanted))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courses::record::raw_course;

    fn store() -> InMemoryCourseStore {
        InMemoryCourseStore::new("MyCourses")
            .with_page_size(2)
            .with_record(raw_course("C1", "Rust", "10", "Completed"))
            .with_record(raw_course("C2", "Go", "8", "In Progress"))
            .with_record(raw_course("C3", "SQL", "5", "Completed"))
    }

    #[tokio::test]
    async fn test_scan_pages_until_exhausted() {
        let store = store();

        let first = store.scan_page(None, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.next_page.is_some());

        let second = store.scan_page(None, first.next_page).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(second.next_page.is_none());
    }

    #[tokio::test]
    async fn test_filter_applies_after_page_limit() {
        let store = store();

        let first = store.scan_page(Some("In Progress"), None).await.unwrap();
        assert_eq!(first.items.len(), 1);
        assert!(first.next_page.is_some());

        let second = store
            .scan_page(Some("In Progress"), first.next_page)
            .await
            .unwrap();
        assert!(second.items.is_empty());
        assert!(second.next_page.is_none());
    }

    #[tokio::test]
    async fn test_insert_replaces_same_identifier() {
        let mut store = store();
        store.insert(raw_course("C2", "Go Advanced", "12", "Completed"));

        assert_eq!(store.len(), 3);
        let record = store.get_course("C2").await.unwrap().unwrap();
        assert_eq!(
            record.get("Course Name"),
            Some(&StoreValue::string("Go Advanced"))
        );
    }

    #[tokio::test]
    async fn test_page_ending_on_record_without_id_continues() {
        let orphan = RawCourseRecord::from([(
            "Course Name".to_string(),
            StoreValue::string("Orphan"),
        )]);
        let store = InMemoryCourseStore::new("MyCourses")
            .with_page_size(1)
            .with_record(orphan.clone())
            .with_record(orphan)
            .with_record(raw_course("C2", "Go", "8", "In Progress"));

        let mut seen = 0;
        let mut key = None;
        loop {
            let page = store.scan_page(None, key).await.unwrap();
            seen += page.items.len();
            match page.next_page {
                Some(next) => key = Some(next),
                None => break,
            }
        }

        assert_eq!(store.len(), 3);
        assert_eq!(seen, 3);
    }

    #[tokio::test]
    async fn test_get_missing_course() {
        assert!(store().get_course("C99").await.unwrap().is_none());
    }
}
