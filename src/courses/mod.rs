//! Course records and the action-group query service

pub mod action;
pub mod dynamo;
pub mod memory;
pub mod record;
pub mod service;
pub mod store;

pub use action::{ActionEvent, ActionParameter, ActionResponse};
pub use dynamo::DynamoCourseStore;
pub use memory::InMemoryCourseStore;
pub use record::{normalize_courses, raw_course, Course, RawCourseRecord, StoreValue};
pub use service::{
    CourseDetails, CourseList, CourseOperation, CourseQueryService, QueryData, QueryOutcome,
    AVAILABLE_PATHS, VALID_STATES,
};
pub use store::{CourseStore, PageKey, ScanPage, StoreError};
