//! Course query service
//!
//! Maps an action path to one of six read operations against the course
//! store and wraps the outcome in the action-group envelope.

use crate::courses::action::{echo_fields, ActionEvent, ActionResponse};
use crate::courses::record::{normalize_courses, Course, RawCourseRecord};
use crate::courses::store::{CourseStore, StoreError};
use crate::error::{panic_message, sanitize_error_message};
use crate::observability::metrics;
use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn, Instrument};

pub const AVAILABLE_PATHS: [&str; 6] = [
    "/getAllCourses",
    "/getCoursesByState",
    "/getCourseDetails",
    "/getCompletedCourses",
    "/getInProgressCourses",
    "/getNotStartedCourses",
];

pub const VALID_STATES: [&str; 3] = ["Completed", "In Progress", "Not Started"];

const UNKNOWN_PATH_LABEL: &str = "unknown";
const TABLE_ACCESS_SUGGESTION: &str = "Check if table exists and IAM permissions are correct";

/// Read operation selected by the action path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseOperation {
    ListAll,
    ListByState,
    GetDetails,
    ListCompleted,
    ListInProgress,
    ListNotStarted,
}

impl CourseOperation {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/getAllCourses" => Some(Self::ListAll),
            "/getCoursesByState" => Some(Self::ListByState),
            "/getCourseDetails" => Some(Self::GetDetails),
            "/getCompletedCourses" => Some(Self::ListCompleted),
            "/getInProgressCourses" => Some(Self::ListInProgress),
            "/getNotStartedCourses" => Some(Self::ListNotStarted),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::ListAll => "/getAllCourses",
            Self::ListByState => "/getCoursesByState",
            Self::GetDetails => "/getCourseDetails",
            Self::ListCompleted => "/getCompletedCourses",
            Self::ListInProgress => "/getInProgressCourses",
            Self::ListNotStarted => "/getNotStartedCourses",
        }
    }

    /// Metrics bucket for a requested path; unrecognized paths share one bucket
    pub fn metrics_label(path: &str) -> &'static str {
        Self::from_path(path)
            .map(|operation| operation.path())
            .unwrap_or(UNKNOWN_PATH_LABEL)
    }

    /// State implied by the convenience paths
    pub fn fixed_state(&self) -> Option<&'static str> {
        match self {
            Self::ListCompleted => Some("Completed"),
            Self::ListInProgress => Some("In Progress"),
            Self::ListNotStarted => Some("Not Started"),
            _ => None,
        }
    }
}

/// Course list payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseList {
    pub courses: Vec<Course>,
    pub total_courses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub message: String,
}

/// Single course lookup payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    pub course_id: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryData {
    Courses(CourseList),
    Details(CourseDetails),
}

/// Result of one course query, serialized at the boundary
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Success { data: QueryData },
    Failure { message: String, context: Map<String, Value> },
}

impl QueryOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            context: Map::new(),
        }
    }

    /// Attach an extra field to a failure. No effect on success.
    pub fn with_context(mut self, key: &str, value: Value) -> Self {
        if let Self::Failure { context, .. } = &mut self {
            context.insert(key.to_string(), value);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// `{"success": true, "data": ...}` or `{"success": false, "error": ..., <context>}`
    pub fn to_json(&self) -> Value {
        match self {
            Self::Success { data } => json!({
                "success": true,
                "data": serde_json::to_value(data).unwrap_or(Value::Null),
            }),
            Self::Failure { message, context } => {
                let mut body = Map::new();
                body.insert("success".to_string(), Value::Bool(false));
                body.insert("error".to_string(), Value::String(message.clone()));
                for (key, value) in context {
                    body.insert(key.clone(), value.clone());
                }
                Value::Object(body)
            }
        }
    }
}

/// Store failure that must surface as the connection-failure envelope
#[derive(Debug)]
struct ConnectionLost(String);

type OperationResult = Result<QueryOutcome, ConnectionLost>;

/// Serves course records to the calling agent
#[derive(Clone)]
pub struct CourseQueryService {
    store: Arc<dyn CourseStore>,
}

impl CourseQueryService {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }

    pub fn table_name(&self) -> &str {
        self.store.table_name()
    }

    /// Handle one raw action event. Never fails: every fault becomes an envelope.
    pub async fn handle(&self, event: &Value) -> ActionResponse {
        let (action_group, api_path, http_method) = echo_fields(event);
        let span = crate::action_span!(api_path = %api_path, action_group = %action_group);

        async move {
            info!("Received action event: {}", event);
            let started = Instant::now();

            let result = AssertUnwindSafe(self.handle_event(event)).catch_unwind().await;
            let response = match result {
                Ok(response) => response,
                Err(panic) => {
                    let detail = panic_message(&*panic);
                    error!("Course query panicked: {}", detail);
                    let outcome = internal_error(&detail, "Panic");
                    ActionResponse::new(&action_group, &api_path, &http_method, &outcome.to_json())
                }
            };

            let status = response.status_code();
            metrics().course_query(
                CourseOperation::metrics_label(&api_path),
                started.elapsed(),
                status == 200,
            );
            info!(
                "Returning response with status {} in {}ms",
                status,
                started.elapsed().as_millis()
            );
            response
        }
        .instrument(span)
        .await
    }

    async fn handle_event(&self, event: &Value) -> ActionResponse {
        let (action_group, api_path, http_method) = echo_fields(event);

        let action: ActionEvent = match serde_json::from_value(event.clone()) {
            Ok(action) => action,
            Err(e) => {
                error!("Malformed action event: {}", e);
                let outcome = internal_error(&e.to_string(), "MalformedEvent");
                return ActionResponse::new(
                    &action_group,
                    &api_path,
                    &http_method,
                    &outcome.to_json(),
                );
            }
        };

        let params = action.parameter_map();
        info!(
            "Processing - API Path: {}, Method: {}, Params: {:?}",
            action.api_path(),
            action.http_method(),
            params
        );

        match self.dispatch(action.api_path(), &params).await {
            Ok(outcome) => ActionResponse::new(
                action.action_group(),
                action.api_path(),
                action.http_method(),
                &outcome.to_json(),
            ),
            Err(ConnectionLost(details)) => {
                error!("Course store unreachable: {}", details);
                metrics().store_connection_failed();
                ActionResponse::connection_failure(&sanitize_error_message(&details))
            }
        }
    }

    /// Run the operation named by `api_path`. Connection-level store
    /// failures are reported as [`StoreError::Connection`].
    pub async fn execute(
        &self,
        api_path: &str,
        params: &HashMap<String, String>,
    ) -> Result<QueryOutcome, StoreError> {
        self.dispatch(api_path, params)
            .await
            .map_err(|ConnectionLost(details)| StoreError::Connection(details))
    }

    async fn dispatch(&self, api_path: &str, params: &HashMap<String, String>) -> OperationResult {
        let Some(operation) = CourseOperation::from_path(api_path) else {
            warn!("Unknown API path: {}", api_path);
            return Ok(QueryOutcome::failure(format!("Unknown API path: {api_path}"))
                .with_context("availablePaths", json!(AVAILABLE_PATHS)));
        };

        match operation {
            CourseOperation::ListAll => self.list_all().await,
            CourseOperation::ListByState => {
                self.list_by_state(params.get("state").map(String::as_str))
                    .await
            }
            CourseOperation::GetDetails => {
                self.get_course_details(params.get("courseId").map(String::as_str))
                    .await
            }
            fixed => self.list_by_state(fixed.fixed_state()).await,
        }
    }

    async fn list_all(&self) -> OperationResult {
        let table = self.store.table_name();
        info!("Scanning {} table for all courses", table);

        match self.store.table_status().await {
            Ok(status) => info!("Table status: {}", status),
            Err(StoreError::Connection(details)) => return Err(ConnectionLost(details)),
            Err(e) => {
                error!("Cannot access table: {}", e);
                return Ok(QueryOutcome::failure(format!(
                    "Cannot access {table} table: {}",
                    sanitize_error_message(&e.to_string())
                ))
                .with_context("suggestion", json!(TABLE_ACCESS_SUGGESTION)));
            }
        }

        let records = match self.scan_all(None).await {
            Ok(records) => records,
            Err(e) => return operation_failure(e, "Failed to retrieve courses", "get_all_courses"),
        };

        let courses = normalize_courses(&records);
        info!("Successfully retrieved {} courses", courses.len());
        Ok(QueryOutcome::Success {
            data: QueryData::Courses(CourseList {
                message: format!(
                    "Retrieved {} courses successfully from {} table",
                    courses.len(),
                    table
                ),
                total_courses: courses.len(),
                courses,
                state: None,
            }),
        })
    }

    async fn list_by_state(&self, state: Option<&str>) -> OperationResult {
        let Some(state) = state.filter(|s| !s.is_empty()) else {
            return Ok(QueryOutcome::failure("state parameter is required")
                .with_context("validStates", json!(VALID_STATES)));
        };
        info!("Getting courses with state: {}", state);

        let records = match self.scan_all(Some(state)).await {
            Ok(records) => records,
            Err(e) => {
                return operation_failure(
                    e,
                    "Failed to filter courses by state",
                    "get_courses_by_state",
                )
            }
        };

        let courses = normalize_courses(&records);
        info!("Found {} courses with state: {}", courses.len(), state);
        Ok(QueryOutcome::Success {
            data: QueryData::Courses(CourseList {
                message: format!("Found {} courses with state: {}", courses.len(), state),
                total_courses: courses.len(),
                courses,
                state: Some(state.to_string()),
            }),
        })
    }

    async fn get_course_details(&self, course_id: Option<&str>) -> OperationResult {
        let Some(course_id) = course_id.filter(|id| !id.is_empty()) else {
            return Ok(QueryOutcome::failure("courseId parameter is required"));
        };
        info!("Getting details for course: {}", course_id);

        let record = match self.store.get_course(course_id).await {
            Ok(record) => record,
            Err(e) => {
                return operation_failure(e, "Failed to get course details", "get_course_details")
            }
        };

        let details = match record {
            Some(record) => CourseDetails {
                course_id: course_id.to_string(),
                found: true,
                course: Some(Course::from_record(&record)),
                message: "Course details retrieved successfully".to_string(),
            },
            None => CourseDetails {
                course_id: course_id.to_string(),
                found: false,
                course: None,
                message: format!("Course with ID {course_id} not found"),
            },
        };

        Ok(QueryOutcome::Success {
            data: QueryData::Details(details),
        })
    }

    /// Scan every page until the store stops returning a continuation key
    async fn scan_all(&self, state: Option<&str>) -> Result<Vec<RawCourseRecord>, StoreError> {
        let mut records = Vec::new();
        let mut start_key = None;
        let mut pages = 0usize;

        loop {
            let page = self.store.scan_page(state, start_key).await?;
            pages += 1;
            records.extend(page.items);
            match page.next_page {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        tracing::debug!("Scan finished after {} pages, {} records", pages, records.len());
        Ok(records)
    }
}

fn operation_failure(err: StoreError, prefix: &str, function: &str) -> OperationResult {
    if let StoreError::Connection(details) = err {
        return Err(ConnectionLost(details));
    }

    error!("Error in {}: {}", function, err);
    Ok(QueryOutcome::failure(format!(
        "{prefix}: {}",
        sanitize_error_message(&err.to_string())
    ))
    .with_context("function", json!(function)))
}

fn internal_error(detail: &str, kind: &str) -> QueryOutcome {
    QueryOutcome::failure(format!("Internal error: {}", sanitize_error_message(detail)))
        .with_context("type", json!(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courses::memory::InMemoryCourseStore;
    use crate::courses::record::raw_course;

    fn service() -> CourseQueryService {
        let store = InMemoryCourseStore::new("MyCourses")
            .with_page_size(2)
            .with_record(raw_course("C3", "SQL", "5", "Completed"))
            .with_record(raw_course("C1", "Rust", "10.5", "In Progress"))
            .with_record(raw_course("C2", "Go", "8", "Completed"));
        CourseQueryService::new(Arc::new(store))
    }

    fn no_params() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_operation_paths_round_trip() {
        for path in AVAILABLE_PATHS {
            let operation = CourseOperation::from_path(path).unwrap();
            assert_eq!(operation.path(), path);
        }
        assert!(CourseOperation::from_path("/getCourses").is_none());
        assert_eq!(
            CourseOperation::metrics_label("/getCourseDetails"),
            "/getCourseDetails"
        );
        assert_eq!(CourseOperation::metrics_label("/junk42"), "unknown");
        assert_eq!(
            CourseOperation::ListInProgress.fixed_state(),
            Some("In Progress")
        );
    }

    #[test]
    fn test_failure_serializes_context_inline() {
        let outcome = QueryOutcome::failure("state parameter is required")
            .with_context("validStates", json!(VALID_STATES));

        assert_eq!(
            outcome.to_json(),
            json!({
                "success": false,
                "error": "state parameter is required",
                "validStates": ["Completed", "In Progress", "Not Started"]
            })
        );
    }

    #[tokio::test]
    async fn test_list_all_sorted_across_pages() {
        let outcome = service().execute("/getAllCourses", &no_params()).await.unwrap();
        let body = outcome.to_json();

        assert_eq!(body["data"]["totalCourses"], 3);
        assert_eq!(body["data"]["courses"][0]["CourseID"], "C1");
        assert_eq!(body["data"]["courses"][0]["Duration"], 10.5);
        assert_eq!(body["data"]["courses"][2]["CourseID"], "C3");
        assert_eq!(
            body["data"]["message"],
            "Retrieved 3 courses successfully from MyCourses table"
        );
        assert!(body["data"].get("state").is_none());
    }

    #[tokio::test]
    async fn test_fixed_state_paths() {
        let outcome = service()
            .execute("/getCompletedCourses", &no_params())
            .await
            .unwrap();
        let body = outcome.to_json();

        assert_eq!(body["data"]["totalCourses"], 2);
        assert_eq!(body["data"]["state"], "Completed");
        assert_eq!(body["data"]["message"], "Found 2 courses with state: Completed");
    }

    #[tokio::test]
    async fn test_empty_state_is_rejected() {
        let params = HashMap::from([("state".to_string(), String::new())]);
        let outcome = service()
            .execute("/getCoursesByState", &params)
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.to_json()["error"], "state parameter is required");
    }

    #[tokio::test]
    async fn test_course_details_found_and_missing() {
        let service = service();

        let params = HashMap::from([("courseId".to_string(), "C2".to_string())]);
        let found = service.execute("/getCourseDetails", &params).await.unwrap();
        let body = found.to_json();
        assert_eq!(body["data"]["found"], true);
        assert_eq!(body["data"]["course"]["CourseName"], "Go");

        let params = HashMap::from([("courseId".to_string(), "C9".to_string())]);
        let missing = service.execute("/getCourseDetails", &params).await.unwrap();
        let body = missing.to_json();
        assert!(missing.is_success());
        assert_eq!(body["data"]["found"], false);
        assert_eq!(body["data"]["message"], "Course with ID C9 not found");
        assert!(body["data"].get("course").is_none());
    }

    #[tokio::test]
    async fn test_unknown_path_lists_available_paths() {
        let outcome = service().execute("/dropTable", &no_params()).await.unwrap();
        let body = outcome.to_json();

        assert_eq!(body["error"], "Unknown API path: /dropTable");
        assert_eq!(body["availablePaths"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_handle_malformed_parameters() {
        let event = json!({"apiPath": "/getAllCourses", "parameters": "not-a-list"});
        let response = service().handle(&event).await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(response.response.api_path, "/getAllCourses");
        let result = response.result().unwrap();
        assert!(result["error"]
            .as_str()
            .unwrap()
            .starts_with("Internal error: "));
        assert_eq!(result["type"], "MalformedEvent");
    }
}
