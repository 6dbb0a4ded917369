//! DynamoDB course store tests
//!
//! Points the SDK client at a wiremock server speaking the DynamoDB JSON
//! protocol, so requests and pagination run through the real client code.

use aws_sdk_dynamodb::config::retry::RetryConfig;
use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::{Client, Config};
use serde_json::json;
use std::sync::Arc;
use upskill_coach::courses::{CourseQueryService, CourseStore, DynamoCourseStore, StoreError};
use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AMZ_JSON: &str = "application/x-amz-json-1.0";

fn client(endpoint: &str) -> Client {
    let config = Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "static"))
        .endpoint_url(endpoint)
        .retry_config(RetryConfig::disabled())
        .build();
    Client::from_conf(config)
}

fn store(server: &MockServer) -> DynamoCourseStore {
    DynamoCourseStore::new(client(&server.uri()), "MyCourses")
}

fn item(id: &str, name: &str, hours: &str, state: &str) -> serde_json::Value {
    json!({
        "CourseID": {"S": id},
        "Course Name": {"S": name},
        "Duration (hours)": {"N": hours},
        "State": {"S": state},
    })
}

fn dynamo_reply(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), AMZ_JSON)
}

fn dynamo_error(kind: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_raw(
        json!({
            "__type": format!("com.amazonaws.dynamodb.v20120810#{kind}"),
            "message": message,
        })
        .to_string(),
        AMZ_JSON,
    )
}

async fn mount(server: &MockServer, target: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(header("x-amz-target", target))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_table_status_probe() {
    let server = MockServer::start().await;
    mount(
        &server,
        "DynamoDB_20120810.DescribeTable",
        dynamo_reply(json!({"Table": {"TableName": "MyCourses", "TableStatus": "ACTIVE"}})),
    )
    .await;

    assert_eq!(store(&server).table_status().await.unwrap(), "ACTIVE");
}

#[tokio::test]
async fn test_missing_table_is_unavailable() {
    let server = MockServer::start().await;
    mount(
        &server,
        "DynamoDB_20120810.DescribeTable",
        dynamo_error("ResourceNotFoundException", "Requested resource not found"),
    )
    .await;

    let result = store(&server).table_status().await;
    assert!(matches!(result, Err(StoreError::TableUnavailable(_))));
}

#[tokio::test]
async fn test_scan_page_decodes_items_and_continuation() {
    let server = MockServer::start().await;
    mount(
        &server,
        "DynamoDB_20120810.Scan",
        dynamo_reply(json!({
            "Items": [item("C1", "Rust", "10.5", "Completed")],
            "Count": 1,
            "ScannedCount": 1,
            "LastEvaluatedKey": {"CourseID": {"S": "C1"}},
        })),
    )
    .await;

    let page = store(&server).scan_page(None, None).await.unwrap();

    assert_eq!(page.items.len(), 1);
    assert!(page.next_page.is_some());
}

#[tokio::test]
async fn test_state_filter_is_sent_as_expression() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "DynamoDB_20120810.Scan"))
        .and(body_string_contains("FilterExpression"))
        .and(body_string_contains("In Progress"))
        .respond_with(dynamo_reply(json!({"Items": [], "Count": 0, "ScannedCount": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let page = store(&server)
        .scan_page(Some("In Progress"), None)
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert!(page.next_page.is_none());
}

#[tokio::test]
async fn test_get_course_found_and_missing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "DynamoDB_20120810.GetItem"))
        .and(body_string_contains("\"C2\""))
        .respond_with(dynamo_reply(json!({"Item": item("C2", "Go", "8", "Not Started")})))
        .mount(&server)
        .await;
    mount(&server, "DynamoDB_20120810.GetItem", dynamo_reply(json!({}))).await;

    let store = store(&server);
    assert!(store.get_course("C2").await.unwrap().is_some());
    assert!(store.get_course("C404").await.unwrap().is_none());
}

#[tokio::test]
async fn test_throttled_scan_is_a_request_error() {
    let server = MockServer::start().await;
    mount(
        &server,
        "DynamoDB_20120810.Scan",
        dynamo_error("ProvisionedThroughputExceededException", "Slow down"),
    )
    .await;

    let result = store(&server).scan_page(None, None).await;
    assert!(matches!(result, Err(StoreError::Request(_))));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_connection_error() {
    // Nothing listens on port 1
    let store = DynamoCourseStore::new(client("http://127.0.0.1:1"), "MyCourses");

    let result = store.get_course("C1").await;
    assert!(matches!(result, Err(StoreError::Connection(_))));
}

#[tokio::test]
async fn test_service_follows_pagination_through_sdk() {
    let server = MockServer::start().await;
    mount(
        &server,
        "DynamoDB_20120810.DescribeTable",
        dynamo_reply(json!({"Table": {"TableName": "MyCourses", "TableStatus": "ACTIVE"}})),
    )
    .await;
    // Second page first: the more specific mock must take precedence
    Mock::given(method("POST"))
        .and(header("x-amz-target", "DynamoDB_20120810.Scan"))
        .and(body_string_contains("ExclusiveStartKey"))
        .respond_with(dynamo_reply(json!({
            "Items": [item("C1", "Rust", "10", "Completed")],
            "Count": 1,
            "ScannedCount": 1,
        })))
        .mount(&server)
        .await;
    mount(
        &server,
        "DynamoDB_20120810.Scan",
        dynamo_reply(json!({
            "Items": [item("C3", "SQL", "5", "In Progress"), item("C2", "Go", "8", "Completed")],
            "Count": 2,
            "ScannedCount": 2,
            "LastEvaluatedKey": {"CourseID": {"S": "C2"}},
        })),
    )
    .await;

    let service = CourseQueryService::new(Arc::new(store(&server)));
    let response = service
        .handle(&json!({"apiPath": "/getAllCourses", "parameters": []}))
        .await;
    let result = response.result().unwrap();

    assert_eq!(response.status_code(), 200);
    assert_eq!(result["data"]["totalCourses"], 3);
    assert_eq!(result["data"]["courses"][0]["CourseID"], "C1");
    assert_eq!(result["data"]["courses"][0]["Duration"], 10.0);
}
