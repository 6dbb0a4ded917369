//! DynamoDB-backed course store
//!
//! Uses `aws-sdk-dynamodb` with the SDK's default retry behaviour.

use crate::courses::record::{RawCourseRecord, StoreValue, COURSE_ID_FIELD, STATE_FIELD};
use crate::courses::store::{CourseStore, PageKey, ScanPage, StoreError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::debug;

/// Course store reading a DynamoDB table
#[derive(Debug, Clone)]
pub struct DynamoCourseStore {
    client: Client,
    table_name: String,
}

impl DynamoCourseStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, table_name: impl Into<String>) -> Self {
        Self::new(Client::new(sdk_config), table_name)
    }
}

#[async_trait]
impl CourseStore for DynamoCourseStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn table_status(&self) -> Result<String, StoreError> {
        let output = self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(store_error)?;

        Ok(output
            .table
            .and_then(|table| table.table_status)
            .map(|status| status.as_str().to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string()))
    }

    async fn scan_page(
        &self,
        state_filter: Option<&str>,
        start_key: Option<PageKey>,
    ) -> Result<ScanPage, StoreError> {
        let mut request = self
            .client
            .scan()
            .table_name(&self.table_name)
            .set_exclusive_start_key(start_key.map(to_attribute_map));

        if let Some(state) = state_filter {
            request = request
                .filter_expression("#state = :state")
                .expression_attribute_names("#state", STATE_FIELD)
                .expression_attribute_values(":state", AttributeValue::S(state.to_string()));
        }

        let output = request.send().await.map_err(store_error)?;
        let items: Vec<RawCourseRecord> = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(from_attribute_map)
            .collect();
        let next_page = output
            .last_evaluated_key
            .filter(|key| !key.is_empty())
            .map(from_attribute_map);

        debug!(
            "Scanned {} items from {} (more pages: {})",
            items.len(),
            self.table_name,
            next_page.is_some()
        );

        Ok(ScanPage { items, next_page })
    }

    async fn get_course(&self, course_id: &str) -> Result<Option<RawCourseRecord>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(COURSE_ID_FIELD, AttributeValue::S(course_id.to_string()))
            .send()
            .await
            .map_err(store_error)?;

        Ok(output.item.map(from_attribute_map))
    }
}

fn store_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug + 'static,
{
    let detail = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => StoreError::Connection(detail),
        SdkError::ServiceError(service_err) => match service_err.err().code() {
            Some("ResourceNotFoundException") | Some("AccessDeniedException") => {
                StoreError::TableUnavailable(detail)
            }
            _ => StoreError::Request(detail),
        },
        _ => StoreError::Request(detail),
    }
}

fn from_attribute_map(map: HashMap<String, AttributeValue>) -> HashMap<String, StoreValue> {
    map.into_iter()
        .map(|(name, value)| (name, from_attribute(value)))
        .collect()
}

fn from_attribute(value: AttributeValue) -> StoreValue {
    match value {
        AttributeValue::S(s) => StoreValue::String(s),
        AttributeValue::N(n) => StoreValue::Number(n),
        AttributeValue::Bool(b) => StoreValue::Bool(b),
        AttributeValue::Null(_) => StoreValue::Null,
        AttributeValue::B(blob) => StoreValue::Binary(blob.into_inner()),
        AttributeValue::L(items) => StoreValue::List(items.into_iter().map(from_attribute).collect()),
        AttributeValue::M(entries) => StoreValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, from_attribute(v)))
                .collect(),
        ),
        AttributeValue::Ss(items) => StoreValue::StringSet(items),
        AttributeValue::Ns(items) => StoreValue::NumberSet(items),
        AttributeValue::Bs(items) => StoreValue::List(
            items
                .into_iter()
                .map(|blob| StoreValue::Binary(blob.into_inner()))
                .collect(),
        ),
        _ => StoreValue::Null,
    }
}

fn to_attribute_map(map: HashMap<String, StoreValue>) -> HashMap<String, AttributeValue> {
    map.into_iter()
        .map(|(name, value)| (name, to_attribute(value)))
        .collect()
}

fn to_attribute(value: StoreValue) -> AttributeValue {
    match value {
        StoreValue::String(s) => AttributeValue::S(s),
        StoreValue::Number(n) => AttributeValue::N(n),
        StoreValue::Bool(b) => AttributeValue::Bool(b),
        StoreValue::Null => AttributeValue::Null(true),
        StoreValue::Binary(bytes) => AttributeValue::B(Blob::new(bytes)),
        StoreValue::List(items) => AttributeValue::L(items.into_iter().map(to_attribute).collect()),
        StoreValue::Map(entries) => AttributeValue::M(
            entries
                .into_iter()
                .map(|(k, v)| (k, to_attribute(v)))
                .collect(),
        ),
        StoreValue::StringSet(items) => AttributeValue::Ss(items),
        StoreValue::NumberSet(items) => AttributeValue::Ns(items),
    }
}
