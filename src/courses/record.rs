//! Course records as stored and as returned to callers
//!
//! The table uses inconsistent attribute names (`Course Name`,
//! `Duration (hours)`). [`Course`] is the fixed output schema, decoupled from
//! whatever the table happens to call its fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

pub const COURSE_ID_FIELD: &str = "CourseID";
pub const COURSE_NAME_FIELD: &str = "Course Name";
pub const DURATION_FIELD: &str = "Duration (hours)";
pub const STATE_FIELD: &str = "State";

/// Attribute value as held by the record store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    String(String),
    /// Arbitrary-precision decimal in its textual form
    Number(String),
    Bool(bool),
    Null,
    Binary(Vec<u8>),
    List(Vec<StoreValue>),
    Map(BTreeMap<String, StoreValue>),
    StringSet(Vec<String>),
    NumberSet(Vec<String>),
}

impl StoreValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self::Number(value.into())
    }

    /// Convert to JSON, turning every decimal into a plain float
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Number(n) => decimal_to_json(n),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null => Value::Null,
            Self::Binary(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            Self::List(items) => Value::Array(items.iter().map(StoreValue::to_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            Self::StringSet(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            Self::NumberSet(items) => Value::Array(items.iter().map(|n| decimal_to_json(n)).collect()),
        }
    }

    /// Text form used for string-typed output fields
    fn to_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => n.clone(),
            other => other.to_json().to_string(),
        }
    }
}

/// Decimal text to a JSON float. Text that does not fit an `f64` stays a string.
fn decimal_to_json(text: &str) -> Value {
    text.trim()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

/// A record exactly as the store returned it
pub type RawCourseRecord = HashMap<String, StoreValue>;

/// Course in the fixed output schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "CourseID")]
    pub course_id: String,
    #[serde(rename = "CourseName")]
    pub course_name: String,
    /// Hours as a float, or `""` when the record has no duration
    #[serde(rename = "Duration")]
    pub duration: Value,
    #[serde(rename = "State")]
    pub state: String,
}

impl Course {
    /// Normalize a stored record. Absent fields become empty strings.
    pub fn from_record(record: &RawCourseRecord) -> Self {
        let text = |field: &str| record.get(field).map(StoreValue::to_text).unwrap_or_default();

        Self {
            course_id: text(COURSE_ID_FIELD),
            course_name: text(COURSE_NAME_FIELD),
            duration: record
                .get(DURATION_FIELD)
                .map(StoreValue::to_json)
                .unwrap_or_else(|| Value::String(String::new())),
            state: text(STATE_FIELD),
        }
    }
}

/// Normalize a batch of records and order them by identifier.
///
/// Ordering is plain string comparison, so `C10` sorts before `C2`.
pub fn normalize_courses(records: &[RawCourseRecord]) -> Vec<Course> {
    let mut courses: Vec<Course> = records.iter().map(Course::from_record).collect();
    courses.sort_by(|a, b| a.course_id.cmp(&b.course_id));
    courses
}

/// Build a stored record with the table's own attribute names
pub fn raw_course(id: &str, name: &str, duration_hours: &str, state: &str) -> RawCourseRecord {
    HashMap::from([
        (COURSE_ID_FIELD.to_string(), StoreValue::string(id)),
        (COURSE_NAME_FIELD.to_string(), StoreValue::string(name)),
        (DURATION_FIELD.to_string(), StoreValue::number(duration_hours)),
        (STATE_FIELD.to_string(), StoreValue::string(state)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_maps_field_names() {
        let course = Course::from_record(&raw_course("C1", "Rust Basics", "12.5", "Completed"));

        assert_eq!(course.course_id, "C1");
        assert_eq!(course.course_name, "Rust Basics");
        assert_eq!(course.duration, json!(12.5));
        assert_eq!(course.state, "Completed");
    }

    #[test]
    fn test_missing_fields_default_to_empty_string() {
        let course = Course::from_record(&RawCourseRecord::new());
        let value = serde_json::to_value(&course).unwrap();

        assert_eq!(
            value,
            json!({"CourseID": "", "CourseName": "", "Duration": "", "State": ""})
        );
    }

    #[test]
    fn test_integral_decimal_becomes_float() {
        let course = Course::from_record(&raw_course("C1", "Go", "40", "Not Started"));
        assert!(course.duration.is_f64());
        assert_eq!(course.duration.as_f64(), Some(40.0));
    }

    #[test]
    fn test_unparseable_decimal_stays_text() {
        assert_eq!(decimal_to_json("not-a-number"), json!("not-a-number"));
    }

    #[test]
    fn test_nested_decimals_convert() {
        let value = StoreValue::Map(BTreeMap::from([
            ("hours".to_string(), StoreValue::number("1.5")),
            (
                "parts".to_string(),
                StoreValue::List(vec![StoreValue::number("2"), StoreValue::string("x")]),
            ),
            (
                "scores".to_string(),
                StoreValue::NumberSet(vec!["3".to_string()]),
            ),
        ]));

        assert_eq!(
            value.to_json(),
            json!({"hours": 1.5, "parts": [2.0, "x"], "scores": [3.0]})
        );
    }

    #[test]
    fn test_numeric_identifier_uses_decimal_text() {
        let record = HashMap::from([(COURSE_ID_FIELD.to_string(), StoreValue::number("42"))]);
        assert_eq!(Course::from_record(&record).course_id, "42");
    }

    #[test]
    fn test_sort_is_plain_string_order() {
        let records = vec![
            raw_course("C2", "b", "1", "Completed"),
            raw_course("C10", "a", "1", "Completed"),
            raw_course("C1", "c", "1", "Completed"),
        ];

        let ids: Vec<String> = normalize_courses(&records)
            .into_iter()
            .map(|c| c.course_id)
            .collect();
        assert_eq!(ids, vec!["C1", "C10", "C2"]);
    }
}
