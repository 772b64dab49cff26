//! LogEntry domain type
//!
//! One performance measurement record as delivered by the instrumented process.
//! Entries are validated once at the ingestion boundary and never mutated after.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ValidationError;

/// Kind of performance record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// A single point in time
    Mark,
    /// A span between two marks
    Measure,
}

impl EntryType {
    /// Wire name of this entry type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Mark => "mark",
            EntryType::Measure => "measure",
        }
    }

    fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "mark" => Ok(EntryType::Mark),
            "measure" => Ok(EntryType::Measure),
            other => Err(ValidationError::InvalidEntryType {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One performance measurement record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Identifier of the measured span
    pub name: String,
    pub entry_type: EntryType,
    /// Timestamp in the producer's monotonic clock units
    pub start_time: f64,
    /// Elapsed time, never negative
    pub duration: f64,
    /// Opaque producer payload, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    /// Baseline row marker for display; no effect on ingestion
    #[serde(default)]
    pub is_base: bool,
}

impl LogEntry {
    /// Create a `measure` entry
    pub fn measure(name: impl Into<String>, start_time: f64, duration: f64) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::Measure,
            start_time,
            duration,
            detail: None,
            is_base: false,
        }
    }

    /// Create a `mark` entry (zero duration)
    pub fn mark(name: impl Into<String>, start_time: f64) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::Mark,
            start_time,
            duration: 0.0,
            detail: None,
            is_base: false,
        }
    }

    /// Builder: attach an opaque detail payload
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Builder: flag as a baseline row
    pub fn with_base(mut self, is_base: bool) -> Self {
        self.is_base = is_base;
        self
    }

    /// Check the numeric invariants of an already-typed entry
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.start_time.is_finite() {
            return Err(ValidationError::NotFinite { field: "startTime" });
        }
        if !self.duration.is_finite() {
            return Err(ValidationError::NotFinite { field: "duration" });
        }
        if self.duration < 0.0 {
            return Err(ValidationError::NegativeDuration {
                duration: self.duration,
            });
        }
        Ok(())
    }

    /// Build an entry from an untyped payload, rejecting anything malformed
    ///
    /// The returned error names the offending field.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let name = required(obj, "name")?
            .as_str()
            .ok_or_else(|| wrong_type(obj, "name", "a string"))?
            .to_string();

        let entry_type = EntryType::parse(
            required(obj, "entryType")?
                .as_str()
                .ok_or_else(|| wrong_type(obj, "entryType", "a string"))?,
        )?;

        let start_time = number(obj, "startTime")?;
        let duration = number(obj, "duration")?;

        let is_base = match obj.get("isBase") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(wrong_type(obj, "isBase", "a boolean")),
        };

        let detail = match obj.get("detail") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.clone()),
        };

        let entry = Self {
            name,
            entry_type,
            start_time,
            duration,
            detail,
            is_base,
        };
        entry.validate()?;
        debug!(name = %entry.name, entry_type = %entry.entry_type, "LogEntry::from_value: accepted");
        Ok(entry)
    }
}

fn required<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(v) => Ok(v),
    }
}

fn number(obj: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let value = required(obj, field)?;
    let n = value.as_f64().ok_or_else(|| wrong_type(obj, field, "a number"))?;
    if !n.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    Ok(n)
}

fn wrong_type(obj: &Map<String, Value>, field: &'static str, expected: &'static str) -> ValidationError {
    let found = match obj.get(field) {
        Some(Value::Null) | None => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    };
    ValidationError::WrongType {
        field,
        expected,
        found: found.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full_payload() {
        let payload = json!({
            "name": "require:App",
            "entryType": "measure",
            "startTime": 1024.5,
            "duration": 12.25,
            "detail": {"module": 42},
            "isBase": true
        });

        let entry = LogEntry::from_value(&payload).unwrap();
        assert_eq!(entry.name, "require:App");
        assert_eq!(entry.entry_type, EntryType::Measure);
        assert_eq!(entry.start_time, 1024.5);
        assert_eq!(entry.duration, 12.25);
        assert_eq!(entry.detail, Some(json!({"module": 42})));
        assert!(entry.is_base);
    }

    #[test]
    fn test_from_value_defaults_optional_fields() {
        let payload = json!({
            "name": "boot",
            "entryType": "mark",
            "startTime": 0,
            "duration": 0
        });

        let entry = LogEntry::from_value(&payload).unwrap();
        assert_eq!(entry.entry_type, EntryType::Mark);
        assert!(entry.detail.is_none());
        assert!(!entry.is_base);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert_eq!(LogEntry::from_value(&json!([1, 2])), Err(ValidationError::NotAnObject));
    }

    #[test]
    fn test_from_value_rejects_missing_start_time() {
        let payload = json!({"name": "x", "entryType": "measure", "duration": 1.0});
        assert_eq!(
            LogEntry::from_value(&payload),
            Err(ValidationError::MissingField { field: "startTime" })
        );
    }

    #[test]
    fn test_from_value_rejects_string_duration() {
        let payload = json!({"name": "x", "entryType": "measure", "startTime": 1.0, "duration": "3ms"});
        let err = LogEntry::from_value(&payload).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongType {
                field: "duration",
                expected: "a number",
                found: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_from_value_rejects_negative_duration() {
        let payload = json!({"name": "x", "entryType": "measure", "startTime": 1.0, "duration": -0.5});
        assert_eq!(
            LogEntry::from_value(&payload),
            Err(ValidationError::NegativeDuration { duration: -0.5 })
        );
    }

    #[test]
    fn test_from_value_rejects_unknown_entry_type() {
        let payload = json!({"name": "x", "entryType": "paint", "startTime": 1.0, "duration": 1.0});
        assert!(matches!(
            LogEntry::from_value(&payload),
            Err(ValidationError::InvalidEntryType { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let entry = LogEntry::measure("x", f64::NAN, 1.0);
        assert_eq!(entry.validate(), Err(ValidationError::NotFinite { field: "startTime" }));
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let entry = LogEntry::measure("x", 1.0, 2.0).with_base(true);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"entryType\":\"measure\""));
        assert!(json.contains("\"startTime\""));
        assert!(json.contains("\"isBase\":true"));
        assert!(!json.contains("detail"));
    }
}
