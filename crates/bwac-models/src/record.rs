//! AIS position reports.
//!
//! The provider decides which fields a report carries, so a report is kept
//! as an insertion-ordered JSON object. Field order is significant: it is
//! reused verbatim as the CSV header of every file the report starts.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::timestamp::parse_msgtime;

/// Name of the field holding the report time.
pub const MSGTIME_FIELD: &str = "msgtime";

/// Name of the field holding the vessel identifier.
pub const MMSI_FIELD: &str = "mmsi";

/// One decoded AIS position report.
///
/// Example provider line:
/// `{"courseOverGround":268,"latitude":66.004573,"longitude":8.029767,"mmsi":258627000,"msgtime":"2025-07-24T10:14:50+00:00"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionReport {
    fields: Map<String, Value>,
}

impl PositionReport {
    /// Decode a report from one line of the live feed.
    pub fn from_json_line(line: &str) -> ModelResult<Self> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value)
    }

    /// Wrap an already decoded JSON value. Only objects are reports.
    pub fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ModelError::invalid_record(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Field names in the order the provider sent them.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Field values in the order the provider sent them.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw `msgtime` string.
    pub fn msgtime(&self) -> ModelResult<&str> {
        match self.fields.get(MSGTIME_FIELD) {
            Some(Value::String(raw)) => Ok(raw),
            Some(other) => Err(ModelError::invalid_record(format!(
                "msgtime must be a string, got {}",
                kind_of(other)
            ))),
            None => Err(ModelError::MissingField(MSGTIME_FIELD)),
        }
    }

    /// Normalized report time.
    pub fn timestamp(&self) -> ModelResult<DateTime<FixedOffset>> {
        parse_msgtime(self.msgtime()?)
    }

    /// Vessel identifier rendered as text, as it appears in file names.
    pub fn mmsi(&self) -> ModelResult<String> {
        match self.fields.get(MMSI_FIELD) {
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(other) => Err(ModelError::invalid_record(format!(
                "mmsi must be a number or non-empty string, got {}",
                kind_of(other)
            ))),
            None => Err(ModelError::MissingField(MMSI_FIELD)),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"courseOverGround":268,"latitude":66.004573,"longitude":8.029767,"name":"TRANSOCEAN ENCOURAGE","rateOfTurn":-3,"shipType":90,"speedOverGround":0,"trueHeading":225,"navigationalStatus":3,"mmsi":258627000,"msgtime":"2025-07-24T10:14:50+00:00"}"#;

    #[test]
    fn test_field_order_is_preserved() {
        let report = PositionReport::from_json_line(SAMPLE).unwrap();
        let names: Vec<&str> = report.field_names().collect();
        assert_eq!(
            names,
            vec![
                "courseOverGround",
                "latitude",
                "longitude",
                "name",
                "rateOfTurn",
                "shipType",
                "speedOverGround",
                "trueHeading",
                "navigationalStatus",
                "mmsi",
                "msgtime"
            ]
        );
    }

    #[test]
    fn test_msgtime_and_mmsi() {
        let report = PositionReport::from_json_line(SAMPLE).unwrap();
        assert_eq!(report.msgtime().unwrap(), "2025-07-24T10:14:50+00:00");
        assert_eq!(report.mmsi().unwrap(), "258627000");
        assert_eq!(report.timestamp().unwrap().timestamp(), 1_753_352_090);
    }

    #[test]
    fn test_rejects_non_object_lines() {
        let err = PositionReport::from_json_line("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ModelError::InvalidRecord(_)));

        let err = PositionReport::from_json_line("{not json").unwrap_err();
        assert!(matches!(err, ModelError::Json(_)));
    }

    #[test]
    fn test_missing_msgtime() {
        let report = PositionReport::from_json_line(r#"{"mmsi":1}"#).unwrap();
        assert!(matches!(
            report.msgtime(),
            Err(ModelError::MissingField(MSGTIME_FIELD))
        ));
    }

    #[test]
    fn test_deserializes_track_lists() {
        let track: Vec<PositionReport> = serde_json::from_str(
            r#"[{"mmsi":1,"msgtime":"2025-07-24T10:00:00+00:00"},{"mmsi":1,"msgtime":"2025-07-24T10:01:00+00:00"}]"#,
        )
        .unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track[1].msgtime().unwrap(), "2025-07-24T10:01:00+00:00");
    }
}
