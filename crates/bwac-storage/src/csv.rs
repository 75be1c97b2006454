//! CSV line rendering.
//!
//! Values are joined with commas using their plain string form. Nothing is
//! quoted or escaped: provider data is assumed to be free of delimiters.

use bwac_models::PositionReport;
use serde_json::Value;

/// Header line (without newline): field names in provider order.
pub fn header_line(record: &PositionReport) -> String {
    record.field_names().collect::<Vec<_>>().join(",")
}

/// Data line (without newline): field values in provider order.
pub fn value_line(record: &PositionReport) -> String {
    record.values().map(render_value).collect::<Vec<_>>().join(",")
}

/// Plain string form of one value. Strings are written without quotes and
/// `null` as an empty cell.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}
