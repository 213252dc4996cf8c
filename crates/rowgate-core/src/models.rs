//! Domain models for the ingestion and query contract.
//!
//! An inbound event maps to exactly one [`EventRow`]. An outbound query
//! result is a [`RecordSet`]: one ordered column-name-to-value mapping per
//! row, keys in table column order.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use sqlx::{any::AnyRow, Column, Row, ValueRef};

use crate::error::{Result, RowgateError};

/// Longest identifier accepted for the target table.
pub const MAX_TABLE_NAME_LEN: usize = 63;

/// The two values bound to the insert statement.
///
/// Decoded from an event payload of the form
/// `{"column1": "<text>", "column2": <integer>}`. Any other field is
/// rejected so that typos never silently insert defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventRow {
    /// Text value for `column1`.
    pub column1: String,
    /// Integer value for `column2`.
    pub column2: i64,
}

impl EventRow {
    /// Creates a row from its two column values.
    pub fn new(column1: impl Into<String>, column2: i64) -> Self {
        Self { column1: column1.into(), column2 }
    }

    /// Parses decoded payload text into a row.
    ///
    /// # Errors
    ///
    /// Returns `RowgateError::InvalidPayload` if the text is not a JSON
    /// object with exactly `column1` (string) and `column2` (integer).
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |e: serde_json::Error| {
            RowgateError::InvalidPayload(format!("payload does not map to a row: {e}"))
        };

        // serde would also accept a positional array for a struct.
        let document: Value = serde_json::from_str(text).map_err(invalid)?;
        if !document.is_object() {
            return Err(RowgateError::InvalidPayload("payload must be a JSON object".to_string()));
        }
        serde_json::from_value(document).map_err(invalid)
    }

    /// Decodes raw payload bytes and parses them into a row.
    ///
    /// # Errors
    ///
    /// Returns `RowgateError::InvalidPayload` on invalid UTF-8 or an
    /// unmappable document.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        Self::parse(decode_payload(payload)?)
    }
}

/// Decodes an event payload as UTF-8 text.
///
/// # Errors
///
/// Returns `RowgateError::InvalidPayload` if the bytes are not valid UTF-8.
pub fn decode_payload(payload: &[u8]) -> Result<&str> {
    std::str::from_utf8(payload)
        .map_err(|e| RowgateError::InvalidPayload(format!("payload is not valid UTF-8: {e}")))
}

/// Validated SQL identifier naming the target table.
///
/// Table names cannot be bound as statement parameters, so they are
/// interpolated into SQL text. Only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validates and wraps a table identifier.
    ///
    /// # Errors
    ///
    /// Returns `RowgateError::Configuration` for empty, overlong or
    /// non-identifier names.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() || name.len() > MAX_TABLE_NAME_LEN {
            return Err(RowgateError::Configuration(format!(
                "table name must be 1..={MAX_TABLE_NAME_LEN} characters, got {}",
                name.len()
            )));
        }

        let mut chars = name.chars();
        let starts_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RowgateError::Configuration(format!(
                "table name {name:?} is not a plain SQL identifier"
            )));
        }

        Ok(Self(name))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One result row as an ordered column-name-to-value mapping.
pub type Record = Map<String, Value>;

/// Every row of a query, in the order the engine returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSet(Vec<Record>);

impl RecordSet {
    /// Zips each row with its column metadata.
    ///
    /// # Errors
    ///
    /// Returns `RowgateError::Serialization` on the first value that has no
    /// JSON representation. No partial set is ever produced.
    pub fn from_rows(rows: &[AnyRow]) -> Result<Self> {
        rows.iter().map(record_from_row).collect::<Result<Vec<_>>>().map(Self)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the records in row order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.0.iter()
    }

    /// Consumes the set, returning the records.
    pub fn into_inner(self) -> Vec<Record> {
        self.0
    }

    /// Serializes the set as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `RowgateError::Serialization` if encoding fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

/// Builds the mapping for a single row, keys in column position order.
fn record_from_row(row: &AnyRow) -> Result<Record> {
    let mut record = Map::with_capacity(row.columns().len());
    for column in row.columns() {
        let value = column_value(row, column.ordinal(), column.name())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// Converts one column value to JSON.
///
/// Integers, floats, booleans and text are representable. NULL becomes
/// `null`. Anything else, including binary data and non-finite floats, is
/// a serialization fault.
fn column_value(row: &AnyRow, index: usize, name: &str) -> Result<Value> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Ok(Value::from(v));
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Number::from_f64(v).map(Value::Number).ok_or_else(|| {
            RowgateError::Serialization(format!("column {name:?} holds non-finite float {v}"))
        });
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return Ok(Value::Bool(v));
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Ok(Value::String(v));
    }

    let type_name = row.try_get_raw(index)?.type_info().to_string();
    Err(RowgateError::Serialization(format!(
        "column {name:?} of type {type_name} has no JSON representation"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_with_both_columns_parses() {
        let row = EventRow::from_payload(br#"{"column1": "abc", "column2": 123}"#).unwrap();
        assert_eq!(row, EventRow::new("abc", 123));
    }

    #[test]
    fn payload_field_order_is_irrelevant() {
        let row = EventRow::from_payload(br#"{"column2": -7, "column1": ""}"#).unwrap();
        assert_eq!(row, EventRow::new("", -7));
    }

    #[test]
    fn invalid_utf8_is_a_payload_fault() {
        let err = EventRow::from_payload(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, RowgateError::InvalidPayload(ref msg) if msg.contains("UTF-8")));
    }

    #[test]
    fn missing_column_is_a_payload_fault() {
        let err = EventRow::from_payload(br#"{"column1": "abc"}"#).unwrap_err();
        assert!(matches!(err, RowgateError::InvalidPayload(_)));
    }

    #[test]
    fn unknown_field_is_a_payload_fault() {
        let err = EventRow::from_payload(br#"{"column1": "a", "column2": 1, "key": "value"}"#)
            .unwrap_err();
        assert!(matches!(err, RowgateError::InvalidPayload(_)));
    }

    #[test]
    fn wrong_column_type_is_a_payload_fault() {
        assert!(EventRow::from_payload(br#"{"column1": 5, "column2": 1}"#).is_err());
        assert!(EventRow::from_payload(br#"{"column1": "a", "column2": "1"}"#).is_err());
        assert!(EventRow::from_payload(br#"{"column1": "a", "column2": 1.5}"#).is_err());
    }

    #[test]
    fn non_object_payload_is_a_payload_fault() {
        assert!(EventRow::from_payload(b"plain text").is_err());
        assert!(EventRow::from_payload(b"[\"abc\", 123]").is_err());
        assert!(EventRow::from_payload(b"").is_err());
    }

    #[test]
    fn table_names_accept_identifiers() {
        for name in ["records", "your_table", "_staging", "T1"] {
            assert_eq!(TableName::new(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn table_names_reject_injection_and_garbage() {
        for name in ["", "1table", "records; DROP TABLE x", "a-b", "dbo.records", "r\u{e9}cords"] {
            assert!(TableName::new(name).is_err(), "{name:?} should be rejected");
        }
        assert!(TableName::new("a".repeat(MAX_TABLE_NAME_LEN + 1)).is_err());
        assert!(TableName::new("a".repeat(MAX_TABLE_NAME_LEN)).is_ok());
    }

    #[test]
    fn empty_record_set_serializes_to_empty_array() {
        let bytes = RecordSet::default().to_json_bytes().unwrap();
        assert_eq!(bytes, b"[]");
    }

    #[test]
    fn record_set_preserves_key_order() {
        let mut record = Record::new();
        record.insert("zeta".into(), Value::from(1));
        record.insert("alpha".into(), Value::from("a"));
        let set = RecordSet::from(vec![record]);

        let text = String::from_utf8(set.to_json_bytes().unwrap()).unwrap();
        assert_eq!(text, r#"[{"zeta":1,"alpha":"a"}]"#);
    }
}
