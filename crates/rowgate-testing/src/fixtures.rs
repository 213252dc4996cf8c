//! Event payload builders.

use serde_json::{json, Map, Value};

/// Builder for event payload bodies.
///
/// Starts from a valid `{"column1", "column2"}` document; individual
/// fields can be replaced, dropped or supplemented to produce invalid
/// payloads.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    fields: Map<String, Value>,
}

impl EventBuilder {
    /// Creates a builder for the row `(column1, column2)`.
    pub fn new(column1: impl Into<String>, column2: i64) -> Self {
        let mut fields = Map::new();
        fields.insert("column1".to_string(), Value::String(column1.into()));
        fields.insert("column2".to_string(), json!(column2));
        Self { fields }
    }

    /// Replaces a field with an arbitrary JSON value.
    #[must_use]
    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Removes a field.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    /// Serialized payload bytes.
    pub fn build(&self) -> Vec<u8> {
        Value::Object(self.fields.clone()).to_string().into_bytes()
    }
}
