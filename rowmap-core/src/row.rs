//! Result rows

use crate::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::ops::Index;
use std::sync::Arc;

/// One result row: column names shared with the rest of the result set,
/// values in column order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the named column, ignoring ASCII case
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.position(name).and_then(|i| self.values.get(i))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    /// (column, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// JSON object keyed by column name
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(column, value)| (column.to_string(), value_to_json(value)))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, name: &str) -> &Self::Output {
        match self.get_by_name(name) {
            Some(value) => value,
            None => panic!("no column named '{}' in row", name),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, &value_to_json(value))?;
        }
        map.end()
    }
}

/// Plain JSON rendering of a value
pub fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::I32(i) => Json::from(*i),
        Value::I64(i) => Json::from(*i),
        Value::F32(f) => serde_json::Number::from_f64(*f as f64)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::F64(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::Array(b.iter().map(|byte| Json::from(*byte)).collect()),
        Value::Json(j) => j.clone(),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        #[cfg(feature = "datetime-support")]
        Value::Timestamp(t) => Json::String(t.to_string()),
        #[cfg(feature = "decimal-support")]
        Value::Decimal(d) => Json::String(d.to_string()),
        #[cfg(feature = "uuid-support")]
        Value::Uuid(u) => Json::String(u.to_string()),
    }
}
