//! Row type for query results.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::error::AppError;
use crate::graph::value::Value;

/// Parameters for Cypher queries.
///
/// A map of parameter names to JSON values that can be passed to queries.
pub type Params = HashMap<String, JsonValue>;

/// A single row from a query result.
///
/// Columns keep the order of the query's RETURN clause. Values are typed
/// [`Value`]s, with serde-based extraction via [`Row::get`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    data: IndexMap<String, Value>,
}

impl Row {
    /// Creates a new row from an ordered map of column names to values.
    pub fn new(data: IndexMap<String, Value>) -> Self {
        Self { data }
    }

    /// Appends a column, replacing any existing column of the same name.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(column.into(), value.into());
        self
    }

    /// Gets a value from the row by column name, deserializing to the requested type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not found or if deserialization fails.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let id: String = row.get("id")?;
    /// let count: i64 = row.get("count")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, AppError> {
        self.data
            .get(key)
            .ok_or_else(|| AppError::Internal(format!("column not found: {}", key)))
            .and_then(|v| {
                serde_json::from_value(v.to_json()).map_err(|e| {
                    AppError::Internal(format!("failed to deserialize '{}': {}", key, e))
                })
            })
    }

    /// Gets a value from the row, returning `None` if the key doesn't exist.
    ///
    /// Still returns an error if the key exists but deserialization fails.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.data.get(key) {
            Some(v) if v.is_null() => Ok(None),
            Some(v) => serde_json::from_value(v.to_json())
                .map(Some)
                .map_err(|e| AppError::Internal(format!("failed to deserialize '{}': {}", key, e))),
            None => Ok(None),
        }
    }

    /// Returns the typed value for a column, if it exists.
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns all column names in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(|s| s.as_str())
    }

    /// Returns all values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.data.values()
    }

    /// Iterates `(column, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the row and returns the underlying data map.
    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.data
    }
}

impl From<IndexMap<String, Value>> for Row {
    fn from(data: IndexMap<String, Value>) -> Self {
        Self::new(data)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_get_string() {
        let row = Row::default().with("name", "test");

        let name: String = row.get("name").unwrap();
        assert_eq!(name, "test");
    }

    #[test]
    fn test_row_get_number() {
        let row = Row::default().with("count", 42i64);

        let count: i64 = row.get("count").unwrap();
        assert_eq!(count, 42);
    }

    #[test]
    fn test_row_get_missing_key() {
        let row = Row::default();
        let result: Result<String, _> = row.get("missing");
        assert!(result.is_err());
    }

    #[test]
    fn test_row_get_opt_present() {
        let row = Row::default().with("name", "test");

        let name: Option<String> = row.get_opt("name").unwrap();
        assert_eq!(name, Some("test".to_string()));
    }

    #[test]
    fn test_row_get_opt_missing() {
        let row = Row::default();
        let name: Option<String> = row.get_opt("missing").unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn test_row_get_opt_null() {
        let row = Row::default().with("name", Value::Null);

        let name: Option<String> = row.get_opt("name").unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn test_row_columns_keep_declaration_order() {
        let row = Row::default()
            .with("u.name", "Alice")
            .with("u.email", "a@example.com")
            .with("age", 30i64);

        let columns: Vec<_> = row.columns().collect();
        assert_eq!(columns, vec!["u.name", "u.email", "age"]);
    }
}
