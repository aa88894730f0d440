//! Terminal fetch operations. Every result is a detached copy.

use std::collections::HashSet;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tql_core::executor::{compare_values, value_to_string};

use super::{Row, RowKey, Table};
use crate::error::{TableError, TableResult};

/// Most group levels accepted by [`Table::fetch_group`].
const MAX_GROUP_LEVELS: usize = 3;

impl Table {
    /// All rows through the selection, as JSON objects.
    pub fn fetch_all(&self) -> Vec<Value> {
        self.rows_projected()
            .map(|(_, row)| Value::Object(row))
            .collect()
    }

    /// All rows through the selection.
    pub fn fetch_rows(&self) -> Vec<Row> {
        self.rows_projected().map(|(_, row)| row).collect()
    }

    /// All rows through the selection, with their keys.
    pub fn fetch_all_keyed(&self) -> Vec<(RowKey, Row)> {
        self.rows_projected()
            .map(|(key, row)| (key.clone(), row))
            .collect()
    }

    /// Up to `limit` rows starting at position `start`.
    pub fn fetch_limit(&self, limit: usize, start: usize) -> Vec<Value> {
        self.fetch_limit_keyed(limit, start)
            .into_iter()
            .map(|(_, row)| Value::Object(row))
            .collect()
    }

    pub fn fetch_limit_keyed(&self, limit: usize, start: usize) -> Vec<(RowKey, Row)> {
        let columns = self.view_columns();
        self.store
            .iter()
            .skip(start)
            .take(limit)
            .map(|(key, row)| (key.clone(), Self::project_with(row, &columns)))
            .collect()
    }

    /// The last `limit` rows.
    pub fn fetch_limit_from_end(&self, limit: usize) -> Vec<Value> {
        self.fetch_limit_from_end_keyed(limit)
            .into_iter()
            .map(|(_, row)| Value::Object(row))
            .collect()
    }

    pub fn fetch_limit_from_end_keyed(&self, limit: usize) -> Vec<(RowKey, Row)> {
        let start = self.store.len().saturating_sub(limit);
        self.fetch_limit_keyed(limit, start)
    }

    /// One row through the selection; the first row when `key` is `None`.
    pub fn fetch_row(&self, key: Option<&RowKey>) -> Option<Row> {
        let row = match key {
            Some(key) => self.store.get(key)?,
            None => self.store.first()?,
        };
        Some(Self::project_with(row, &self.view_columns()))
    }

    /// All rows with their keys, ignoring the selection.
    pub fn fetch_raw(&self) -> Vec<(RowKey, Row)> {
        self.store
            .iter()
            .map(|(key, row)| (key.clone(), row.clone()))
            .collect()
    }

    /// Values of one column, ignoring the selection. Rows without the
    /// column are skipped.
    pub fn fetch_column(&self, column: &str) -> TableResult<Vec<Value>> {
        self.require_raw_columns(&[column])?;
        Ok(self
            .store
            .rows()
            .filter_map(|row| row.get(column).cloned())
            .collect())
    }

    /// Distinct values of one column in loose ascending order.
    pub fn fetch_column_unique(&self, column: &str) -> TableResult<Vec<Value>> {
        let mut seen = HashSet::new();
        let mut values: Vec<Value> = self
            .fetch_column(column)?
            .into_iter()
            .filter(|v| seen.insert(value_to_string(v)))
            .collect();
        values.sort_by(compare_values);
        Ok(values)
    }

    /// Map of `key_column` to `value_column`, ignoring the selection.
    /// Keys are stringified; a repeated key keeps the last value.
    pub fn fetch_key_value(
        &self,
        key_column: &str,
        value_column: &str,
    ) -> TableResult<Map<String, Value>> {
        self.require_raw_columns(&[key_column, value_column])?;
        let mut map = Map::new();
        for row in self.store.rows() {
            if let (Some(key), Some(value)) = (row.get(key_column), row.get(value_column)) {
                map.insert(value_to_string(key), value.clone());
            }
        }
        Ok(map)
    }

    /// Rows nested by the values of one to three group columns, then by
    /// row key. Every group column must be part of the selection.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use tablearray::Table;
    ///
    /// let table = Table::new(json!([
    ///     {"team": "a", "name": "x"},
    ///     {"team": "b", "name": "y"},
    /// ]))?;
    /// let grouped = table.fetch_group(&["team"])?;
    /// assert_eq!(grouped["b"]["1"], json!({"team": "b", "name": "y"}));
    /// # Ok::<(), tablearray::TableError>(())
    /// ```
    pub fn fetch_group<S: AsRef<str>>(&self, groups: &[S]) -> TableResult<Value> {
        if self.is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        if groups.is_empty() || groups.len() > MAX_GROUP_LEVELS {
            return Err(TableError::InvalidInput(format!(
                "fetch_group needs 1 to {} group columns, got {}",
                MAX_GROUP_LEVELS,
                groups.len()
            )));
        }
        self.require_raw_columns(groups)?;
        if let Some(selected) = &self.selected {
            if let Some(missing) = groups.iter().find(|g| !selected.iter().any(|s| s == g.as_ref())) {
                return Err(TableError::InvalidInput(format!(
                    "group column '{}' must be selected",
                    missing.as_ref()
                )));
            }
        }

        let mut root = Map::new();
        for (key, row) in self.rows_projected() {
            let mut level = &mut root;
            for group in groups {
                let name = value_to_string(row.get(group.as_ref()).unwrap_or(&Value::Null));
                let entry = level
                    .entry(name)
                    .or_insert_with(|| Value::Object(Map::new()));
                level = match entry {
                    Value::Object(map) => map,
                    other => {
                        return Err(TableError::InvalidInput(format!(
                            "group level holds a non-object value: {}",
                            other
                        )))
                    }
                };
            }
            level.insert(key.to_string(), Value::Object(row));
        }
        Ok(Value::Object(root))
    }

    /// Raw column name at `index` in the first row.
    pub fn field_name_raw(&self, index: usize) -> Option<String> {
        self.first_raw()?.keys().nth(index).cloned()
    }

    /// Raw column names of the first row.
    pub fn field_names_raw(&self) -> Vec<String> {
        self.first_raw()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The selected view as a JSON list.
    pub fn to_json_value(&self) -> Value {
        Value::Array(self.fetch_all())
    }

    /// The selected view as JSON text.
    pub fn fetch_all_as_json(&self) -> TableResult<String> {
        Ok(serde_json::to_string(&self.to_json_value())?)
    }
}

impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.rows_projected().map(|(_, row)| row))
    }
}
