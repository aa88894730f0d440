//! Pivot, transpose and flattening.

use std::collections::HashMap;

use serde_json::Value;
use tql_core::executor::value_to_string;

use super::{Row, RowKey, RowStore, Table};
use crate::error::{TableError, TableResult};

impl Table {
    /// Turn `case` values into columns.
    ///
    /// One row per distinct `group` value, keyed by that value, with the
    /// group column followed by a `value.<case>` column for every distinct
    /// case found anywhere in the table. Cases a group never had are null.
    /// Works on the selected view and resets the selection.
    pub fn pivot(&mut self, group: &str, value: &str, case: &str) -> TableResult<&mut Self> {
        let Some(schema) = self.schema_row() else {
            return Ok(self);
        };
        if let Some(missing) = [group, value, case].into_iter().find(|c| !schema.contains_key(*c)) {
            return Err(TableError::UnknownField(missing.to_string()));
        }

        let rows: Vec<Row> = self.rows_projected().map(|(_, row)| row).collect();
        let column_of = |row: &Row| {
            format!(
                "{}.{}",
                value,
                value_to_string(row.get(case).unwrap_or(&Value::Null))
            )
        };

        let mut all_cases: Vec<String> = Vec::new();
        for row in &rows {
            let column = column_of(row);
            if !all_cases.contains(&column) {
                all_cases.push(column);
            }
        }

        let mut pivoted: Vec<(RowKey, Row)> = Vec::new();
        let mut positions: HashMap<RowKey, usize> = HashMap::new();
        for row in &rows {
            let group_value = row.get(group).cloned().unwrap_or(Value::Null);
            let key = RowKey::from_value(&group_value);
            let pos = *positions.entry(key.clone()).or_insert_with(|| {
                let mut start = Row::new();
                start.insert(group.to_string(), group_value);
                pivoted.push((key, start));
                pivoted.len() - 1
            });
            let cell = row.get(value).cloned().unwrap_or(Value::Null);
            pivoted[pos].1.insert(column_of(row), cell);
        }
        for (_, row) in &mut pivoted {
            for column in &all_cases {
                row.entry(column.clone()).or_insert(Value::Null);
            }
        }

        tracing::debug!(
            "PIVOT: {} row(s) into {} group(s) x {} case(s)",
            rows.len(),
            pivoted.len(),
            all_cases.len()
        );
        self.store.replace_all(pivoted);
        self.selected = None;
        Ok(self)
    }

    /// Swap rows and columns: one row per column name, keyed by it, whose
    /// columns are the original row keys. Resets the selection.
    pub fn transpose(&mut self) -> &mut Self {
        if self.is_empty() {
            return self;
        }
        let mut columns: Vec<(String, Row)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (key, row) in self.store.iter() {
            for (name, value) in row {
                let pos = *positions.entry(name.clone()).or_insert_with(|| {
                    columns.push((name.clone(), Row::new()));
                    columns.len() - 1
                });
                columns[pos].1.insert(key.to_string(), value.clone());
            }
        }
        let mut store = RowStore::new();
        for (name, row) in columns {
            store.insert(RowKey::parse(&name), row);
        }
        self.store = store;
        self.selected = None;
        self
    }

    /// Replace nested values by dotted-path columns (`a.b.c`). Does
    /// nothing unless the first row holds a nested value.
    pub fn flatten(&mut self, delimiter: &str) -> &mut Self {
        if !self.first_row_is_nested() {
            return self;
        }
        for row in self.store.rows_mut() {
            *row = flatten_row(row, delimiter);
        }
        tracing::debug!("FLATTEN: {} row(s)", self.store.len());
        self
    }

    /// Like [`Table::flatten`] but keeps the original columns and adds the
    /// flattened ones.
    pub fn add_flat_keys(&mut self, delimiter: &str) -> &mut Self {
        if !self.first_row_is_nested() {
            return self;
        }
        for row in self.store.rows_mut() {
            let flat = flatten_row(row, delimiter);
            row.extend(flat);
        }
        self
    }

    fn first_row_is_nested(&self) -> bool {
        self.first_raw()
            .map(|row| row.values().any(|v| v.is_array() || v.is_object()))
            .unwrap_or(false)
    }
}

/// Flatten one row. An empty list or map becomes `path<delimiter>` = "".
pub(crate) fn flatten_row(row: &Row, delimiter: &str) -> Row {
    let mut out = Row::new();
    for (key, value) in row {
        flatten_into(&mut out, key, value, delimiter);
    }
    out
}

fn flatten_into(out: &mut Row, path: &str, value: &Value, delimiter: &str) {
    let children: Vec<(String, &Value)> = match value {
        Value::Array(items) => items.iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        _ => {
            out.entry(path.to_string()).or_insert_with(|| value.clone());
            return;
        }
    };
    if children.is_empty() {
        out.entry(format!("{}{}", path, delimiter))
            .or_insert_with(|| Value::String(String::new()));
        return;
    }
    for (key, child) in children {
        flatten_into(out, &format!("{}{}{}", path, delimiter, key), child, delimiter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pivot_columns_are_global() {
        let mut t = Table::new(json!([
            {"group": 1, "case": 1, "value": 11},
            {"group": 1, "case": 2, "value": 22},
            {"group": 2, "case": 3, "value": 33},
        ]))
        .unwrap();
        t.pivot("group", "value", "case").unwrap();
        assert_eq!(
            t.fetch_all(),
            vec![
                json!({"group": 1, "value.1": 11, "value.2": 22, "value.3": null}),
                json!({"group": 2, "value.3": 33, "value.1": null, "value.2": null}),
            ]
        );
        let keys: Vec<_> = t.fetch_all_keyed().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![RowKey::Index(1), RowKey::Index(2)]);
    }

    #[test]
    fn test_pivot_unknown_field() {
        let mut t = Table::new(json!([{"group": 1, "case": 1}])).unwrap();
        assert!(matches!(
            t.pivot("group", "value", "case"),
            Err(TableError::UnknownField(ref f)) if f == "value"
        ));
    }

    #[test]
    fn test_transpose() {
        let mut t = Table::new(json!([
            {"a": 1, "b": 2},
            {"a": 3, "b": 4},
        ]))
        .unwrap();
        t.transpose();
        let rows = t.fetch_all_keyed();
        assert_eq!(rows[0].0, RowKey::Name("a".to_string()));
        assert_eq!(rows[0].1, json!({"0": 1, "1": 3}).as_object().cloned().unwrap());
        assert_eq!(rows[1].1["1"], json!(4));
    }

    #[test]
    fn test_flatten() {
        let mut t = Table::new(json!([
            {"id": 1, "tags": [], "user": {"name": "x", "roles": ["a", "b"]}},
        ]))
        .unwrap();
        t.flatten(".");
        assert_eq!(
            t.fetch_all()[0],
            json!({
                "id": 1,
                "tags.": "",
                "user.name": "x",
                "user.roles.0": "a",
                "user.roles.1": "b",
            })
        );
    }

    #[test]
    fn test_add_flat_keys_keeps_originals() {
        let mut t = Table::new(json!([{"id": 1, "p": {"x": 2}}])).unwrap();
        t.add_flat_keys("_");
        assert_eq!(t.fetch_all()[0], json!({"id": 1, "p": {"x": 2}, "p_x": 2}));
    }

    #[test]
    fn test_flatten_skips_flat_tables() {
        let mut t = Table::new(json!([{"id": 1}, {"id": 2, "n": {"x": 1}}])).unwrap();
        t.flatten(".");
        assert_eq!(t.fetch_all()[1]["n"], json!({"x": 1}));
    }
}
