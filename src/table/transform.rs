//! Row-wise transforms and key rewriting.

use serde_json::Value;
use tql_core::executor::value_to_string;

use super::reshape::flatten_row;
use super::{to_row, union_columns, Row, RowKey, RowStore, Table};
use crate::error::{TableError, TableResult};
use crate::source::{walk_nested, wildcard_match};

impl Table {
    /// Replace every row by `f(row, key)`.
    pub fn walk<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&Row, &RowKey) -> Row,
    {
        for (key, row) in self.store.iter_mut() {
            *row = f(row, key);
        }
        self
    }

    /// Append the rows of `other` (through its selection), then
    /// [`rectify`](Table::rectify).
    ///
    /// Named row keys are kept unless already taken; everything else gets
    /// the next free index. Fails when no free index is left.
    pub fn merge(&mut self, other: &Table) -> TableResult<&mut Self> {
        let before = self.store.len();
        for (key, row) in other.rows_projected() {
            match key {
                RowKey::Name(_) if !self.store.contains_key(key) => {
                    self.store.insert(key.clone(), row);
                }
                _ => {
                    self.store.push(row)?;
                }
            }
        }
        tracing::debug!("MERGE: {} + {} row(s)", before, other.count());
        if !self.is_empty() {
            self.fill_missing_columns();
        }
        Ok(self)
    }

    /// Give every row every column seen in any row. Missing cells are
    /// null; columns follow first-seen order.
    pub fn rectify(&mut self) -> TableResult<&mut Self> {
        if self.is_empty() {
            return Err(TableError::InvalidInput(
                "rectify needs at least one row".to_string(),
            ));
        }
        self.fill_missing_columns();
        Ok(self)
    }

    fn fill_missing_columns(&mut self) {
        let columns = union_columns(self.store.rows());
        for row in self.store.rows_mut() {
            if row.len() == columns.len() {
                continue;
            }
            let mut filled = Row::new();
            for column in &columns {
                let value = row.remove(column).unwrap_or(Value::Null);
                filled.insert(column.clone(), value);
            }
            *row = filled;
        }
    }

    /// Replace the rows by every nested structure (rows included) whose
    /// flattened keys match all `patterns`.
    ///
    /// Patterns use `*` for any run of characters and `?` for any run
    /// without a dot. Results are keyed 0..n, or by their dotted path when
    /// `keyed_by_path` is set.
    pub fn collect_childs<S: AsRef<str>>(&mut self, patterns: &[S], keyed_by_path: bool) -> &mut Self {
        let root: Value = Value::Object(
            self.store
                .iter()
                .map(|(key, row)| (key.to_string(), Value::Object(row.clone())))
                .collect(),
        );

        let mut found: Vec<(String, Row)> = Vec::new();
        walk_nested(&root, &mut |path, value| {
            let Some(row) = to_row(value.clone()) else {
                return;
            };
            let flat_keys: Vec<String> = flatten_row(&row, ".").into_iter().map(|(k, _)| k).collect();
            let all_match = patterns.iter().all(|pattern| {
                flat_keys
                    .iter()
                    .any(|key| wildcard_match(pattern.as_ref(), key))
            });
            if all_match {
                found.push((path.to_string(), row));
            }
        });

        let store = if keyed_by_path {
            let mut store = RowStore::new();
            for (path, row) in found {
                store.insert(RowKey::parse(&path), row);
            }
            store
        } else {
            RowStore::from_rows(found.into_iter().map(|(_, row)| row))
        };
        tracing::debug!("COLLECT: {} structure(s) matched", store.len());
        self.store = store;
        self
    }

    /// Store each row key in `column`.
    pub fn add_keys(&mut self, column: &str) -> &mut Self {
        for (key, row) in self.store.iter_mut() {
            row.insert(column.to_string(), key.to_value());
        }
        self
    }

    /// Use the values of `column` as row keys and drop the column. Rows
    /// repeating an earlier value are dropped.
    pub fn field_as_key(&mut self, column: &str) -> TableResult<&mut Self> {
        if self.is_empty() {
            return Ok(self);
        }
        self.require_raw_columns(&[column])?;
        let mut store = RowStore::new();
        for (_, mut row) in self.store.drain() {
            let key = RowKey::from_value(row.get(column).unwrap_or(&Value::Null));
            if store.contains_key(&key) {
                continue;
            }
            row.remove(column);
            store.insert(key, row);
        }
        self.store = store;
        Ok(self)
    }

    /// Use the values of the first row as column names for the remaining
    /// rows, which are keyed 0..n.
    pub fn first_row_to_key(&mut self) -> TableResult<&mut Self> {
        let mut entries = self.store.drain().into_iter();
        let Some((_, first)) = entries.next() else {
            return Ok(self);
        };
        let names: Vec<String> = first.values().map(value_to_string).collect();
        let mut rows = Vec::new();
        for (key, row) in entries {
            if row.len() != names.len() {
                return Err(TableError::InvalidInput(format!(
                    "row {} has {} column(s), the title row has {}",
                    key,
                    row.len(),
                    names.len()
                )));
            }
            rows.push(names.iter().cloned().zip(row.into_iter().map(|(_, v)| v)).collect::<Row>());
        }
        self.store = RowStore::from_rows(rows);
        self.selected = None;
        Ok(self)
    }
}
