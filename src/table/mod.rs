//! The table pipeline.
//!
//! A [`Table`] owns an ordered [`RowStore`], an optional selected column
//! list and its own copy of the function registry and CSV options. Every
//! operation mutates the table in place and returns it for chaining;
//! fetch operations produce detached snapshots.
//!
//! ```rust
//! use serde_json::json;
//! use tablearray::Table;
//!
//! let mut table = Table::new(json!([
//!     {"name": "A2", "likes": 3},
//!     {"name": "A12", "likes": 5},
//!     {"name": "A1", "likes": 3},
//! ]))?;
//! let rows = table
//!     .select("name, UPPER(name) AS up")?
//!     .order_by("name NATURAL")?
//!     .fetch_all();
//! assert_eq!(rows[0]["name"], json!("A1"));
//! assert_eq!(rows[2]["up"], json!("A12"));
//! # Ok::<(), tablearray::TableError>(())
//! ```

mod aggregate;
mod cursor;
mod fetch;
mod filter;
mod join;
mod reshape;
mod select;
mod sort;
mod store;
mod transform;

pub use aggregate::AggregateFn;
pub use cursor::Cursor;
pub use filter::LikeList;
pub use join::JoinSource;
pub use store::{Row, RowKey, RowStore};

use std::sync::Arc;

use serde_json::Value;
use tql_core::{FunctionRegistry, SqlFunction, TqlResult};

use crate::config::CsvOptions;
use crate::error::{TableError, TableResult};

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub(crate) store: RowStore,
    /// Selected column list; `None` exposes the union of all columns.
    pub(crate) selected: Option<Vec<String>>,
    pub(crate) functions: FunctionRegistry,
    pub(crate) csv: CsvOptions,
}

impl Table {
    /// A table without rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from rows keyed 0..n.
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        Self::from_store(RowStore::from_rows(rows))
    }

    /// Build a table from keyed rows. A later duplicate key replaces the
    /// earlier row.
    pub fn from_keyed_rows(entries: impl IntoIterator<Item = (RowKey, Row)>) -> Self {
        let mut store = RowStore::new();
        store.replace_all(entries);
        Self::from_store(store)
    }

    pub(crate) fn from_store(store: RowStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    /// Number of rows.
    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The selected column list, `None` when all columns are selected.
    pub fn selected_columns(&self) -> Option<&[String]> {
        self.selected.as_deref()
    }

    /// Raw row storage, ignoring the selection.
    pub fn store(&self) -> &RowStore {
        &self.store
    }

    /// Register a function for SELECT and ORDER BY terms. An existing
    /// function with the same name is replaced.
    pub fn add_function<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> TqlResult<Value> + Send + Sync + 'static,
    {
        self.functions.register(name, function);
        self
    }

    /// Register several functions at once.
    pub fn add_functions<I, N>(&mut self, functions: I) -> &mut Self
    where
        I: IntoIterator<Item = (N, Arc<dyn SqlFunction>)>,
        N: Into<String>,
    {
        self.functions.register_many(functions);
        self
    }

    /// Look up a registered function.
    pub fn function(&self, name: &str) -> Option<Arc<dyn SqlFunction>> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn csv_options(&self) -> &CsvOptions {
        &self.csv
    }

    pub fn set_csv_options(&mut self, options: CsvOptions) -> &mut Self {
        self.csv = options;
        self
    }

    /// Set one CSV option by name, see [`CsvOptions::set`].
    pub fn set_option(&mut self, key: &str, value: &str) -> TableResult<&mut Self> {
        self.csv.set(key, value)?;
        Ok(self)
    }

    /// Column names exposed by fetch operations, in order.
    pub(crate) fn view_columns(&self) -> Vec<String> {
        match &self.selected {
            Some(columns) => columns.clone(),
            None => union_columns(self.store.rows()),
        }
    }

    /// Restrict a row to `columns`. Columns missing from the row are left out.
    pub(crate) fn project_with(row: &Row, columns: &[String]) -> Row {
        columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect()
    }

    /// A single row as seen through the selection.
    pub(crate) fn project(&self, row: &Row) -> Row {
        match &self.selected {
            Some(columns) => Self::project_with(row, columns),
            None => row.clone(),
        }
    }

    /// The first row as seen through the selection: the schema every
    /// operation validates against.
    pub(crate) fn schema_row(&self) -> Option<Row> {
        self.store.first().map(|row| self.project(row))
    }

    /// The raw first row.
    pub(crate) fn first_raw(&self) -> Option<&Row> {
        self.store.first()
    }

    /// Fail with `UnknownField` unless every name is a column of the raw
    /// first row.
    pub(crate) fn require_raw_columns<S: AsRef<str>>(&self, names: &[S]) -> TableResult<()> {
        let Some(first) = self.first_raw() else {
            return Ok(());
        };
        match names.iter().find(|n| !first.contains_key(n.as_ref())) {
            Some(missing) => Err(TableError::UnknownField(missing.as_ref().to_string())),
            None => Ok(()),
        }
    }

    /// Iterate rows ignoring the selection.
    pub fn rows_raw(&self) -> impl Iterator<Item = (&RowKey, &Row)> {
        self.store.iter()
    }

    /// Iterate rows through the selection.
    pub fn rows_projected(&self) -> impl Iterator<Item = (&RowKey, Row)> + '_ {
        let columns = self.view_columns();
        self.store
            .iter()
            .map(move |(key, row)| (key, Self::project_with(row, &columns)))
    }

    /// Ordered traversal of the projected rows.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }
}

/// Union of the column names of all rows, in first-seen order.
pub(crate) fn union_columns<'a>(rows: impl Iterator<Item = &'a Row>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Convert a JSON object into a row.
pub(crate) fn to_row(value: Value) -> Option<Row> {
    match value {
        Value::Object(map) => Some(map),
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        ),
        _ => None,
    }
}
