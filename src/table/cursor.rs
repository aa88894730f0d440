//! Ordered traversal of the selected view.

use super::{Row, RowKey, Table};

/// A position in a table's row order, yielding projected rows.
///
/// ```rust
/// use serde_json::json;
/// use tablearray::Table;
///
/// let table = Table::new(json!([{"a": 1}, {"a": 2}]))?;
/// let mut cursor = table.cursor();
/// let mut seen = Vec::new();
/// while let Some(row) = cursor.current() {
///     seen.push(row["a"].clone());
///     cursor.next();
/// }
/// assert_eq!(seen, vec![json!(1), json!(2)]);
/// # Ok::<(), tablearray::TableError>(())
/// ```
#[derive(Debug)]
pub struct Cursor<'a> {
    table: &'a Table,
    columns: Vec<String>,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(table: &'a Table) -> Self {
        Self {
            table,
            columns: table.view_columns(),
            position: 0,
        }
    }

    /// Back to the first row; returns it.
    pub fn rewind(&mut self) -> Option<Row> {
        self.position = 0;
        self.current()
    }

    /// The row at the cursor, or `None` past the end.
    pub fn current(&self) -> Option<Row> {
        self.table
            .store
            .entry_at(self.position)
            .map(|(_, row)| Table::project_with(row, &self.columns))
    }

    /// Key of the row at the cursor.
    pub fn key(&self) -> Option<&'a RowKey> {
        self.table.store.entry_at(self.position).map(|(key, _)| key)
    }

    /// Advance and return the new current row.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Row> {
        if self.position < self.table.count() {
            self.position += 1;
        }
        self.current()
    }

    pub fn valid(&self) -> bool {
        self.position < self.table.count()
    }

    /// Jump to a position in row order.
    pub fn seek(&mut self, position: usize) -> Option<Row> {
        self.position = position.min(self.table.count());
        self.current()
    }

    pub fn position(&self) -> usize {
        self.position
    }
}
