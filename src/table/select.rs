//! SELECT: projection with computed and renamed columns.

use serde_json::Value;
use tql_core::{parse_terms, Evaluator};

use super::Table;
use crate::error::{TableError, TableResult};

/// Characters rejected anywhere in a selection.
const FORBIDDEN_CHARS: &[char] = &[';', '|', '+', '<', '>', '=', '*', '/'];

impl Table {
    /// Select columns with a term list such as
    /// `"id, name AS title, UPPER(name) AS upper"`.
    ///
    /// `"*"` resets to the full column view. Terms are validated against the
    /// first row as seen through the current selection; an alias produced by
    /// an earlier term of the same call may be used by later terms. Computed
    /// and aliased columns are written into row storage and stay there even
    /// when a later selection drops them from the view.
    pub fn select(&mut self, columns: &str) -> TableResult<&mut Self> {
        let columns = columns.trim();
        if columns == "*" {
            tracing::debug!("SELECT: reset to all columns");
            self.selected = None;
            return Ok(self);
        }
        let Some(mut schema) = self.schema_row() else {
            return Ok(self);
        };
        if columns.contains(FORBIDDEN_CHARS) {
            return Err(TableError::InvalidInput(format!(
                "forbidden character in selection '{}'",
                columns
            )));
        }

        let terms = parse_terms(columns);
        let evaluator = Evaluator::new(&self.functions);
        let mut selected: Vec<String> = Vec::with_capacity(terms.len());

        for term in &terms {
            evaluator.validate(term, &schema)?;
            let output = match (&term.function, &term.alias) {
                (Some(_), None) => return Err(TableError::MissingAlias(term.raw.clone())),
                (Some(_), Some(alias)) => {
                    tracing::trace!("SELECT: computing column {} from {}", alias, term.raw);
                    let values = self
                        .store
                        .rows()
                        .map(|row| evaluator.evaluate(term, row))
                        .collect::<Result<Vec<Value>, _>>()?;
                    for (row, value) in self.store.rows_mut().zip(values) {
                        row.insert(alias.clone(), value);
                    }
                    alias.clone()
                }
                (None, Some(alias)) => {
                    tracing::trace!("SELECT: copying column {} to {}", term.name, alias);
                    for row in self.store.rows_mut() {
                        let value = row.get(&term.name).cloned().unwrap_or(Value::Null);
                        row.insert(alias.clone(), value);
                    }
                    alias.clone()
                }
                (None, None) => term.name.clone(),
            };
            if let Some(first) = self.store.first() {
                if let Some(value) = first.get(&output) {
                    schema.insert(output.clone(), value.clone());
                }
            }
            if !selected.contains(&output) {
                selected.push(output);
            }
        }

        tracing::debug!(
            "SELECT: {} column(s) selected over {} row(s)",
            selected.len(),
            self.store.len()
        );
        self.selected = Some(selected);
        Ok(self)
    }

    /// Select by a list of terms, joined with commas.
    pub fn select_columns<S: AsRef<str>>(&mut self, columns: &[S]) -> TableResult<&mut Self> {
        let joined = columns
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.select(&joined)
    }
}
