//! Inner and left joins against reference rows.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tql_core::executor::value_to_string;

use super::{Row, Table};
use crate::error::{TableError, TableResult};

/// Something that can be joined: its rows are copied into the join index.
pub trait JoinSource {
    fn join_rows(&self) -> Vec<Row>;
}

impl JoinSource for Table {
    /// Rows as seen through the selection.
    fn join_rows(&self) -> Vec<Row> {
        self.rows_projected().map(|(_, row)| row).collect()
    }
}

impl JoinSource for [Row] {
    fn join_rows(&self) -> Vec<Row> {
        self.to_vec()
    }
}

impl JoinSource for Vec<Row> {
    fn join_rows(&self) -> Vec<Row> {
        self.clone()
    }
}

impl JoinSource for Value {
    /// A list or map of row objects. Other entries are skipped.
    fn join_rows(&self) -> Vec<Row> {
        let entries: Vec<&Value> = match self {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => Vec::new(),
        };
        entries
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinKind {
    Inner,
    Left,
}

impl Table {
    /// Inner join: rows without a matching reference row are removed.
    ///
    /// Reference columns other than `reference_key` are copied in as
    /// `alias.column` (no prefix for an empty alias). Row keys are kept.
    pub fn inner_join_on<R: JoinSource + ?Sized>(
        &mut self,
        reference: &R,
        alias: &str,
        reference_key: &str,
        local_key: &str,
    ) -> TableResult<&mut Self> {
        self.join_on(reference, alias, reference_key, local_key, JoinKind::Inner)
    }

    /// Left join: rows without a matching reference row get null in every
    /// joined column.
    pub fn left_join_on<R: JoinSource + ?Sized>(
        &mut self,
        reference: &R,
        alias: &str,
        reference_key: &str,
        local_key: &str,
    ) -> TableResult<&mut Self> {
        self.join_on(reference, alias, reference_key, local_key, JoinKind::Left)
    }

    fn join_on<R: JoinSource + ?Sized>(
        &mut self,
        reference: &R,
        alias: &str,
        reference_key: &str,
        local_key: &str,
        kind: JoinKind,
    ) -> TableResult<&mut Self> {
        if self.is_empty() {
            return Ok(self);
        }
        let reference = reference.join_rows();
        if let Some(first) = reference.first() {
            if !first.contains_key(reference_key) {
                return Err(TableError::UnknownField(reference_key.to_string()));
            }
        }
        self.require_raw_columns(&[local_key])?;

        // Joined columns come from the first reference row.
        let added: Vec<(String, String)> = reference
            .first()
            .map(|first| {
                first
                    .keys()
                    .filter(|k| k.as_str() != reference_key)
                    .map(|k| {
                        let target = if alias.is_empty() {
                            k.clone()
                        } else {
                            format!("{}.{}", alias, k)
                        };
                        (k.clone(), target)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut index: HashMap<String, Row> = HashMap::with_capacity(reference.len());
        for row in reference {
            let key = value_to_string(row.get(reference_key).unwrap_or(&Value::Null));
            index.insert(key, row);
        }

        let before = self.store.len();
        let mut unmatched = HashSet::new();
        for (key, row) in self.store.iter_mut() {
            let local = value_to_string(row.get(local_key).unwrap_or(&Value::Null));
            match index.get(&local) {
                Some(found) => {
                    for (source, target) in &added {
                        let value = found.get(source).cloned().unwrap_or(Value::Null);
                        row.insert(target.clone(), value);
                    }
                }
                None if kind == JoinKind::Left => {
                    for (_, target) in &added {
                        row.insert(target.clone(), Value::Null);
                    }
                }
                None => {
                    unmatched.insert(key.clone());
                }
            }
        }
        if !unmatched.is_empty() {
            self.store.retain(|key, _| !unmatched.contains(key));
        }

        tracing::debug!(
            "JOIN: {:?} join on {} = {}.{}, {} -> {} row(s)",
            kind,
            local_key,
            alias,
            reference_key,
            before,
            self.store.len()
        );
        Ok(self)
    }
}
