//! Ordered row storage.
//!
//! Rows keep insertion order and are addressed by a unique [`RowKey`].
//! Removal by key never fails; a missing key is a no-op.

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{TableError, TableResult};

/// One record: an ordered column name to value mapping.
pub type Row = Map<String, Value>;

/// Key of a row within a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Index(i64),
    Name(String),
}

impl RowKey {
    /// Key from text. Canonical integers ("7", "-3", not "07" or "+1")
    /// become [`RowKey::Index`].
    pub fn parse(text: &str) -> Self {
        match text.parse::<i64>() {
            Ok(i) if i.to_string() == text => RowKey::Index(i),
            _ => RowKey::Name(text.to_string()),
        }
    }

    /// Key from a cell value. Integral numbers become indexes, everything
    /// else goes through its string form.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => RowKey::Index(i),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => RowKey::Index(f as i64),
                    _ => RowKey::parse(&tql_core::executor::value_to_string(value)),
                },
            },
            Value::Bool(b) => RowKey::Index(i64::from(*b)),
            other => RowKey::parse(&tql_core::executor::value_to_string(other)),
        }
    }

    pub fn as_index(&self) -> Option<i64> {
        match self {
            RowKey::Index(i) => Some(*i),
            RowKey::Name(_) => None,
        }
    }

    /// The key as a JSON value (number or string).
    pub fn to_value(&self) -> Value {
        match self {
            RowKey::Index(i) => Value::from(*i),
            RowKey::Name(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Index(i) => write!(f, "{}", i),
            RowKey::Name(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowKey {
    fn from(i: i64) -> Self {
        RowKey::Index(i)
    }
}

impl From<usize> for RowKey {
    fn from(i: usize) -> Self {
        RowKey::Index(i as i64)
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        RowKey::parse(s)
    }
}

impl From<String> for RowKey {
    fn from(s: String) -> Self {
        RowKey::parse(&s)
    }
}

impl Serialize for RowKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RowKey::Index(i) => serializer.serialize_i64(*i),
            RowKey::Name(s) => serializer.serialize_str(s),
        }
    }
}

/// Ordered, keyed collection of rows.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    rows: Vec<(RowKey, Row)>,
    index: HashMap<RowKey, usize>,
    next_index: i64,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows keyed 0..n.
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let mut store = Self {
            rows: rows.into_iter().map(|row| (RowKey::Index(0), row)).collect(),
            ..Self::default()
        };
        store.reindex();
        store
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row under the next free integer key. Fails once the
    /// largest integer key is `i64::MAX`.
    pub fn push(&mut self, row: Row) -> TableResult<RowKey> {
        if self.index.contains_key(&RowKey::Index(self.next_index)) {
            return Err(TableError::InvalidInput(format!(
                "no free row key after {}",
                self.next_index
            )));
        }
        let key = RowKey::Index(self.next_index);
        self.insert(key.clone(), row);
        Ok(key)
    }

    /// Insert or replace the row stored under `key`. A replaced row keeps
    /// its position; a new key is appended.
    pub fn insert(&mut self, key: RowKey, row: Row) {
        if let Some(i) = key.as_index() {
            self.next_index = self.next_index.max(i.saturating_add(1));
        }
        match self.index.get(&key) {
            Some(&pos) => self.rows[pos].1 = row,
            None => {
                self.index.insert(key.clone(), self.rows.len());
                self.rows.push((key, row));
            }
        }
    }

    pub fn contains_key(&self, key: &RowKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &RowKey) -> Option<&Row> {
        self.index.get(key).map(|&pos| &self.rows[pos].1)
    }

    /// Remove the row under `key`, if any.
    pub fn remove(&mut self, key: &RowKey) -> Option<Row> {
        let pos = self.index.remove(key)?;
        let (_, row) = self.rows.remove(pos);
        self.rebuild_index();
        Some(row)
    }

    /// Keep only rows for which `keep` returns true. Keys are untouched.
    pub fn retain(&mut self, mut keep: impl FnMut(&RowKey, &Row) -> bool) {
        self.rows.retain(|(key, row)| keep(key, row));
        self.rebuild_index();
    }

    /// Renumber keys to a dense 0-based sequence.
    pub fn reindex(&mut self) {
        for (i, (key, _)) in self.rows.iter_mut().enumerate() {
            *key = RowKey::Index(i as i64);
        }
        self.next_index = self.rows.len() as i64;
        self.rebuild_index();
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first().map(|(_, row)| row)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&RowKey, &Row)> + ExactSizeIterator {
        self.rows.iter().map(|(key, row)| (key, row))
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &Row> + ExactSizeIterator {
        self.rows.iter().map(|(_, row)| row)
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut().map(|(_, row)| row)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&RowKey, &mut Row)> {
        self.rows.iter_mut().map(|(key, row)| (&*key, row))
    }

    pub fn keys(&self) -> impl Iterator<Item = &RowKey> {
        self.rows.iter().map(|(key, _)| key)
    }

    /// Entry at a position in iteration order.
    pub fn entry_at(&self, pos: usize) -> Option<(&RowKey, &Row)> {
        self.rows.get(pos).map(|(key, row)| (key, row))
    }

    /// Replace the whole content, keeping the given order and keys. Later
    /// duplicates of a key replace the earlier row in place.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = (RowKey, Row)>) {
        self.clear();
        for (key, row) in entries {
            self.insert(key, row);
        }
    }

    /// Take all entries out, leaving the store empty.
    pub fn drain(&mut self) -> Vec<(RowKey, Row)> {
        self.index.clear();
        self.next_index = 0;
        std::mem::take(&mut self.rows)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
        self.next_index = 0;
    }

    /// Reorder rows according to a permutation of positions.
    pub fn reorder(&mut self, order: &[usize]) {
        let mut taken: Vec<Option<(RowKey, Row)>> = self.rows.drain(..).map(Some).collect();
        self.rows = order.iter().filter_map(|&pos| taken[pos].take()).collect();
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, (key, _)) in self.rows.iter().enumerate() {
            self.index.insert(key.clone(), pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_row_key_parse() {
        assert_eq!(RowKey::parse("7"), RowKey::Index(7));
        assert_eq!(RowKey::parse("-3"), RowKey::Index(-3));
        assert_eq!(RowKey::parse("07"), RowKey::Name("07".to_string()));
        assert_eq!(RowKey::parse("+1"), RowKey::Name("+1".to_string()));
        assert_eq!(RowKey::parse("a"), RowKey::Name("a".to_string()));
        assert_eq!(RowKey::from_value(&json!(2.0)), RowKey::Index(2));
        assert_eq!(RowKey::from_value(&json!("12")), RowKey::Index(12));
    }

    #[test]
    fn test_push_and_insert() {
        let mut store = RowStore::new();
        assert_eq!(store.push(row(json!({"a": 1}))).unwrap(), RowKey::Index(0));
        store.insert(RowKey::Index(5), row(json!({"a": 2})));
        assert_eq!(store.push(row(json!({"a": 3}))).unwrap(), RowKey::Index(6));
        store.insert("x".into(), row(json!({"a": 4})));
        assert_eq!(store.len(), 4);

        store.insert(RowKey::Index(5), row(json!({"a": 20})));
        assert_eq!(store.len(), 4);
        assert_eq!(store.entry_at(1).unwrap().1["a"], json!(20));
    }

    #[test]
    fn test_remove_is_noop_for_missing_key() {
        let mut store = RowStore::from_rows(vec![row(json!({"a": 1})), row(json!({"a": 2}))]);
        assert!(store.remove(&RowKey::Index(9)).is_none());
        assert_eq!(store.len(), 2);
        assert!(store.remove(&RowKey::Index(0)).is_some());
        assert_eq!(store.get(&RowKey::Index(1)).unwrap()["a"], json!(2));
    }

    #[test]
    fn test_push_after_max_key_fails() {
        let mut store = RowStore::new();
        store.insert(RowKey::Index(i64::MAX), row(json!({"a": 1})));
        assert!(matches!(
            store.push(row(json!({"a": 2}))),
            Err(TableError::InvalidInput(_))
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&RowKey::Index(i64::MAX)).unwrap()["a"], json!(1));
    }

    #[test]
    fn test_reindex() {
        let mut store = RowStore::new();
        store.insert("b".into(), row(json!({"v": 1})));
        store.insert(RowKey::Index(10), row(json!({"v": 2})));
        store.reindex();
        let keys: Vec<_> = store.keys().cloned().collect();
        assert_eq!(keys, vec![RowKey::Index(0), RowKey::Index(1)]);
        assert_eq!(store.push(Row::new()).unwrap(), RowKey::Index(2));
    }
}
