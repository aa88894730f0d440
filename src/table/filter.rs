//! Row filters and windowing.

use std::collections::HashSet;

use serde_json::Value;
use tql_core::executor::{loose_equals, value_to_string};

use super::{Row, Table};
use crate::error::TableResult;

impl Table {
    /// Keep rows for which `predicate` returns true. Keys are renumbered.
    pub fn filter<P>(&mut self, mut predicate: P) -> &mut Self
    where
        P: FnMut(&Row) -> bool,
    {
        let before = self.store.len();
        self.store.retain(|_, row| predicate(row));
        self.store.reindex();
        tracing::debug!("FILTER: {} -> {} row(s)", before, self.store.len());
        self
    }

    /// Remove every row holding a null in any column.
    pub fn filter_nulls(&mut self) -> &mut Self {
        self.filter(|row| !row.values().any(Value::is_null))
    }

    /// Keep rows whose columns equal all given values. Values are compared
    /// by their string form, so `1` matches `"1"`. A row lacking one of
    /// the columns is removed.
    pub fn filter_equal<C, V>(&mut self, conditions: &[(C, V)]) -> &mut Self
    where
        C: AsRef<str>,
        V: Into<Value> + Clone,
    {
        let wanted: Vec<(&str, String)> = conditions
            .iter()
            .map(|(column, value)| (column.as_ref(), value_to_string(&value.clone().into())))
            .collect();
        self.filter(|row| {
            wanted.iter().all(|(column, text)| {
                row.get(*column)
                    .map(|v| value_to_string(v) == *text)
                    .unwrap_or(false)
            })
        })
    }

    /// Keep rows whose `column` contains any of `items`
    /// (case-insensitive). A string list is split on `,`.
    pub fn filter_like_in<L: LikeList>(
        &mut self,
        column: &str,
        items: L,
        preserve_key: bool,
    ) -> TableResult<&mut Self> {
        self.filter_like(column, items.into_items(), preserve_key, false)
    }

    /// Keep rows whose `column` contains all of `items`
    /// (case-insensitive). A string list is split on `,`.
    pub fn filter_like_all<L: LikeList>(
        &mut self,
        column: &str,
        items: L,
        preserve_key: bool,
    ) -> TableResult<&mut Self> {
        self.filter_like(column, items.into_items(), preserve_key, true)
    }

    fn filter_like(
        &mut self,
        column: &str,
        items: Vec<String>,
        preserve_key: bool,
        require_all: bool,
    ) -> TableResult<&mut Self> {
        let Some(first) = self.first_raw() else {
            return Ok(self);
        };
        self.require_raw_columns(&[column])?;
        // Integer columns match by value, not by substring.
        let integer_column = first.get(column).map(|v| v.is_i64() || v.is_u64()) == Some(true);
        let needles: Vec<(Value, String)> = items
            .into_iter()
            .map(|item| (Value::String(item.clone()), item.to_lowercase()))
            .collect();

        let before = self.store.len();
        self.store.retain(|_, row| {
            let value = row.get(column).unwrap_or(&Value::Null);
            let haystack = value_to_string(value).to_lowercase();
            let matches = |(raw, lower): &(Value, String)| {
                if integer_column {
                    loose_equals(value, raw)
                } else {
                    haystack.contains(lower.as_str())
                }
            };
            if require_all {
                needles.iter().all(matches)
            } else {
                needles.iter().any(matches)
            }
        });
        if !preserve_key {
            self.store.reindex();
        }
        tracing::debug!(
            "FILTER LIKE: {} on '{}' kept {} of {} row(s)",
            if require_all { "all" } else { "any" },
            column,
            self.store.len(),
            before
        );
        Ok(self)
    }

    /// Remove rows repeating an earlier row. With `columns` only those
    /// columns are compared. Values compare by their text, so `1` and
    /// `"1"` are the same. The first occurrence wins; keys are renumbered.
    pub fn filter_unique<S: AsRef<str>>(&mut self, columns: Option<&[S]>) -> TableResult<&mut Self> {
        if let Some(columns) = columns {
            self.require_raw_columns(columns)?;
        }
        let names: Option<Vec<&str>> = columns.map(|c| c.iter().map(|s| s.as_ref()).collect());
        let mut seen = HashSet::new();
        let before = self.store.len();
        self.store.retain(|_, row| {
            let fingerprint: Vec<(String, String)> = row
                .iter()
                .filter(|(k, _)| names.as_ref().map_or(true, |n| n.contains(&k.as_str())))
                .map(|(k, v)| (k.clone(), value_to_string(v)))
                .collect();
            seen.insert(fingerprint)
        });
        self.store.reindex();
        tracing::debug!("UNIQUE: {} -> {} row(s)", before, self.store.len());
        Ok(self)
    }

    /// Drop the first `number` rows. Keys are renumbered.
    pub fn offset(&mut self, number: usize) -> &mut Self {
        let mut position = 0usize;
        self.store.retain(|_, _| {
            position += 1;
            position > number
        });
        self.store.reindex();
        self
    }

    /// Keep the first `number` rows. A negative number keeps the last
    /// `-number` rows. Keys are renumbered.
    pub fn limit(&mut self, number: i64) -> &mut Self {
        if number < 0 {
            let start = (self.store.len() as i64 + number).max(0) as usize;
            return self.offset(start);
        }
        let mut position = 0i64;
        self.store.retain(|_, _| {
            position += 1;
            position <= number
        });
        self.store.reindex();
        self
    }
}

/// Items for the LIKE filters: a list or a comma-separated string.
pub trait LikeList {
    fn into_items(self) -> Vec<String>;
}

impl LikeList for &str {
    fn into_items(self) -> Vec<String> {
        self.split(',').map(str::to_string).collect()
    }
}

impl LikeList for String {
    fn into_items(self) -> Vec<String> {
        self.as_str().into_items()
    }
}

impl<S: AsRef<str>> LikeList for &[S] {
    fn into_items(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> LikeList for [S; N] {
    fn into_items(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> LikeList for Vec<S> {
    fn into_items(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;
    use crate::table::RowKey;
    use serde_json::json;

    fn table() -> Table {
        Table::new(json!([
            {"id": 1, "name": "Anton", "city": "Berlin"},
            {"id": 2, "name": "Berta", "city": null},
            {"id": 3, "name": "Carl", "city": "Bern"},
            {"id": 4, "name": "Anna", "city": "Bern"},
        ]))
        .unwrap()
    }

    fn ids(t: &Table) -> Vec<Value> {
        t.fetch_column("id").unwrap()
    }

    #[test]
    fn test_filter_predicate_renumbers() {
        let mut t = table();
        t.filter(|row| row["id"].as_i64().unwrap_or(0) > 2);
        assert_eq!(ids(&t), vec![json!(3), json!(4)]);
        assert_eq!(t.fetch_all_keyed()[0].0, RowKey::Index(0));
    }

    #[test]
    fn test_filter_nulls() {
        let mut t = table();
        t.filter_nulls();
        assert_eq!(ids(&t), vec![json!(1), json!(3), json!(4)]);
    }

    #[test]
    fn test_filter_equal_compares_text() {
        let mut t = table();
        t.filter_equal(&[("city", "Bern"), ("id", "4")]);
        assert_eq!(ids(&t), vec![json!(4)]);
    }

    #[test]
    fn test_filter_like() {
        let mut t = table();
        t.filter_like_in("name", "an,ar", false).unwrap();
        assert_eq!(ids(&t), vec![json!(1), json!(3), json!(4)]);

        let mut t = table();
        t.filter_like_all("name", ["a", "n"], false).unwrap();
        assert_eq!(ids(&t), vec![json!(1), json!(4)]);
    }

    #[test]
    fn test_filter_like_integer_column() {
        let mut t = table();
        t.filter_like_in("id", "2,13", true).unwrap();
        assert_eq!(t.fetch_all_keyed()[0].0, RowKey::Index(1));
        assert_eq!(t.count(), 1);
    }

    #[test]
    fn test_filter_like_unknown_field() {
        let mut t = table();
        assert!(matches!(
            t.filter_like_in("nope", "x", false),
            Err(TableError::UnknownField(_))
        ));
    }

    #[test]
    fn test_filter_unique() {
        let mut t = table();
        t.filter_unique(Some(&["city"][..])).unwrap();
        assert_eq!(ids(&t), vec![json!(1), json!(2), json!(3)]);

        let mut t = Table::new(json!([{"a": 1}, {"a": 2}, {"a": 1}])).unwrap();
        t.filter_unique::<&str>(None).unwrap();
        assert_eq!(t.fetch_column("a").unwrap(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_offset_and_limit() {
        let mut t = table();
        t.offset(1).limit(2);
        assert_eq!(ids(&t), vec![json!(2), json!(3)]);

        let mut t = table();
        t.limit(-3);
        assert_eq!(ids(&t), vec![json!(2), json!(3), json!(4)]);

        let mut t = table();
        t.limit(-10);
        assert_eq!(t.count(), 4);
        t.offset(10);
        assert!(t.is_empty());
    }
}
