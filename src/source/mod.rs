//! Source adapters.
//!
//! Everything that turns outside data into a [`Table`]: nested JSON values
//! (optionally narrowed by a key path or a predicate), JSON text, lists of
//! delimited lines, grouped structures and CSV.

mod csv_reader;
mod lines;

pub use lines::compile_delimited;

use regex::Regex;
use serde_json::Value;

use crate::error::{TableError, TableResult};
use crate::table::{to_row, union_columns, Row, RowKey, RowStore, Table};

impl Table {
    /// Build a table from a list or map of rows. A row is a map, or a list
    /// whose positions become the columns "0", "1", ...
    pub fn new(data: Value) -> TableResult<Self> {
        let entries: Vec<(RowKey, Value)> = match data {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (RowKey::from(i), v))
                .collect(),
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| (RowKey::parse(&k), v))
                .collect(),
            other => {
                return Err(TableError::InvalidInput(format!(
                    "expected a list or map of rows, got {}",
                    type_name(&other)
                )))
            }
        };

        let mut store = RowStore::new();
        for (key, value) in entries {
            let kind = type_name(&value);
            let row = to_row(value).ok_or_else(|| {
                TableError::InvalidInput(format!("row {} is {}, not a map or list", key, kind))
            })?;
            store.insert(key, row);
        }
        tracing::debug!("SOURCE: {} row(s)", store.len());
        Ok(Table::from_store(store))
    }

    /// Descend `path` into `data` first. The path is split on `.` or `,`,
    /// whichever gives more parts.
    pub fn with_path(data: Value, path: &str) -> TableResult<Self> {
        let path = path.trim();
        if path.is_empty() {
            return Table::new(data);
        }
        let by_comma: Vec<&str> = path.split(',').collect();
        let by_dot: Vec<&str> = path.split('.').collect();
        let keys = if by_dot.len() > by_comma.len() {
            by_dot
        } else {
            by_comma
        };
        Table::with_key_path(data, &keys)
    }

    /// Descend a list of keys into `data` first. A missing key is
    /// `InvalidInput`.
    pub fn with_key_path<S: AsRef<str>>(data: Value, keys: &[S]) -> TableResult<Self> {
        let mut current = data;
        for key in keys {
            let key = key.as_ref().trim();
            current = match current {
                Value::Object(mut map) => map.remove(key),
                Value::Array(mut items) => match key.parse::<usize>() {
                    Ok(i) if i < items.len() => Some(items.swap_remove(i)),
                    _ => None,
                },
                _ => None,
            }
            .ok_or_else(|| TableError::InvalidInput(format!("key path has no key '{}'", key)))?;
        }
        Table::new(current)
    }

    /// Rows are the nested structures of `data` accepted by `predicate`,
    /// keyed by their dotted path. The predicate sees the structure and
    /// its path.
    pub fn with_filter<P>(data: Value, mut predicate: P) -> TableResult<Self>
    where
        P: FnMut(&Value, &str) -> bool,
    {
        if !data.is_array() && !data.is_object() {
            return Err(TableError::InvalidInput(format!(
                "expected a list or map, got {}",
                type_name(&data)
            )));
        }
        let mut store = RowStore::new();
        walk_nested(&data, &mut |path, value| {
            if predicate(value, path) {
                if let Some(row) = to_row(value.clone()) {
                    store.insert(RowKey::parse(path), row);
                }
            }
        });
        Ok(Table::from_store(store))
    }

    /// Parse JSON text. Anything before the first `[`/`{` and after the
    /// last `]`/`}` is dropped, so a byte order mark or a JSONP wrapper
    /// does no harm.
    pub fn from_json(text: &str) -> TableResult<Self> {
        let start = text.find(['[', '{']).unwrap_or(0);
        let end = text.rfind([']', '}']).map(|i| i + 1).unwrap_or(text.len());
        let body = if start < end { &text[start..end] } else { "" };
        let data: Value = serde_json::from_str(body)?;
        Table::new(data)
    }

    /// Un-group a nested structure: one row per leaf, with the traversed
    /// keys as leading columns named by `keys`.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use tablearray::Table;
    ///
    /// let grouped = json!({"a": {"x": 1, "y": 2}, "b": {"x": 3}});
    /// let table = Table::from_grouped(&grouped, &["group"])?;
    /// assert_eq!(table.fetch_all()[2], json!({"group": "b", "x": 3}));
    /// # Ok::<(), tablearray::TableError>(())
    /// ```
    pub fn from_grouped<S: AsRef<str>>(data: &Value, keys: &[S]) -> TableResult<Self> {
        if !data.is_array() && !data.is_object() {
            return Err(TableError::InvalidInput(format!(
                "expected a grouped list or map, got {}",
                type_name(data)
            )));
        }
        let keys: Vec<&str> = keys.iter().map(|k| k.as_ref()).collect();
        let mut rows = Vec::new();
        ungroup(data, &keys, &Row::new(), &mut rows);
        Ok(Table::from_rows(rows))
    }
}

fn ungroup(value: &Value, keys: &[&str], prefix: &Row, out: &mut Vec<Row>) {
    for (key, child) in children(value) {
        let child = if child.is_array() || child.is_object() {
            child.clone()
        } else {
            let mut single = Row::new();
            single.insert(key.clone(), child.clone());
            Value::Object(single)
        };
        if prefix.len() >= keys.len() {
            let mut row = prefix.clone();
            if let Some(leaf) = to_row(child) {
                row.extend(leaf);
            }
            out.push(row);
        } else {
            let mut next = prefix.clone();
            next.insert(keys[prefix.len()].to_string(), RowKey::parse(&key).to_value());
            ungroup(&child, keys, &next, out);
        }
    }
}

/// Direct children of a list or map with their keys as text.
fn children(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        _ => Vec::new(),
    }
}

/// Visit every list or map nested in `value`, parents before children,
/// with its dotted path. `value` itself is not visited.
pub(crate) fn walk_nested(value: &Value, visit: &mut dyn FnMut(&str, &Value)) {
    walk_nested_at(value, "", visit);
}

fn walk_nested_at(value: &Value, prefix: &str, visit: &mut dyn FnMut(&str, &Value)) {
    for (key, child) in children(value) {
        if !child.is_array() && !child.is_object() {
            continue;
        }
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };
        visit(&path, child);
        walk_nested_at(child, &path, visit);
    }
}

/// True if every entry of a list or map is a row and all rows have the
/// same column names in the same order.
pub fn check(data: &Value) -> bool {
    let mut expected: Option<Vec<String>> = None;
    for (_, row) in children(data) {
        let Some(row) = to_row(row.clone()) else {
            return false;
        };
        let keys: Vec<String> = row.keys().cloned().collect();
        match &expected {
            None => expected = Some(keys),
            Some(previous) if *previous != keys => return false,
            Some(_) => {}
        }
    }
    true
}

/// Union of the column names of all rows in first-seen order, or `None`
/// if the first entry is not a row.
pub fn all_row_keys(data: &Value) -> Option<Vec<String>> {
    let rows: Vec<Row> = children(data)
        .into_iter()
        .map_while(|(_, v)| to_row(v.clone()))
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(union_columns(rows.iter()))
}

/// Match `text` against a pattern where `*` is any run of characters and
/// `?` any run without a dot.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let escaped = regex::escape(pattern)
        .replace("\\*", ".*")
        .replace("\\?", "[^.]*");
    Regex::new(&format!("^{}$", escaped))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_accepts_lists_and_maps() {
        let t = Table::new(json!([{"a": 1}, ["x", "y"]])).unwrap();
        assert_eq!(t.fetch_raw()[1].1["1"], json!("y"));

        let t = Table::new(json!({"k": {"a": 1}, "7": {"a": 2}})).unwrap();
        let keys: Vec<_> = t.fetch_raw().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![RowKey::Name("k".into()), RowKey::Index(7)]);
    }

    #[test]
    fn test_new_rejects_scalars() {
        assert!(matches!(Table::new(json!(5)), Err(TableError::InvalidInput(_))));
        assert!(matches!(
            Table::new(json!([{"a": 1}, 3])),
            Err(TableError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_with_path() {
        let data = json!({"result": {"items": [{"id": 1}, {"id": 2}]}});
        let t = Table::with_path(data.clone(), "result.items").unwrap();
        assert_eq!(t.count(), 2);
        let t = Table::with_path(data.clone(), "result,items").unwrap();
        assert_eq!(t.count(), 2);
        assert!(matches!(
            Table::with_path(data, "result.nope"),
            Err(TableError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_with_filter() {
        let data = json!({"a": {"b": {"id": 1, "x": true}}, "c": [{"id": 2}]});
        let t = Table::with_filter(data, |v, _| v.get("id").is_some()).unwrap();
        let keys: Vec<_> = t.fetch_raw().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![RowKey::Name("a.b".into()), RowKey::Name("c.0".into())]);
    }

    #[test]
    fn test_from_json_strips_wrappers() {
        let t = Table::from_json("\u{feff}callback([{\"a\": 1}]);").unwrap();
        assert_eq!(t.fetch_all(), vec![json!({"a": 1})]);
        assert!(matches!(Table::from_json("nope"), Err(TableError::Json(_))));
    }

    #[test]
    fn test_from_grouped_two_levels() {
        let data = json!({"2023": {"q1": {"sales": 5}, "q2": {"sales": 7}}});
        let t = Table::from_grouped(&data, &["year", "quarter"]).unwrap();
        assert_eq!(
            t.fetch_all(),
            vec![
                json!({"year": 2023, "quarter": "q1", "sales": 5}),
                json!({"year": 2023, "quarter": "q2", "sales": 7}),
            ]
        );
    }

    #[test]
    fn test_check_and_all_row_keys() {
        assert!(check(&json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}])));
        assert!(!check(&json!([{"a": 1}, {"b": 2}])));
        assert!(!check(&json!([{"a": 1}, 2])));
        assert_eq!(
            all_row_keys(&json!([{"a": 1}, {"b": 2, "a": 1}])).unwrap(),
            vec!["a", "b"]
        );
        assert!(all_row_keys(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*.2.?", "a.1.2.c"));
        assert!(!wildcard_match("?.c", "a.b.c"));
        assert!(wildcard_match("a.*", "a.b.c"));
        assert!(wildcard_match("price(eur)", "price(eur)"));
    }
}
