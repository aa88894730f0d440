//! Filter and fetch tests
//!
//! Tests for row filters, windowing, uniqueness and the terminal fetch
//! operations.

mod common;

use common::{column, people};
use serde_json::json;
use tablearray::{RowKey, Table, TableError};

#[test]
fn test_filter_equal_compares_text() {
    let mut table = people();
    table.filter_equal(&[("city", json!("Berlin")), ("likes", json!("3"))]);
    assert_eq!(column(&table, "id"), vec![json!(1), json!(3)]);
    let keys: Vec<RowKey> = table.fetch_raw().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![RowKey::Index(0), RowKey::Index(1)]);
}

#[test]
fn test_filter_like() {
    let mut table = people();
    table.filter_like_in("name", "AN,dor", false).unwrap();
    assert_eq!(column(&table, "name"), vec![json!("Anton"), json!("Dora")]);

    let mut table = people();
    table.filter_like_all("name", vec!["a", "r"], false).unwrap();
    assert_eq!(column(&table, "name"), vec![json!("berta"), json!("Carl"), json!("Dora")]);

    // integer columns compare by value, not by substring
    let mut table = people();
    table.filter_like_in("likes", ["3", "1"], true).unwrap();
    assert_eq!(column(&table, "id"), vec![json!(1), json!(3)]);
    let keys: Vec<RowKey> = table.fetch_raw().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![RowKey::Index(0), RowKey::Index(2)]);
}

#[test]
fn test_filter_nulls_and_predicate() {
    let mut table = Table::new(json!([{"a": 1}, {"a": null}, {"a": 3}])).unwrap();
    table.filter_nulls();
    assert_eq!(table.count(), 2);
    table.filter(|row| row["a"] != json!(1));
    assert_eq!(table.fetch_all(), vec![json!({"a": 3})]);
}

#[test]
fn test_unique() {
    let mut table = people();
    table.filter_unique(Some(&["city"][..])).unwrap();
    assert_eq!(column(&table, "id"), vec![json!(1), json!(2), json!(4)]);

    let mut table = Table::new(json!([{"a": 1}, {"a": 1}, {"a": 2}])).unwrap();
    table.filter_unique::<&str>(None).unwrap();
    assert_eq!(table.count(), 2);

    // numbers and their text form are the same value
    let mut table = Table::new(json!([{"a": 1, "b": "x"}, {"a": "1", "b": "x"}, {"a": 1.5, "b": "y"}])).unwrap();
    table.filter_unique::<&str>(None).unwrap();
    assert_eq!(column(&table, "a"), vec![json!(1), json!(1.5)]);

    assert!(matches!(
        people().filter_unique(Some(&["zip"][..])),
        Err(TableError::UnknownField(_))
    ));
}

#[test]
fn test_limit_and_offset() {
    let mut table = people();
    table.offset(1).limit(2);
    assert_eq!(column(&table, "id"), vec![json!(2), json!(3)]);

    let mut table = people();
    table.limit(-1);
    assert_eq!(column(&table, "id"), vec![json!(4)]);
    assert_eq!(table.fetch_raw()[0].0, RowKey::Index(0));
}

#[test]
fn test_fetch_windows() {
    let table = people();
    let ids = |rows: Vec<serde_json::Value>| rows.iter().map(|r| r["id"].clone()).collect::<Vec<_>>();
    assert_eq!(ids(table.fetch_limit(2, 1)), vec![json!(2), json!(3)]);
    assert_eq!(ids(table.fetch_limit_from_end(2)), vec![json!(3), json!(4)]);
    assert_eq!(table.fetch_limit_keyed(1, 3)[0].0, RowKey::Index(3));
    assert!(table.fetch_limit(5, 10).is_empty());
}

#[test]
fn test_fetch_row_and_columns() {
    let mut table = people();
    table.select("name").unwrap();
    assert_eq!(table.fetch_row(None).unwrap(), *json!({"name": "Anton"}).as_object().unwrap());
    assert_eq!(table.fetch_row(Some(&RowKey::Index(2))).unwrap()["name"], json!("Carl"));
    assert!(table.fetch_row(Some(&RowKey::Index(9))).is_none());

    // columns outside the selection are still reachable
    assert_eq!(
        table.fetch_column_unique("city").unwrap(),
        vec![json!("Berlin"), json!("Paris"), json!("Rome")]
    );
    assert!(matches!(
        table.fetch_column("zip"),
        Err(TableError::UnknownField(_))
    ));

    let pairs = table.fetch_key_value("id", "name").unwrap();
    assert_eq!(pairs["4"], json!("Dora"));
}

#[test]
fn test_fetch_group_needs_selected_columns() {
    let mut table = people();
    table.select("city, name").unwrap();
    let grouped = table.fetch_group(&["city"]).unwrap();
    assert_eq!(grouped["Berlin"]["2"], json!({"city": "Berlin", "name": "Carl"}));

    table.select("name").unwrap();
    assert!(matches!(
        table.fetch_group(&["city"]),
        Err(TableError::InvalidInput(_))
    ));
    assert!(matches!(
        table.fetch_group(&["a", "b", "c", "d"]),
        Err(TableError::InvalidInput(_))
    ));
}

#[test]
fn test_keys_and_field_names() {
    let mut table = Table::new(json!({"x": {"v": 1}, "y": {"v": 2}})).unwrap();
    table.add_keys("key");
    assert_eq!(column(&table, "key"), vec![json!("x"), json!("y")]);
    assert_eq!(table.field_name_raw(1).as_deref(), Some("key"));
    assert!(table.field_name_raw(5).is_none());

    let mut table = people();
    table.field_as_key("city").unwrap();
    let keys: Vec<String> = table.fetch_raw().iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["Berlin", "Paris", "Rome"]);
    assert!(!table.field_names_raw().contains(&"city".to_string()));
}

#[test]
fn test_cursor_over_selection() {
    let mut table = people();
    table.select("id").unwrap();
    let mut cursor = table.cursor();
    let mut ids = Vec::new();
    let mut row = cursor.rewind();
    while let Some(current) = row {
        ids.push(current["id"].clone());
        row = cursor.next();
    }
    assert_eq!(ids, vec![json!(1), json!(2), json!(3), json!(4)]);
    assert!(!cursor.valid());
}
