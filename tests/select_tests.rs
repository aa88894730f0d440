//! Projection tests
//!
//! Tests for SELECT including:
//! - Column order and presence in fetched rows
//! - Aliases and computed columns
//! - Composing selections
//! - Validation errors

mod common;

use common::{column, people, row_keys};
use serde_json::{json, Value};
use tablearray::{Table, TableError, TqlError};

#[test]
fn test_round_trip_without_operations() {
    let data = common::people_data();
    let table = Table::new(data.clone()).unwrap();
    assert_eq!(Value::Array(table.fetch_all()), data);
}

#[test]
fn test_projection_has_exactly_selected_keys() {
    let mut table = people();
    table.select("likes, id, name").unwrap();
    for keys in row_keys(&table) {
        assert_eq!(keys, vec!["likes", "id", "name"]);
    }
}

#[test]
fn test_alias_and_function_columns() {
    let mut table = people();
    table
        .select("id, name AS who, UPPER(city) AS town, DATEFORMAT('Y', born) AS year")
        .unwrap();
    assert_eq!(
        table.fetch_all()[1],
        json!({"id": 2, "who": "berta", "town": "PARIS", "year": "1985"})
    );
}

#[test]
fn test_later_select_uses_new_names() {
    let mut table = people();
    table.select("id, name AS who").unwrap();
    table.select("who").unwrap();
    assert_eq!(column(&table, "who"), vec![json!("Anton"), json!("berta"), json!("Carl"), json!("Dora")]);

    // "name" left the view
    assert!(matches!(
        table.select("name"),
        Err(TableError::UnknownField(ref f)) if f == "name"
    ));
}

#[test]
fn test_computed_columns_stay_in_storage() {
    let mut table = people();
    table.select("id, LOWER(name) AS low").unwrap();
    table.select("id").unwrap();
    let raw = table.fetch_raw();
    assert_eq!(raw[0].1["low"], json!("anton"));
    assert!(table.fetch_all()[0].get("low").is_none());
}

#[test]
fn test_nested_function_arguments() {
    let mut table = people();
    table
        .select("id, CONCAT(UPPER(name), '-', city) AS label")
        .unwrap();
    assert_eq!(column(&table, "label")[0], json!("ANTON-Berlin"));
}

#[test]
fn test_wildcard_resets_selection() {
    let mut table = people();
    table.select("id").unwrap();
    table.select("*").unwrap();
    assert_eq!(table.fetch_all()[0].as_object().unwrap().len(), 5);
    assert!(table.selected_columns().is_none());
}

#[test]
fn test_function_without_alias_fails() {
    let mut table = people();
    assert!(matches!(
        table.select("UPPER(name)"),
        Err(TableError::MissingAlias(_))
    ));
}

#[test]
fn test_unknown_function_and_field() {
    let mut table = people();
    assert!(matches!(
        table.select("NOPE(name) AS x"),
        Err(TableError::UnknownFunction(ref f)) if f == "NOPE"
    ));
    assert!(matches!(
        table.select("UPPER(nickname) AS x"),
        Err(TableError::UnknownField(ref f)) if f == "nickname"
    ));
}

#[test]
fn test_forbidden_characters() {
    let mut table = people();
    assert!(matches!(
        table.select("id; name"),
        Err(TableError::InvalidInput(_))
    ));
    assert!(matches!(
        table.select("likes + 1 AS x"),
        Err(TableError::InvalidInput(_))
    ));
}

#[test]
fn test_user_function() {
    let mut table = people();
    table.add_function("DOUBLE", |args: &[Value]| {
        let n = args
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| TqlError::ArityOrType("DOUBLE needs a number".to_string()))?;
        Ok(json!(n * 2))
    });
    table.select("id, DOUBLE(likes) AS twice").unwrap();
    assert_eq!(column(&table, "twice"), vec![json!(6), json!(24), json!(6), json!(14)]);

    // lookups are case-sensitive
    assert!(matches!(
        table.select("double(likes) AS x"),
        Err(TableError::UnknownFunction(_))
    ));
}

#[test]
fn test_select_on_empty_table_is_noop() {
    let mut table = Table::empty();
    table.select("id, UPPER(name) AS n").unwrap();
    assert!(table.fetch_all().is_empty());
}
