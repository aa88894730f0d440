//! ORDER BY tests
//!
//! Tests for sorting including:
//! - Multi-term ordering with per-term direction
//! - Natural ordering
//! - Stability on ties
//! - Function terms and eager validation

mod common;

use common::{column, people};
use serde_json::json;
use tablearray::{RowKey, Table, TableError};

#[test]
fn test_multi_term_direction_is_per_term() {
    let mut table = people();
    table.order_by("likes DESC, name ASC").unwrap();
    assert_eq!(
        column(&table, "id"),
        vec![json!(2), json!(4), json!(1), json!(3)]
    );
}

#[test]
fn test_natural_order() {
    let mut table = Table::new(json!([{"name": "A2"}, {"name": "A12"}, {"name": "A1"}])).unwrap();
    table.order_by("name NATURAL").unwrap();
    assert_eq!(column(&table, "name"), vec![json!("A1"), json!("A2"), json!("A12")]);

    table.order_by("name").unwrap();
    assert_eq!(column(&table, "name"), vec![json!("A1"), json!("A12"), json!("A2")]);

    table.order_by("name NATURAL DESC").unwrap();
    assert_eq!(column(&table, "name"), vec![json!("A12"), json!("A2"), json!("A1")]);
}

#[test]
fn test_full_ties_keep_relative_order() {
    let rows: Vec<_> = (0..20)
        .map(|i| json!({"seq": i, "bucket": i % 3}))
        .collect();
    let mut table = Table::new(json!(rows)).unwrap();
    table.order_by("bucket").unwrap();

    let fetched = table.fetch_all();
    for pair in fetched.windows(2) {
        if pair[0]["bucket"] == pair[1]["bucket"] {
            assert!(pair[0]["seq"].as_i64() < pair[1]["seq"].as_i64());
        }
    }
}

#[test]
fn test_numeric_strings_compare_as_numbers() {
    let mut table = Table::new(json!([{"v": "10"}, {"v": 9}, {"v": "2"}])).unwrap();
    table.order_by("v").unwrap();
    assert_eq!(column(&table, "v"), vec![json!("2"), json!(9), json!("10")]);
}

#[test]
fn test_function_term() {
    let mut table = people();
    table.order_by("DATEFORMAT('Y', born) DESC, id").unwrap();
    assert_eq!(
        column(&table, "id"),
        vec![json!(3), json!(1), json!(2), json!(4)]
    );
}

#[test]
fn test_keys_are_renumbered() {
    let mut table = Table::new(json!({"x": {"v": 2}, "y": {"v": 1}})).unwrap();
    table.order_by("v").unwrap();
    let keys: Vec<RowKey> = table.fetch_raw().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![RowKey::Index(0), RowKey::Index(1)]);
    assert_eq!(table.fetch_all()[0]["v"], json!(1));
}

#[test]
fn test_unknown_term_fails_before_reordering() {
    let mut table = people();
    assert!(matches!(
        table.order_by("likes, shoe_size DESC"),
        Err(TableError::UnknownField(ref f)) if f == "shoe_size"
    ));
    assert!(matches!(
        table.order_by("NOPE(name)"),
        Err(TableError::UnknownFunction(_))
    ));
    assert_eq!(
        column(&table, "id"),
        vec![json!(1), json!(2), json!(3), json!(4)]
    );
}
