//! Common test utilities for table pipeline tests
//!
//! Provides shared fixture builders for:
//! - People, grouped values and order/customer tables
//! - Reading tables back as plain JSON

#![allow(dead_code)]

use serde_json::{json, Value};
use tablearray::Table;

pub fn people_data() -> Value {
    json!([
        {"id": 1, "name": "Anton", "city": "Berlin", "likes": 3, "born": "1990-05-17"},
        {"id": 2, "name": "berta", "city": "Paris", "likes": 12, "born": "1985-11-02"},
        {"id": 3, "name": "Carl", "city": "Berlin", "likes": 3, "born": "2001-01-30"},
        {"id": 4, "name": "Dora", "city": "Rome", "likes": 7, "born": "1985-11-02"},
    ])
}

pub fn people() -> Table {
    Table::new(people_data()).expect("people fixture")
}

/// id/group/value rows used by the aggregation scenarios.
pub fn grouped_values() -> Table {
    Table::new(json!([
        {"id": 1, "group": 1, "value": 2},
        {"id": 2, "group": 2, "value": 4},
        {"id": 3, "group": 1, "value": 1},
        {"id": 4, "group": 2, "value": 6},
    ]))
    .expect("grouped values fixture")
}

pub fn orders() -> Table {
    Table::new(json!([
        {"order": 100, "customer": 1, "total": 25.5},
        {"order": 101, "customer": 2, "total": 10},
        {"order": 102, "customer": 3, "total": 99},
    ]))
    .expect("orders fixture")
}

pub fn customers() -> Value {
    json!([
        {"customer": 1, "name": "Anton", "tier": "gold"},
        {"customer": 2, "name": "Berta", "tier": "silver"},
    ])
}

/// One column of the selected view.
pub fn column(table: &Table, name: &str) -> Vec<Value> {
    table
        .fetch_all()
        .into_iter()
        .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Column names of every fetched row.
pub fn row_keys(table: &Table) -> Vec<Vec<String>> {
    table
        .fetch_rows()
        .into_iter()
        .map(|row| row.keys().cloned().collect())
        .collect()
}
