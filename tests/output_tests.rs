//! Output tests
//!
//! Tests for JSON and CSV output of the selected view, and the
//! configuration that drives CSV writing.

mod common;

use std::fs;

use common::people;
use serde_json::{json, Value};
use tablearray::{Config, TableError};
use tempfile::TempDir;

#[test]
fn test_json_output_follows_selection() {
    let mut table = people();
    table.select("name, id").unwrap();
    table.limit(2);
    let text = table.fetch_all_as_json().unwrap();
    assert_eq!(
        text,
        r#"[{"name":"Anton","id":1},{"name":"berta","id":2}]"#
    );

    let serialized = serde_json::to_value(&table).unwrap();
    assert_eq!(serialized, table.to_json_value());
}

#[test]
fn test_csv_output_with_title() {
    let mut table = people();
    table.select("id, city").unwrap();
    table
        .set_option("title", "true")
        .unwrap()
        .set_option("bom", "false")
        .unwrap()
        .set_option("eol", "\n")
        .unwrap();
    assert_eq!(
        table.fetch_all_as_csv().unwrap(),
        "id,city\n1,Berlin\n2,Paris\n3,Berlin\n4,Rome\n"
    );
}

#[test]
fn test_save_and_read_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.csv");

    let mut table = people();
    table.select("id, name").unwrap();
    table.set_option("title", "true").unwrap();
    table.save_as_csv(&path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("\u{feff}id,name\r\n"));

    let mut options = table.csv_options().clone();
    options.title = true;
    let back = tablearray::Table::from_csv_file(&path, &options).unwrap();
    assert_eq!(back.count(), 4);
    assert_eq!(back.fetch_all()[3], json!({"id": "4", "name": "Dora"}));
}

#[test]
fn test_unknown_option() {
    let mut table = people();
    assert!(matches!(
        table.set_option("separator", ";"),
        Err(TableError::InvalidOption(_))
    ));
}

#[test]
fn test_config_file_drives_csv_options() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tablearray.toml");
    fs::write(&path, "[csv]\ndelimiter = \"|\"\nbom = false\n").unwrap();

    let config = Config::load(&path).unwrap();
    let mut table = people();
    table.select("id, likes").unwrap();
    table.set_csv_options(config.csv);
    table.limit(1);
    assert_eq!(table.fetch_all_as_csv().unwrap(), "1|3\r\n");

    // missing file falls back to defaults
    let defaults = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(defaults.csv.delimiter, ',');
}

#[test]
fn test_error_serializes_as_message() {
    let err = people().select("nickname").map(|_| ()).unwrap_err();
    assert_eq!(
        serde_json::to_value(&err).unwrap(),
        Value::String("Unknown field 'nickname'".to_string())
    );
}
