//! TableArray - an in-memory table engine.
//!
//! Load a list of rows from JSON, CSV or text lines, shape it with a
//! chainable SQL-like pipeline (select, order by, group and aggregate,
//! filter, join, pivot, flatten) and fetch the result as rows, JSON or CSV.
//! Term parsing, evaluation and the function library live in [`tql_core`].

pub mod config;
pub mod error;
pub mod output;
pub mod source;
pub mod table;

pub use config::{Config, CsvOptions};
pub use error::{TableError, TableResult};
pub use source::{all_row_keys, check, compile_delimited, wildcard_match};
pub use table::{AggregateFn, Cursor, JoinSource, LikeList, Row, RowKey, RowStore, Table};
pub use tql_core::{FunctionRegistry, SqlFunction, TqlError, TqlResult};
