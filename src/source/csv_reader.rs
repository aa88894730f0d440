//! CSV source.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::config::{CsvOptions, BOM};
use crate::error::{TableError, TableResult};
use crate::table::{Row, Table};

impl Table {
    /// Read CSV with the given options. Columns are positional ("0", "1",
    /// ...) unless `options.title` is set, in which case the first record
    /// names them. A leading byte order mark is dropped. The table keeps a
    /// copy of `options` for later CSV output.
    pub fn from_csv_reader<R: Read>(reader: R, options: &CsvOptions) -> TableResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(options.delimiter_byte()?)
            .quote(options.enclosure_byte()?)
            .escape(Some(options.escape_byte()?))
            .from_reader(reader);

        let mut rows = Vec::new();
        for (i, result) in csv_reader.records().enumerate() {
            let record = result?;
            let row: Row = record
                .iter()
                .enumerate()
                .map(|(col, field)| {
                    let field = if i == 0 && col == 0 {
                        field.strip_prefix(BOM).unwrap_or(field)
                    } else {
                        field
                    };
                    (col.to_string(), Value::String(field.to_string()))
                })
                .collect();
            rows.push(row);
        }

        let mut table = Table::from_rows(rows);
        if options.title {
            table.first_row_to_key()?;
        }
        table.set_csv_options(options.clone());
        tracing::debug!("SOURCE: {} CSV row(s)", table.count());
        Ok(table)
    }

    /// Read a CSV file. An empty `path` falls back to `options.file`.
    pub fn from_csv_file(path: impl AsRef<Path>, options: &CsvOptions) -> TableResult<Self> {
        let path = path.as_ref();
        let path = if path.as_os_str().is_empty() {
            if options.file.is_empty() {
                return Err(TableError::InvalidInput(
                    "no CSV file given and no default file configured".to_string(),
                ));
            }
            Path::new(&options.file)
        } else {
            path
        };
        let file = File::open(path)?;
        Table::from_csv_reader(file, options)
    }
}
