//! CSV output of the selected view.
//!
//! Honors the table's [`CsvOptions`]: byte order mark, title line,
//! delimiter, enclosure, escape and line terminator. Nested values are written as
//! compact JSON.

use std::fs;
use std::path::Path;

use tql_core::executor::value_to_string;

use crate::config::{CsvOptions, BOM, DEFAULT_ESCAPE};
use crate::error::{TableError, TableResult};
use crate::table::Table;

impl Table {
    /// The selected view as CSV text.
    pub fn fetch_all_as_csv(&self) -> TableResult<String> {
        let options = &self.csv;
        let mut writer = csv_writer(options)?;
        let mut ends = Vec::new();
        let mut title_pending = options.title;
        for row in self.fetch_rows() {
            if title_pending {
                writer.write_record(row.keys())?;
                writer.flush()?;
                ends.push(writer.get_ref().len());
                title_pending = false;
            }
            writer.write_record(row.values().map(value_to_string))?;
            writer.flush()?;
            ends.push(writer.get_ref().len());
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| TableError::Io(e.into_error()))?;

        // Each record ends in a single '\n' which is swapped for `eol`.
        let mut out = String::with_capacity(bytes.len() + ends.len() * options.eol.len());
        if options.bom {
            out.push_str(BOM);
        }
        let mut start = 0;
        for end in ends {
            out.push_str(&String::from_utf8_lossy(&bytes[start..end - 1]));
            out.push_str(&options.eol);
            start = end;
        }
        Ok(out)
    }

    /// Write the selected view as CSV to `path`. An empty path falls back
    /// to the `file` option.
    pub fn save_as_csv(&self, path: impl AsRef<Path>) -> TableResult<()> {
        let path = path.as_ref();
        let path = if path.as_os_str().is_empty() {
            if self.csv.file.is_empty() {
                return Err(TableError::InvalidInput(
                    "no CSV file given and no default file configured".to_string(),
                ));
            }
            Path::new(&self.csv.file)
        } else {
            path
        };
        fs::write(path, self.fetch_all_as_csv()?)?;
        tracing::debug!("OUTPUT: {} row(s) written to {}", self.count(), path.display());
        Ok(())
    }
}

/// One writer for a whole output. The default backslash escape keeps
/// doubled enclosures; any other escape byte prefixes embedded enclosures.
fn csv_writer(options: &CsvOptions) -> TableResult<csv::Writer<Vec<u8>>> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(options.delimiter_byte()?)
        .quote(options.enclosure_byte()?)
        .terminator(csv::Terminator::Any(b'\n'));
    if options.escape != DEFAULT_ESCAPE {
        builder.escape(options.escape_byte()?).double_quote(false);
    }
    Ok(builder.from_writer(Vec::new()))
}
