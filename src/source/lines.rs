//! Tables from lists of text lines.

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::config::CsvOptions;
use crate::error::{TableError, TableResult};
use crate::table::{Row, Table};

/// Delimiters from this length on are regular expressions.
const REGEX_DELIMITER_LEN: usize = 5;

/// Line break pattern used by [`Table::from_string`] by default.
pub const LINE_BREAK_PATTERN: &str = r"/\R/";

/// Compile a delimited regular expression such as `/^(\d+):(\d+)/i`.
///
/// The first character is the delimiter; flags after the closing
/// delimiter may be `i`, `m`, `s`, `x` and `u`. `\R` matches any line
/// break.
pub fn compile_delimited(pattern: &str) -> TableResult<Regex> {
    let invalid = || TableError::InvalidInput(format!("invalid regular expression '{}'", pattern));
    let mut chars = pattern.chars();
    let open = chars.next().ok_or_else(invalid)?;
    if open.is_alphanumeric() || open == '\\' || open.is_whitespace() {
        return Err(invalid());
    }
    let close = match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    };
    let body = &pattern[open.len_utf8()..];
    let end = body.rfind(close).ok_or_else(invalid)?;
    let (source, flags) = (&body[..end], &body[end + close.len_utf8()..]);

    let mut builder = RegexBuilder::new(&source.replace(r"\R", r"(?:\r\n|\n|\r)"));
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'u' => builder.unicode(true),
            _ => return Err(invalid()),
        };
    }
    builder.build().map_err(|e| {
        TableError::InvalidInput(format!("invalid regular expression '{}': {}", pattern, e))
    })
}

/// How each line is split into columns.
enum LineSplit {
    /// `[key, line]`
    KeyValue,
    Csv(char),
    Plain(String),
    Captures { regex: Regex, named: bool },
    RegexSplit(Regex),
}

impl LineSplit {
    fn from_delimiter(delimiter: &str) -> TableResult<Self> {
        Ok(match delimiter.len() {
            0 => LineSplit::KeyValue,
            1 => LineSplit::Csv(delimiter.chars().next().unwrap_or(',')),
            n if n < REGEX_DELIMITER_LEN => LineSplit::Plain(delimiter.to_string()),
            _ => match delimiter.strip_prefix('s') {
                Some(rest) => LineSplit::RegexSplit(compile_delimited(rest)?),
                None => {
                    let regex = compile_delimited(delimiter)?;
                    let named = regex.capture_names().flatten().next().is_some();
                    LineSplit::Captures { regex, named }
                }
            },
        })
    }

    fn split(&self, index: usize, line: &str, options: &CsvOptions) -> TableResult<Vec<(String, Value)>> {
        let positional = |parts: Vec<Value>| {
            parts
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect::<Vec<_>>()
        };
        let text = |s: &str| Value::String(s.to_string());

        Ok(match self {
            LineSplit::KeyValue => positional(vec![Value::from(index), text(line)]),
            LineSplit::Csv(delimiter) => positional(split_csv_line(line, *delimiter, options)?),
            LineSplit::Plain(delimiter) => positional(line.split(delimiter.as_str()).map(text).collect()),
            LineSplit::RegexSplit(regex) => positional(regex.split(line).map(text).collect()),
            LineSplit::Captures { regex, named } => {
                let caps = regex.captures(line).ok_or_else(|| {
                    TableError::InvalidInput(format!(
                        "line {} does not match '{}'",
                        index,
                        regex.as_str()
                    ))
                })?;
                let group = |i: usize| text(caps.get(i).map(|m| m.as_str()).unwrap_or(""));
                match caps.len() {
                    1 => positional(vec![Value::from(index), group(0)]),
                    2 => positional(vec![Value::from(index), group(1)]),
                    _ if *named => regex
                        .capture_names()
                        .enumerate()
                        .filter_map(|(i, name)| name.map(|n| (n.to_string(), group(i))))
                        .collect(),
                    n => positional((1..n).map(group).collect()),
                }
            }
        })
    }
}

fn split_csv_line(line: &str, delimiter: char, options: &CsvOptions) -> TableResult<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(ascii(delimiter)?)
        .quote(options.enclosure_byte()?)
        .escape(Some(options.escape_byte()?))
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(record.iter().map(|f| Value::String(f.to_string())).collect())
}

fn ascii(c: char) -> TableResult<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| TableError::InvalidInput(format!("delimiter '{}' is not ASCII", c)))
}

impl Table {
    /// Build a table from text lines, splitting each line by `delimiter`:
    ///
    /// - empty: rows `[index, line]`
    /// - one character: a CSV line
    /// - two to four characters: plain split
    /// - five or more: a delimited regular expression whose capture groups
    ///   become columns (named groups become named columns, a single group
    ///   or none gives `[index, match]`); prefixed with `s` the expression
    ///   splits the line instead
    ///
    /// A line the expression does not match is `InvalidInput`.
    pub fn from_one_dim<S: AsRef<str>>(lines: &[S], delimiter: &str) -> TableResult<Self> {
        let split = LineSplit::from_delimiter(delimiter)?;
        let options = CsvOptions::default();
        let rows = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                split
                    .split(i, line.as_ref(), &options)
                    .map(|cells| cells.into_iter().collect::<Row>())
            })
            .collect::<TableResult<Vec<Row>>>()?;
        tracing::debug!("SOURCE: {} line(s) split by '{}'", rows.len(), delimiter);
        Ok(Table::from_rows(rows))
    }

    /// Split `text` into lines with `line_pattern` (a delimited regular
    /// expression, default any line break), drop empty lines, then
    /// [`from_one_dim`](Table::from_one_dim).
    pub fn from_string(text: &str, delimiter: &str, line_pattern: Option<&str>) -> TableResult<Self> {
        let splitter = compile_delimited(line_pattern.unwrap_or(LINE_BREAK_PATTERN))?;
        let lines: Vec<&str> = splitter.split(text).filter(|l| !l.is_empty()).collect();
        Table::from_one_dim(&lines, delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_delimited() {
        let re = compile_delimited("/^a(\\d)/i").unwrap();
        assert!(re.is_match("A1"));
        assert!(compile_delimited("#x#").is_ok());
        assert!(matches!(compile_delimited("abc"), Err(TableError::InvalidInput(_))));
        assert!(matches!(compile_delimited("/(/"), Err(TableError::InvalidInput(_))));
        assert!(matches!(compile_delimited("/a/q"), Err(TableError::InvalidInput(_))));
    }

    #[test]
    fn test_key_value_rows() {
        let t = Table::from_one_dim(&["x", "y"], "").unwrap();
        assert_eq!(t.fetch_all()[1], json!({"0": 1, "1": "y"}));
    }

    #[test]
    fn test_csv_and_plain_split() {
        let t = Table::from_one_dim(&["a,\"b,c\"", "d,e"], ",").unwrap();
        assert_eq!(t.fetch_all()[0], json!({"0": "a", "1": "b,c"}));

        let t = Table::from_one_dim(&["a::b"], "::").unwrap();
        assert_eq!(t.fetch_all()[0], json!({"0": "a", "1": "b"}));
    }

    #[test]
    fn test_regex_captures() {
        let t = Table::from_one_dim(&["10:20", "30:40"], r"/^(\d+):(\d+)$/").unwrap();
        assert_eq!(t.fetch_all()[1], json!({"0": "30", "1": "40"}));

        let t = Table::from_one_dim(&["10:20"], r"/^(?P<h>\d+):(?P<m>\d+)$/").unwrap();
        assert_eq!(t.fetch_all()[0], json!({"h": "10", "m": "20"}));

        let t = Table::from_one_dim(&["id=7"], r"/id=(\d+)/").unwrap();
        assert_eq!(t.fetch_all()[0], json!({"0": 0, "1": "7"}));

        assert!(matches!(
            Table::from_one_dim(&["nope"], r"/^(\d+):(\d+)$/"),
            Err(TableError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_regex_split() {
        let t = Table::from_one_dim(&["a   b  c"], "s/  +/").unwrap();
        assert_eq!(t.fetch_all()[0], json!({"0": "a", "1": "b", "2": "c"}));
    }

    #[test]
    fn test_from_string() {
        let t = Table::from_string("a,1\r\n\nb,2\n", ",", None).unwrap();
        assert_eq!(t.count(), 2);
        assert_eq!(t.fetch_all()[1], json!({"0": "b", "1": "2"}));

        let t = Table::from_string("a;b|c;d", ";", Some("/\\|/")).unwrap();
        assert_eq!(t.fetch_column("1").unwrap(), vec![json!("b"), json!("d")]);
    }
}
