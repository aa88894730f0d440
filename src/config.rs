//! Configuration handling
//!
//! CSV read/write options and the `tablearray.toml` configuration file.
//!
//! ## Environment Variables
//!
//! The following environment variables override config file settings:
//!
//! - `TABLEARRAY_CSV_DELIMITER` - Field delimiter (one character)
//! - `TABLEARRAY_CSV_ENCLOSURE` - Quote character (one character)
//! - `TABLEARRAY_CSV_BOM` - Write a UTF-8 byte order mark (true/false)
//! - `TABLEARRAY_CSV_TITLE` - First CSV line holds the column names (true/false)
//!
//! These can be set in a `.env` file next to the config file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{TableError, TableResult};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "tablearray.toml";

/// Environment variable names
pub const ENV_CSV_DELIMITER: &str = "TABLEARRAY_CSV_DELIMITER";
pub const ENV_CSV_ENCLOSURE: &str = "TABLEARRAY_CSV_ENCLOSURE";
pub const ENV_CSV_BOM: &str = "TABLEARRAY_CSV_BOM";
pub const ENV_CSV_TITLE: &str = "TABLEARRAY_CSV_TITLE";

/// UTF-8 byte order mark
pub const BOM: &str = "\u{feff}";

/// Escape byte that leaves embedded enclosures doubled on output
pub const DEFAULT_ESCAPE: char = '\\';

/// Options for reading and writing CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Default target file for `save_as_csv`; empty for none
    #[serde(default)]
    pub file: String,
    /// Write a byte order mark before the first line
    #[serde(default = "default_true")]
    pub bom: bool,
    /// First line holds the column names
    #[serde(default)]
    pub title: bool,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_enclosure")]
    pub enclosure: char,
    #[serde(default = "default_escape")]
    pub escape: char,
    /// Line terminator
    #[serde(default = "default_eol")]
    pub eol: String,
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

fn default_enclosure() -> char {
    '"'
}

fn default_escape() -> char {
    DEFAULT_ESCAPE
}

fn default_eol() -> String {
    "\r\n".to_string()
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            file: String::new(),
            bom: default_true(),
            title: false,
            delimiter: default_delimiter(),
            enclosure: default_enclosure(),
            escape: default_escape(),
            eol: default_eol(),
        }
    }
}

impl CsvOptions {
    /// Update one option by name.
    pub fn set(&mut self, key: &str, value: &str) -> TableResult<&mut Self> {
        match key {
            "file" => self.file = value.to_string(),
            "bom" => self.bom = parse_bool(key, value)?,
            "title" => self.title = parse_bool(key, value)?,
            "delimiter" => self.delimiter = parse_char(key, value)?,
            "enclosure" => self.enclosure = parse_char(key, value)?,
            "escape" => self.escape = parse_char(key, value)?,
            "eol" => {
                if value.is_empty() {
                    return Err(TableError::InvalidOption("eol must not be empty".to_string()));
                }
                self.eol = value.to_string();
            }
            other => {
                return Err(TableError::InvalidOption(format!(
                    "unknown CSV option '{}'",
                    other
                )))
            }
        }
        Ok(self)
    }

    /// Single-byte delimiter for the csv crate.
    pub(crate) fn delimiter_byte(&self) -> TableResult<u8> {
        ascii_byte("delimiter", self.delimiter)
    }

    pub(crate) fn enclosure_byte(&self) -> TableResult<u8> {
        ascii_byte("enclosure", self.enclosure)
    }

    pub(crate) fn escape_byte(&self) -> TableResult<u8> {
        ascii_byte("escape", self.escape)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(delimiter) = std::env::var(ENV_CSV_DELIMITER) {
            if let Some(c) = single_char(&delimiter) {
                self.delimiter = c;
            }
        }

        if let Ok(enclosure) = std::env::var(ENV_CSV_ENCLOSURE) {
            if let Some(c) = single_char(&enclosure) {
                self.enclosure = c;
            }
        }

        if let Ok(bom) = std::env::var(ENV_CSV_BOM) {
            if let Ok(flag) = parse_bool(ENV_CSV_BOM, &bom) {
                self.bom = flag;
            }
        }

        if let Ok(title) = std::env::var(ENV_CSV_TITLE) {
            if let Ok(flag) = parse_bool(ENV_CSV_TITLE, &title) {
                self.title = flag;
            }
        }
    }
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_char(key: &str, value: &str) -> TableResult<char> {
    single_char(value).ok_or_else(|| {
        TableError::InvalidOption(format!("{} must be a single character, got '{}'", key, value))
    })
}

fn parse_bool(key: &str, value: &str) -> TableResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(TableError::InvalidOption(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

fn ascii_byte(key: &str, c: char) -> TableResult<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(TableError::InvalidOption(format!(
            "{} must be an ASCII character, got '{}'",
            key, c
        )))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// CSV options used for reading and writing
    #[serde(default)]
    pub csv: CsvOptions,
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// A `.env` file in the same directory is loaded first. A missing config
    /// file yields the defaults; environment overrides apply either way.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let env_path = path
            .parent()
            .map(|dir| dir.join(".env"))
            .unwrap_or_else(|| Path::new(".env").to_path_buf());
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        }

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) {
        self.csv.apply_env_overrides();
    }

    /// Save configuration to a file path
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
