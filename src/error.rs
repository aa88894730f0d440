use thiserror::Error;
use tql_core::TqlError;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function term '{0}' needs an alias (AS name)")]
    MissingAlias(String),

    #[error("Invalid aggregate: {0}")]
    InvalidAggregateSpec(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Function error: {0}")]
    Function(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type TableResult<T> = Result<T, TableError>;

impl From<TqlError> for TableError {
    fn from(err: TqlError) -> Self {
        match err {
            TqlError::UnknownField(name) => TableError::UnknownField(name),
            TqlError::UnknownFunction(name) => TableError::UnknownFunction(name),
            other => TableError::Function(other.to_string()),
        }
    }
}

impl serde::Serialize for TableError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
