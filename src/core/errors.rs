/*!
# Error System for the Model Analyzer

Named failure conditions surfaced by the loader and the analyzers.
Parsers never fail: unrecognized input degrades to "nothing parsed".
*/

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors produced while assembling or querying a semantic model
#[derive(Error, Debug)]
pub enum ModelError {
    /// The semantic model directory derived from a project path does not exist
    #[error("Semantic model not found: {}", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Measure not found: {0}")]
    MeasureNotFound(String),

    #[error("Column not found: {table}[{column}]")]
    ColumnNotFound { table: String, column: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ModelError {
    /// True for the lookup-miss family (table, measure or column name not in the model)
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            ModelError::TableNotFound(_)
                | ModelError::MeasureNotFound(_)
                | ModelError::ColumnNotFound { .. }
        )
    }
}
