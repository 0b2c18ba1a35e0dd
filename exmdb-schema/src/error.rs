//! Schema error types.

use thiserror::Error;

/// Errors from building or querying a schema catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("table not found: {table}")]
    UnknownTable { table: String },

    #[error("table defined more than once: {table}")]
    DuplicateTable { table: String },

    #[error("{table}.{column} references missing column {target_table}.{target_column}")]
    DanglingReference {
        table: String,
        column: String,
        target_table: String,
        target_column: String,
    },
}
