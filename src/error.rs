//! Error types for the liftplan application.

use thiserror::Error;

/// Errors raised by the SQLite store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt state row: {0}")]
    CorruptState(String),
}

/// Errors raised while building the xlsx export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
