//! Error taxonomy for the store backend: parse/codec errors, the handle
//! state-machine misuse errors (`not-open`, `read-only`), and I/O failures
//! from the underlying SQLite connection.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("store handle is not open")]
    NotOpen,

    #[error("store handle is open read-only")]
    ReadOnly,

    #[error("schema version mismatch: file has {found}, this build expects {expected}")]
    SchemaMismatch { found: i64, expected: i64 },

    #[error("io error: {0}")]
    Io(#[from] rusqlite::Error),

    #[error("chess error: {0}")]
    Chess(#[from] chesscore::ChessError),
}

impl StoreError {
    pub fn parse(msg: impl Into<String>) -> Self {
        StoreError::ParseError(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
