//! Error taxonomy shared by every fallible operation in this crate.
//!
//! Parsing and codec operations never abort on malformed input — they
//! return one of these variants. Violations of internal invariants (a king
//! vanishing during `unmake_move`, for instance) are `debug_assert!`s, not
//! `ChessError`s: those are fatal in debug builds and undefined behavior in
//! release, never a value a caller can recover from.

use thiserror::Error;

/// Errors surfaced by FEN/SAN/UCI-move parsing, move generation, and the
/// bit-level `Blob`/`Bitstream` primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),
}

impl ChessError {
    pub fn parse(msg: impl Into<String>) -> Self {
        ChessError::ParseError(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ChessError::InvalidArgument(msg.into())
    }

    pub fn illegal(msg: impl Into<String>) -> Self {
        ChessError::IllegalMove(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ChessError>;
