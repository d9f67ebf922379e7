//! Error taxonomy for the engine driver: malformed UCI wire text, state
//! machine violations, and the process/pipe failures that come with owning
//! a child executable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation timed out")]
    Timeout,

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine process hung up")]
    Hangup,

    #[error("chess error: {0}")]
    Chess(#[from] chesscore::ChessError),
}

impl DriverError {
    pub fn parse(msg: impl Into<String>) -> Self {
        DriverError::ParseError(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        DriverError::InvalidArgument(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        DriverError::ProtocolError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
