//! Position representation, magic-bitboard move generation, Zobrist
//! hashing, legal-move validation, SAN, bit-level I/O, annotated game
//! trees, and time controls — the board-and-rules core shared by every
//! higher-level ChessCore crate.
//!
//! This crate has no knowledge of search, evaluation, engines, or storage;
//! those live in `chesscore-uci` and `chesscore-store`, both of which
//! depend on this one.

pub mod error;

pub mod bits;
pub mod square;
pub mod piece;

pub mod prng;
pub mod zobrist;
pub mod tables;

pub mod mv;
pub mod position;
pub mod san;
pub mod perft;

pub mod blob;
pub mod bitstream;

pub mod game;
pub mod time_control;

pub use error::{ChessError, Result};
pub use mv::Move;
pub use position::{Context, FenResult, FenStatus, Position};
