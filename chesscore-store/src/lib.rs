//! Relational persistence for annotated games: a SQLite schema for
//! players, events, sites, annotators, games, and opening-tree rows, a
//! bit-packed move/annotation codec over `chesscore`'s `Blob`/`Bitstream`,
//! and an opening-tree classifier.
//!
//! This crate has no knowledge of move generation or Zobrist hashing
//! beyond what it borrows from `chesscore`; it only ever reads/writes
//! already-generated positions and moves.

pub mod error;

pub mod schema;
pub mod handle;
pub mod records;
pub mod repo;

pub mod codec;
pub mod opening;
pub mod search;

pub use error::{Result, StoreError};
pub use handle::StoreHandle;
pub use opening::OpeningMatch;
pub use records::{Annotator, Event, GameRecord, OpeningTreeRow, Player, Site};
pub use search::{GameQuery, SortColumn, SortDirection};
