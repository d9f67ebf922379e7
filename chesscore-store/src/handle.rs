//! The store handle state machine:
//! `closed → opening → open[read] | open[read_write] → closing → closed`.
//! Any operation on `closed`, or attempted mid-transition, fails with
//! `NotOpen`; writes against a read-only handle fail with `ReadOnly`.

use std::path::Path;

use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::schema;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    Read,
    ReadWrite,
}

enum State {
    Closed,
    Open { conn: Connection, mode: Mode },
}

/// Owns (at most) one open SQLite connection. `open_read_write`/`open_read`
/// move the handle from `Closed` through an implicit `Opening` step (schema
/// bootstrap/check) into `Open`; `close` tears it back down. Errors from an
/// operation leave the handle in whatever `Open`/`Closed` state it was in —
/// only a reported connection loss would force it back to `Closed`, and
/// `rusqlite` surfaces that as an `Io` error on the next call rather than
/// silently, so this handle doesn't need to track it separately.
pub struct StoreHandle {
    state: State,
}

impl StoreHandle {
    pub fn new() -> StoreHandle {
        StoreHandle {
            state: State::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.state, State::Open { mode: Mode::Read, .. })
    }

    /// Opens (creating if necessary) `path` for reading and writing,
    /// bootstrapping the schema on a fresh file and checking the schema
    /// version on an existing one.
    pub fn open_read_write(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::debug!("opening {} read-write", path.display());
        let conn = Connection::open(path)?;
        schema::ensure_schema(&conn, false)?;
        self.state = State::Open {
            conn,
            mode: Mode::ReadWrite,
        };
        Ok(())
    }

    /// Opens `path` read-only. The file must already carry a matching
    /// schema — a read-only handle can never bootstrap one.
    pub fn open_read(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::debug!("opening {} read-only", path.display());
        let conn = Connection::open_with_flags(path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        schema::ensure_schema(&conn, true)?;
        self.state = State::Open {
            conn,
            mode: Mode::Read,
        };
        Ok(())
    }

    /// Opens an in-memory database, mainly for tests — always read/write.
    pub fn open_in_memory(&mut self) -> Result<()> {
        let conn = Connection::open_in_memory()?;
        schema::ensure_schema(&conn, false)?;
        self.state = State::Open {
            conn,
            mode: Mode::ReadWrite,
        };
        Ok(())
    }

    pub fn close(&mut self) {
        if self.is_open() {
            log::trace!("closing store handle");
        }
        self.state = State::Closed;
    }

    /// A connection reference for read-only queries; fails `NotOpen` on a
    /// closed handle (reads are otherwise allowed in either open mode).
    pub fn connection(&self) -> Result<&Connection> {
        match &self.state {
            State::Open { conn, .. } => Ok(conn),
            State::Closed => Err(StoreError::NotOpen),
        }
    }

    /// A connection reference for mutation; fails `NotOpen` when closed and
    /// `ReadOnly` when open read-only.
    pub fn connection_mut(&mut self) -> Result<&mut Connection> {
        match &mut self.state {
            State::Open { conn, mode } => {
                if *mode == Mode::Read {
                    Err(StoreError::ReadOnly)
                } else {
                    Ok(conn)
                }
            }
            State::Closed => Err(StoreError::NotOpen),
        }
    }
}

impl Default for StoreHandle {
    fn default() -> Self {
        StoreHandle::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_handle_rejects_every_operation() {
        let handle = StoreHandle::new();
        assert!(matches!(handle.connection(), Err(StoreError::NotOpen)));
    }

    #[test]
    fn read_only_handle_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.db");
        {
            let mut h = StoreHandle::new();
            h.open_read_write(&path).unwrap();
        }
        let mut h = StoreHandle::new();
        h.open_read(&path).unwrap();
        assert!(h.is_read_only());
        assert!(matches!(h.connection_mut(), Err(StoreError::ReadOnly)));
        assert!(h.connection().is_ok());
    }

    #[test]
    fn close_returns_to_not_open() {
        let mut h = StoreHandle::new();
        h.open_in_memory().unwrap();
        assert!(h.is_open());
        h.close();
        assert!(matches!(h.connection(), Err(StoreError::NotOpen)));
    }
}
