//! The relational schema: players,
//! events, sites, annotators, games, and the opening-tree index, plus a
//! `meta` row carrying the schema version every build must agree on.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Bumped whenever the DDL below changes in a way that isn't
/// backward-compatible. A file whose `meta.schema_version` doesn't match
/// this is rejected rather than silently misread.
pub const SCHEMA_VERSION: i64 = 1;

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS player (
    id          INTEGER PRIMARY KEY,
    last_name   TEXT NOT NULL,
    first_names TEXT NOT NULL,
    country_code TEXT,
    elo         INTEGER,
    UNIQUE(last_name, first_names)
);

CREATE TABLE IF NOT EXISTS event (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS site (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS annotator (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS game (
    id                INTEGER PRIMARY KEY,
    white_id          INTEGER REFERENCES player(id),
    black_id          INTEGER REFERENCES player(id),
    event_id          INTEGER REFERENCES event(id),
    site_id           INTEGER REFERENCES site(id),
    annotator_id      INTEGER REFERENCES annotator(id),
    round_major       INTEGER NOT NULL DEFAULT 0,
    round_minor       INTEGER NOT NULL DEFAULT 0,
    day               INTEGER,
    month             INTEGER,
    year              INTEGER,
    result            TEXT NOT NULL DEFAULT '*',
    eco               TEXT,
    time_control_blob BLOB,
    moves_blob        BLOB NOT NULL,
    annotations_blob  BLOB,
    partial_flag      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS opening_tree (
    hash_key       INTEGER NOT NULL,
    game_id        INTEGER NOT NULL REFERENCES game(id),
    move_bits      INTEGER NOT NULL,
    score          INTEGER NOT NULL DEFAULT 0,
    last_move_flag INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS opening_tree_hash_idx ON opening_tree(hash_key);

CREATE INDEX IF NOT EXISTS game_white_idx ON game(white_id);
CREATE INDEX IF NOT EXISTS game_black_idx ON game(black_id);
CREATE INDEX IF NOT EXISTS game_event_idx ON game(event_id);
CREATE INDEX IF NOT EXISTS game_eco_idx ON game(eco);
CREATE INDEX IF NOT EXISTS game_year_idx ON game(year);
"#;

/// Applies the schema to a freshly-opened connection (idempotent — every
/// statement is `CREATE ... IF NOT EXISTS`), then checks or stamps the
/// `meta.schema_version` row.
pub fn ensure_schema(conn: &Connection, read_only: bool) -> Result<()> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .ok()
        .and_then(|s| s.parse().ok());

    match existing {
        Some(found) if found != SCHEMA_VERSION => {
            log::warn!("schema version mismatch: found {found}, expected {SCHEMA_VERSION}");
            return Err(StoreError::SchemaMismatch {
                found,
                expected: SCHEMA_VERSION,
            })
        }
        Some(_) => return Ok(()),
        None => {}
    }

    if read_only {
        // A brand-new, schema-less file opened read-only can't be bootstrapped.
        log::warn!("read-only open of schema-less database; cannot bootstrap");
        return Err(StoreError::SchemaMismatch {
            found: 0,
            expected: SCHEMA_VERSION,
        });
    }

    log::debug!("bootstrapping schema (version {SCHEMA_VERSION})");
    conn.execute_batch(DDL)?;
    conn.execute(
        "INSERT OR REPLACE INTO meta(key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_memory_db_bootstraps_schema() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn, false).unwrap();
        let version: i64 = conn
            .query_row("SELECT value FROM meta WHERE key='schema_version'", [], |r| {
                r.get::<_, String>(0)
            })
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn mismatched_version_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn, false).unwrap();
        conn.execute(
            "UPDATE meta SET value = '999' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();
        assert!(matches!(
            ensure_schema(&conn, false),
            Err(StoreError::SchemaMismatch { found: 999, .. })
        ));
    }
}
