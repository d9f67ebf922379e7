//! Select-or-insert helpers for the canonical reference tables (player,
//! event, site, annotator) and the transactional game+opening-tree insert
//! in a single transaction.

use rusqlite::{params, Connection, OptionalExtension};

use crate::codec;
use crate::error::Result;
use crate::records::{canonicalize, Annotator, Event, GameRecord, OpeningTreeRow, Player, Site};
use chesscore::game::Game;
use chesscore::position::Context;

/// Runs `body` inside a `BEGIN IMMEDIATE` transaction: the write lock is
/// taken up front, before `body`'s own SELECT runs, so two concurrent
/// callers racing the same select-or-insert can never both observe "not
/// found" and both proceed to INSERT. Spec §4.7 requires exactly this
/// serialisation for the reference tables.
fn with_immediate_transaction<T>(conn: &Connection, body: impl FnOnce() -> Result<T>) -> Result<T> {
    conn.execute_batch("BEGIN IMMEDIATE")?;
    match body() {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(err) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(err)
        }
    }
}

/// Finds `last_name`/`first_names` (canonicalized) in `player`, inserting a
/// new row if absent. Existing `country_code`/`elo` are left untouched by a
/// second call with different values — only the first insert sets them.
/// The select and the insert run inside one `IMMEDIATE` transaction so two
/// concurrent callers for the same canonicalized person never both insert.
pub fn find_or_insert_player(
    conn: &Connection,
    last_name: &str,
    first_names: &str,
    country_code: Option<&str>,
    elo: Option<i32>,
) -> Result<Player> {
    let key_last = canonicalize(last_name);
    let key_first = canonicalize(first_names);
    log::trace!("beginning transaction: find_or_insert_player({last_name}, {first_names})");
    with_immediate_transaction(conn, || {
        let existing = conn
            .query_row(
                "SELECT id, last_name, first_names, country_code, elo FROM player \
                 WHERE lower(trim(last_name)) = ?1 AND lower(trim(first_names)) = ?2",
                params![key_last, key_first],
                |row| {
                    Ok(Player {
                        id: row.get(0)?,
                        last_name: row.get(1)?,
                        first_names: row.get(2)?,
                        country_code: row.get(3)?,
                        elo: row.get(4)?,
                    })
                },
            )
            .optional()?;
        if let Some(p) = existing {
            return Ok(p);
        }
        conn.execute(
            "INSERT INTO player(last_name, first_names, country_code, elo) VALUES (?1, ?2, ?3, ?4)",
            params![last_name, first_names, country_code, elo],
        )?;
        Ok(Player {
            id: conn.last_insert_rowid(),
            last_name: last_name.to_string(),
            first_names: first_names.to_string(),
            country_code: country_code.map(str::to_string),
            elo,
        })
    })
}

/// Same select-or-insert discipline as [`find_or_insert_player`], for the
/// single-`name`-column reference tables (`event`, `site`, `annotator`).
fn find_or_insert_named(conn: &Connection, table: &str, name: &str) -> Result<i64> {
    let key = canonicalize(name);
    log::trace!("beginning transaction: find_or_insert_named({table}, {name})");
    with_immediate_transaction(conn, || {
        let existing: Option<i64> = conn
            .query_row(
                &format!("SELECT id FROM {table} WHERE lower(trim(name)) = ?1"),
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        conn.execute(&format!("INSERT INTO {table}(name) VALUES (?1)"), params![name])?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn find_or_insert_event(conn: &Connection, name: &str) -> Result<Event> {
    let id = find_or_insert_named(conn, "event", name)?;
    Ok(Event { id, name: name.to_string() })
}

pub fn find_or_insert_site(conn: &Connection, name: &str) -> Result<Site> {
    let id = find_or_insert_named(conn, "site", name)?;
    Ok(Site { id, name: name.to_string() })
}

pub fn find_or_insert_annotator(conn: &Connection, name: &str) -> Result<Annotator> {
    let id = find_or_insert_named(conn, "annotator", name)?;
    Ok(Annotator { id, name: name.to_string() })
}

/// Inserts `game` and its opening-tree rows in a single transaction: either
/// both land, or neither does.
pub fn insert_game(conn: &mut Connection, game: &GameRecord, tree_rows: &[OpeningTreeRow]) -> Result<i64> {
    log::trace!("beginning transaction: insert_game with {} opening-tree row(s)", tree_rows.len());
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO game(
            white_id, black_id, event_id, site_id, annotator_id,
            round_major, round_minor, day, month, year,
            result, eco, time_control_blob, moves_blob, annotations_blob, partial_flag
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
        params![
            game.white_id,
            game.black_id,
            game.event_id,
            game.site_id,
            game.annotator_id,
            game.round_major,
            game.round_minor,
            game.day,
            game.month,
            game.year,
            game.result,
            game.eco,
            game.time_control_blob,
            game.moves_blob,
            game.annotations_blob,
            game.partial_flag as i64,
        ],
    )?;
    let game_id = tx.last_insert_rowid();

    {
        let mut stmt = tx.prepare(
            "INSERT INTO opening_tree(hash_key, game_id, move_bits, score, last_move_flag) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for row in tree_rows {
            stmt.execute(params![
                row.hash_key as i64,
                game_id,
                row.move_bits,
                row.score,
                row.last_move_flag as i64,
            ])?;
        }
    }

    tx.commit()?;
    log::debug!("committed game {game_id}");
    Ok(game_id)
}

/// Encodes `game`'s move tree and stamps the resulting blobs onto `record`
/// before it's passed to [`insert_game`] — the usual way a caller turns a
/// freshly-built [`Game`] into a persisted row.
pub fn prepare_record(ctx: &Context, game: &Game, record: &mut GameRecord) -> Result<()> {
    let (moves_blob, annotations_blob) = codec::encode_game(ctx, game)?;
    record.moves_blob = moves_blob;
    record.annotations_blob = annotations_blob;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::StoreHandle;

    #[test]
    fn player_lookup_is_case_and_whitespace_insensitive() {
        let mut h = StoreHandle::new();
        h.open_in_memory().unwrap();
        let conn = h.connection().unwrap();
        let a = find_or_insert_player(conn, "Karpov", "Anatoly", Some("URS"), Some(2700)).unwrap();
        let b = find_or_insert_player(conn, " karpov ", "ANATOLY", None, None).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn insert_game_is_transactional() {
        let mut h = StoreHandle::new();
        h.open_in_memory().unwrap();
        let conn = h.connection_mut().unwrap();
        let mut record = GameRecord {
            moves_blob: vec![0u8],
            result: "1-0".to_string(),
            ..Default::default()
        };
        record.moves_blob = vec![0];
        let rows = vec![OpeningTreeRow {
            hash_key: 42,
            game_id: 0,
            move_bits: 7,
            score: 0,
            last_move_flag: true,
        }];
        let id = insert_game(conn, &record, &rows).unwrap();
        assert!(id > 0);
        let count: i64 = conn
            .query_row("SELECT count(*) FROM opening_tree WHERE game_id = ?1", params![id], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
