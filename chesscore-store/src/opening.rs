//! The opening classifier: replays a
//! game's moves from the start position, looking each resulting hash up in
//! `opening_tree`, and reports the deepest ECO/name match found.
//!
//! The lookup is two-pass per the documented convention: first restricted
//! to rows marked `last_move_flag` (a curated "this is the book's last
//! known move from here" terminal), falling back to any row for that hash
//! if none carries the flag. The opening name and variation are borrowed
//! from the matched book game's white-player/black-player last-name
//! fields — the domain convention spec.md §4.8 prescribes, since the
//! opening book has no dedicated name table of its own.

use rusqlite::{params, Connection, OptionalExtension};

use chesscore::game::Game;
use chesscore::mv::Move;
use chesscore::position::Context;

use crate::error::Result;

/// A single matched opening: the ECO code, opening name, and variation
/// name of the book game the match came from (the name/variation pair
/// borrowed from that game's white/black "player" last-name fields, the
/// domain convention spec.md §4.8 names), and how many plies of the
/// classified game matched it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpeningMatch {
    pub eco: Option<String>,
    pub name: Option<String>,
    pub variation: Option<String>,
    pub ply_depth: u32,
}

struct TreeHit {
    game_id: i64,
}

fn lookup_hash(conn: &Connection, hash_key: u64, require_last_move: bool) -> Result<Option<TreeHit>> {
    let sql = if require_last_move {
        "SELECT game_id FROM opening_tree WHERE hash_key = ?1 AND last_move_flag = 1 LIMIT 1"
    } else {
        "SELECT game_id FROM opening_tree WHERE hash_key = ?1 LIMIT 1"
    };
    let hit = conn
        .query_row(sql, params![hash_key as i64], |row| Ok(TreeHit { game_id: row.get(0)? }))
        .optional()?;
    Ok(hit)
}

/// Replays `moves` from `start`, stopping at the first position with no
/// matching `opening_tree` row, and returns the name/ECO of the deepest
/// match (from the matching row's source game), or `None` if even the
/// start position matched nothing.
pub fn classify(conn: &Connection, ctx: &Context, start: chesscore::position::Position, moves: &[Move]) -> Result<Option<OpeningMatch>> {
    let mut pos = start;

    let mut best = match lookup_hash(conn, pos.hash(), true)?.or(lookup_hash(conn, pos.hash(), false)?) {
        Some(hit) => (hit.game_id, 0u32),
        None => return Ok(None),
    };

    for (ply, &mv) in moves.iter().enumerate() {
        pos.make_move(ctx, mv);
        match lookup_hash(conn, pos.hash(), true)?.or(lookup_hash(conn, pos.hash(), false)?) {
            Some(hit) => best = (hit.game_id, ply as u32 + 1),
            None => break,
        }
    }

    let (game_id, ply_depth) = best;
    let (eco, name, variation): (Option<String>, Option<String>, Option<String>) = conn.query_row(
        "SELECT game.eco, white.last_name, black.last_name \
         FROM game \
         LEFT JOIN player AS white ON game.white_id = white.id \
         LEFT JOIN player AS black ON game.black_id = black.id \
         WHERE game.id = ?1",
        params![game_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(Some(OpeningMatch { eco, name, variation, ply_depth }))
}

/// Replays `game`'s mainline from its start position and classifies it —
/// the common case of identifying the opening of a freshly-built [`Game`].
pub fn classify_mainline(conn: &Connection, ctx: &Context, game: &Game) -> Result<Option<OpeningMatch>> {
    let mut moves = Vec::new();
    let mut node = game.root_moves().first().copied();
    while let Some(n) = node {
        moves.push(game.move_at(n));
        node = game.children(n).first().copied();
    }
    classify(conn, ctx, game.start_position().clone(), &moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::StoreHandle;
    use crate::repo;
    use crate::records::{GameRecord, OpeningTreeRow};
    use chesscore::position::Position;

    #[test]
    fn classifies_through_two_plies_then_stops() {
        let ctx = Context::new();
        let mut h = StoreHandle::new();
        h.open_in_memory().unwrap();
        let conn = h.connection_mut().unwrap();

        let start = Position::start(&ctx);
        let e4 = chesscore::san::from_san(&ctx, &start, "e4").unwrap();
        let mut after_e4 = start.clone();
        after_e4.make_move(&ctx, e4);
        let e5 = chesscore::san::from_san(&ctx, &after_e4, "e5").unwrap();
        let mut after_e5 = after_e4.clone();
        after_e5.make_move(&ctx, e5);

        let opening_name = repo::find_or_insert_player(conn, "King's Pawn Game", "", None, None).unwrap();
        let opening_variation = repo::find_or_insert_player(conn, "Open Game", "", None, None).unwrap();

        let record = GameRecord {
            white_id: Some(opening_name.id),
            black_id: Some(opening_variation.id),
            eco: Some("C20".to_string()),
            moves_blob: vec![0],
            ..Default::default()
        };
        let rows = vec![
            OpeningTreeRow { hash_key: start.hash(), game_id: 0, move_bits: 0, score: 0, last_move_flag: false },
            OpeningTreeRow { hash_key: after_e4.hash(), game_id: 0, move_bits: 0, score: 0, last_move_flag: false },
            OpeningTreeRow { hash_key: after_e5.hash(), game_id: 0, move_bits: 0, score: 0, last_move_flag: true },
        ];
        repo::insert_game(conn, &record, &rows).unwrap();

        let conn = h.connection().unwrap();
        let nf3 = chesscore::san::from_san(&ctx, &after_e5, "Nf3").unwrap();
        let result = classify(conn, &ctx, start, &[e4, e5, nf3]).unwrap().unwrap();
        assert_eq!(result.eco, Some("C20".to_string()));
        assert_eq!(result.name, Some("King's Pawn Game".to_string()));
        assert_eq!(result.variation, Some("Open Game".to_string()));
        assert_eq!(result.ply_depth, 2);
    }

    #[test]
    fn unknown_start_position_classifies_to_none() {
        let ctx = Context::new();
        let mut h = StoreHandle::new();
        h.open_in_memory().unwrap();
        let conn = h.connection().unwrap();
        let start = Position::start(&ctx);
        assert!(classify(conn, &ctx, start, &[]).unwrap().is_none());
    }
}
