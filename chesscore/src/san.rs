//! Short Algebraic Notation: formatting a [`Move`] in the context of the
//! position it was played in, and parsing it back.

use crate::error::{ChessError, Result};
use crate::mv::{flags, Move};
use crate::piece::PieceType;
use crate::position::{Context, Position};
use crate::square::Square;

/// Formats `m` (which must be a legal move in `pos`) as SAN, including
/// check/mate suffixes if the corresponding flags are set.
pub fn to_san(ctx: &Context, pos: &Position, m: Move) -> String {
    if m.has_flag(flags::CASTLE_KS) {
        return append_suffix("O-O", m);
    }
    if m.has_flag(flags::CASTLE_QS) {
        return append_suffix("O-O-O", m);
    }

    let mut s = String::new();
    let moving = m.moving_piece();
    let is_capture = m.is_capture();

    if moving == PieceType::Pawn {
        if is_capture {
            s.push(file_char(m.from()));
            s.push('x');
        }
        s.push_str(&m.to().to_string());
        if m.is_promotion() {
            s.push('=');
            s.push(m.promotion_piece().to_char());
        }
    } else {
        s.push(moving.to_char());
        s.push_str(&disambiguation(ctx, pos, m));
        if is_capture {
            s.push('x');
        }
        s.push_str(&m.to().to_string());
    }

    append_suffix(&s, m)
}

fn append_suffix(body: &str, m: Move) -> String {
    let mut s = body.to_string();
    if m.has_flag(flags::MATE) {
        s.push('#');
    } else if m.has_flag(flags::CHECK) {
        s.push('+');
    }
    s
}

fn file_char(sq: Square) -> char {
    sq.file().to_string().chars().next().unwrap()
}

/// Minimum disambiguation: file only if that's enough, else rank, else
/// both.
fn disambiguation(ctx: &Context, pos: &Position, m: Move) -> String {
    let siblings: Vec<Move> = pos
        .gen_moves(ctx)
        .into_iter()
        .filter(|&other| {
            other.to() == m.to() && other.moving_piece() == m.moving_piece() && other.from() != m.from()
        })
        .collect();
    if siblings.is_empty() {
        return String::new();
    }
    let same_file = siblings.iter().any(|s| s.from().file() == m.from().file());
    let same_rank = siblings.iter().any(|s| s.from().rank() == m.from().rank());
    if !same_file {
        file_char(m.from()).to_string()
    } else if !same_rank {
        m.from().rank().to_string()
    } else {
        m.from().to_string()
    }
}

/// Parses SAN in the context of `pos` by generating the legal move list and
/// matching against it, since SAN's disambiguation rules are themselves
/// defined relative to what's legal.
pub fn from_san(ctx: &Context, pos: &Position, san: &str) -> Result<Move> {
    let trimmed = san.trim_end_matches(['+', '#']);
    let legal = pos.gen_moves(ctx);

    if trimmed == "O-O" {
        return legal
            .into_iter()
            .find(|m| m.has_flag(flags::CASTLE_KS))
            .ok_or_else(|| ChessError::parse("no legal kingside castle"));
    }
    if trimmed == "O-O-O" {
        return legal
            .into_iter()
            .find(|m| m.has_flag(flags::CASTLE_QS))
            .ok_or_else(|| ChessError::parse("no legal queenside castle"));
    }

    for m in &legal {
        if to_san(ctx, pos, *m).trim_end_matches(['+', '#']) == trimmed {
            return Ok(*m);
        }
    }
    Err(ChessError::parse(format!("no legal move matches SAN '{san}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_pawn_push_is_unadorned() {
        let ctx = Context::new();
        let pos = Position::start(&ctx);
        let m = pos
            .gen_moves(&ctx)
            .into_iter()
            .find(|m| m.to() == Square::from_algebraic("e4").unwrap())
            .unwrap();
        assert_eq!(to_san(&ctx, &pos, m), "e4");
    }

    #[test]
    fn san_roundtrips_through_parser() {
        let ctx = Context::new();
        let pos = Position::start(&ctx);
        for m in pos.gen_moves(&ctx) {
            let san = to_san(&ctx, &pos, m);
            let parsed = from_san(&ctx, &pos, &san).unwrap();
            assert!(parsed.is_same_action(m));
        }
    }

    #[test]
    fn castling_san() {
        let ctx = Context::new();
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let pos = Position::from_fen(&ctx, fen).unwrap().position;
        let m = pos
            .gen_moves(&ctx)
            .into_iter()
            .find(|m| m.has_flag(flags::CASTLE_KS))
            .unwrap();
        assert_eq!(to_san(&ctx, &pos, m), "O-O");
    }
}
