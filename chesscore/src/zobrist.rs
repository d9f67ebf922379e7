//! Zobrist hash key tables.
//!
//! Keys are drawn once, at [`Tables::new`] time, from a fixed-seed
//! [`crate::prng::Isaac64`] stream so that two `Tables` built in the same
//! process (or two separate processes running the same binary) always agree
//! on the same hash for the same position — callers that persist a position
//! hash (the opening-tree classifier, for instance) depend on that
//! stability.

use crate::piece::{Piece, PieceType, Player};
use crate::prng::Isaac64;
use crate::square::Square;

/// Seed for the Zobrist key stream. Arbitrary but fixed: changing it changes
/// every hash value a running binary will ever produce, so it's pinned here
/// rather than derived from the wall clock.
const ZOBRIST_SEED: u64 = 0x5A67_5269_7374_4B59;

/// One Zobrist key per (piece, square), plus side-to-move, castling-right
/// bits, and en-passant file.
pub struct ZobristKeys {
    piece_square: [[[u64; 64]; 7]; 2],
    side_to_move: u64,
    castle_bits: [u64; 4],
    ep_file: [u64; 8],
}

impl ZobristKeys {
    pub fn new() -> ZobristKeys {
        let mut rng = Isaac64::from_seed(ZOBRIST_SEED);
        let mut piece_square = [[[0u64; 64]; 7]; 2];
        for player in 0..2 {
            for kind in 1..7 {
                for sq in 0..64 {
                    piece_square[player][kind][sq] = rng.next_u64();
                }
            }
        }
        let side_to_move = rng.next_u64();
        let mut castle_bits = [0u64; 4];
        for key in castle_bits.iter_mut() {
            *key = rng.next_u64();
        }
        let mut ep_file = [0u64; 8];
        for key in ep_file.iter_mut() {
            *key = rng.next_u64();
        }
        ZobristKeys {
            piece_square,
            side_to_move,
            castle_bits,
            ep_file,
        }
    }

    /// Key contribution of `piece` sitting on `sq`. `piece.kind` must not be
    /// [`PieceType::None`].
    #[inline]
    pub fn piece_at(&self, piece: Piece, sq: Square) -> u64 {
        debug_assert!(piece.kind != PieceType::None);
        self.piece_square[piece.player.idx()][piece.kind as usize][sq.0 as usize]
    }

    /// Key contribution toggled whenever the side to move changes.
    #[inline]
    pub fn side_to_move(&self) -> u64 {
        self.side_to_move
    }

    /// Key contribution of a single castling-rights bit (0=WK, 1=WQ, 2=BK,
    /// 3=BQ). Composing a castling-rights hash is XOR over whichever bits
    /// are set.
    #[inline]
    pub fn castle_bit(&self, bit: u8) -> u64 {
        self.castle_bits[bit as usize]
    }

    /// Key contribution of an en-passant target on a given file.
    #[inline]
    pub fn ep_file(&self, file: u8) -> u64 {
        self.ep_file[file as usize]
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        ZobristKeys::new()
    }
}

#[allow(dead_code)]
fn _assert_player_idx_fits(p: Player) -> usize {
    p.idx()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_instances() {
        let a = ZobristKeys::new();
        let b = ZobristKeys::new();
        let p = Piece::new(Player::White, PieceType::Pawn);
        assert_eq!(a.piece_at(p, Square(12)), b.piece_at(p, Square(12)));
        assert_eq!(a.side_to_move(), b.side_to_move());
        assert_eq!(a.castle_bit(2), b.castle_bit(2));
        assert_eq!(a.ep_file(3), b.ep_file(3));
    }

    #[test]
    fn distinct_keys_for_distinct_features() {
        let z = ZobristKeys::new();
        let wp = Piece::new(Player::White, PieceType::Pawn);
        let bp = Piece::new(Player::Black, PieceType::Pawn);
        assert_ne!(z.piece_at(wp, Square(12)), z.piece_at(bp, Square(12)));
        assert_ne!(z.piece_at(wp, Square(12)), z.piece_at(wp, Square(13)));
    }
}
