//! Position representation, FEN parsing, move generation, and make/unmake.

use std::fmt;

use crate::error::{ChessError, Result};
use crate::mv::{flags, Move};
use crate::piece::{Piece, PieceType, Player};
use crate::square::{File, Rank, Square};
use crate::tables::Tables;
use crate::zobrist::ZobristKeys;

/// Bundles the process-wide immutable tables move generation and hashing
/// need, kept as an explicit value threaded by the caller rather than a
/// global — cheap to build once at startup, trivial to rebuild fresh in a
/// test.
pub struct Context {
    pub tables: Tables,
    pub zobrist: ZobristKeys,
}

impl Context {
    pub fn new() -> Context {
        Context {
            tables: Tables::new(),
            zobrist: ZobristKeys::new(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

pub mod castle {
    pub const WK: u8 = 1 << 0;
    pub const WQ: u8 = 1 << 1;
    pub const BK: u8 = 1 << 2;
    pub const BQ: u8 = 1 << 3;
    pub const ALL: u8 = WK | WQ | BK | BQ;
}

/// Snapshot of everything `make_move` mutates destructively, needed to
/// restore bit-exact equality (including the Zobrist hash) on `unmake_move`.
#[derive(Copy, Clone)]
pub struct UnmakeInfo {
    captured: PieceType,
    captured_square: Square,
    castling_rights: u8,
    ep_square: Square,
    halfmove_clock: u16,
    hash: u64,
}

/// Outcome of parsing a FEN string: the position parsed, but it may still
/// violate invariants (two kings, pawns on the back rank, etc).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FenStatus {
    Legal,
    IllegalButParsed,
}

#[derive(Clone)]
pub struct Position {
    board: [Piece; 64],
    piece_bb: [[u64; 7]; 2],
    occupied_co: [u64; 2],
    side_to_move: Player,
    castling_rights: u8,
    ep_square: Square,
    halfmove_clock: u16,
    fullmove_number: u16,
    hash: u64,
}

const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    fn empty() -> Position {
        Position {
            board: [Piece::EMPTY; 64],
            piece_bb: [[0u64; 7]; 2],
            occupied_co: [0u64; 2],
            side_to_move: Player::White,
            castling_rights: 0,
            ep_square: Square::NONE,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        }
    }

    pub fn start(ctx: &Context) -> Position {
        Position::from_fen(ctx, STARTING_FEN)
            .expect("starting FEN is always well-formed")
            .position
    }

    #[inline]
    pub fn side_to_move(&self) -> Player {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> u8 {
        self.castling_rights
    }

    #[inline]
    pub fn ep_square(&self) -> Square {
        self.ep_square
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Piece {
        self.board[sq.0 as usize]
    }

    #[inline]
    pub fn occupied(&self) -> u64 {
        self.occupied_co[0] | self.occupied_co[1]
    }

    #[inline]
    pub fn occupied_by(&self, player: Player) -> u64 {
        self.occupied_co[player.idx()]
    }

    #[inline]
    pub fn pieces(&self, player: Player, kind: PieceType) -> u64 {
        self.piece_bb[player.idx()][kind as usize]
    }

    pub fn king_square(&self, player: Player) -> Square {
        let bb = self.pieces(player, PieceType::King);
        debug_assert_ne!(bb, 0, "every legal position has exactly one king per side");
        Square(bb.trailing_zeros() as u8)
    }

    fn put_piece(&mut self, sq: Square, piece: Piece) {
        debug_assert!(self.board[sq.0 as usize].is_none());
        self.board[sq.0 as usize] = piece;
        self.piece_bb[piece.player.idx()][piece.kind as usize] |= sq.to_bb();
        self.occupied_co[piece.player.idx()] |= sq.to_bb();
    }

    fn remove_piece(&mut self, sq: Square) -> Piece {
        let piece = self.board[sq.0 as usize];
        debug_assert!(!piece.is_none());
        self.board[sq.0 as usize] = Piece::EMPTY;
        self.piece_bb[piece.player.idx()][piece.kind as usize] &= !sq.to_bb();
        self.occupied_co[piece.player.idx()] &= !sq.to_bb();
        piece
    }

    /// Every square attacked by `player`'s pieces, given `occ` as the board
    /// occupancy (passed explicitly so callers can probe hypothetical
    /// occupancies, e.g. while validating castling).
    pub fn attackers_to(&self, ctx: &Context, sq: Square, occ: u64) -> u64 {
        let t = &ctx.tables;
        let mut attackers = 0u64;
        attackers |= t.pawn_attacks(Player::White, sq) & self.pieces(Player::Black, PieceType::Pawn);
        attackers |= t.pawn_attacks(Player::Black, sq) & self.pieces(Player::White, PieceType::Pawn);
        attackers |= t.knight_attacks(sq) & (self.pieces(Player::White, PieceType::Knight) | self.pieces(Player::Black, PieceType::Knight));
        attackers |= t.king_attacks(sq) & (self.pieces(Player::White, PieceType::King) | self.pieces(Player::Black, PieceType::King));
        let bishops_queens = self.pieces(Player::White, PieceType::Bishop)
            | self.pieces(Player::Black, PieceType::Bishop)
            | self.pieces(Player::White, PieceType::Queen)
            | self.pieces(Player::Black, PieceType::Queen);
        attackers |= t.bishop_attacks(occ, sq) & bishops_queens;
        let rooks_queens = self.pieces(Player::White, PieceType::Rook)
            | self.pieces(Player::Black, PieceType::Rook)
            | self.pieces(Player::White, PieceType::Queen)
            | self.pieces(Player::Black, PieceType::Queen);
        attackers |= t.rook_attacks(occ, sq) & rooks_queens;
        attackers
    }

    pub fn attacked_by(&self, ctx: &Context, sq: Square, by: Player) -> bool {
        self.attackers_to(ctx, sq, self.occupied()) & self.occupied_by(by) != 0
    }

    pub fn in_check(&self, ctx: &Context, player: Player) -> bool {
        self.attacked_by(ctx, self.king_square(player), player.other())
    }

    /// Full (non-incremental) Zobrist hash recompute, used to validate the
    /// incremental value maintained through make/unmake.
    pub fn compute_hash(&self, ctx: &Context) -> u64 {
        let z = &ctx.zobrist;
        let mut hash = 0u64;
        for sq in 0..64u8 {
            let piece = self.board[sq as usize];
            if !piece.is_none() {
                hash ^= z.piece_at(piece, Square(sq));
            }
        }
        if self.side_to_move == Player::Black {
            hash ^= z.side_to_move();
        }
        for bit in 0..4u8 {
            if self.castling_rights & (1 << bit) != 0 {
                hash ^= z.castle_bit(bit);
            }
        }
        if self.ep_square.is_valid() && self.ep_capture_exists(ctx) {
            hash ^= z.ep_file(self.ep_square.file() as u8);
        }
        hash
    }

    /// Whether a pseudo-legal en-passant capture actually exists in the
    /// current position — the hash only includes the ep-file key when one
    /// does.
    fn ep_capture_exists(&self, ctx: &Context) -> bool {
        if !self.ep_square.is_valid() {
            return false;
        }
        let attackers = ctx.tables.pawn_attacks(self.side_to_move.other(), self.ep_square)
            & self.pieces(self.side_to_move, PieceType::Pawn);
        attackers != 0
    }

    // ---- FEN ----

    pub fn from_fen(ctx: &Context, fen: &str) -> Result<FenResult> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            log::debug!("rejecting FEN with {} field(s): '{fen}'", parts.len());
            return Err(ChessError::parse("FEN must have at least 4 fields"));
        }
        let mut pos = Position::empty();

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::parse("FEN board must have 8 ranks"));
        }
        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(empty) = c.to_digit(10) {
                    file += empty as u8;
                } else {
                    if file >= 8 {
                        return Err(ChessError::parse("FEN rank overflows 8 files"));
                    }
                    let piece = Piece::from_char(c)
                        .ok_or_else(|| ChessError::parse(format!("bad FEN piece char '{c}'")))?;
                    pos.put_piece(Square::make(File::ALL[file as usize], Rank::ALL[rank as usize]), piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(ChessError::parse("FEN rank does not sum to 8 files"));
            }
        }

        pos.side_to_move = match parts[1] {
            "w" => Player::White,
            "b" => Player::Black,
            other => return Err(ChessError::parse(format!("bad side-to-move field '{other}'"))),
        };

        if parts[2] != "-" {
            for c in parts[2].chars() {
                match c {
                    'K' => pos.castling_rights |= castle::WK,
                    'Q' => pos.castling_rights |= castle::WQ,
                    'k' => pos.castling_rights |= castle::BK,
                    'q' => pos.castling_rights |= castle::BQ,
                    other => return Err(ChessError::parse(format!("bad castling char '{other}'"))),
                }
            }
        }

        if parts[3] != "-" {
            pos.ep_square = Square::from_algebraic(parts[3])
                .ok_or_else(|| ChessError::parse(format!("bad en-passant field '{}'", parts[3])))?;
        }

        pos.halfmove_clock = parts.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
        pos.fullmove_number = parts.get(5).and_then(|s| s.parse().ok()).unwrap_or(1);

        pos.hash = pos.compute_hash(ctx);

        let status = if pos.violates_invariants() {
            log::warn!("FEN '{fen}' parsed but violates position invariants");
            FenStatus::IllegalButParsed
        } else {
            FenStatus::Legal
        };

        log::trace!("parsed FEN '{fen}' -> status={status:?}");
        Ok(FenResult { position: pos, status })
    }

    fn violates_invariants(&self) -> bool {
        if self.pieces(Player::White, PieceType::King).count_ones() != 1 {
            return true;
        }
        if self.pieces(Player::Black, PieceType::King).count_ones() != 1 {
            return true;
        }
        let back_ranks = Rank::R1.bb() | Rank::R8.bb();
        if (self.pieces(Player::White, PieceType::Pawn) | self.pieces(Player::Black, PieceType::Pawn)) & back_ranks != 0 {
            return true;
        }
        false
    }

    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        for rank_from_top in 0..8u8 {
            let rank = 7 - rank_from_top;
            let mut empty = 0u8;
            for file in 0..8u8 {
                let sq = Square::make(File::ALL[file as usize], Rank::ALL[rank as usize]);
                let piece = self.board[sq.0 as usize];
                if piece.is_none() {
                    empty += 1;
                } else {
                    if empty > 0 {
                        s.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    s.push(piece.to_char());
                }
            }
            if empty > 0 {
                s.push((b'0' + empty) as char);
            }
            if rank_from_top != 7 {
                s.push('/');
            }
        }
        s.push(' ');
        s.push(match self.side_to_move {
            Player::White => 'w',
            Player::Black => 'b',
        });
        s.push(' ');
        if self.castling_rights == 0 {
            s.push('-');
        } else {
            if self.castling_rights & castle::WK != 0 {
                s.push('K');
            }
            if self.castling_rights & castle::WQ != 0 {
                s.push('Q');
            }
            if self.castling_rights & castle::BK != 0 {
                s.push('k');
            }
            if self.castling_rights & castle::BQ != 0 {
                s.push('q');
            }
        }
        s.push(' ');
        if self.ep_square.is_valid() {
            s.push_str(&self.ep_square.to_string());
        } else {
            s.push('-');
        }
        s.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        s
    }

    // ---- make / unmake ----

    /// Applies `m`, which must be pseudo-legal in the current position, and
    /// returns the bookkeeping needed to reverse it exactly.
    pub fn make_move(&mut self, ctx: &Context, m: Move) -> UnmakeInfo {
        log::trace!("make_move {m:?} side_to_move={:?}", self.side_to_move);
        let z = &ctx.zobrist;
        let us = self.side_to_move;
        let them = us.other();
        let from = m.from();
        let to = m.to();
        let moving = self.board[from.0 as usize].kind;

        let info = UnmakeInfo {
            captured: PieceType::None,
            captured_square: to,
            castling_rights: self.castling_rights,
            ep_square: self.ep_square,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
        };
        let mut info = info;

        let mut hash = self.hash;
        // Clear old ep-file key contribution (if it was actually live).
        if self.ep_capture_exists(ctx) {
            hash ^= z.ep_file(self.ep_square.file() as u8);
        }

        if m.has_flag(flags::EP_CAPTURE) {
            let captured_sq = Square::make(to.file(), from.rank());
            let captured = self.remove_piece(captured_sq);
            hash ^= z.piece_at(captured, captured_sq);
            info.captured = captured.kind;
            info.captured_square = captured_sq;
        } else if m.has_flag(flags::CAPTURE) {
            let captured = self.remove_piece(to);
            hash ^= z.piece_at(captured, to);
            info.captured = captured.kind;
        }

        let moved_piece = self.remove_piece(from);
        hash ^= z.piece_at(moved_piece, from);
        let final_piece = if m.is_promotion() {
            Piece::new(us, m.promotion_piece())
        } else {
            moved_piece
        };
        self.put_piece(to, final_piece);
        hash ^= z.piece_at(final_piece, to);

        if m.has_flag(flags::CASTLE_KS) || m.has_flag(flags::CASTLE_QS) {
            let rank = from.rank();
            let (rook_from, rook_to) = if m.has_flag(flags::CASTLE_KS) {
                (Square::make(File::H, rank), Square::make(File::F, rank))
            } else {
                (Square::make(File::A, rank), Square::make(File::D, rank))
            };
            let rook = self.remove_piece(rook_from);
            hash ^= z.piece_at(rook, rook_from);
            self.put_piece(rook_to, rook);
            hash ^= z.piece_at(rook, rook_to);
        }

        // Castling-rights updates: moving the king clears both of that
        // side's rights; moving/capturing a rook off its home square clears
        // that single right.
        for bit in 0..4u8 {
            if self.castling_rights & (1 << bit) != 0 {
                hash ^= z.castle_bit(bit);
            }
        }
        if moving == PieceType::King {
            self.castling_rights &= !match us {
                Player::White => castle::WK | castle::WQ,
                Player::Black => castle::BK | castle::BQ,
            };
        }
        let clear_rook_right = |rights: &mut u8, sq: Square| {
            match sq.0 {
                0 => *rights &= !castle::WQ,
                7 => *rights &= !castle::WK,
                56 => *rights &= !castle::BQ,
                63 => *rights &= !castle::BK,
                _ => {}
            }
        };
        clear_rook_right(&mut self.castling_rights, from);
        clear_rook_right(&mut self.castling_rights, to);
        for bit in 0..4u8 {
            if self.castling_rights & (1 << bit) != 0 {
                hash ^= z.castle_bit(bit);
            }
        }

        self.ep_square = if m.has_flag(flags::EP_MOVE) {
            let mid_rank = (from.rank() as u8 + to.rank() as u8) / 2;
            Square::make(to.file(), Rank::ALL[mid_rank as usize])
        } else {
            Square::NONE
        };

        self.halfmove_clock = if moving == PieceType::Pawn || m.is_capture() {
            0
        } else {
            self.halfmove_clock + 1
        };

        if us == Player::Black {
            self.fullmove_number += 1;
        }

        hash ^= z.side_to_move();
        if self.ep_capture_exists(ctx) {
            hash ^= z.ep_file(self.ep_square.file() as u8);
        }

        self.side_to_move = them;
        self.hash = hash;
        info
    }

    /// Reverses exactly the effect of the `make_move` call that produced
    /// `info`. Restores bit-exact equality with the pre-move position,
    /// including the Zobrist hash.
    pub fn unmake_move(&mut self, m: Move, info: UnmakeInfo) {
        log::trace!("unmake_move {m:?}");
        let them = self.side_to_move;
        let us = them.other();
        let from = m.from();
        let to = m.to();

        if us == Player::Black {
            self.fullmove_number -= 1;
        }

        let placed = self.remove_piece(to);
        let original = if m.is_promotion() {
            Piece::new(us, PieceType::Pawn)
        } else {
            placed
        };
        self.put_piece(from, original);

        if m.has_flag(flags::EP_CAPTURE) {
            self.put_piece(info.captured_square, Piece::new(them, info.captured));
        } else if m.has_flag(flags::CAPTURE) {
            self.put_piece(to, Piece::new(them, info.captured));
        }

        if m.has_flag(flags::CASTLE_KS) || m.has_flag(flags::CASTLE_QS) {
            let rank = from.rank();
            let (rook_from, rook_to) = if m.has_flag(flags::CASTLE_KS) {
                (Square::make(File::H, rank), Square::make(File::F, rank))
            } else {
                (Square::make(File::A, rank), Square::make(File::D, rank))
            };
            let rook = self.remove_piece(rook_to);
            self.put_piece(rook_from, rook);
        }

        self.castling_rights = info.castling_rights;
        self.ep_square = info.ep_square;
        self.halfmove_clock = info.halfmove_clock;
        self.hash = info.hash;
        self.side_to_move = us;
    }

    /// Generates every legal move: pseudo-legal generation followed by a
    /// king-safety filter (play the move on a scratch copy, discard it if
    /// the mover's own king ends up attacked). Deliberately simple over
    /// pin-precomputation — correctness-first, and it handles discovered
    /// en-passant checks for free since the filter re-evaluates the whole
    /// board after the capture actually happens.
    pub fn gen_moves(&self, ctx: &Context) -> Vec<Move> {
        let pseudo = self.gen_pseudo_legal(ctx);
        let us = self.side_to_move;
        pseudo
            .into_iter()
            .filter(|&m| {
                let mut scratch = self.clone();
                scratch.make_move(ctx, m);
                !scratch.in_check(ctx, us)
            })
            .collect()
    }

    fn gen_pseudo_legal(&self, ctx: &Context) -> Vec<Move> {
        let mut moves = Vec::new();
        let us = self.side_to_move;
        let them = us.other();
        let own = self.occupied_by(us);
        let occ = self.occupied();

        self.gen_pawn_moves(ctx, &mut moves);

        for kind in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen, PieceType::King] {
            let mut bb = self.pieces(us, kind);
            while bb != 0 {
                let from = Square(bb.trailing_zeros() as u8);
                bb &= bb - 1;
                let attacks = match kind {
                    PieceType::Knight => ctx.tables.knight_attacks(from),
                    PieceType::Bishop => ctx.tables.bishop_attacks(occ, from),
                    PieceType::Rook => ctx.tables.rook_attacks(occ, from),
                    PieceType::Queen => ctx.tables.queen_attacks(occ, from),
                    PieceType::King => ctx.tables.king_attacks(from),
                    _ => unreachable!(),
                } & !own;
                let mut targets = attacks;
                while targets != 0 {
                    let to = Square(targets.trailing_zeros() as u8);
                    targets &= targets - 1;
                    let is_capture = self.occupied_by(them) & to.to_bb() != 0;
                    let flag = if is_capture { flags::CAPTURE } else { 0 };
                    moves.push(Move::new(from, to, kind, PieceType::None, flag));
                }
            }
        }

        self.gen_castling(ctx, &mut moves);
        moves
    }

    fn gen_pawn_moves(&self, ctx: &Context, moves: &mut Vec<Move>) {
        let us = self.side_to_move;
        let them = us.other();
        let occ = self.occupied();
        let (push_dir, start_rank, promo_rank): (i8, Rank, Rank) = match us {
            Player::White => (8, Rank::R2, Rank::R8),
            Player::Black => (-8, Rank::R7, Rank::R1),
        };

        let mut pawns = self.pieces(us, PieceType::Pawn);
        while pawns != 0 {
            let from = Square(pawns.trailing_zeros() as u8);
            pawns &= pawns - 1;

            let one_step = from.0 as i16 + push_dir as i16;
            if (0..64).contains(&one_step) && occ & (1u64 << one_step) == 0 {
                let to = Square(one_step as u8);
                Position::push_pawn_move(from, to, to.rank() == promo_rank, 0, moves);

                if from.rank() == start_rank {
                    let two_step = from.0 as i16 + 2 * push_dir as i16;
                    if occ & (1u64 << two_step) == 0 {
                        moves.push(Move::new(from, Square(two_step as u8), PieceType::Pawn, PieceType::None, flags::EP_MOVE));
                    }
                }
            }

            let attacks = ctx.tables.pawn_attacks(us, from);
            let mut caps = attacks & self.occupied_by(them);
            while caps != 0 {
                let to = Square(caps.trailing_zeros() as u8);
                caps &= caps - 1;
                Position::push_pawn_move(from, to, to.rank() == promo_rank, flags::CAPTURE, moves);
            }

            if self.ep_square.is_valid() && attacks & self.ep_square.to_bb() != 0 {
                moves.push(Move::new(from, self.ep_square, PieceType::Pawn, PieceType::None, flags::EP_CAPTURE | flags::CAPTURE));
            }
        }
    }

    fn push_pawn_move(from: Square, to: Square, promotes: bool, base_flags: u16, moves: &mut Vec<Move>) {
        if promotes {
            for &promo in PieceType::PROMOTABLE.iter() {
                moves.push(Move::new(from, to, PieceType::Pawn, promo, base_flags | flags::PROMOTION));
            }
        } else {
            moves.push(Move::new(from, to, PieceType::Pawn, PieceType::None, base_flags));
        }
    }

    fn gen_castling(&self, ctx: &Context, moves: &mut Vec<Move>) {
        let us = self.side_to_move;
        let them = us.other();
        if self.in_check(ctx, us) {
            return;
        }
        let rank = match us {
            Player::White => Rank::R1,
            Player::Black => Rank::R8,
        };
        let king_from = Square::make(File::E, rank);
        if self.king_square(us) != king_from {
            return;
        }
        let (ks_right, qs_right) = match us {
            Player::White => (castle::WK, castle::WQ),
            Player::Black => (castle::BK, castle::BQ),
        };
        let occ = self.occupied();

        if self.castling_rights & ks_right != 0 {
            let f = Square::make(File::F, rank);
            let g = Square::make(File::G, rank);
            if occ & (f.to_bb() | g.to_bb()) == 0
                && !self.attacked_by(ctx, f, them)
                && !self.attacked_by(ctx, g, them)
            {
                moves.push(Move::new(king_from, g, PieceType::King, PieceType::None, flags::CASTLE_KS));
            }
        }
        if self.castling_rights & qs_right != 0 {
            let d = Square::make(File::D, rank);
            let c = Square::make(File::C, rank);
            let b = Square::make(File::B, rank);
            if occ & (d.to_bb() | c.to_bb() | b.to_bb()) == 0
                && !self.attacked_by(ctx, d, them)
                && !self.attacked_by(ctx, c, them)
            {
                moves.push(Move::new(king_from, c, PieceType::King, PieceType::None, flags::CASTLE_QS));
            }
        }
    }

    /// `true` once the half-move clock has reached 100 plies (50 full
    /// moves) without a pawn move or capture — the rule-based fifty-move
    /// draw. Search/evaluation is out of scope for this crate, but this
    /// condition is local to the position itself, not a search claim.
    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// `true` if neither side has enough material to ever deliver
    /// checkmate: K vs K, K+N vs K, or K+B vs K (bishops-only draws with
    /// more than one bishop per side, or any pawn/rook/queen on the board,
    /// are excluded — those positions can still be mating).
    pub fn insufficient_material(&self) -> bool {
        for player in [Player::White, Player::Black] {
            if self.pieces(player, PieceType::Pawn) != 0
                || self.pieces(player, PieceType::Rook) != 0
                || self.pieces(player, PieceType::Queen) != 0
            {
                return false;
            }
        }
        let minor_count = |p: Player| {
            self.pieces(p, PieceType::Knight).count_ones() + self.pieces(p, PieceType::Bishop).count_ones()
        };
        let white_minors = minor_count(Player::White);
        let black_minors = minor_count(Player::Black);
        // Any side with two-or-more minors (other than exactly two bishops
        // on opposite colors, which genuinely mates) is not insufficient;
        // keep the check conservative and only special-case the clearly
        // drawn configurations.
        match (white_minors, black_minors) {
            (0, 0) => true,
            (1, 0) | (0, 1) => true,
            _ => false,
        }
    }

    /// ASCII board dump, rank 8 at the top, files a-h left to right.
    pub fn ascii(&self) -> String {
        let mut s = String::new();
        for rank_from_top in 0..8u8 {
            let rank = 7 - rank_from_top;
            for file in 0..8u8 {
                let sq = Square::make(File::ALL[file as usize], Rank::ALL[rank as usize]);
                s.push(self.board[sq.0 as usize].to_char());
                s.push(' ');
            }
            s.push('\n');
        }
        s
    }
}

pub struct FenResult {
    pub position: Position,
    pub status: FenStatus,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ascii())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new()
    }

    #[test]
    fn starting_position_fen_roundtrips() {
        let c = ctx();
        let pos = Position::start(&c);
        assert_eq!(pos.to_fen(), STARTING_FEN);
    }

    #[test]
    fn starting_position_has_twenty_moves() {
        let c = ctx();
        let pos = Position::start(&c);
        assert_eq!(pos.gen_moves(&c).len(), 20);
    }

    #[test]
    fn make_unmake_restores_hash_and_fen() {
        let c = ctx();
        let mut pos = Position::start(&c);
        let before_fen = pos.to_fen();
        let before_hash = pos.hash();
        let m = pos.gen_moves(&c)[0];
        let info = pos.make_move(&c, m);
        assert_ne!(pos.hash(), before_hash);
        pos.unmake_move(m, info);
        assert_eq!(pos.to_fen(), before_fen);
        assert_eq!(pos.hash(), before_hash);
        assert_eq!(pos.hash(), pos.compute_hash(&c));
    }

    #[test]
    fn illegal_fen_with_no_king_is_flagged() {
        let c = ctx();
        let result = Position::from_fen(&c, "8/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(result.status, FenStatus::IllegalButParsed);
    }

    #[test]
    fn kiwipete_move_count_is_forty_eight() {
        let c = ctx();
        let result = Position::from_fen(&c, "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -").unwrap();
        assert_eq!(result.status, FenStatus::Legal);
        assert_eq!(result.position.gen_moves(&c).len(), 48);
    }

    #[test]
    fn king_vs_king_is_insufficient_material() {
        let c = ctx();
        let pos = Position::from_fen(&c, "8/8/4k3/8/8/3K4/8/8 w - - 0 1").unwrap().position;
        assert!(pos.insufficient_material());
    }

    #[test]
    fn king_and_two_bishops_vs_king_can_mate() {
        let c = ctx();
        let pos = Position::from_fen(&c, "8/8/4k3/8/2B5/3KB3/8/8 w - - 0 1").unwrap().position;
        assert!(!pos.insufficient_material());
    }

    #[test]
    fn halfmove_clock_of_hundred_is_fifty_move_draw() {
        let c = ctx();
        let fresh = Position::start(&c);
        assert!(!fresh.is_fifty_move_draw());
        let late = Position::from_fen(&c, "8/8/4k3/8/8/3K4/8/8 w - - 100 1").unwrap().position;
        assert!(late.is_fifty_move_draw());
    }

    #[test]
    fn en_passant_pin_is_excluded() {
        let c = ctx();
        let result = Position::from_fen(&c, "8/2p5/3p4/KP5r/1R2Pp1k/8/6P1/8 b - e3 0 1").unwrap();
        let moves = result.position.gen_moves(&c);
        assert!(!moves.iter().any(|m| m.from() == Square::from_algebraic("f4").unwrap()
            && m.to() == Square::from_algebraic("e3").unwrap()));
    }
}
