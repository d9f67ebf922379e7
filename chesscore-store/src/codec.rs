//! The bit-packed move/annotation codec: a [`Game`]'s
//! mainline and variations serialised depth-first into a [`Bitstream`],
//! with a parallel byte-aligned annotations [`Blob`] indexed by the same
//! per-move traversal order.
//!
//! Each move is a variable-width tag selecting its category, a 6-bit
//! destination square, and — only when the position being replayed makes
//! it ambiguous — just enough bits to pick the right source square out of
//! the legal candidates for that category and destination. The decoder
//! walks the identical grammar by replaying moves through the same move
//! generator the encoder consulted, so it never needs to store more than
//! the minimum disambiguation the position actually requires.

use chesscore::blob::Blob;
use chesscore::bitstream::Bitstream;
use chesscore::game::Game;
use chesscore::mv::{flags, Move};
use chesscore::piece::{PieceType, Player};
use chesscore::position::{Context, Position};
use chesscore::square::{Rank, Square};

use crate::error::{Result, StoreError};

const TAG_END: u32 = 0;
const TAG_VARSTART: u32 = 1;
const TAG_VAREND: u32 = 2;
const TAG_NULL: u32 = 3;
const TAG_PAWN_MOVE: u32 = 4;
const TAG_PAWN_CAPTURE: u32 = 5;
const TAG_PIECE_MOVE: u32 = 6;
const TAG_PIECE_CAPTURE: u32 = 7;
const TAG_CASTLE_KS: u32 = 8;
const TAG_CASTLE_QS: u32 = 9;

const TAG_BITS: u32 = 4;
const KIND_BITS: u32 = 3;
const SQUARE_BITS: u32 = 6;
const PROMO_BITS: u32 = 2;

fn promo_code(kind: PieceType) -> u32 {
    match kind {
        PieceType::Knight => 0,
        PieceType::Bishop => 1,
        PieceType::Rook => 2,
        PieceType::Queen => 3,
        _ => unreachable!("only minor/major pieces are promotion targets"),
    }
}

fn promo_from_code(code: u32) -> PieceType {
    match code {
        0 => PieceType::Knight,
        1 => PieceType::Bishop,
        2 => PieceType::Rook,
        _ => PieceType::Queen,
    }
}

fn is_promotion_rank(side_to_move: Player, to: Square) -> bool {
    match side_to_move {
        Player::White => to.rank() == Rank::R8,
        Player::Black => to.rank() == Rank::R1,
    }
}

/// Bits needed to index `n` candidates: `0` when disambiguation isn't
/// needed at all (`n <= 1`), else `ceil(log2(n))`.
fn bits_for_count(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        32 - (n as u32 - 1).leading_zeros()
    }
}

/// Every legal move in `pos` that belongs to the same wire category as the
/// move being encoded/decoded: same moving-piece kind, same capture-ness,
/// same destination, and (for promotions) the same promoted-to piece.
/// Sorted by source square so encoder and decoder agree on indices.
fn candidates(
    ctx: &Context,
    pos: &Position,
    moving: PieceType,
    is_capture: bool,
    to: Square,
    promo: Option<PieceType>,
) -> Vec<Move> {
    let mut v: Vec<Move> = pos
        .gen_moves(ctx)
        .into_iter()
        .filter(|c| {
            !c.is_castle()
                && c.moving_piece() == moving
                && c.is_capture() == is_capture
                && c.to() == to
                && match promo {
                    Some(p) => c.is_promotion() && c.promotion_piece() == p,
                    None => !c.is_promotion(),
                }
        })
        .collect();
    v.sort_by_key(|c| c.from().0);
    v
}

fn encode_move(writer: &mut Bitstream, pos: &Position, m: Move, ctx: &Context) -> Result<()> {
    if m.has_flag(flags::CASTLE_KS) {
        writer.write_bits(TAG_CASTLE_KS, TAG_BITS)?;
        return Ok(());
    }
    if m.has_flag(flags::CASTLE_QS) {
        writer.write_bits(TAG_CASTLE_QS, TAG_BITS)?;
        return Ok(());
    }
    if m.is_null() {
        writer.write_bits(TAG_NULL, TAG_BITS)?;
        return Ok(());
    }

    let moving = m.moving_piece();
    let is_capture = m.is_capture();
    let is_pawn = moving == PieceType::Pawn;
    let tag = match (is_pawn, is_capture) {
        (true, false) => TAG_PAWN_MOVE,
        (true, true) => TAG_PAWN_CAPTURE,
        (false, false) => TAG_PIECE_MOVE,
        (false, true) => TAG_PIECE_CAPTURE,
    };
    writer.write_bits(tag, TAG_BITS)?;
    if !is_pawn {
        writer.write_bits(moving as u32, KIND_BITS)?;
    }
    writer.write_bits(m.to().0 as u32, SQUARE_BITS)?;

    let promo = if is_pawn && is_promotion_rank(pos.side_to_move(), m.to()) {
        writer.write_bits(promo_code(m.promotion_piece()), PROMO_BITS)?;
        Some(m.promotion_piece())
    } else {
        None
    };

    let cands = candidates(ctx, pos, moving, is_capture, m.to(), promo);
    let bits = bits_for_count(cands.len());
    if bits > 0 {
        let idx = cands
            .iter()
            .position(|c| c.from() == m.from())
            .ok_or_else(|| StoreError::invalid("move not found among its own legal candidates"))?;
        writer.write_bits(idx as u32, bits)?;
    }
    Ok(())
}

fn decode_move(tag: u32, reader: &mut Bitstream, pos: &Position, ctx: &Context) -> Result<Move> {
    match tag {
        TAG_CASTLE_KS | TAG_CASTLE_QS => {
            let flag = if tag == TAG_CASTLE_KS { flags::CASTLE_KS } else { flags::CASTLE_QS };
            pos.gen_moves(ctx)
                .into_iter()
                .find(|m| m.has_flag(flag))
                .ok_or_else(|| StoreError::parse("no legal castle move matches the encoded tag"))
        }
        TAG_NULL => Ok(Move::NULL),
        TAG_PAWN_MOVE | TAG_PAWN_CAPTURE | TAG_PIECE_MOVE | TAG_PIECE_CAPTURE => {
            let is_pawn = tag == TAG_PAWN_MOVE || tag == TAG_PAWN_CAPTURE;
            let is_capture = tag == TAG_PAWN_CAPTURE || tag == TAG_PIECE_CAPTURE;
            let moving = if is_pawn {
                PieceType::Pawn
            } else {
                PieceType::from_u8(reader.read_bits(KIND_BITS)? as u8)
            };
            let to = Square(reader.read_bits(SQUARE_BITS)? as u8);
            let promo = if is_pawn && is_promotion_rank(pos.side_to_move(), to) {
                Some(promo_from_code(reader.read_bits(PROMO_BITS)?))
            } else {
                None
            };
            let cands = candidates(ctx, pos, moving, is_capture, to, promo);
            if cands.is_empty() {
                return Err(StoreError::parse("encoded move matches no legal candidate"));
            }
            let bits = bits_for_count(cands.len());
            let idx = if bits > 0 { reader.read_bits(bits)? as usize } else { 0 };
            cands
                .get(idx)
                .copied()
                .ok_or_else(|| StoreError::parse("disambiguation index out of range"))
        }
        other => Err(StoreError::parse(format!("unknown move tag {other}"))),
    }
}

fn encode_annotation(ann: &mut Blob<'static>, game: &Game, node: usize) -> Result<()> {
    let mut bitmap: u64 = 0;
    for &nag in game.nags(node) {
        if (1..=64).contains(&nag) {
            bitmap |= 1u64 << (nag - 1);
        }
    }
    ann.append(&bitmap.to_le_bytes())?;
    write_text(ann, game.pre_text(node).unwrap_or(""))?;
    write_text(ann, game.post_text(node).unwrap_or(""))?;
    Ok(())
}

fn write_text(ann: &mut Blob<'static>, text: &str) -> Result<()> {
    let bytes = text.as_bytes();
    ann.append(&(bytes.len() as u16).to_le_bytes())?;
    ann.append(bytes)?;
    Ok(())
}

/// A plain byte-offset cursor over the annotations blob — unlike the move
/// stream, annotations are byte-aligned, so a bit-level `Bitstream` isn't
/// needed here.
struct AnnReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> AnnReader<'a> {
    fn new(bytes: &'a [u8]) -> AnnReader<'a> {
        AnnReader { bytes, pos: 0 }
    }

    fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn read_text(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| StoreError::parse("annotation text is not valid utf8"))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(StoreError::parse("annotation stream ended early"));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

fn decode_annotation(reader: &mut AnnReader, game: &mut Game, node: usize) -> Result<()> {
    let bitmap = reader.read_u64()?;
    for bit in 0..64u8 {
        if bitmap & (1u64 << bit) != 0 {
            game.add_nag(node, bit + 1);
        }
    }
    let pre = reader.read_text()?;
    if !pre.is_empty() {
        game.set_pre_text(node, pre);
    }
    let post = reader.read_text()?;
    if !post.is_empty() {
        game.set_post_text(node, post);
    }
    Ok(())
}

/// Encodes `game`'s whole move tree (mainline, variations, NAGs, and
/// pre/post annotation text) into a `(moves_blob, annotations_blob)` pair.
pub fn encode_game(ctx: &Context, game: &Game) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut moves_blob = Blob::new_owned();
    let mut ann_blob = Blob::new_owned();
    {
        let mut writer = Bitstream::new(&mut moves_blob);
        encode_list(&mut writer, &mut ann_blob, game, game.root_moves(), game.start_position().clone(), ctx)?;
        writer.write_bits(TAG_END, TAG_BITS)?;
    }
    Ok((moves_blob.as_bytes().to_vec(), ann_blob.as_bytes().to_vec()))
}

fn encode_list(
    writer: &mut Bitstream,
    ann: &mut Blob<'static>,
    game: &Game,
    list: &[usize],
    pos: Position,
    ctx: &Context,
) -> Result<()> {
    let Some((&main, alts)) = list.split_first() else {
        return Ok(());
    };
    let before = pos.clone();
    let m = game.move_at(main);
    encode_move(writer, &before, m, ctx)?;
    encode_annotation(ann, game, main)?;

    let mut after = before.clone();
    after.make_move(ctx, m);

    for &alt in alts {
        writer.write_bits(TAG_VARSTART, TAG_BITS)?;
        encode_list(writer, ann, game, std::slice::from_ref(&alt), before.clone(), ctx)?;
        writer.write_bits(TAG_VAREND, TAG_BITS)?;
    }

    encode_list(writer, ann, game, game.children(main), after, ctx)
}

/// Decodes a `(moves_blob, annotations_blob)` pair produced by
/// [`encode_game`] back into a [`Game`] rooted at `start_pos`.
pub fn decode_game(ctx: &Context, start_pos: Position, moves_blob: &[u8], annotations_blob: &[u8]) -> Result<Game> {
    let mut moves_storage = Blob::wrap_borrowed(moves_blob);
    let mut reader = Bitstream::new(&mut moves_storage);
    let mut ann_reader = AnnReader::new(annotations_blob);

    let mut game = Game::new(start_pos.clone());

    struct Frame {
        resume_pos: Position,
        outer_last_before: Position,
    }

    let mut stack: Vec<Frame> = Vec::new();
    let mut cur_pos = start_pos.clone();
    let mut last_before = start_pos;

    loop {
        let tag = reader.read_bits(TAG_BITS)?;
        match tag {
            TAG_END => {
                if stack.is_empty() {
                    break;
                }
                return Err(StoreError::parse("unexpected END inside an open variation"));
            }
            TAG_VARSTART => {
                stack.push(Frame {
                    resume_pos: cur_pos.clone(),
                    outer_last_before: last_before.clone(),
                });
                game.start_variation();
                cur_pos = last_before.clone();
            }
            TAG_VAREND => {
                let frame = stack.pop().ok_or_else(|| StoreError::parse("VAREND without matching VARSTART"))?;
                game.end_variation();
                cur_pos = frame.resume_pos;
                last_before = frame.outer_last_before;
            }
            _ => {
                last_before = cur_pos.clone();
                let m = decode_move(tag, &mut reader, &cur_pos, ctx)?;
                cur_pos.make_move(ctx, m);
                let node = game.make_move(m);
                decode_annotation(&mut ann_reader, &mut game, node)?;
            }
        }
    }

    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chesscore::piece::PieceType;

    fn mv(ctx: &Context, pos: &Position, san: &str) -> Move {
        chesscore::san::from_san(ctx, pos, san).unwrap()
    }

    #[test]
    fn round_trips_a_simple_mainline() {
        let ctx = Context::new();
        let start = Position::start(&ctx);
        let mut game = Game::new(start.clone());
        let mut pos = start.clone();

        for san in ["e4", "e5", "Nf3", "Nc6", "Bb5"] {
            let m = mv(&ctx, &pos, san);
            game.make_move(m);
            pos.make_move(&ctx, m);
        }

        let (moves, ann) = encode_game(&ctx, &game).unwrap();
        let decoded = decode_game(&ctx, start, &moves, &ann).unwrap();
        assert_eq!(decoded.canonical_dump(), game.canonical_dump());
    }

    #[test]
    fn round_trips_variations_and_annotations() {
        let ctx = Context::new();
        let start = Position::start(&ctx);
        let mut game = Game::new(start.clone());

        let e4 = mv(&ctx, &start, "e4");
        let n1 = game.make_move(e4);
        game.set_pre_text(n1, "The king's pawn.");
        game.add_nag(n1, 1);

        let mut after_e4 = start.clone();
        after_e4.make_move(&ctx, e4);
        let e5 = mv(&ctx, &after_e4, "e5");
        let n2 = game.make_move(e5);
        game.set_post_text(n2, "Symmetric reply.");

        game.start_variation();
        let c5 = mv(&ctx, &after_e4, "c5");
        game.make_move(c5);
        game.end_variation();

        let (moves, ann) = encode_game(&ctx, &game).unwrap();
        let decoded = decode_game(&ctx, start, &moves, &ann).unwrap();
        assert_eq!(decoded.canonical_dump(), game.canonical_dump());

        let decoded_n1 = decoded.root_moves()[0];
        assert_eq!(decoded.pre_text(decoded_n1), Some("The king's pawn."));
        assert_eq!(decoded.nags(decoded_n1), &[1]);
        let decoded_n2 = decoded.children(decoded_n1)[0];
        assert_eq!(decoded.post_text(decoded_n2), Some("Symmetric reply."));
    }

    #[test]
    fn round_trips_a_promotion() {
        let ctx = Context::new();
        let fen = "8/P7/8/8/4k3/8/8/4K3 w - - 0 1";
        let start = Position::from_fen(&ctx, fen).unwrap().position;
        let mut game = Game::new(start.clone());
        let promo = Move::new(
            Square::from_algebraic("a7").unwrap(),
            Square::from_algebraic("a8").unwrap(),
            PieceType::Pawn,
            PieceType::Queen,
            flags::PROMOTION,
        );
        game.make_move(promo);

        let (moves, ann) = encode_game(&ctx, &game).unwrap();
        let decoded = decode_game(&ctx, start, &moves, &ann).unwrap();
        assert_eq!(decoded.canonical_dump(), game.canonical_dump());
    }
}
