//! Property-based tests backing the universal hash/make-unmake and
//! bitstream invariants with generated inputs rather than only fixed
//! scenarios.

use proptest::prelude::*;

use chesscore::bitstream::Bitstream;
use chesscore::blob::Blob;
use chesscore::position::{Context, Position};

/// Property 1 & 2: for every position reached by a random walk of legal
/// moves, the incrementally-maintained hash agrees with a full
/// recomputation, and unmaking the last move restores the exact FEN and
/// hash from before it was made.
fn walk_and_check(ctx: &Context, move_choices: &[u8]) {
    let mut pos = Position::start(ctx);
    let mut stack = Vec::new();

    for &choice in move_choices {
        let moves = pos.gen_moves(ctx);
        if moves.is_empty() {
            break;
        }
        let mv = moves[choice as usize % moves.len()];
        let fen_before = pos.to_fen();
        let hash_before = pos.hash();

        let info = pos.make_move(ctx, mv);
        assert_eq!(pos.hash(), pos.compute_hash(ctx), "incremental hash diverged from full recompute");

        stack.push((mv, info, fen_before, hash_before));
    }

    while let Some((mv, info, fen_before, hash_before)) = stack.pop() {
        pos.unmake_move(mv, info);
        assert_eq!(pos.to_fen(), fen_before, "unmake did not restore the prior FEN");
        assert_eq!(pos.hash(), hash_before, "unmake did not restore the prior hash");
        assert_eq!(pos.hash(), pos.compute_hash(ctx), "unmade position's hash diverged from full recompute");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn make_unmake_is_exact_inverse(choices in prop::collection::vec(any::<u8>(), 1..24)) {
        let ctx = Context::new();
        walk_and_check(&ctx, &choices);
    }

    #[test]
    fn bitstream_roundtrips_arbitrary_write_sequences(
        writes in prop::collection::vec((any::<u32>(), 1u32..=32u32), 1..32)
    ) {
        let mut blob = Blob::new_owned();
        {
            let mut writer = Bitstream::new(&mut blob);
            for &(value, bits) in &writes {
                writer.write_bits(value, bits).unwrap();
            }
        }
        let mut reader = Bitstream::new(&mut blob);
        reader.reset();
        for &(value, bits) in &writes {
            let got = reader.read_bits(bits).unwrap();
            let expected = if bits == 32 { value } else { value & ((1u32 << bits) - 1) };
            prop_assert_eq!(got, expected);
        }
    }
}
