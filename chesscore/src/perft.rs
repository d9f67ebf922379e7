//! Perft (performance test): counts leaves of the legal-move tree to a
//! given depth. Used both as a correctness oracle (known positions have
//! known counts) and as the basis for `benches/perft_bench.rs`.

use crate::position::{Context, Position};

/// Counts leaf nodes of the legal-move tree rooted at `pos`, `depth` plies
/// deep. `perft(pos, 0) == 1` by convention (the empty continuation).
pub fn perft(ctx: &Context, pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = pos.gen_moves(ctx);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0u64;
    for m in moves {
        let mut child = pos.clone();
        child.make_move(ctx, m);
        nodes += perft(ctx, &child, depth - 1);
    }
    nodes
}

/// Per-move leaf counts at `depth`, i.e. `perft(depth - 1)` from each child
/// position — useful when diagnosing a perft mismatch move-by-move ("perft
/// divide").
pub fn perft_divide(ctx: &Context, pos: &Position, depth: u32) -> Vec<(crate::mv::Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    pos.gen_moves(ctx)
        .into_iter()
        .map(|m| {
            let mut child = pos.clone();
            child.make_move(ctx, m);
            (m, perft(ctx, &child, depth - 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perft_depth_zero_is_one() {
        let ctx = Context::new();
        let pos = Position::start(&ctx);
        assert_eq!(perft(&ctx, &pos, 0), 1);
    }

    #[test]
    fn perft_start_depth_one_is_twenty() {
        let ctx = Context::new();
        let pos = Position::start(&ctx);
        assert_eq!(perft(&ctx, &pos, 1), 20);
    }

    #[test]
    fn perft_start_depth_two_is_four_hundred() {
        let ctx = Context::new();
        let pos = Position::start(&ctx);
        assert_eq!(perft(&ctx, &pos, 2), 400);
    }

    // Deeper perft values (depth 4/5 against the full standard suite) are
    // exercised in tests/perft.rs, where they're not on the critical path
    // of every `cargo test` invocation.
}
