use criterion::{criterion_group, criterion_main, Criterion};

use chesscore::perft::perft;
use chesscore::position::{Context, Position};

fn bench_perft(c: &mut Criterion) {
    let ctx = Context::new();
    let pos = Position::start(&ctx);
    c.bench_function("perft start depth 4", |b| {
        b.iter(|| perft(&ctx, &pos, 4));
    });
}

criterion_group!(benches, bench_perft);
criterion_main!(benches);
