use criterion::{criterion_group, criterion_main, Criterion};

use chesscore::square::Square;
use chesscore::tables::Tables;

fn bench_table_init(c: &mut Criterion) {
    c.bench_function("tables new (magic generation)", |b| {
        b.iter(Tables::new);
    });
}

fn bench_sliding_lookup(c: &mut Criterion) {
    let tables = Tables::new();
    let sq = Square::from_algebraic("d4").unwrap();
    c.bench_function("rook_attacks lookup", |b| {
        b.iter(|| tables.rook_attacks(0x1000_0000_0010, sq));
    });
}

criterion_group!(benches, bench_table_init, bench_sliding_lookup);
criterion_main!(benches);
