use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ssbench::dims::Dimensions;
use ssbench::families;
use ssbench::queryset::unravel_index;

// Materializing query text dominates producer-side cost, so benchmark the
// unranking plus template fill for a mid-sized family.
fn materialize_family(dims: &Dimensions, name: &str) -> usize {
    let qs = families::flat(name, dims).unwrap();
    let mut total = 0usize;
    for n in 0..qs.size() {
        total += qs.query_at(n).len();
    }
    total
}

fn bench_query_gen(c: &mut Criterion) {
    let dims = Dimensions::new();
    c.bench_function("materialize_4.3", |b| {
        b.iter(|| black_box(materialize_family(&dims, "4.3")))
    });
    c.bench_function("unravel_1e5", |b| {
        let lens = [40usize, 10, 250];
        b.iter(|| {
            let mut acc = 0usize;
            for n in 0..100_000 {
                acc += unravel_index(black_box(n), &lens)[0];
            }
            acc
        })
    });
}

criterion_group!(benches, bench_query_gen);
criterion_main!(benches);
