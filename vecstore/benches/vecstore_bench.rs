use criterion::{Criterion, black_box, criterion_group, criterion_main};
use faceid_vecstore::{FlatIndex, HNSW, HNSWConfig, VecIndex};

fn random_unit_vec(dim: usize, seed: u64) -> Vec<f32> {
    let mut v = Vec::with_capacity(dim);
    let mut state = seed;
    for _ in 0..dim {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        v.push(((state >> 33) as f32) / (u32::MAX as f32) - 0.5);
    }
    let norm: f64 = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let s = (1.0 / norm) as f32;
        for x in &mut v {
            *x *= s;
        }
    }
    v
}

fn fill(idx: &mut dyn VecIndex, n: usize) {
    let dim = idx.dim();
    for i in 0..n {
        idx.append(&random_unit_vec(dim, i as u64 + 1)).unwrap();
    }
}

fn bench_flat_search(c: &mut Criterion) {
    let mut idx = FlatIndex::new(128);
    fill(&mut idx, 5000);
    let query = random_unit_vec(128, 999_999);

    c.bench_function("flat_search_128d_5000_top5", |b| {
        b.iter(|| {
            let _ = black_box(idx.search(black_box(&query), 5));
        });
    });
}

fn bench_hnsw_search(c: &mut Criterion) {
    let mut idx = HNSW::new(HNSWConfig {
        dim: 128,
        m: 16,
        ef_construction: 100,
        ef_search: 50,
        seed: Some(1),
    });
    fill(&mut idx, 5000);
    let query = random_unit_vec(128, 999_999);

    c.bench_function("hnsw_search_128d_5000_top5", |b| {
        b.iter(|| {
            let _ = black_box(idx.search(black_box(&query), 5));
        });
    });
}

fn bench_hnsw_append(c: &mut Criterion) {
    c.bench_function("hnsw_append_128d_1000", |b| {
        b.iter_with_setup(
            || {
                HNSW::new(HNSWConfig {
                    dim: 128,
                    m: 16,
                    ef_construction: 100,
                    ef_search: 50,
                    seed: Some(1),
                })
            },
            |mut idx| {
                fill(&mut idx, 1000);
                black_box(idx.len())
            },
        );
    });
}

criterion_group!(benches, bench_flat_search, bench_hnsw_search, bench_hnsw_append);
criterion_main!(benches);
