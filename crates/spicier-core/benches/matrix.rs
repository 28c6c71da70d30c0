//! Benchmarks for the dense Gaussian-elimination solve path.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use spicier_core::linalg::{Matrix, Vector, solve};

fn diagonally_dominant(n: usize) -> (Matrix, Vector) {
    let mut a = Matrix::zeros(n);
    let mut b = Vector::zeros(n);
    for i in 0..n {
        a.add_at(i, i, (n + 1) as f64);
        b.set(i, (i + 1) as f64);
        for j in 0..n {
            if i != j {
                a.add_at(i, j, 1.0 / ((i as f64 - j as f64).abs() + 1.0));
            }
        }
    }
    (a, b)
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_solve");
    for &n in &[10usize, 50, 200] {
        let (a, b) = diagonally_dominant(n);
        group.bench_function(format!("n={n}"), |bencher| {
            bencher.iter(|| solve(black_box(&a), black_box(&b)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
