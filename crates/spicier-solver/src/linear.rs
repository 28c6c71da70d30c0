//! Linear-system solve dispatch (§4.1): dense Gaussian elimination below the
//! sparse threshold, a `faer` sparse LU above it, falling back to the dense
//! path transparently if sparse factorization fails on a nearly-singular
//! system faer's pivoting handles differently than the dense solver's.

use spicier_core::linalg::{Matrix, Vector};

use crate::error::{Error, Result};

/// Solve `A x = b`, dispatching to the sparse path once `a.size() >=
/// sparse_threshold`. `t` is only carried through for error reporting.
pub fn solve(a: &Matrix, b: &Vector, t: f64, sparse_threshold: usize) -> Result<Vector> {
    if a.size() >= sparse_threshold {
        if let Some(x) = solve_sparse(a, b) {
            return Ok(x);
        }
        log::warn!("sparse LU failed to factor a {}x{} system at t={t:.6e}, falling back to dense", a.size(), a.size());
    }
    spicier_core::linalg::solve(a, b).map_err(|source| Error::SingularSystem { t, source })
}

/// Extract `a`'s nonzero entries into a `faer` sparse column matrix and
/// factor it. Returns `None` on any construction/factorization failure so
/// the caller can retry densely rather than propagating a faer-specific error.
fn solve_sparse(a: &Matrix, b: &Vector) -> Option<Vector> {
    use faer::sparse::{SparseColMat, Triplet};

    let n = a.size();
    let mut triplets = Vec::with_capacity(n * 4);
    for row in 0..n {
        for col in 0..n {
            let v = a.get(row, col);
            if v != 0.0 {
                triplets.push(Triplet::new(row, col, v));
            }
        }
    }

    let sparse = SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &triplets).ok()?;
    let lu = sparse.sp_lu().ok()?;

    let rhs = faer::Col::<f64>::from_fn(n, |i| b.get(i));
    let solved = lu.solve(&rhs);

    let mut x = Vector::zeros(n);
    for i in 0..n {
        x.set(i, solved[i]);
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spd_matrix(n: usize) -> Matrix {
        let mut a = Matrix::zeros(n);
        for i in 0..n {
            a.add_at(i, i, (n + 2) as f64);
            if i + 1 < n {
                a.add_at(i, i + 1, -1.0);
                a.add_at(i + 1, i, -1.0);
            }
        }
        a
    }

    #[test]
    fn dense_path_used_below_threshold() {
        let a = spd_matrix(4);
        let mut b = Vector::zeros(4);
        b.set(0, 1.0);
        let x = solve(&a, &b, 0.0, 50).unwrap();
        let check = a.mul_vec(&x);
        assert!((check.get(0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sparse_path_used_above_threshold_matches_dense() {
        let n = 60;
        let a = spd_matrix(n);
        let mut b = Vector::zeros(n);
        for i in 0..n {
            b.set(i, (i as f64 + 1.0) * 0.1);
        }
        let x_sparse = solve(&a, &b, 0.0, 50).unwrap();
        let x_dense = spicier_core::linalg::solve(&a, &b).unwrap();
        for i in 0..n {
            assert!((x_sparse.get(i) - x_dense.get(i)).abs() < 1e-6, "index {i}");
        }
    }

    #[test]
    fn singular_system_reports_time() {
        let mut a = Matrix::zeros(2);
        a.add_at(0, 0, 1.0);
        a.add_at(0, 1, 2.0);
        a.add_at(1, 0, 2.0);
        a.add_at(1, 1, 4.0);
        let b = Vector::zeros(2);
        let err = solve(&a, &b, 3.5, 50).unwrap_err();
        assert!(matches!(err, Error::SingularSystem { t, .. } if t == 3.5));
    }
}
