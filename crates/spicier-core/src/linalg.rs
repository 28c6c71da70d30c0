//! Dense linear-algebra substrate for the MNA system (§4.1).
//!
//! `Matrix`/`Vector` wrap `nalgebra`'s dense storage but add the `add_at`
//! stamping primitive every component uses, and `solve` is a hand-written
//! Gaussian elimination with partial pivoting rather than `nalgebra::LU` —
//! the spec's `SingularMatrix(col)` contract needs the failing column index
//! and an explicit `1e-14` pivot-magnitude floor, which `nalgebra::LU` does
//! not expose.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Pivot magnitude below which the dense solver reports [`Error::SingularMatrix`].
pub const PIVOT_EPS: f64 = 1e-14;

/// Dense square matrix, additively stamped by components.
#[derive(Debug, Clone)]
pub struct Matrix {
    data: DMatrix<f64>,
}

impl Matrix {
    pub fn zeros(n: usize) -> Self {
        Matrix {
            data: DMatrix::zeros(n, n),
        }
    }

    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    /// Additive stamp: `A[i][j] += v`. The sole way components contribute to
    /// the system — per §4.3 the assembler never interprets semantics, only
    /// routes additions.
    pub fn add_at(&mut self, i: usize, j: usize, v: f64) {
        self.data[(i, j)] += v;
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        self.data[(i, j)] = v;
    }

    pub fn fill(&mut self, v: f64) {
        self.data.fill(v);
    }

    pub fn as_nalgebra(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn as_nalgebra_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.data
    }

    /// Dense matrix-vector product `A * v`, used by the nonlinear solver to
    /// fold a linear companion system into a Newton residual (§4.4).
    pub fn mul_vec(&self, v: &Vector) -> Vector {
        Vector::from_nalgebra(&self.data * v.as_nalgebra())
    }
}

/// Dense vector, additively stamped by components.
#[derive(Debug, Clone)]
pub struct Vector {
    data: DVector<f64>,
}

impl Vector {
    pub fn zeros(n: usize) -> Self {
        Vector {
            data: DVector::zeros(n),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn add_at(&mut self, i: usize, v: f64) {
        self.data[i] += v;
    }

    pub fn get(&self, i: usize) -> f64 {
        self.data[i]
    }

    pub fn set(&mut self, i: usize, v: f64) {
        self.data[i] = v;
    }

    pub fn fill(&mut self, v: f64) {
        self.data.fill(v);
    }

    pub fn norm_inf(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()))
    }

    pub fn as_nalgebra(&self) -> &DVector<f64> {
        &self.data
    }

    pub fn as_slice(&self) -> &[f64] {
        self.data.as_slice()
    }

    pub fn from_nalgebra(data: DVector<f64>) -> Self {
        Vector { data }
    }

    pub fn has_nonfinite(&self) -> bool {
        self.data.iter().any(|v| !v.is_finite())
    }
}

impl std::ops::Index<usize> for Vector {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl std::ops::IndexMut<usize> for Vector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.data[i]
    }
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting, in place on
/// a scratch copy of `A`.
///
/// Fails with [`Error::SingularMatrix`] carrying the offending column if the
/// pivot magnitude falls below [`PIVOT_EPS`] — singular detection never
/// silently returns garbage (§4.1 testable property).
pub fn solve(a: &Matrix, b: &Vector) -> Result<Vector> {
    let n = a.size();
    if b.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }

    let mut m = a.as_nalgebra().clone();
    let mut rhs = b.as_nalgebra().clone();

    for col in 0..n {
        // Partial pivot: find the largest-magnitude entry at or below the diagonal.
        let mut pivot_row = col;
        let mut pivot_mag = m[(col, col)].abs();
        for row in (col + 1)..n {
            let mag = m[(row, col)].abs();
            if mag > pivot_mag {
                pivot_mag = mag;
                pivot_row = row;
            }
        }

        if pivot_mag < PIVOT_EPS {
            return Err(Error::SingularMatrix(col));
        }

        if pivot_row != col {
            m.swap_rows(col, pivot_row);
            rhs.swap_rows(col, pivot_row);
        }

        let pivot = m[(col, col)];
        for row in (col + 1)..n {
            let factor = m[(row, col)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let sub = factor * m[(col, k)];
                m[(row, k)] -= sub;
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    // Back substitution.
    let mut x = DVector::zeros(n);
    for row in (0..n).rev() {
        let mut sum = rhs[row];
        for k in (row + 1)..n {
            sum -= m[(row, k)] * x[k];
        }
        x[row] = sum / m[(row, row)];
    }

    Ok(Vector::from_nalgebra(x))
}
