//! The Modified Nodal Analysis system: the matrix `A`, RHS `b`, and the
//! stamping primitives every component funnels its contribution through.

use crate::linalg::{Matrix, Vector};

/// `Ax = b` for one time step or Newton iteration.
///
/// Owned by the driver for the lifetime of the simulation (§5); the
/// assembler and components only read/write it via the `add_at`/`stamp_*`
/// methods, never retaining a reference past the call.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    /// Node unknowns (`0..num_nodes`).
    pub num_nodes: usize,
    /// Branch-current unknowns (`num_nodes..num_nodes+num_current_vars`).
    pub num_current_vars: usize,
    matrix: Matrix,
    rhs: Vector,
}

impl MnaSystem {
    /// Allocate a zeroed system of size `S = num_nodes + num_current_vars`.
    pub fn new(num_nodes: usize, num_current_vars: usize) -> Self {
        let size = num_nodes + num_current_vars;
        MnaSystem {
            num_nodes,
            num_current_vars,
            matrix: Matrix::zeros(size),
            rhs: Vector::zeros(size),
        }
    }

    pub fn size(&self) -> usize {
        self.num_nodes + self.num_current_vars
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    pub fn rhs(&self) -> &Vector {
        &self.rhs
    }

    pub fn rhs_mut(&mut self) -> &mut Vector {
        &mut self.rhs
    }

    /// Zero the system in place for the next step/iteration, without
    /// reallocating the backing storage (§5: no per-step heap allocation).
    pub fn clear(&mut self) {
        self.matrix.fill(0.0);
        self.rhs.fill(0.0);
    }

    /// The branch-current row/column for a branch allocated at `branch_index`
    /// (0-based, within `[0, num_current_vars)`).
    pub fn branch_row(&self, branch_index: usize) -> usize {
        self.num_nodes + branch_index
    }

    /// Unconditionally add `g_min` to every non-ground diagonal entry (§4.3
    /// Pass 2), preventing floating-node singularity.
    pub fn add_gmin_floor(&mut self, g_min: f64) {
        for i in 0..self.num_nodes {
            self.matrix.add_at(i, i, g_min);
        }
    }

    /// Stamp a conductance `g` between two (optional) node indices, omitting
    /// ground rows/columns per §4.2.1's pattern:
    /// `{(i,i)+g, (j,j)+g, (i,j)-g, (j,i)-g}`.
    pub fn stamp_conductance(&mut self, a: Option<usize>, b: Option<usize>, g: f64) {
        if let Some(i) = a {
            self.matrix.add_at(i, i, g);
        }
        if let Some(j) = b {
            self.matrix.add_at(j, j, g);
        }
        if let (Some(i), Some(j)) = (a, b) {
            self.matrix.add_at(i, j, -g);
            self.matrix.add_at(j, i, -g);
        }
    }

    /// Stamp an independent current source of magnitude `i` flowing from
    /// `from` to `to`: drawn at `from`, injected at `to` — the SPICE
    /// convention preserved bit-exactly per §6.
    pub fn stamp_current_source(&mut self, from: Option<usize>, to: Option<usize>, i: f64) {
        if let Some(f) = from {
            self.rhs.add_at(f, -i);
        }
        if let Some(t) = to {
            self.rhs.add_at(t, i);
        }
    }

    /// Stamp the KCL incidence of a branch-current unknown at `branch_row`
    /// between node `pos` (current enters, `+1`) and `neg` (current leaves,
    /// `-1`) — the pattern shared by voltage sources, inductors, and any
    /// other branch-current-carrying element.
    pub fn stamp_branch_incidence(&mut self, pos: Option<usize>, neg: Option<usize>, branch_row: usize) {
        if let Some(i) = pos {
            self.matrix.add_at(i, branch_row, 1.0);
            self.matrix.add_at(branch_row, i, 1.0);
        }
        if let Some(j) = neg {
            self.matrix.add_at(j, branch_row, -1.0);
            self.matrix.add_at(branch_row, j, -1.0);
        }
    }
}
