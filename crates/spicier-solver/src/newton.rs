//! Damped Newton-Raphson with Armijo line search (§4.4).
//!
//! `F(x)` and `J(x)` are assembled in two layers: a linear baseline from
//! every component's `stamp` (this already includes primed/updated reactive
//! companion models, since those are plain linear contributions once their
//! coefficients are fixed for the step) plus nonlinear devices' own
//! `stamp_residual`/`stamp_jacobian` additions. The assembler itself never
//! distinguishes device kinds; this module is the one place that does.

use spicier_core::component::{Component, StampContext};
use spicier_core::config::SimulationConfig;
use spicier_core::linalg::{Matrix, Vector};
use spicier_core::netlist::Netlist;

use crate::error::{Error, Result};
use crate::linear;

/// Assemble `F(x) = A_lin*x - b_lin + F_nl(x)` and `J(x) = A_lin + J_nl(x)`
/// at time `t` (§4.4 steps 1 and 3, folded into one assembler pass).
pub fn assemble(netlist: &Netlist, x: &Vector, t: f64, g_min: f64) -> (Matrix, Vector) {
    let mna = netlist.assemble_mna_at(t, g_min);
    let mut jacobian = mna.matrix().clone();
    let mut residual = mna.matrix().mul_vec(x);
    for i in 0..residual.len() {
        residual.add_at(i, -mna.rhs().get(i));
    }

    let (node_map, branch_map) = netlist.analyze();
    let ctx = StampContext::new(netlist.num_nodes(), &node_map, &branch_map);

    for device in netlist.devices() {
        if device.is_nonlinear() {
            device.stamp_residual(&mut residual, x, &ctx, t);
            device.stamp_jacobian(&mut jacobian, x, &ctx, t);
        }
    }
    (jacobian, residual)
}

/// Newton's result: the converged unknown vector plus diagnostics.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    pub x: Vector,
    pub iterations: usize,
    pub residual_norm: f64,
}

/// Damped Newton with Armijo backtracking line search (§4.4 steps 1-6).
///
/// `x0` is the Newton seed: zero for a cold DC start, the last accepted
/// solution for a transient step.
pub fn solve(netlist: &Netlist, x0: Vector, t: f64, g_min: f64, cfg: &SimulationConfig) -> Result<NewtonResult> {
    let mut x = x0;
    let mut last_residual_norm = 0.0;

    for iter in 0..cfg.max_newton {
        let (jacobian, residual) = assemble(netlist, &x, t, g_min);
        let residual_norm = residual.norm_inf();
        last_residual_norm = residual_norm;

        if residual_norm < cfg.abstol + cfg.reltol * x.norm_inf() {
            return Ok(NewtonResult { x, iterations: iter, residual_norm });
        }

        let neg_residual = negate(&residual);
        let step = linear::solve(&jacobian, &neg_residual, t, cfg.sparse_threshold)?;

        match armijo_search(netlist, &x, &step, t, g_min, residual_norm, cfg) {
            Some((x_next, residual_norm_next)) => {
                x = x_next;
                last_residual_norm = residual_norm_next;
            }
            None => {
                return Err(Error::NewtonDivergence {
                    iterations: iter + 1,
                    final_residual: residual_norm,
                });
            }
        }
    }

    Err(Error::NewtonDivergence {
        iterations: cfg.max_newton,
        final_residual: last_residual_norm,
    })
}

/// Backtrack `alpha` from 1.0 down to `armijo_alpha_min`, accepting the first
/// trial point whose residual satisfies the sufficient-decrease condition
/// `||F(x + alpha*dx)|| <= (1 - c1*alpha) * ||F(x)||`.
fn armijo_search(
    netlist: &Netlist,
    x: &Vector,
    step: &Vector,
    t: f64,
    g_min: f64,
    residual_norm: f64,
    cfg: &SimulationConfig,
) -> Option<(Vector, f64)> {
    let mut alpha = 1.0;
    while alpha >= cfg.armijo_alpha_min {
        let x_trial = axpy(x, alpha, step);
        let (_, residual_trial) = assemble(netlist, &x_trial, t, g_min);
        let residual_trial_norm = residual_trial.norm_inf();
        if residual_trial_norm <= (1.0 - cfg.armijo_c1 * alpha) * residual_norm {
            return Some((x_trial, residual_trial_norm));
        }
        alpha *= 0.5;
    }
    None
}

fn negate(v: &Vector) -> Vector {
    let mut out = Vector::zeros(v.len());
    for i in 0..v.len() {
        out.set(i, -v.get(i));
    }
    out
}

fn axpy(x: &Vector, alpha: f64, dx: &Vector) -> Vector {
    let mut out = Vector::zeros(x.len());
    for i in 0..x.len() {
        out.set(i, x.get(i) + alpha * dx.get(i));
    }
    out
}
