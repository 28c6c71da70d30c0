//! The capability-trait set every component implements (§9 Design Notes).
//!
//! Deep inheritance (`BaseComponent -> LinearTwoTerminal -> {R, C, L}`, ...)
//! is replaced by a tagged enum over this shared trait: variants that don't
//! need a given capability (e.g. a resistor's `update_companion`) accept the
//! default no-op, turning the dispatch into an exhaustive compile-time
//! checklist rather than virtual dispatch.

use indexmap::IndexMap;

use crate::mna::MnaSystem;
use crate::linalg::{Matrix, Vector};
use crate::node::NodeId;

/// Selects the implicit integrator a reactive component's companion model
/// should use (§4.5). Carried as an explicit enum rather than a module-level
/// flag (§9 Design Notes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntegrationMethod {
    /// First order, L-stable.
    BackwardEuler,
    /// Second order, A-stable but not L-stable — oscillatory on switched circuits.
    Trapezoidal,
    /// Second order, L-stable; bootstraps its first step with Backward Euler.
    Bdf2,
    /// Second order, L-stable with tunable high-frequency damping `rho_inf`.
    GeneralizedAlpha { rho_inf: f64 },
}

impl IntegrationMethod {
    /// Default `rho_inf = 0.85` per §4.5.
    pub fn generalized_alpha_default() -> Self {
        IntegrationMethod::GeneralizedAlpha { rho_inf: 0.85 }
    }

    /// Formal order of accuracy, used by the PI step-size controller (§4.6).
    pub fn order(&self) -> u32 {
        match self {
            IntegrationMethod::BackwardEuler => 1,
            IntegrationMethod::Trapezoidal => 2,
            IntegrationMethod::Bdf2 => 2,
            IntegrationMethod::GeneralizedAlpha { .. } => 2,
        }
    }
}

/// Resolves `NodeId`s and component names to their final MNA row/column
/// indices, as produced by a `Netlist`'s Pass 1 (Analyze).
///
/// The assembler builds this once per step and hands it to every component's
/// `stamp`/`stamp_residual`/`stamp_jacobian`/`commit_history` call; components
/// never retain it past the call (§5).
pub struct StampContext<'a> {
    pub num_nodes: usize,
    pub(crate) node_map: &'a IndexMap<NodeId, usize>,
    pub(crate) branch_map: &'a IndexMap<String, usize>,
}

impl<'a> StampContext<'a> {
    pub fn new(
        num_nodes: usize,
        node_map: &'a IndexMap<NodeId, usize>,
        branch_map: &'a IndexMap<String, usize>,
    ) -> Self {
        StampContext {
            num_nodes,
            node_map,
            branch_map,
        }
    }

    /// Resolve a node to its MNA row/column, or `None` for ground.
    pub fn node_index(&self, node: NodeId) -> Option<usize> {
        if node.is_ground() {
            None
        } else {
            self.node_map.get(&node).copied()
        }
    }

    /// Resolve a component's branch-current index within `[0, M)`.
    pub fn branch_index(&self, component_name: &str) -> Option<usize> {
        self.branch_map.get(component_name).copied()
    }

    /// Resolve a component's branch-current row/column within `[0, S)`.
    pub fn branch_row(&self, component_name: &str) -> Option<usize> {
        self.branch_index(component_name).map(|b| self.num_nodes + b)
    }

    /// Resolve the `offset`-th branch row of a multi-winding component
    /// (§4.2.4 coupled inductors), `offset` counting from the component's
    /// first allocated branch index.
    pub fn branch_row_at(&self, component_name: &str, offset: usize) -> Option<usize> {
        self.branch_index(component_name).map(|b| self.num_nodes + b + offset)
    }
}

/// The shared capability set every device variant implements.
///
/// Non-applicable capabilities (e.g. `update_companion` on a resistor) use
/// the default no-op bodies rather than a separate marker trait per
/// capability — the exhaustive `match` in the `Device` enum is the real
/// compile-time checklist.
pub trait Component: std::fmt::Debug {
    fn name(&self) -> &str;

    fn nodes(&self) -> Vec<NodeId>;

    /// Declares an additional branch-current unknown per §3: voltage
    /// sources, inductors, VCVS/CCVS all return `true`.
    fn needs_current_var(&self) -> bool {
        false
    }

    /// Number of contiguous branch-current unknowns this component needs.
    /// Almost always `0` or `1`; a multi-winding coupled-inductor group is
    /// the one variant that needs more than one (§4.2.4).
    fn num_current_vars(&self) -> usize {
        if self.needs_current_var() { 1 } else { 0 }
    }

    fn is_nonlinear(&self) -> bool {
        false
    }

    fn is_reactive(&self) -> bool {
        false
    }

    /// Contribute to the linear MNA system for a time-domain step. No-op for
    /// purely-nonlinear devices (they use `stamp_residual`/`stamp_jacobian`
    /// instead).
    fn stamp(&self, _mna: &mut MnaSystem, _ctx: &StampContext, _t: f64) {}

    /// Contribute to Newton's residual `F(x)`. Nonlinear devices only.
    fn stamp_residual(&self, _r: &mut Vector, _x: &Vector, _ctx: &StampContext, _t: f64) {}

    /// Contribute to Newton's Jacobian `J(x)`. Nonlinear devices only.
    fn stamp_jacobian(&self, _j: &mut Matrix, _x: &Vector, _ctx: &StampContext, _t: f64) {}

    /// Prime a reactive component's companion coefficients for the DC
    /// operating point: capacitor -> open, inductor -> short (§4.2.2/4.2.3).
    fn prime_for_dc(&mut self) {}

    /// Recompute companion coefficients from history and the candidate step
    /// `h` (§4.5). Reactive components only.
    fn update_companion(&mut self, _h: f64, _method: IntegrationMethod) {}

    /// Shift the history ring after a step is accepted (§3 invariant: never
    /// called for a rejected step).
    fn commit_history(&mut self, _x: &Vector, _ctx: &StampContext) {}

    /// Seed history directly, e.g. from the DC operating point or a
    /// user-supplied initial condition (`ic=`).
    fn seed_history(&mut self, _voltage: f64, _current: f64) {}

    /// Scale an independent source's contribution for the source-stepping
    /// DC homotopy (§4.4 Tier 2). No-op for every device except voltage and
    /// current sources.
    fn set_dc_scale(&mut self, _scale: f64) {}

    /// Per-step local truncation error estimate (§4.5). Reactive components only.
    fn local_truncation_error(&self, _h: f64) -> f64 {
        0.0
    }

    /// Poll for an imminent state transition (diode near turn-on, MOSFET
    /// body diode about to conduct) given the last accepted solution.
    /// `Some(())`-style boolean return per §4.6 event detection.
    fn event_imminent(&self, _x: &Vector, _ctx: &StampContext) -> bool {
        false
    }

    /// Re-latch any device state that depends on the last accepted solution
    /// (switch-mode MOSFET body-diode state, region latching). Externally
    /// driven state (e.g. a switch-mode MOSFET's digitally forced gate) is
    /// never touched here.
    fn realize_transition(&mut self, _x: &Vector, _ctx: &StampContext) {}
}
