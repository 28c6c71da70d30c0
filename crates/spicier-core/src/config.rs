//! Global simulation knobs, carried as one explicit struct rather than
//! module-level flags (§9 Design Notes / §7 Configuration).

use crate::component::IntegrationMethod;

/// Every tunable the solver/driver needs, constructed once per simulation
/// and passed by value/reference into the driver — never a global.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Implicit integration method for reactive companion models (§4.5).
    pub method: IntegrationMethod,

    /// Newton absolute convergence tolerance (§4.4).
    pub abstol: f64,
    /// Newton relative convergence tolerance (§4.4).
    pub reltol: f64,
    /// KCL current-balance tolerance for the testable-property check (§8).
    pub tol_current: f64,
    /// Maximum Newton iterations per solve (§4.4).
    pub max_newton: usize,
    /// Armijo line-search sufficient-decrease constant `c1` (§4.4).
    pub armijo_c1: f64,
    /// Minimum Armijo step-length fraction before declaring a line-search failure.
    pub armijo_alpha_min: f64,

    /// Floor conductance added to every non-ground diagonal (§3/§4.3).
    pub g_min: f64,
    /// Starting `g_min` for Gmin-stepping homotopy (§4.4 Tier 3).
    pub g_min_start: f64,
    /// Number of geometric Gmin-stepping stages (§4.4 Tier 3).
    pub g_min_steps: usize,
    /// `dc_scale` levels for source-stepping homotopy (§4.4 Tier 2).
    pub source_steps: Vec<f64>,

    /// LTE relative tolerance for the adaptive step controller (§4.6).
    pub lte_reltol: f64,
    /// LTE absolute tolerance for the adaptive step controller (§4.6).
    pub lte_abstol: f64,
    /// Minimum allowed step size; falling below it while still failing is fatal (§4.7).
    pub h_min: f64,
    /// Maximum allowed step size.
    pub h_max: f64,
    /// Step-size clamp applied when an imminent event is detected (§4.6).
    pub event_step_clamp: f64,

    /// `|v| >` this on any node is treated as an unphysical solution (§4.7).
    pub max_node_voltage: f64,

    /// Systems at or above this size use the sparse solver path (§4.1).
    pub sparse_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            method: IntegrationMethod::Trapezoidal,

            abstol: 1e-9,
            reltol: 1e-6,
            tol_current: 1e-9,
            max_newton: 50,
            armijo_c1: 1e-4,
            armijo_alpha_min: 1e-4,

            g_min: 1e-12,
            g_min_start: 1e-2,
            g_min_steps: 10,
            source_steps: vec![0.0, 0.25, 0.5, 0.75, 1.0],

            lte_reltol: 1e-3,
            lte_abstol: 1e-6,
            h_min: 1e-15,
            h_max: 1e-3,
            event_step_clamp: 1e-9,

            max_node_voltage: 1e3,

            sparse_threshold: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.max_newton, 50);
        assert_eq!(cfg.armijo_c1, 1e-4);
        assert_eq!(cfg.g_min, 1e-12);
        assert_eq!(cfg.g_min_start, 1e-2);
        assert_eq!(cfg.source_steps, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
