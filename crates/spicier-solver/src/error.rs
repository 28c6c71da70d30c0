//! Solver- and driver-level error taxonomy (§7), layered over the core
//! linear-algebra/assembly errors rather than duplicating them.

use spicier_core::error::Error as CoreError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("singular system at t={t:.6e}: {source}")]
    SingularSystem { t: f64, #[source] source: CoreError },

    #[error("Newton failed to converge after {iterations} iterations (||F||_inf={final_residual:.3e})")]
    NewtonDivergence { iterations: usize, final_residual: f64 },

    #[error("local truncation error {estimate:.3e} exceeded tolerance for {component}")]
    LteExceeded { component: String, estimate: f64 },

    #[error("unphysical solution at node {node}: {value:.3e}")]
    UnphysicalSolution { node: String, value: f64 },

    #[error("step size fell below h_min={h_min:.3e} at t={t:.6e}")]
    StepFloor { t: f64, h_min: f64 },

    #[error("DC operating point failed to converge under all three homotopy tiers")]
    DcFailure,
}

pub type Result<T> = std::result::Result<T, Error>;
