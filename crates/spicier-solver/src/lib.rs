//! Nonlinear solving and time integration for Spicier (§4.4-§4.6).
//!
//! - [`linear`]: dense/sparse linear-system solve dispatch (§4.1).
//! - [`newton`]: damped Newton-Raphson with Armijo line search (§4.4).
//! - [`dc`]: the three-tier DC operating-point homotopy (§4.4).
//! - [`transient`]: the adaptive transient driver (§4.5/§4.6).
//! - [`sink`]: the pluggable result-sink interface (§6).

pub mod dc;
pub mod error;
pub mod linear;
pub mod newton;
pub mod sink;
pub mod transient;

pub use dc::solve_dc;
pub use error::{Error, Result};
pub use newton::{NewtonResult, solve as solve_newton};
pub use sink::{InMemorySink, ResultSink, StepRecord};
pub use transient::{TransientOptions, TransientSummary, run_transient};
