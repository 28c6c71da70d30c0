//! Adaptive transient driver (§4.5/§4.6).
//!
//! The driver owns the step state machine; every reactive component's
//! companion coefficients, history, and local-truncation-error estimate are
//! already implemented on the `Component` trait (`spicier-devices`), so this
//! module's job is purely orchestration: prime from a DC operating point,
//! then repeatedly propose a step, solve, accept or reject, and adapt `h`.

mod driver;

pub use driver::{TransientOptions, TransientSummary, run_transient};
