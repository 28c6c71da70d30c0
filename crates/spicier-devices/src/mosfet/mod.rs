//! MOSFET device models (§4.2.7, §4.2.8): a gate-state-controlled switch
//! model for power-electronics topologies, and a nonlinear square-law model
//! for analog-style biasing. Replaces the teacher's BSIM4 parameter set with
//! the simpler model this spec calls for.

pub mod switch;
pub mod vc;

pub use switch::SwitchMosfet;
pub use vc::VcMosfet;

/// Channel polarity. Shared between the switch-mode and square-law models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MosfetType {
    Nmos,
    Pmos,
}
