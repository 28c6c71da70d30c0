//! Linear and reactive passive elements (§4.2.1–§4.2.4).

pub mod capacitor;
pub mod coupled_inductors;
pub mod inductor;
pub mod resistor;

pub use capacitor::Capacitor;
pub use coupled_inductors::{CoupledInductors, Winding};
pub use inductor::Inductor;
pub use resistor::Resistor;
