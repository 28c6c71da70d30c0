//! Device models and MNA stamps for Spicier.
//!
//! Every device implements `spicier_core::Component`; the [`Device`] enum
//! wraps the full set for netlist-level storage (§9 Design Notes: tagged-enum
//! polymorphism in place of a `BaseComponent` inheritance hierarchy).
//!
//! - Passive elements: R, C, L, coupled inductors.
//! - Independent sources: V, I, with time-varying waveforms.
//! - Nonlinear devices: Diode, square-law MOSFET.
//! - Switch-mode MOSFET (gate-latched channel + body diode).
//! - Controlled sources: VCVS, VCCS, CCVS, CCCS.

pub mod controlled;
pub mod device;
pub mod diode;
pub mod error;
pub mod mosfet;
pub mod passive;
pub mod sources;
pub mod waveforms;

pub use controlled::{Cccs, Ccvs, Vccs, Vcvs};
pub use device::Device;
pub use diode::Diode;
pub use error::{Error, Result};
pub use mosfet::{MosfetType, SwitchMosfet, VcMosfet};
pub use passive::{Capacitor, CoupledInductors, Inductor, Resistor, Winding};
pub use sources::{CurrentSource, VoltageSource};
pub use waveforms::Waveform;
