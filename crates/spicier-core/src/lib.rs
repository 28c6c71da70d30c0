//! Core circuit representation and MNA assembly for Spicier.
//!
//! This crate provides the numerical substrate every higher layer builds on:
//! node identity ([`NodeId`]), the dense linear-algebra primitives ([`linalg`]),
//! the MNA system ([`mna`]), the shared component capability trait
//! ([`component`]), the two-pass assembler ([`netlist`]), engineering-notation
//! value parsing ([`units`]), and the explicit simulation configuration
//! ([`config`]). Device models live in `spicier-devices`; nonlinear solving
//! and time integration live in `spicier-solver`.

pub mod component;
pub mod config;
pub mod error;
pub mod linalg;
pub mod mna;
pub mod netlist;
pub mod node;
pub mod units;

pub use component::{Component, IntegrationMethod, StampContext};
pub use config::SimulationConfig;
pub use error::{Error, Result};
pub use linalg::{Matrix, Vector};
pub use mna::MnaSystem;
pub use netlist::Netlist;
pub use node::NodeId;
