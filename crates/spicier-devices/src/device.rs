//! The tagged `Device` enum (§4.2.x, §9 Design Notes): one exhaustive match
//! standing in for the teacher's `BaseComponent` inheritance hierarchy. Every
//! capability call is forwarded to the active variant; adding a new device
//! type is a compile error everywhere this match isn't updated, which is the
//! point.

use spicier_core::component::{Component, IntegrationMethod, StampContext};
use spicier_core::linalg::{Matrix, Vector};
use spicier_core::mna::MnaSystem;
use spicier_core::NodeId;

use crate::controlled::{Cccs, Ccvs, Vccs, Vcvs};
use crate::diode::Diode;
use crate::mosfet::{SwitchMosfet, VcMosfet};
use crate::passive::{Capacitor, CoupledInductors, Inductor, Resistor};
use crate::sources::{CurrentSource, VoltageSource};

#[derive(Debug, Clone)]
pub enum Device {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    CoupledInductors(CoupledInductors),
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
    SwitchMosfet(SwitchMosfet),
    VcMosfet(VcMosfet),
    Diode(Diode),
    Vcvs(Vcvs),
    Vccs(Vccs),
    Ccvs(Ccvs),
    Cccs(Cccs),
}

macro_rules! for_each_variant {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Device::Resistor($inner) => $body,
            Device::Capacitor($inner) => $body,
            Device::Inductor($inner) => $body,
            Device::CoupledInductors($inner) => $body,
            Device::VoltageSource($inner) => $body,
            Device::CurrentSource($inner) => $body,
            Device::SwitchMosfet($inner) => $body,
            Device::VcMosfet($inner) => $body,
            Device::Diode($inner) => $body,
            Device::Vcvs($inner) => $body,
            Device::Vccs($inner) => $body,
            Device::Ccvs($inner) => $body,
            Device::Cccs($inner) => $body,
        }
    };
}

impl Component for Device {
    fn name(&self) -> &str {
        for_each_variant!(self, d => d.name())
    }

    fn nodes(&self) -> Vec<NodeId> {
        for_each_variant!(self, d => d.nodes())
    }

    fn needs_current_var(&self) -> bool {
        for_each_variant!(self, d => d.needs_current_var())
    }

    fn num_current_vars(&self) -> usize {
        for_each_variant!(self, d => d.num_current_vars())
    }

    fn is_nonlinear(&self) -> bool {
        for_each_variant!(self, d => d.is_nonlinear())
    }

    fn is_reactive(&self) -> bool {
        for_each_variant!(self, d => d.is_reactive())
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, t: f64) {
        for_each_variant!(self, d => d.stamp(mna, ctx, t))
    }

    fn stamp_residual(&self, r: &mut Vector, x: &Vector, ctx: &StampContext, t: f64) {
        for_each_variant!(self, d => d.stamp_residual(r, x, ctx, t))
    }

    fn stamp_jacobian(&self, j: &mut Matrix, x: &Vector, ctx: &StampContext, t: f64) {
        for_each_variant!(self, d => d.stamp_jacobian(j, x, ctx, t))
    }

    fn prime_for_dc(&mut self) {
        for_each_variant!(self, d => d.prime_for_dc())
    }

    fn update_companion(&mut self, h: f64, method: IntegrationMethod) {
        for_each_variant!(self, d => d.update_companion(h, method))
    }

    fn commit_history(&mut self, x: &Vector, ctx: &StampContext) {
        for_each_variant!(self, d => d.commit_history(x, ctx))
    }

    fn seed_history(&mut self, voltage: f64, current: f64) {
        for_each_variant!(self, d => d.seed_history(voltage, current))
    }

    fn set_dc_scale(&mut self, scale: f64) {
        for_each_variant!(self, d => d.set_dc_scale(scale))
    }

    fn local_truncation_error(&self, h: f64) -> f64 {
        for_each_variant!(self, d => d.local_truncation_error(h))
    }

    fn event_imminent(&self, x: &Vector, ctx: &StampContext) -> bool {
        for_each_variant!(self, d => d.event_imminent(x, ctx))
    }

    fn realize_transition(&mut self, x: &Vector, ctx: &StampContext) {
        for_each_variant!(self, d => d.realize_transition(x, ctx))
    }
}

macro_rules! from_variant {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Device {
            fn from(value: $ty) -> Self {
                Device::$variant(value)
            }
        }
    };
}

from_variant!(Resistor, Resistor);
from_variant!(Capacitor, Capacitor);
from_variant!(Inductor, Inductor);
from_variant!(CoupledInductors, CoupledInductors);
from_variant!(VoltageSource, VoltageSource);
from_variant!(CurrentSource, CurrentSource);
from_variant!(SwitchMosfet, SwitchMosfet);
from_variant!(VcMosfet, VcMosfet);
from_variant!(Diode, Diode);
from_variant!(Vcvs, Vcvs);
from_variant!(Vccs, Vccs);
from_variant!(Ccvs, Ccvs);
from_variant!(Cccs, Cccs);
