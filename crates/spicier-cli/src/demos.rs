//! Hand-assembled canonical circuits, standing in for the netlist-text
//! front-end this workspace deliberately omits (§6 EXPANSION): each demo
//! builds a `Netlist` directly via `Device` construction, the same
//! programmatic surface a text parser would target.

use anyhow::{bail, Result};
use spicier_core::netlist::Netlist;
use spicier_core::NodeId;
use spicier_devices::{Capacitor, CoupledInductors, Diode, Inductor, Resistor, VoltageSource, Waveform, Winding};

/// A demo circuit plus the node/branch label the CLI reports by default.
pub struct Demo {
    pub netlist: Netlist,
    pub probe_node: String,
}

pub fn build(name: &str) -> Result<Demo> {
    match name {
        "rc" => Ok(rc_charging()),
        "rl" => Ok(rl_step()),
        "rectifier" => Ok(half_wave_rectifier()),
        "lc" => Ok(lc_tank()),
        "transformer" => Ok(coupled_transformer()),
        other => bail!("unknown demo circuit '{other}' (expected one of: rc, rl, rectifier, lc, transformer)"),
    }
}

/// V1 -- R1 -- vout -- C1 -- GND: classic RC charging curve.
fn rc_charging() -> Demo {
    let mut nl = Netlist::new();
    let vin = nl.node("vin");
    let vout = nl.node("vout");
    nl.add_device(Box::new(VoltageSource::dc("V1", vin, NodeId::ground(), 5.0))).unwrap();
    nl.add_device(Box::new(Resistor::new("R1", vin, vout, 1e3).unwrap())).unwrap();
    nl.add_device(Box::new(Capacitor::new("C1", vout, NodeId::ground(), 1e-6).unwrap())).unwrap();
    Demo { netlist: nl, probe_node: "vout".to_string() }
}

/// V1 -- R1 -- vmid -- L1 -- GND: driven-step current ramp toward V1/R1.
fn rl_step() -> Demo {
    let mut nl = Netlist::new();
    let vin = nl.node("vin");
    let vmid = nl.node("vmid");
    nl.add_device(Box::new(VoltageSource::dc("V1", vin, NodeId::ground(), 10.0))).unwrap();
    nl.add_device(Box::new(Resistor::new("R1", vin, vmid, 100.0).unwrap())).unwrap();
    nl.add_device(Box::new(Inductor::new("L1", vmid, NodeId::ground(), 1e-3).unwrap())).unwrap();
    Demo { netlist: nl, probe_node: "vmid".to_string() }
}

/// Sinusoidal source -- diode -- RC load: half-wave rectification.
fn half_wave_rectifier() -> Demo {
    let mut nl = Netlist::new();
    let vin = nl.node("vin");
    let vout = nl.node("vout");
    let sine = Waveform::Sin { dc: 0.0, amp: 5.0, freq: 1e3, phase: 0.0, delay: 0.0, damping: 0.0 };
    nl.add_device(Box::new(VoltageSource::new("V1", vin, NodeId::ground(), sine))).unwrap();
    nl.add_device(Box::new(Diode::new("D1", vin, vout).unwrap())).unwrap();
    nl.add_device(Box::new(Resistor::new("Rload", vout, NodeId::ground(), 1e4).unwrap())).unwrap();
    nl.add_device(Box::new(Capacitor::new("Cload", vout, NodeId::ground(), 1e-7).unwrap())).unwrap();
    Demo { netlist: nl, probe_node: "vout".to_string() }
}

/// A capacitor primed to 5V and an inductor in a closed loop: undamped LC
/// resonance at 1/(2*pi*sqrt(LC)).
fn lc_tank() -> Demo {
    let mut nl = Netlist::new();
    let node = nl.node("tank");
    let mut cap = Capacitor::new("C1", node, NodeId::ground(), 1e-6).unwrap();
    cap.set_initial_condition(5.0);
    nl.add_device(Box::new(cap)).unwrap();
    nl.add_device(Box::new(Inductor::new("L1", node, NodeId::ground(), 1e-3).unwrap())).unwrap();
    Demo { netlist: nl, probe_node: "tank".to_string() }
}

/// A pulsed primary winding coupled into a secondary, demonstrating induced
/// voltage from the primary's rising edge.
fn coupled_transformer() -> Demo {
    let mut nl = Netlist::new();
    let vin = nl.node("vin");
    let sec = nl.node("sec");
    let step = Waveform::Pulse { v1: 0.0, v2: 10.0, td: 0.0, tr: 1e-7, tf: 1e-7, pw: 1e-3, per: 0.0 };
    nl.add_device(Box::new(VoltageSource::new("V1", vin, NodeId::ground(), step))).unwrap();
    let windings = vec![
        Winding { pos: vin, neg: NodeId::ground(), inductance: 1e-3 },
        Winding { pos: sec, neg: NodeId::ground(), inductance: 4e-3 },
    ];
    nl.add_device(Box::new(CoupledInductors::new("T1", windings).unwrap())).unwrap();
    nl.add_device(Box::new(Resistor::new("Rload", sec, NodeId::ground(), 1e6).unwrap())).unwrap();
    Demo { netlist: nl, probe_node: "sec".to_string() }
}
