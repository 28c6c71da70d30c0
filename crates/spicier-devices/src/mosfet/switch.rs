//! Switch-mode MOSFET (§4.2.7): a gate-state-controlled channel resistor in
//! parallel with a latched body-diode Norton equivalent. Everything here
//! stamps linearly — there is no Newton involvement, only latched-state
//! updates between accepted steps.

use spicier_core::component::{Component, StampContext};
use spicier_core::mna::MnaSystem;
use spicier_core::{NodeId, Vector};

use super::MosfetType;
use crate::error::{Result, invalid};

#[derive(Debug, Clone)]
pub struct SwitchMosfet {
    pub name: String,
    pub drain: NodeId,
    pub gate: NodeId,
    pub source: NodeId,
    pub mosfet_type: MosfetType,

    r_on: f64,
    r_off: f64,
    v_f_body: f64,
    r_on_body: f64,

    gate_on: bool,
    body_diode_on: bool,
}

impl SwitchMosfet {
    /// Defaults per the spec's adopted parameter table: `R_on = 0.1 Ω`,
    /// `R_off = 1e9 Ω`, `V_f_body = 0.7 V`, `R_on_body = 1 Ω`.
    pub fn new(
        name: impl Into<String>,
        drain: NodeId,
        gate: NodeId,
        source: NodeId,
        mosfet_type: MosfetType,
    ) -> Result<Self> {
        Self::with_params(name, drain, gate, source, mosfet_type, 0.1, 1e9, 0.7, 1.0)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_params(
        name: impl Into<String>,
        drain: NodeId,
        gate: NodeId,
        source: NodeId,
        mosfet_type: MosfetType,
        r_on: f64,
        r_off: f64,
        v_f_body: f64,
        r_on_body: f64,
    ) -> Result<Self> {
        let name = name.into();
        if !(r_on > 0.0) || !r_on.is_finite() {
            return Err(invalid(&name, "r_on", format!("must be > 0, got {r_on}")));
        }
        if !(r_off > r_on) {
            return Err(invalid(&name, "r_off", format!("must be > r_on, got {r_off}")));
        }
        if !(r_on_body > 0.0) {
            return Err(invalid(&name, "r_on_body", format!("must be > 0, got {r_on_body}")));
        }
        Ok(SwitchMosfet {
            name,
            drain,
            gate,
            source,
            mosfet_type,
            r_on,
            r_off,
            v_f_body,
            r_on_body,
            gate_on: false,
            body_diode_on: false,
        })
    }

    /// Force the gate state directly. This is the sole way `gate_on` changes
    /// — the gate node's voltage is never read by `realize_transition` (§4.2.7
    /// calls this device "gate-state-controlled", in explicit contrast to
    /// §4.2.8's `VcMosfet`, which *does* derive its region from node voltages
    /// every step). A caller driving a real analog gate network is
    /// responsible for sampling that node and calling this each step.
    pub fn set_gate_on(&mut self, on: bool) {
        self.gate_on = on;
    }

    pub fn gate_on(&self) -> bool {
        self.gate_on
    }

    fn v_ds(&self, x: &Vector, ctx: &StampContext) -> f64 {
        let vd = ctx.node_index(self.drain).map(|i| x[i]).unwrap_or(0.0);
        let vs = ctx.node_index(self.source).map(|i| x[i]).unwrap_or(0.0);
        vd - vs
    }
}

impl Component for SwitchMosfet {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.drain, self.gate, self.source]
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        let drain = ctx.node_index(self.drain);
        let source = ctx.node_index(self.source);

        let r_channel = if self.gate_on { self.r_on } else { self.r_off };
        mna.stamp_conductance(drain, source, 1.0 / r_channel);

        if self.body_diode_on {
            let g_body = 1.0 / self.r_on_body;
            mna.stamp_conductance(drain, source, g_body);
            let i_eq = g_body * self.v_f_body;
            match self.mosfet_type {
                // NMOS intrinsic body diode: anode=source, cathode=drain.
                MosfetType::Nmos => mna.stamp_current_source(source, drain, i_eq),
                // PMOS intrinsic body diode: anode=drain, cathode=source.
                MosfetType::Pmos => mna.stamp_current_source(drain, source, i_eq),
            }
        }
    }

    fn event_imminent(&self, x: &Vector, ctx: &StampContext) -> bool {
        let v_ds = self.v_ds(x, ctx);
        let trigger = match self.mosfet_type {
            MosfetType::Nmos => -self.v_f_body,
            MosfetType::Pmos => self.v_f_body,
        };
        (v_ds - trigger).abs() < 0.1
    }

    /// Re-latches only the body diode from the last accepted solution's
    /// `v_ds`; `gate_on` is untouched here (see `set_gate_on`).
    fn realize_transition(&mut self, x: &Vector, ctx: &StampContext) {
        let v_ds = self.v_ds(x, ctx);
        self.body_diode_on = match self.mosfet_type {
            MosfetType::Nmos => v_ds < -self.v_f_body,
            MosfetType::Pmos => v_ds > self.v_f_body,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn rejects_r_off_not_greater_than_r_on() {
        assert!(SwitchMosfet::with_params(
            "M1",
            NodeId::new(1),
            NodeId::new(2),
            NodeId::ground(),
            MosfetType::Nmos,
            10.0,
            5.0,
            0.7,
            1.0
        )
        .is_err());
    }

    #[test]
    fn gate_on_stamps_low_resistance_channel() {
        let mut m = SwitchMosfet::new("M1", NodeId::new(1), NodeId::new(2), NodeId::ground(), MosfetType::Nmos).unwrap();
        m.set_gate_on(true);
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0)].into_iter().collect();
        let branch_map = IndexMap::new();
        let ctx = StampContext::new(1, &node_map, &branch_map);
        let mut mna = MnaSystem::new(1, 0);
        m.stamp(&mut mna, &ctx, 0.0);
        assert!((mna.matrix().get(0, 0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn gate_off_stamps_high_resistance_channel() {
        let m = SwitchMosfet::new("M1", NodeId::new(1), NodeId::new(2), NodeId::ground(), MosfetType::Nmos).unwrap();
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0)].into_iter().collect();
        let branch_map = IndexMap::new();
        let ctx = StampContext::new(1, &node_map, &branch_map);
        let mut mna = MnaSystem::new(1, 0);
        m.stamp(&mut mna, &ctx, 0.0);
        assert!(mna.matrix().get(0, 0) < 1e-6);
    }

    /// An ideal digital gate drive has no real node voltage to read back —
    /// `realize_transition` must leave a digitally-forced `gate_on` alone
    /// across every committed step, the way a driver's `commit_step` would
    /// call it after each accepted transient step.
    #[test]
    fn digitally_forced_gate_on_survives_repeated_commits() {
        let mut m = SwitchMosfet::new("M1", NodeId::new(1), NodeId::new(2), NodeId::ground(), MosfetType::Nmos).unwrap();
        m.set_gate_on(true);

        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0), (NodeId::new(2), 1)].into_iter().collect();
        let branch_map = IndexMap::new();
        let ctx = StampContext::new(2, &node_map, &branch_map);
        let x = Vector::zeros(2); // gate node held at 0V: no analog drive whatsoever.

        for _ in 0..5 {
            m.realize_transition(&x, &ctx);
            assert!(m.gate_on(), "gate_on must not be overwritten by gate-node voltage");

            let mut mna = MnaSystem::new(2, 0);
            m.stamp(&mut mna, &ctx, 0.0);
            assert!((mna.matrix().get(0, 0) - 1.0 / 0.1).abs() < 1e-9, "channel must stay at r_on");
        }
    }
}
