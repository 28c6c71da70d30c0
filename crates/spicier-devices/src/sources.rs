//! Independent sources (§4.2.5, §4.2.6).

use spicier_core::component::{Component, StampContext};
use spicier_core::mna::MnaSystem;
use spicier_core::NodeId;

use crate::waveforms::Waveform;

/// Independent voltage source. Adds one branch-current unknown; stamps the
/// incidence pattern in both the node rows (KCL) and the source row (KVL),
/// plus `v(t)` into the RHS of the source row.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub name: String,
    pub pos: NodeId,
    pub neg: NodeId,
    pub waveform: Waveform,
    /// Source-stepping homotopy knob (§4.4 Tier 2), `1.0` outside DC ramp-up.
    dc_scale: f64,
}

impl VoltageSource {
    pub fn new(name: impl Into<String>, pos: NodeId, neg: NodeId, waveform: Waveform) -> Self {
        VoltageSource {
            name: name.into(),
            pos,
            neg,
            waveform,
            dc_scale: 1.0,
        }
    }

    pub fn dc(name: impl Into<String>, pos: NodeId, neg: NodeId, v: f64) -> Self {
        Self::new(name, pos, neg, Waveform::dc(v))
    }

    pub fn set_dc_scale(&mut self, dc_scale: f64) {
        self.dc_scale = dc_scale;
    }

    pub fn dc_scale(&self) -> f64 {
        self.dc_scale
    }
}

impl Component for VoltageSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.pos, self.neg]
    }

    fn needs_current_var(&self) -> bool {
        true
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, t: f64) {
        let pos = ctx.node_index(self.pos);
        let neg = ctx.node_index(self.neg);
        let branch = ctx.branch_row(&self.name).expect("voltage source registered a branch var");

        mna.stamp_branch_incidence(pos, neg, branch);
        mna.rhs_mut().add_at(branch, self.waveform.eval(t, self.dc_scale));
    }

    fn set_dc_scale(&mut self, scale: f64) {
        self.dc_scale = scale;
    }
}

/// Independent current source. No new unknown; injects `i(t)` on the node
/// RHS — positive on `from`, negative on `to` (§6 sign convention).
#[derive(Debug, Clone)]
pub struct CurrentSource {
    pub name: String,
    pub from: NodeId,
    pub to: NodeId,
    pub waveform: Waveform,
    dc_scale: f64,
}

impl CurrentSource {
    pub fn new(name: impl Into<String>, from: NodeId, to: NodeId, waveform: Waveform) -> Self {
        CurrentSource {
            name: name.into(),
            from,
            to,
            waveform,
            dc_scale: 1.0,
        }
    }

    pub fn dc(name: impl Into<String>, from: NodeId, to: NodeId, i: f64) -> Self {
        Self::new(name, from, to, Waveform::dc(i))
    }

    pub fn set_dc_scale(&mut self, dc_scale: f64) {
        self.dc_scale = dc_scale;
    }

    pub fn dc_scale(&self) -> f64 {
        self.dc_scale
    }
}

impl Component for CurrentSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.from, self.to]
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, t: f64) {
        let from = ctx.node_index(self.from);
        let to = ctx.node_index(self.to);
        mna.stamp_current_source(from, to, self.waveform.eval(t, self.dc_scale));
    }

    fn set_dc_scale(&mut self, scale: f64) {
        self.dc_scale = scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn voltage_source_stamps_branch_and_rhs() {
        let v = VoltageSource::dc("V1", NodeId::new(1), NodeId::ground(), 5.0);
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0)].into_iter().collect();
        let branch_map: IndexMap<String, usize> = [("V1".to_string(), 0)].into_iter().collect();
        let ctx = StampContext::new(1, &node_map, &branch_map);
        let mut mna = MnaSystem::new(1, 1);
        v.stamp(&mut mna, &ctx, 0.0);

        assert_eq!(mna.matrix().get(0, 1), 1.0);
        assert_eq!(mna.matrix().get(1, 0), 1.0);
        assert_eq!(mna.rhs().get(1), 5.0);
    }

    #[test]
    fn dc_scale_ramps_source_stepping() {
        let mut v = VoltageSource::dc("V1", NodeId::new(1), NodeId::ground(), 10.0);
        v.set_dc_scale(0.25);
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0)].into_iter().collect();
        let branch_map: IndexMap<String, usize> = [("V1".to_string(), 0)].into_iter().collect();
        let ctx = StampContext::new(1, &node_map, &branch_map);
        let mut mna = MnaSystem::new(1, 1);
        v.stamp(&mut mna, &ctx, 0.0);
        assert_eq!(mna.rhs().get(1), 2.5);
    }

    #[test]
    fn current_source_sign_convention_preserved() {
        let i = CurrentSource::dc("I1", NodeId::new(1), NodeId::new(2), 2.0);
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0), (NodeId::new(2), 1)].into_iter().collect();
        let branch_map = IndexMap::new();
        let ctx = StampContext::new(2, &node_map, &branch_map);
        let mut mna = MnaSystem::new(2, 0);
        i.stamp(&mut mna, &ctx, 0.0);
        assert_eq!(mna.rhs().get(0), -2.0);
        assert_eq!(mna.rhs().get(1), 2.0);
    }
}
