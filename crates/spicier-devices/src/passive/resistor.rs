//! Linear resistor (§4.2.1).

use spicier_core::component::{Component, StampContext};
use spicier_core::mna::MnaSystem;
use spicier_core::units::temperature_correct;
use spicier_core::NodeId;

use crate::error::{Result, invalid};

/// Two-terminal linear resistor. `R <= 0` is rejected at construction (§4.2.1).
#[derive(Debug, Clone)]
pub struct Resistor {
    pub name: String,
    pub pos: NodeId,
    pub neg: NodeId,
    /// Temperature-corrected conductance, `1/R`.
    conductance: f64,
}

impl Resistor {
    pub fn new(name: impl Into<String>, pos: NodeId, neg: NodeId, resistance: f64) -> Result<Self> {
        Self::with_temperature(name, pos, neg, resistance, 0.0, 0.0, 27.0, 27.0)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_temperature(
        name: impl Into<String>,
        pos: NodeId,
        neg: NodeId,
        resistance: f64,
        tc1: f64,
        tc2: f64,
        t_nominal: f64,
        t_measured: f64,
    ) -> Result<Self> {
        let name = name.into();
        if !(resistance > 0.0) || !resistance.is_finite() {
            return Err(invalid(&name, "resistance", format!("must be > 0, got {resistance}")));
        }
        let corrected = temperature_correct(resistance, tc1, tc2, t_nominal, t_measured);
        Ok(Resistor {
            name,
            pos,
            neg,
            conductance: 1.0 / corrected,
        })
    }

    pub fn conductance(&self) -> f64 {
        self.conductance
    }
}

impl Component for Resistor {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.pos, self.neg]
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        mna.stamp_conductance(ctx.node_index(self.pos), ctx.node_index(self.neg), self.conductance);
    }
}
