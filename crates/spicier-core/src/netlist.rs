//! The two-pass MNA assembler (§4.3).
//!
//! Pass 1 (Analyze) walks the registered component set, assigns deterministic
//! node and branch-current indices; Pass 2 (Stamp) zeroes the system, floors
//! every non-ground diagonal with `g_min`, then asks each component to stamp.
//! The assembler never interprets component semantics — it only routes
//! additive contributions, which keeps the model set open-ended.

use indexmap::IndexMap;

use crate::component::{Component, IntegrationMethod, StampContext};
use crate::error::{Error, Result};
use crate::mna::MnaSystem;
use crate::node::NodeId;

/// Registers node labels, owns the component set, and runs the two-pass
/// assembly protocol.
pub struct Netlist {
    /// Label -> handle, in first-seen order (not yet the final sorted index).
    label_to_id: IndexMap<String, NodeId>,
    /// Handle.as_u32() - 1 -> label, for the reverse lookup Pass 1 needs to sort by.
    labels: Vec<String>,
    devices: Vec<Box<dyn Component>>,
}

impl Default for Netlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Netlist {
    pub fn new() -> Self {
        Netlist {
            label_to_id: IndexMap::new(),
            labels: Vec::new(),
            devices: Vec::new(),
        }
    }

    /// Resolve (registering if new) a node label to a `NodeId` handle.
    ///
    /// `"0"` and `"gnd"` both resolve to the reference node regardless of
    /// registration order (§6 ground-node convention).
    pub fn node(&mut self, label: &str) -> NodeId {
        if label == "0" || label == "gnd" {
            return NodeId::ground();
        }
        if let Some(&id) = self.label_to_id.get(label) {
            return id;
        }
        let id = NodeId::new((self.labels.len() + 1) as u32);
        self.labels.push(label.to_string());
        self.label_to_id.insert(label.to_string(), id);
        id
    }

    /// Register a component. Component names must be unique; a duplicate
    /// name is a fatal construction-time error rather than a silent
    /// shadowing, since branch-map lookups are keyed by name.
    pub fn add_device(&mut self, device: Box<dyn Component>) -> Result<()> {
        let name = device.name().to_string();
        if self.devices.iter().any(|d| d.name() == name) {
            return Err(Error::DuplicateNode(name));
        }
        self.devices.push(device);
        Ok(())
    }

    pub fn devices(&self) -> &[Box<dyn Component>] {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut [Box<dyn Component>] {
        &mut self.devices
    }

    pub fn has_nonlinear_devices(&self) -> bool {
        self.devices.iter().any(|d| d.is_nonlinear())
    }

    pub fn has_reactive_devices(&self) -> bool {
        self.devices.iter().any(|d| d.is_reactive())
    }

    /// Number of non-reference nodes (Pass 1 result, §3).
    pub fn num_nodes(&self) -> usize {
        self.labels.len()
    }

    /// Number of branch-current unknowns (Pass 1 result, §3).
    pub fn num_current_vars(&self) -> usize {
        self.devices.iter().map(|d| d.num_current_vars()).sum()
    }

    /// Non-reference node labels in the same sorted order `analyze()` assigns
    /// indices in — i.e. `sorted_labels()[i]` is the label of node index `i`.
    /// Used by result sinks to report `node_voltages` by label (§6).
    pub fn sorted_labels(&self) -> Vec<String> {
        let mut labels = self.labels.clone();
        labels.sort();
        labels
    }

    /// Branch-owning component names in the same sorted order `analyze()`
    /// allocates branch rows in. A multi-winding component's name appears
    /// once even though it may own more than one contiguous branch row.
    pub fn sorted_branch_names(&self) -> Vec<String> {
        let mut names: Vec<&str> = self
            .devices
            .iter()
            .filter(|d| d.num_current_vars() > 0)
            .map(|d| d.name())
            .collect();
        names.sort();
        names.into_iter().map(|s| s.to_string()).collect()
    }

    /// Pass 1 (Analyze): sort non-reference node labels for deterministic
    /// Jacobian sparsity, then sort branch-needing component names, and
    /// build the two index maps.
    pub fn analyze(&self) -> (IndexMap<NodeId, usize>, IndexMap<String, usize>) {
        let mut sorted_labels: Vec<&String> = self.labels.iter().collect();
        sorted_labels.sort();
        let mut node_map = IndexMap::new();
        for (idx, label) in sorted_labels.iter().enumerate() {
            let id = self.label_to_id[*label];
            node_map.insert(id, idx);
        }

        let mut branch_owners: Vec<(&str, usize)> = self
            .devices
            .iter()
            .filter(|d| d.num_current_vars() > 0)
            .map(|d| (d.name(), d.num_current_vars()))
            .collect();
        branch_owners.sort_by_key(|(name, _)| *name);
        let mut branch_map = IndexMap::new();
        let mut next = 0usize;
        for (name, width) in branch_owners {
            branch_map.insert(name.to_string(), next);
            next += width;
        }

        (node_map, branch_map)
    }

    /// Build a [`StampContext`] and an empty [`MnaSystem`] from the current
    /// (node_map, branch_map), ready for Pass 2.
    fn new_system<'a>(
        &self,
        node_map: &'a IndexMap<NodeId, usize>,
        branch_map: &'a IndexMap<String, usize>,
    ) -> (MnaSystem, StampContext<'a>) {
        let num_nodes = self.num_nodes();
        let num_current_vars = self.num_current_vars();
        let mna = MnaSystem::new(num_nodes, num_current_vars);
        let ctx = StampContext::new(num_nodes, node_map, branch_map);
        (mna, ctx)
    }

    /// Pass 2 (Stamp): assemble the linear MNA system at time `t` using each
    /// component's current internal state (companion coefficients must
    /// already be primed by the caller via `update_companion`/`prime_for_dc`
    /// before calling this for reactive circuits).
    ///
    /// Unknown/incompatible component types never reach this layer: the
    /// `Device` enum's match is exhaustive, so there is no string-keyed
    /// device-type dispatch here for an unsupported type to fail at.
    pub fn assemble_mna_at(&self, t: f64, g_min: f64) -> MnaSystem {
        let (node_map, branch_map) = self.analyze();
        let (mut mna, ctx) = self.new_system(&node_map, &branch_map);
        mna.add_gmin_floor(g_min);
        for device in &self.devices {
            device.stamp(&mut mna, &ctx, t);
        }
        mna
    }

    /// Convenience used by simple linear-only callers (DC at `t=0`, default `g_min`).
    pub fn assemble_mna(&self) -> MnaSystem {
        self.assemble_mna_at(0.0, crate::config::SimulationConfig::default().g_min)
    }
}
