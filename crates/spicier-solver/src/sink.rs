//! Result sink (§6): a pluggable per-step callback so long transient runs
//! don't have to buffer every waveform sample in memory if the caller
//! doesn't want them to.

/// Called exactly once per accepted transient step, in monotonic time order.
/// Node voltages and branch currents are reported by label rather than raw
/// MNA index, so a sink never needs to know the assembler's internal
/// ordering (§6 result sink interface).
pub trait ResultSink {
    fn on_step(&mut self, t: f64, node_voltages: &[(String, f64)], branch_currents: &[(String, f64)]);
}

/// One accepted step's snapshot, as recorded by [`InMemorySink`].
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub t: f64,
    pub node_voltages: Vec<(String, f64)>,
    pub branch_currents: Vec<(String, f64)>,
}

/// Accumulates every accepted step in memory. The simplest possible sink,
/// suitable for the canonical-circuit demos and for tests; a streaming sink
/// (writing straight to a file/stdout as each step lands) implements the
/// same trait without this type's memory cost.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    pub steps: Vec<StepRecord>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `(t, voltage)` trace for a single node label, in step order.
    pub fn node_voltage(&self, label: &str) -> Vec<(f64, f64)> {
        self.steps
            .iter()
            .filter_map(|s| {
                s.node_voltages
                    .iter()
                    .find(|(name, _)| name == label)
                    .map(|(_, v)| (s.t, *v))
            })
            .collect()
    }

    /// The `(t, current)` trace for a single branch name, in step order.
    pub fn branch_current(&self, label: &str) -> Vec<(f64, f64)> {
        self.steps
            .iter()
            .filter_map(|s| {
                s.branch_currents
                    .iter()
                    .find(|(name, _)| name == label)
                    .map(|(_, i)| (s.t, *i))
            })
            .collect()
    }
}

impl ResultSink for InMemorySink {
    fn on_step(&mut self, t: f64, node_voltages: &[(String, f64)], branch_currents: &[(String, f64)]) {
        self.steps.push(StepRecord {
            t,
            node_voltages: node_voltages.to_vec(),
            branch_currents: branch_currents.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_accumulates_in_step_order() {
        let mut sink = InMemorySink::new();
        sink.on_step(0.0, &[("vout".into(), 0.0)], &[]);
        sink.on_step(1e-6, &[("vout".into(), 0.5)], &[]);
        let trace = sink.node_voltage("vout");
        assert_eq!(trace, vec![(0.0, 0.0), (1e-6, 0.5)]);
    }

    #[test]
    fn missing_label_yields_empty_trace() {
        let mut sink = InMemorySink::new();
        sink.on_step(0.0, &[("vout".into(), 1.0)], &[]);
        assert!(sink.node_voltage("nope").is_empty());
    }
}
