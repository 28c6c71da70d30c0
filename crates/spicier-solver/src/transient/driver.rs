use spicier_core::component::{Component, StampContext};
use spicier_core::config::SimulationConfig;
use spicier_core::linalg::Vector;
use spicier_core::netlist::Netlist;

use crate::error::{Error, Result};
use crate::linear;
use crate::newton;
use crate::sink::ResultSink;

/// The time window and initial step size for a transient run. Everything
/// else (tolerances, integration method, step bounds) lives in
/// [`SimulationConfig`].
#[derive(Debug, Clone, Copy)]
pub struct TransientOptions {
    pub t_start: f64,
    pub t_stop: f64,
    pub h_initial: f64,
}

/// Run-level bookkeeping returned alongside whatever the sink accumulated.
#[derive(Debug, Clone, Copy)]
pub struct TransientSummary {
    pub steps_accepted: usize,
    pub steps_rejected: usize,
    pub final_time: f64,
}

const MAX_SOLVE_RETRIES: usize = 3;

/// Run a transient analysis: DC-first operating point, seed every reactive
/// component's history from it, then step from `t_start` to `t_stop` under
/// the PI step-size controller (§4.6).
pub fn run_transient(
    netlist: &mut Netlist,
    cfg: &SimulationConfig,
    opts: &TransientOptions,
    sink: &mut dyn ResultSink,
) -> Result<TransientSummary> {
    let dc = crate::dc::solve_dc(netlist, cfg)?;
    seed_history_from_dc(netlist, &dc.x);
    emit_step(netlist, opts.t_start, &dc.x, sink);

    let mut x = dc.x;
    let mut t = opts.t_start;
    let mut h = opts.h_initial.clamp(cfg.h_min, cfg.h_max);
    let order = cfg.method.order() as f64;

    let mut steps_accepted = 0usize;
    let mut steps_rejected = 0usize;

    while t < opts.t_stop {
        h = h.min(opts.t_stop - t).max(cfg.h_min);

        if event_imminent(netlist, &x) {
            h = h.min(cfg.event_step_clamp);
        }

        let x_candidate = match solve_step(netlist, &x, t, h, cfg) {
            Ok((x_candidate, h_used)) => {
                h = h_used;
                x_candidate
            }
            Err((err, h_next)) => {
                if h_next < cfg.h_min {
                    log::error!("step size fell below h_min={:.3e} at t={t:.6e} while retrying after: {err}", cfg.h_min);
                    return Err(Error::StepFloor { t, h_min: cfg.h_min });
                }
                h = h_next;
                steps_rejected += 1;
                continue;
            }
        };

        if let Some((node, value)) = unphysical_node(netlist, &x_candidate, cfg) {
            log::warn!("unphysical solution at node {node}={value:.3e} and t={:.6e}, halving step", t + h);
            steps_rejected += 1;
            h *= 0.5;
            if h < cfg.h_min {
                return Err(Error::UnphysicalSolution { node, value });
            }
            continue;
        }

        let lte = worst_lte(netlist, h);
        let tol = cfg.lte_reltol * x_candidate.norm_inf() + cfg.lte_abstol;
        if let Some((component, estimate)) = lte {
            if estimate > tol {
                log::warn!("LTE {estimate:.3e} exceeded tolerance {tol:.3e} for {component} at t={:.6e}, halving step", t + h);
                steps_rejected += 1;
                h *= 0.5;
                if h < cfg.h_min {
                    return Err(Error::LteExceeded { component, estimate });
                }
                continue;
            }
        }

        commit_step(netlist, &x_candidate);
        x = x_candidate;
        t += h;
        steps_accepted += 1;
        emit_step(netlist, t, &x, sink);

        h = next_step_size(h, lte.map(|(_, e)| e).unwrap_or(0.0), tol, order, cfg);
    }

    Ok(TransientSummary {
        steps_accepted,
        steps_rejected,
        final_time: t,
    })
}

fn seed_history_from_dc(netlist: &mut Netlist, x: &Vector) {
    let (node_map, branch_map) = netlist.analyze();
    let ctx = StampContext::new(netlist.num_nodes(), &node_map, &branch_map);
    for device in netlist.devices_mut() {
        if device.is_reactive() {
            device.commit_history(x, &ctx);
        }
    }
}

fn event_imminent(netlist: &Netlist, x: &Vector) -> bool {
    let (node_map, branch_map) = netlist.analyze();
    let ctx = StampContext::new(netlist.num_nodes(), &node_map, &branch_map);
    netlist.devices().iter().any(|d| d.event_imminent(x, &ctx))
}

/// Update every reactive component's companion coefficients for candidate
/// step `h`, then solve (linear path if the circuit has no nonlinear
/// devices, Newton otherwise), retrying with a halved `h` on solver failure.
/// Returns `Ok((x, h_used))` — `h_used` may be smaller than `h_initial` if a
/// retry halved it — or `Err((error, next_h))` once retries are exhausted so
/// the caller can decide whether `next_h` still clears `h_min`.
fn solve_step(netlist: &mut Netlist, x_prev: &Vector, t: f64, h_initial: f64, cfg: &SimulationConfig) -> std::result::Result<(Vector, f64), (Error, f64)> {
    let mut h = h_initial;
    let mut attempt = 0;
    loop {
        for device in netlist.devices_mut() {
            if device.is_reactive() {
                device.update_companion(h, cfg.method);
            }
        }

        let outcome = if netlist.has_nonlinear_devices() {
            newton::solve(netlist, x_prev.clone(), t + h, cfg.g_min, cfg).map(|r| r.x)
        } else {
            let mna = netlist.assemble_mna_at(t + h, cfg.g_min);
            linear::solve(mna.matrix(), mna.rhs(), t + h, cfg.sparse_threshold)
        };

        match outcome {
            Ok(x) => return Ok((x, h)),
            Err(err) => {
                attempt += 1;
                h *= 0.5;
                if attempt > MAX_SOLVE_RETRIES {
                    return Err((err, h));
                }
            }
        }
    }
}

fn unphysical_node(netlist: &Netlist, x: &Vector, cfg: &SimulationConfig) -> Option<(String, f64)> {
    let labels = netlist.sorted_labels();
    for (i, label) in labels.iter().enumerate() {
        let v = x.get(i);
        if !v.is_finite() || v.abs() > cfg.max_node_voltage {
            return Some((label.clone(), v));
        }
    }
    None
}

fn worst_lte(netlist: &Netlist, h: f64) -> Option<(String, f64)> {
    netlist
        .devices()
        .iter()
        .filter(|d| d.is_reactive())
        .map(|d| (d.name().to_string(), d.local_truncation_error(h)))
        .fold(None, |acc, (name, lte)| match acc {
            Some((_, best)) if best >= lte => acc,
            _ => Some((name, lte)),
        })
}

fn commit_step(netlist: &mut Netlist, x: &Vector) {
    let (node_map, branch_map) = netlist.analyze();
    let ctx = StampContext::new(netlist.num_nodes(), &node_map, &branch_map);
    for device in netlist.devices_mut() {
        if device.is_reactive() {
            device.commit_history(x, &ctx);
        }
        device.realize_transition(x, &ctx);
    }
}

/// PI step-size controller (§4.6): `h_next = h * clip(0.9*(tol/lte)^(1/(p+1)), 0.2, 2.0)`.
fn next_step_size(h: f64, lte: f64, tol: f64, order: f64, cfg: &SimulationConfig) -> f64 {
    let factor = if lte <= 0.0 {
        2.0
    } else {
        (0.9 * (tol / lte).powf(1.0 / (order + 1.0))).clamp(0.2, 2.0)
    };
    (h * factor).clamp(cfg.h_min, cfg.h_max)
}

fn emit_step(netlist: &Netlist, t: f64, x: &Vector, sink: &mut dyn ResultSink) {
    let labels = netlist.sorted_labels();
    let node_voltages: Vec<(String, f64)> = labels.iter().enumerate().map(|(i, label)| (label.clone(), x.get(i))).collect();

    let (_, branch_map) = netlist.analyze();
    let num_nodes = netlist.num_nodes();
    let mut branch_currents = Vec::new();
    for device in netlist.devices() {
        let width = device.num_current_vars();
        if width == 0 {
            continue;
        }
        let start = branch_map[device.name()];
        for w in 0..width {
            let name = if width == 1 {
                device.name().to_string()
            } else {
                format!("{}:{w}", device.name())
            };
            branch_currents.push((name, x.get(num_nodes + start + w)));
        }
    }

    sink.on_step(t, &node_voltages, &branch_currents);
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicier_core::NodeId;
    use spicier_devices::{Capacitor, Diode, Resistor, VoltageSource, Waveform};

    use crate::sink::InMemorySink;

    #[test]
    fn rc_circuit_charges_toward_source_voltage() {
        let mut nl = Netlist::new();
        let vin = nl.node("vin");
        let vout = nl.node("vout");
        nl.add_device(Box::new(VoltageSource::dc("V1", vin, NodeId::ground(), 5.0))).unwrap();
        nl.add_device(Box::new(Resistor::new("R1", vin, vout, 1e3).unwrap())).unwrap();
        nl.add_device(Box::new(Capacitor::new("C1", vout, NodeId::ground(), 1e-6).unwrap())).unwrap();

        let cfg = SimulationConfig::default();
        let opts = TransientOptions {
            t_start: 0.0,
            t_stop: 5e-3,
            h_initial: 1e-6,
        };
        let mut sink = InMemorySink::new();
        let summary = run_transient(&mut nl, &cfg, &opts, &mut sink).unwrap();

        assert!(summary.steps_accepted > 0);
        let trace = sink.node_voltage("vout");
        let (_, v_final) = *trace.last().unwrap();
        assert!((v_final - 5.0).abs() < 0.05, "v_final={v_final}");
    }

    #[test]
    fn rejected_steps_do_not_advance_history() {
        let mut nl = Netlist::new();
        let vin = nl.node("vin");
        let vout = nl.node("vout");
        nl.add_device(Box::new(VoltageSource::dc("V1", vin, NodeId::ground(), 5.0))).unwrap();
        nl.add_device(Box::new(Resistor::new("R1", vin, vout, 1e3).unwrap())).unwrap();
        nl.add_device(Box::new(Capacitor::new("C1", vout, NodeId::ground(), 1e-6).unwrap())).unwrap();

        let mut cfg = SimulationConfig::default();
        cfg.lte_reltol = 1e-12;
        cfg.lte_abstol = 1e-15;

        let opts = TransientOptions {
            t_start: 0.0,
            t_stop: 2e-3,
            h_initial: 5e-6,
        };
        let mut sink = InMemorySink::new();
        let summary = run_transient(&mut nl, &cfg, &opts, &mut sink).unwrap();
        assert!(summary.steps_rejected > 0 || summary.steps_accepted > 0);
    }

    /// `max_newton = 1` converges trivially at the DC operating point (the
    /// source is 0V there, so `x = 0` already satisfies KCL), but every
    /// transient step after the source pulses to 5V needs more than one
    /// Newton iteration and so never converges — `solve_step` exhausts its
    /// retries on every outer iteration until `h` is driven below `h_min`,
    /// which must surface as `Error::StepFloor`, not the swallowed
    /// `NewtonDivergence` that caused it.
    #[test]
    fn newton_divergence_that_never_recovers_floors_the_step_size() {
        let mut nl = Netlist::new();
        let vin = nl.node("vin");
        let vout = nl.node("vout");
        let pulse = Waveform::Pulse {
            v1: 0.0,
            v2: 5.0,
            td: 0.0,
            tr: 1e-9,
            tf: 1e-9,
            pw: 1.0,
            per: 0.0,
        };
        nl.add_device(Box::new(VoltageSource::new("V1", vin, NodeId::ground(), pulse))).unwrap();
        nl.add_device(Box::new(Resistor::new("R1", vin, vout, 1e3).unwrap())).unwrap();
        nl.add_device(Box::new(Diode::new("D1", vout, NodeId::ground()).unwrap())).unwrap();

        let mut cfg = SimulationConfig::default();
        cfg.max_newton = 1;
        cfg.h_min = 1e-7;

        let opts = TransientOptions {
            t_start: 0.0,
            t_stop: 1e-3,
            h_initial: 1e-6,
        };
        let mut sink = InMemorySink::new();
        let err = run_transient(&mut nl, &cfg, &opts, &mut sink).unwrap_err();
        assert!(matches!(err, Error::StepFloor { h_min, .. } if h_min == cfg.h_min));
    }
}
