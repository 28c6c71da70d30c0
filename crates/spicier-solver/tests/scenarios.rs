//! End-to-end scenario tests (§8): each scenario builds a small netlist by
//! hand and checks behavior against a closed-form or well-known result,
//! exercising the DC homotopy and transient driver together the way a
//! canonical textbook circuit would.

use spicier_core::component::IntegrationMethod;
use spicier_core::config::SimulationConfig;
use spicier_core::netlist::Netlist;
use spicier_core::NodeId;
use spicier_devices::{Capacitor, CoupledInductors, Diode, Inductor, Resistor, VoltageSource, Waveform, Winding};
use spicier_solver::sink::InMemorySink;
use spicier_solver::transient::{TransientOptions, run_transient};

fn cfg() -> SimulationConfig {
    SimulationConfig::default()
}

/// RC charging: V1 -- R -- node -- C -- GND, node should approach V1 with
/// time constant tau = R*C.
#[test]
fn rc_charging_reaches_source_voltage_with_expected_time_constant() {
    let mut nl = Netlist::new();
    let vin = nl.node("vin");
    let vout = nl.node("vout");
    nl.add_device(Box::new(VoltageSource::dc("V1", vin, NodeId::ground(), 5.0))).unwrap();
    nl.add_device(Box::new(Resistor::new("R1", vin, vout, 1e3).unwrap())).unwrap();
    nl.add_device(Box::new(Capacitor::new("C1", vout, NodeId::ground(), 1e-6).unwrap())).unwrap();

    let tau = 1e3 * 1e-6;
    let opts = TransientOptions { t_start: 0.0, t_stop: 5.0 * tau, h_initial: tau / 200.0 };
    let mut sink = InMemorySink::new();
    run_transient(&mut nl, &cfg(), &opts, &mut sink).unwrap();

    let trace = sink.node_voltage("vout");
    let at_tau = trace.iter().min_by(|a, b| (a.0 - tau).abs().total_cmp(&(b.0 - tau).abs())).unwrap();
    let expected_at_tau = 5.0 * (1.0 - (-1.0_f64).exp());
    assert!((at_tau.1 - expected_at_tau).abs() < 0.2, "V(tau)={} expected~{}", at_tau.1, expected_at_tau);

    let (_, v_final) = *trace.last().unwrap();
    assert!((v_final - 5.0).abs() < 0.05, "v_final={v_final}");
}

/// RL driven step: V1 -- R -- node -- L -- GND, branch current should
/// approach V1/R with time constant tau = L/R.
#[test]
fn rl_driven_step_current_approaches_steady_state() {
    let mut nl = Netlist::new();
    let vin = nl.node("vin");
    let vmid = nl.node("vmid");
    nl.add_device(Box::new(VoltageSource::dc("V1", vin, NodeId::ground(), 10.0))).unwrap();
    nl.add_device(Box::new(Resistor::new("R1", vin, vmid, 100.0).unwrap())).unwrap();
    nl.add_device(Box::new(Inductor::new("L1", vmid, NodeId::ground(), 1e-3).unwrap())).unwrap();

    let tau = 1e-3 / 100.0;
    let opts = TransientOptions { t_start: 0.0, t_stop: 8.0 * tau, h_initial: tau / 100.0 };
    let mut sink = InMemorySink::new();
    run_transient(&mut nl, &cfg(), &opts, &mut sink).unwrap();

    let trace = sink.branch_current("L1");
    let (_, i_final) = *trace.last().unwrap();
    assert!((i_final - 0.1).abs() < 0.01, "i_final={i_final} expected~0.1");
}

/// Half-wave rectifier: a sinusoidal source into a diode into an RC load
/// should clamp the negative half-cycles near zero.
#[test]
fn half_wave_rectifier_clamps_negative_half_cycle() {
    let mut nl = Netlist::new();
    let vin = nl.node("vin");
    let vout = nl.node("vout");
    let sine = Waveform::Sin { dc: 0.0, amp: 5.0, freq: 1e3, phase: 0.0, delay: 0.0, damping: 0.0 };
    nl.add_device(Box::new(VoltageSource::new("V1", vin, NodeId::ground(), sine))).unwrap();
    nl.add_device(Box::new(Diode::new("D1", vin, vout).unwrap())).unwrap();
    nl.add_device(Box::new(Resistor::new("Rload", vout, NodeId::ground(), 1e4).unwrap())).unwrap();
    nl.add_device(Box::new(Capacitor::new("Cload", vout, NodeId::ground(), 1e-7).unwrap())).unwrap();

    let period = 1e-3;
    let opts = TransientOptions { t_start: 0.0, t_stop: 1.5 * period, h_initial: period / 2000.0 };
    let mut sink = InMemorySink::new();
    run_transient(&mut nl, &cfg(), &opts, &mut sink).unwrap();

    let trace = sink.node_voltage("vout");
    let min_v = trace.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max_v = trace.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    assert!(min_v > -0.5, "rectified output should stay near/above 0V, got min={min_v}");
    assert!(max_v > 3.5, "rectified peak should approach the source amplitude minus a diode drop, got max={max_v}");
}

/// LC resonance: an initially-charged capacitor in a loop with an inductor
/// oscillates at 1/(2*pi*sqrt(LC)); dominant FFT bin should land there.
#[test]
fn lc_tank_oscillates_at_expected_resonant_frequency() {
    use rustfft::{FftPlanner, num_complex::Complex};

    let inductance = 1e-3;
    let capacitance = 1e-6;
    let expected_freq = 1.0 / (2.0 * std::f64::consts::PI * (inductance * capacitance).sqrt());

    let mut nl = Netlist::new();
    let node = nl.node("tank");
    let mut cap = Capacitor::new("C1", node, NodeId::ground(), capacitance).unwrap();
    cap.set_initial_condition(5.0);
    nl.add_device(Box::new(cap)).unwrap();
    nl.add_device(Box::new(Inductor::new("L1", node, NodeId::ground(), inductance).unwrap())).unwrap();

    let period = 1.0 / expected_freq;
    let mut cfg = cfg();
    cfg.method = IntegrationMethod::Trapezoidal;
    let n_samples = 1024usize;
    let dt = (6.0 * period) / n_samples as f64;
    let opts = TransientOptions { t_start: 0.0, t_stop: 6.0 * period, h_initial: dt };
    let mut sink = InMemorySink::new();
    run_transient(&mut nl, &cfg, &opts, &mut sink).unwrap();

    let trace = sink.node_voltage("tank");
    // Resample onto a uniform grid for the FFT (the adaptive driver doesn't
    // emit evenly-spaced steps).
    let mut samples: Vec<Complex<f64>> = Vec::with_capacity(n_samples);
    for k in 0..n_samples {
        let t = k as f64 * dt;
        let v = interpolate(&trace, t);
        samples.push(Complex::new(v, 0.0));
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_samples);
    fft.process(&mut samples);

    let bin_hz = 1.0 / (n_samples as f64 * dt);
    let (peak_bin, _) = samples
        .iter()
        .take(n_samples / 2)
        .enumerate()
        .skip(1) // skip DC bin
        .max_by(|(_, a), (_, b)| a.norm().total_cmp(&b.norm()))
        .unwrap();
    let measured_freq = peak_bin as f64 * bin_hz;

    let rel_error = (measured_freq - expected_freq).abs() / expected_freq;
    assert!(rel_error < 0.1, "measured {measured_freq} Hz vs expected {expected_freq} Hz");
}

fn interpolate(trace: &[(f64, f64)], t: f64) -> f64 {
    if t <= trace[0].0 {
        return trace[0].1;
    }
    if t >= trace[trace.len() - 1].0 {
        return trace[trace.len() - 1].1;
    }
    let idx = trace.partition_point(|(ti, _)| *ti < t);
    let (t0, v0) = trace[idx - 1];
    let (t1, v1) = trace[idx];
    if (t1 - t0).abs() < 1e-300 {
        return v0;
    }
    v0 + (v1 - v0) * (t - t0) / (t1 - t0)
}

/// Coupled-inductor transformer: stepping the primary drive (after an
/// initial all-zero DC operating point) should induce a secondary-side
/// voltage spike while the primary current is still ramping.
#[test]
fn coupled_inductor_transformer_induces_secondary_voltage() {
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

    let opts = TransientOptions { t_start: 0.0, t_stop: 5e-7, h_initial: 1e-9 };
    let mut sink = InMemorySink::new();
    run_transient(&mut nl, &cfg(), &opts, &mut sink).unwrap();

    let trace = sink.node_voltage("sec");
    assert!(!trace.is_empty());
    let peak = trace.iter().map(|(_, v)| v.abs()).fold(0.0_f64, f64::max);
    assert!(peak > 0.1, "secondary should see a significant induced voltage during the primary step, got peak={peak}");
}

/// Diode reverse bias: with the anode held below the cathode, current
/// through the diode should sit at the (negative, Gmin-floored) leakage
/// level, never forward-conducting.
#[test]
fn diode_reverse_bias_current_stays_at_leakage_floor() {
    let mut nl = Netlist::new();
    let vneg = nl.node("vneg");
    nl.add_device(Box::new(VoltageSource::dc("V1", NodeId::ground(), vneg, 5.0))).unwrap();
    nl.add_device(Box::new(Diode::new("D1", vneg, NodeId::ground()).unwrap())).unwrap();
    nl.add_device(Box::new(Resistor::new("R1", vneg, NodeId::ground(), 1e6).unwrap())).unwrap();

    let result = spicier_solver::solve_dc(&mut nl, &cfg()).unwrap();
    let v_idx = nl.analyze().0[&vneg];
    let v = result.x.get(v_idx);
    assert!(v < 0.0, "anode should sit below cathode under reverse bias, got {v}");
}
