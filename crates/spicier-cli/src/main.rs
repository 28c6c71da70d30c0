//! Thin demonstration binary: run DC operating-point or transient analysis
//! against one of a handful of hand-assembled canonical circuits (§6
//! EXPANSION). There is no netlist-text front-end in this workspace — the
//! programmatic `Device` construction API is the documented entry point,
//! and this binary exercises it the same way a parser-backed frontend
//! eventually would.

mod demos;
mod sink;

use std::path::PathBuf;

use clap::Parser;
use spicier_core::component::IntegrationMethod;
use spicier_core::config::SimulationConfig;
use spicier_solver::transient::{run_transient, TransientOptions};
use spicier_solver::{solve_dc, Error as SolverError};

use sink::WriterSink;

/// Run a canonical circuit through the Spicier solver core.
#[derive(Parser, Debug)]
#[command(name = "spicier", version, about)]
struct Args {
    /// Circuit to simulate: rc, rl, rectifier, lc, transformer.
    circuit: String,

    /// Integration method: backward-euler, trapezoidal, bdf2, or
    /// gen-alpha:<rho_inf> (e.g. gen-alpha:0.8).
    #[arg(long, default_value = "trapezoidal")]
    method: String,

    /// Stop time in seconds. Defaults to a value sensible for the chosen
    /// circuit's natural time constant if omitted.
    #[arg(long)]
    tstop: Option<f64>,

    /// Initial time step in seconds.
    #[arg(long)]
    tstep: Option<f64>,

    /// Only solve the DC operating point; skip the transient sweep.
    #[arg(long)]
    dc_only: bool,

    /// Write results here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_method(s: &str) -> anyhow::Result<IntegrationMethod> {
    if let Some(rho) = s.strip_prefix("gen-alpha:") {
        let rho_inf: f64 = rho.parse().map_err(|_| anyhow::anyhow!("invalid rho_inf '{rho}' for gen-alpha"))?;
        return Ok(IntegrationMethod::GeneralizedAlpha { rho_inf });
    }
    match s {
        "backward-euler" => Ok(IntegrationMethod::BackwardEuler),
        "trapezoidal" => Ok(IntegrationMethod::Trapezoidal),
        "bdf2" => Ok(IntegrationMethod::Bdf2),
        other => anyhow::bail!("unknown integration method '{other}' (expected backward-euler, trapezoidal, bdf2, or gen-alpha:<rho_inf>)"),
    }
}

/// Time-scale defaults per demo, so `--tstop`/`--tstep` can be omitted for a
/// quick look.
fn default_window(circuit: &str) -> (f64, f64) {
    match circuit {
        "rc" => (5e-3, 1e-6),
        "rl" => (8e-5, 1e-7),
        "rectifier" => (1.5e-3, 5e-7),
        "lc" => (6e-3, 3e-6),
        "transformer" => (5e-7, 1e-9),
        _ => (1e-3, 1e-6),
    }
}

fn main() {
    let args = Args::parse();
    env_logger::init();

    match run(&args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = if err.downcast_ref::<SolverError>().is_some() { 1 } else { 2 };
            std::process::exit(code);
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let demo = demos::build(&args.circuit)?;
    let mut netlist = demo.netlist;

    let method = parse_method(&args.method)?;
    let mut cfg = SimulationConfig::default();
    cfg.method = method;

    let (default_tstop, default_tstep) = default_window(&args.circuit);
    let mut writer = WriterSink::new(args.output.as_deref())?;

    if args.dc_only {
        let result = solve_dc(&mut netlist, &cfg).map_err(anyhow::Error::from)?;
        writer.write_dc(&netlist, &result.x)?;
        if let Some(v) = writer.last_value(&demo.probe_node) {
            log::info!("probe node '{}' settled at {v:.6e} V", demo.probe_node);
        }
        return Ok(());
    }

    let opts = TransientOptions {
        t_start: 0.0,
        t_stop: args.tstop.unwrap_or(default_tstop),
        h_initial: args.tstep.unwrap_or(default_tstep),
    };

    let summary = run_transient(&mut netlist, &cfg, &opts, &mut writer).map_err(anyhow::Error::from)?;
    log::info!(
        "{} steps accepted, {} rejected, final t={:.6e}",
        summary.steps_accepted,
        summary.steps_rejected,
        summary.final_time
    );
    if let Some(v) = writer.last_value(&demo.probe_node) {
        log::info!("probe node '{}' final value {v:.6e}", demo.probe_node);
    }
    Ok(())
}
