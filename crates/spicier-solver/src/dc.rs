//! DC operating point: three-tier homotopy (§4.4).
//!
//! Each tier is attempted only after the previous one fails outright; tier
//! 2 and 3 never run on circuits the plain Newton solve already handles.

use spicier_core::component::Component;
use spicier_core::config::SimulationConfig;
use spicier_core::linalg::Vector;
use spicier_core::netlist::Netlist;

use crate::error::{Error, Result};
use crate::newton::{self, NewtonResult};

/// Run the DC operating-point homotopy. Every reactive device is primed to
/// its DC limit (capacitor open, inductor short) before any attempt.
pub fn solve_dc(netlist: &mut Netlist, cfg: &SimulationConfig) -> Result<NewtonResult> {
    for device in netlist.devices_mut() {
        device.prime_for_dc();
    }

    let size = netlist.num_nodes() + netlist.num_current_vars();

    if let Ok(result) = newton::solve(netlist, Vector::zeros(size), 0.0, cfg.g_min, cfg) {
        return Ok(result);
    }
    log::warn!("DC tier 1 (plain Newton) failed to converge, trying source-stepping");

    if let Ok(result) = source_stepping(netlist, cfg) {
        return Ok(result);
    }
    log::warn!("DC tier 2 (source-stepping) failed to converge, trying Gmin-stepping");

    if let Ok(result) = gmin_stepping(netlist, cfg) {
        return Ok(result);
    }

    log::warn!("DC tier 3 (Gmin-stepping) failed; operating point not found");
    Err(Error::DcFailure)
}

/// Tier 2: ramp every independent source's `dc_scale` through `cfg.source_steps`
/// (typically `0.0..=1.0`), reusing each stage's converged point as the next
/// stage's Newton seed.
fn source_stepping(netlist: &mut Netlist, cfg: &SimulationConfig) -> Result<NewtonResult> {
    let size = netlist.num_nodes() + netlist.num_current_vars();
    let mut x = Vector::zeros(size);
    let mut last = None;

    for &scale in &cfg.source_steps {
        for device in netlist.devices_mut() {
            device.set_dc_scale(scale);
        }
        let result = newton::solve(netlist, x.clone(), 0.0, cfg.g_min, cfg)?;
        x = result.x.clone();
        last = Some(result);
    }

    for device in netlist.devices_mut() {
        device.set_dc_scale(1.0);
    }
    last.ok_or(Error::DcFailure)
}

/// Tier 3: ramp `g_min` geometrically from `cfg.g_min_start` down to
/// `cfg.g_min` over `cfg.g_min_steps` stages, regularizing floating or
/// weakly-connected nodes until the true `g_min` is reached.
fn gmin_stepping(netlist: &mut Netlist, cfg: &SimulationConfig) -> Result<NewtonResult> {
    let size = netlist.num_nodes() + netlist.num_current_vars();
    let mut x = Vector::zeros(size);
    let mut last = None;

    let ratio = (cfg.g_min / cfg.g_min_start).powf(1.0 / cfg.g_min_steps as f64);
    let mut g = cfg.g_min_start;
    for _ in 0..=cfg.g_min_steps {
        let result = newton::solve(netlist, x.clone(), 0.0, g, cfg)?;
        x = result.x.clone();
        last = Some(result);
        g *= ratio;
    }
    last.ok_or(Error::DcFailure)
}
