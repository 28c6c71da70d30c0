//! Engineering-notation value parsing.
//!
//! Accepts `<number><opt-suffix>` where `<opt-suffix>` is a case-sensitive SI
//! prefix. `MEG` is matched before `M` (longest-suffix match): `M = mega`,
//! `m = milli`, `MEG = mega` (a SPICE convention the distilled spec pins down
//! explicitly rather than leaving to each netlist dialect's interpretation).

use crate::error::{Error, Result};

/// Suffixes ordered longest-first so `MEG` is tried before `M`.
const SUFFIXES: &[(&str, f64)] = &[
    ("MEG", 1e6),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("K", 1e3),
    ("k", 1e3),
    ("m", 1e-3),
    ("u", 1e-6),
    ("\u{b5}", 1e-6), // µ (micro sign)
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
];

/// Parse an engineering-notation value string, e.g. `"4.7k"`, `"10MEG"`, `"100p"`.
///
/// Whitespace is trimmed. A bare float with no suffix parses as-is. Unparseable
/// values fail with [`Error::InvalidValue`], carrying the offending field name
/// so construction-time errors stay component-identifying per §3/§7.
pub fn parse_value(raw: &str, component: &str, field: &str) -> Result<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(invalid(component, field, "empty value"));
    }

    for (suffix, multiplier) in SUFFIXES {
        if let Some(number) = s.strip_suffix(suffix) {
            let number = number.trim();
            return number
                .parse::<f64>()
                .map(|v| v * multiplier)
                .map_err(|_| invalid(component, field, &format!("not a number: {raw}")));
        }
    }

    s.parse::<f64>()
        .map_err(|_| invalid(component, field, &format!("not a number: {raw}")))
}

fn invalid(component: &str, field: &str, reason: &str) -> Error {
    Error::InvalidValue {
        component: component.to_string(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Temperature-corrected value: `value * (1 + tc1*dT + tc2*dT^2)`.
///
/// Applied once at component instantiation (§3), never re-evaluated per step.
/// `t_nominal`/`t_measured` default to 27.0 (room temperature) when the caller
/// has no explicit temperature data, making the correction a no-op by default.
pub fn temperature_correct(value: f64, tc1: f64, tc2: f64, t_nominal: f64, t_measured: f64) -> f64 {
    let dt = t_measured - t_nominal;
    value * (1.0 + tc1 * dt + tc2 * dt * dt)
}
