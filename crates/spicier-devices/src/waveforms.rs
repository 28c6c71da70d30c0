//! Time-domain source waveforms (§4.2.5).
//!
//! Every waveform is additively scaled by `dc_scale ∈ [0,1]`, the knob the
//! nonlinear solver's source-stepping homotopy (§4.4 Tier 2) uses to ramp
//! independent sources from zero to their target value.

/// A source waveform. Unrecognized/placeholder waveforms fall back to DC.
#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    Dc {
        v: f64,
    },
    Sin {
        dc: f64,
        amp: f64,
        freq: f64,
        phase: f64,
        delay: f64,
        damping: f64,
    },
    Pulse {
        v1: f64,
        v2: f64,
        td: f64,
        tr: f64,
        tf: f64,
        pw: f64,
        per: f64,
    },
    Exp {
        v1: f64,
        v2: f64,
        td1: f64,
        tau1: f64,
        td2: f64,
        tau2: f64,
    },
    Ac {
        amp: f64,
        freq: f64,
        phase: f64,
    },
}

impl Waveform {
    pub fn dc(v: f64) -> Self {
        Waveform::Dc { v }
    }

    /// Evaluate the waveform at time `t`, scaled by `dc_scale`.
    ///
    /// `AC` has no meaningful time-domain value outside a small-signal sweep
    /// (out of scope per §1 Non-goals); it evaluates to its DC operating
    /// point of zero, matching the "unrecognized waveforms fall back to DC"
    /// rule for any case this core doesn't drive in the time domain.
    pub fn eval(&self, t: f64, dc_scale: f64) -> f64 {
        let raw = match *self {
            Waveform::Dc { v } => v,
            Waveform::Sin {
                dc,
                amp,
                freq,
                phase,
                delay,
                damping,
            } => {
                if t < delay {
                    dc
                } else {
                    let tau = t - delay;
                    let envelope = (-damping * tau).exp();
                    dc + amp * envelope * (2.0 * std::f64::consts::PI * freq * tau + phase).sin()
                }
            }
            Waveform::Pulse {
                v1,
                v2,
                td,
                tr,
                tf,
                pw,
                per,
            } => eval_pulse(v1, v2, td, tr, tf, pw, per, t),
            Waveform::Exp {
                v1,
                v2,
                td1,
                tau1,
                td2,
                tau2,
            } => {
                if t < td1 {
                    v1
                } else if t < td2 {
                    v1 + (v2 - v1) * (1.0 - (-(t - td1) / tau1).exp())
                } else {
                    let rise = v1 + (v2 - v1) * (1.0 - (-(t - td1) / tau1).exp());
                    rise + (v1 - v2) * (1.0 - (-(t - td2) / tau2).exp())
                }
            }
            Waveform::Ac { .. } => 0.0,
        };
        raw * dc_scale
    }
}

fn eval_pulse(v1: f64, v2: f64, td: f64, tr: f64, tf: f64, pw: f64, per: f64, t: f64) -> f64 {
    if t < td {
        return v1;
    }
    let tau = if per > 0.0 {
        (t - td) % per
    } else {
        t - td
    };
    if tau < tr {
        if tr <= 0.0 {
            v2
        } else {
            v1 + (v2 - v1) * (tau / tr)
        }
    } else if tau < tr + pw {
        v2
    } else if tau < tr + pw + tf {
        if tf <= 0.0 {
            v1
        } else {
            v2 + (v1 - v2) * ((tau - tr - pw) / tf)
        }
    } else {
        v1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_scale_applies_additively() {
        let w = Waveform::dc(5.0);
        assert_eq!(w.eval(0.0, 1.0), 5.0);
        assert_eq!(w.eval(0.0, 0.5), 2.5);
        assert_eq!(w.eval(0.0, 0.0), 0.0);
    }

    #[test]
    fn sin_starts_at_dc_before_delay() {
        let w = Waveform::Sin {
            dc: 1.0,
            amp: 2.0,
            freq: 1e3,
            phase: 0.0,
            delay: 1e-3,
            damping: 0.0,
        };
        assert_eq!(w.eval(0.0, 1.0), 1.0);
    }

    #[test]
    fn pulse_rises_and_falls() {
        let w = Waveform::Pulse {
            v1: 0.0,
            v2: 1.0,
            td: 0.0,
            tr: 1e-9,
            tf: 1e-9,
            pw: 5e-6,
            per: 10e-6,
        };
        assert_eq!(w.eval(0.0, 1.0), 0.0);
        assert!((w.eval(2e-6, 1.0) - 1.0).abs() < 1e-9);
        assert!((w.eval(9e-6, 1.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn unrecognized_ac_falls_back_to_zero_in_time_domain() {
        let w = Waveform::Ac {
            amp: 1.0,
            freq: 60.0,
            phase: 0.0,
        };
        assert_eq!(w.eval(1.0, 1.0), 0.0);
    }

    #[test]
    fn exp_approaches_v2_then_v1() {
        let w = Waveform::Exp {
            v1: 0.0,
            v2: 5.0,
            td1: 0.0,
            tau1: 1e-6,
            td2: 10e-6,
            tau2: 1e-6,
        };
        assert!(w.eval(5e-6, 1.0) > 4.9);
    }
}
