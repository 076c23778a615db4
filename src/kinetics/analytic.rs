//! Closed-form solutions for a constant dose rate.
//!
//! With Ḋ held constant both depletion laws are linear first-order ODEs:
//!
//!   O(t) = O_eq + (O₀ - O_eq)·exp(-λt)
//!
//! Proportional: λ = k·Ḋ + r, O_eq = r·b / λ
//! Linear:       λ = r,       O_eq = b - k·Ḋ / r  (floored at zero)
//!
//! Averaging the hyperbolic OER curve over such a trajectory only needs
//! ∫ dt / (O(t) + c), which also has a closed form. For the linear law the
//! integral is split at the time oxygen reaches zero.
//!
//! Reference: Petersson et al., IJROBP 2020, Appendix (cumulative OER)

use crate::config::{DepletionModel, KineticsParameters, OerCurveParameters};
use crate::error::{ensure_non_negative, ensure_positive, FlashError, Result};

/// Unclamped solution of the held-dose-rate ODE after `t` seconds
pub fn relax(kinetics: &KineticsParameters, o2: f64, dose_rate: f64, t: f64) -> f64 {
    let k = kinetics.depletion_per_Gy;
    let r = kinetics.recovery_per_sec;
    let b = kinetics.baseline_o2;

    match kinetics.model {
        DepletionModel::Proportional => {
            let lambda = k * dose_rate + r;
            if lambda <= 0.0 {
                return o2;
            }
            let o_eq = r * b / lambda;
            o_eq + (o2 - o_eq) * (-lambda * t).exp()
        }
        DepletionModel::Linear => {
            let unclamped = if r > 0.0 {
                let o_eq = b - k * dose_rate / r;
                o_eq + (o2 - o_eq) * (-r * t).exp()
            } else {
                o2 - k * dose_rate * t
            };
            // Once consumed, oxygen stays at zero while depletion outpaces recovery
            unclamped.max(0.0)
        }
    }
}

/// Oxygen at time `t` of a constant-rate exposure starting at `t = 0`
pub fn oxygen_at(time_sec: f64, dose_rate: f64, kinetics: &KineticsParameters) -> Result<f64> {
    kinetics.validate()?;
    ensure_non_negative("time_sec", time_sec)?;
    ensure_non_negative("dose_rate", dose_rate)?;
    Ok(relax(kinetics, kinetics.start_o2(), dose_rate, time_sec).clamp(0.0, kinetics.baseline_o2))
}

/// ∫₀^τ dt / (a + b·exp(-λt)), for a + b·exp(-λt) > 0 on [0, τ]
fn inverse_integral(a: f64, b: f64, lambda: f64, tau: f64) -> f64 {
    if tau <= 0.0 {
        return 0.0;
    }
    if lambda <= 0.0 || b == 0.0 {
        return tau / (a + b);
    }
    if a.abs() <= 1e-12 * (a + b).abs() {
        // Integrand reduces to exp(λt) / b
        return (lambda * tau).exp_m1() / (lambda * b);
    }
    (tau + ((a + b * (-lambda * tau).exp()) / (a + b)).ln() / lambda) / a
}

/// ∫₀^T dt / (O(t) + c) over a held segment of length T starting at `o0`
pub(crate) fn inverse_oxygen_integral(
    kinetics: &KineticsParameters,
    o0: f64,
    dose_rate: f64,
    duration_sec: f64,
    center_o2: f64,
) -> f64 {
    let k = kinetics.depletion_per_Gy;
    let r = kinetics.recovery_per_sec;
    let b = kinetics.baseline_o2;
    let c = center_o2;

    match kinetics.model {
        DepletionModel::Proportional => {
            let lambda = k * dose_rate + r;
            if lambda <= 0.0 {
                return duration_sec / (o0 + c);
            }
            let o_eq = r * b / lambda;
            inverse_integral(o_eq + c, o0 - o_eq, lambda, duration_sec)
        }
        DepletionModel::Linear => {
            let depletion = k * dose_rate;
            if r > 0.0 {
                let o_eq = b - depletion / r;
                // Time at which oxygen is exhausted, if ever
                let crossing = if o_eq >= 0.0 {
                    f64::INFINITY
                } else if o0 <= 0.0 {
                    0.0
                } else {
                    ((o0 - o_eq) / -o_eq).ln() / r
                };
                let tau = duration_sec.min(crossing);
                inverse_integral(o_eq + c, o0 - o_eq, r, tau) + (duration_sec - tau) / c
            } else if depletion > 0.0 {
                let tau = duration_sec.min(o0 / depletion);
                ((o0 + c) / (o0 + c - depletion * tau)).ln() / depletion
                    + (duration_sec - tau) / c
            } else {
                duration_sec / (o0 + c)
            }
        }
    }
}

/// Cumulative OER for `dose_Gy` delivered at a constant `dose_rate`.
///
/// With a constant dose rate the dose-weighted average equals the time
/// average: OER_cum = oer_max - (oer_max - oer_min)·c / T · ∫ dt / (O + c).
/// Fails with `DivisionUndefined` for a zero dose.
pub fn cumulative_oer(
    dose_Gy: f64,
    dose_rate: f64,
    kinetics: &KineticsParameters,
    curve: &OerCurveParameters,
) -> Result<f64> {
    kinetics.validate()?;
    curve.validate()?;
    ensure_non_negative("dose_Gy", dose_Gy)?;
    ensure_positive("dose_rate", dose_rate)?;
    if dose_Gy == 0.0 {
        return Err(FlashError::DivisionUndefined(
            "cumulative OER of a zero-dose exposure".to_string(),
        ));
    }

    let duration_sec = dose_Gy / dose_rate;
    let integral = inverse_oxygen_integral(
        kinetics,
        kinetics.start_o2(),
        dose_rate,
        duration_sec,
        curve.center_o2,
    );
    let oer = curve.oer_max
        - (curve.oer_max - curve.oer_min) * curve.center_o2 * integral / duration_sec;
    Ok(oer.clamp(curve.oer_min, curve.oer_max))
}
