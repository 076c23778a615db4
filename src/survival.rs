//! Linear-quadratic cell survival corrected for oxygen.
//!
//! The cumulative OER rescales both LQ coefficients:
//!
//!   S = exp(-α'·D - β'·D²),  α' = α·s,  β' = β·s²
//!
//! where s = OER for α, β measured on anoxic cells and s = OER / oer_max
//! for α, β measured on fully oxic cells. Both the linear and quadratic
//! damage are treated as equally oxygen dependent, i.e. s acts as a dose
//! modifying factor.
//!
//! References:
//! - Fowler JF. Br J Radiol. 1989;62:679-694 (LQ model)
//! - Petersson K et al. Int J Radiat Oncol Biol Phys. 2020;107:539-547

use serde::{Deserialize, Serialize};

use crate::config::{KineticsParameters, LqParameters, LqReference, OerCurveParameters, Parameters};
use crate::error::{ensure_non_negative, ensure_positive, Result};
use crate::exposure::Exposure;
use crate::kinetics::{
    analytic, oxygen_curve_with, ExactExponential, IntegrationStrategy, OxygenTrajectory,
};
use crate::oer::{cumulative_oer_with, trajectory_oer};

/// Surviving fraction for a known cumulative OER and total dose.
///
/// Returns a value in (0, 1]; underflow is floored at the smallest
/// positive `f64`.
pub fn survival_from_oer(
    cumulative_oer: f64,
    dose_Gy: f64,
    lq: &LqParameters,
    curve: &OerCurveParameters,
) -> Result<f64> {
    lq.validate()?;
    ensure_non_negative("dose_Gy", dose_Gy)?;
    ensure_positive("cumulative_oer", cumulative_oer)?;

    let scale = match lq.reference {
        LqReference::Anoxic => cumulative_oer,
        LqReference::Normoxic => {
            curve.validate()?;
            curve.relative_sensitivity(cumulative_oer)
        }
    };
    let alpha_eff = lq.alpha_per_Gy * scale;
    let beta_eff = lq.beta_per_Gy2 * scale * scale;

    let survival = (-alpha_eff * dose_Gy - beta_eff * dose_Gy * dose_Gy).exp();
    Ok(survival.max(f64::MIN_POSITIVE))
}

/// Surviving fraction after an exposure (exact oxygen kinetics)
pub fn predict_survival(
    exposure: &Exposure,
    kinetics: &KineticsParameters,
    curve: &OerCurveParameters,
    lq: &LqParameters,
) -> Result<f64> {
    predict_survival_with(exposure, kinetics, curve, lq, &ExactExponential)
}

/// Surviving fraction after an exposure with a chosen integration strategy.
///
/// A zero-dose exposure survives fully; its OER is never evaluated.
pub fn predict_survival_with<S: IntegrationStrategy>(
    exposure: &Exposure,
    kinetics: &KineticsParameters,
    curve: &OerCurveParameters,
    lq: &LqParameters,
    strategy: &S,
) -> Result<f64> {
    lq.validate()?;
    kinetics.validate()?;
    curve.validate()?;

    let dose = exposure.total_dose_Gy();
    if dose == 0.0 {
        return Ok(1.0);
    }
    let oer = cumulative_oer_with(exposure, kinetics, curve, strategy)?;
    survival_from_oer(oer, dose, lq, curve)
}

/// Survival at each dose for constant-rate delivery (a dose-response curve).
///
/// Uses the closed-form cumulative OER, so no time grid is needed.
pub fn dose_response(
    doses_Gy: &[f64],
    dose_rate: f64,
    kinetics: &KineticsParameters,
    curve: &OerCurveParameters,
    lq: &LqParameters,
) -> Result<Vec<f64>> {
    lq.validate()?;
    kinetics.validate()?;
    curve.validate()?;
    ensure_positive("dose_rate", dose_rate)?;
    doses_Gy
        .iter()
        .map(|&dose| constant_rate_survival(dose, dose_rate, kinetics, curve, lq))
        .collect()
}

fn constant_rate_survival(
    dose_Gy: f64,
    dose_rate: f64,
    kinetics: &KineticsParameters,
    curve: &OerCurveParameters,
    lq: &LqParameters,
) -> Result<f64> {
    lq.validate()?;
    kinetics.validate()?;
    curve.validate()?;
    ensure_non_negative("dose_Gy", dose_Gy)?;
    ensure_positive("dose_rate", dose_rate)?;
    if dose_Gy == 0.0 {
        return Ok(1.0);
    }
    let oer = analytic::cumulative_oer(dose_Gy, dose_rate, kinetics, curve)?;
    survival_from_oer(oer, dose_Gy, lq, curve)
}

/// One constant-rate irradiation of cells at a given oxygen level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureCondition {
    pub dose_Gy: f64,
    pub dose_rate_Gy_per_sec: f64,
    /// Baseline (and starting) oxygen, fraction of 100% O2
    pub baseline_o2: f64,
}

/// Survival for a batch of independent conditions.
///
/// Each condition replaces the baseline of `kinetics` and starts from it.
/// Every condition is validated, including those with zero dose.
pub fn predict_survival_batch(
    conditions: &[ExposureCondition],
    kinetics: &KineticsParameters,
    curve: &OerCurveParameters,
    lq: &LqParameters,
) -> Result<Vec<f64>> {
    conditions
        .iter()
        .map(|condition| {
            let kinetics = KineticsParameters {
                baseline_o2: condition.baseline_o2,
                initial_o2: None,
                ..*kinetics
            };
            constant_rate_survival(
                condition.dose_Gy,
                condition.dose_rate_Gy_per_sec,
                &kinetics,
                curve,
                lq,
            )
        })
        .collect()
}

/// Everything computed for one exposure
#[derive(Debug, Clone, Serialize)]
pub struct ExposureOutcome {
    pub total_dose_Gy: f64,
    pub final_o2: f64,
    pub min_o2: f64,
    pub cumulative_oer: f64,
    pub relative_sensitivity: f64,
    pub surviving_fraction: f64,
    pub trajectory: OxygenTrajectory,
}

/// Run kinetics, OER and survival for one exposure with the given parameters
pub fn evaluate_exposure(
    exposure: &Exposure,
    params: &Parameters,
    lq: &LqParameters,
) -> Result<ExposureOutcome> {
    params.validate()?;
    lq.validate()?;

    let trajectory = oxygen_curve_with(exposure, &params.kinetics, &params.integrator)?;
    let oer = trajectory_oer(
        exposure,
        &params.kinetics,
        &trajectory,
        &params.oer_curve,
        &params.integrator,
    )?;
    let dose = exposure.total_dose_Gy();
    let surviving_fraction = survival_from_oer(oer, dose, lq, &params.oer_curve)?;

    log::debug!(
        "Exposure {:.3} Gy: OER {:.4}, survival {:.4e}",
        dose,
        oer,
        surviving_fraction
    );
    Ok(ExposureOutcome {
        total_dose_Gy: dose,
        final_o2: trajectory.final_o2(),
        min_o2: trajectory.min_o2(),
        cumulative_oer: oer,
        relative_sensitivity: params.oer_curve.relative_sensitivity(oer),
        surviving_fraction,
        trajectory,
    })
}
