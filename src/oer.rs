//! Oxygen enhancement ratio over an exposure.
//!
//! The instantaneous OER follows the hyperbolic oxygen response
//!
//!   OER(O) = (oer_max·O + oer_min·c) / (O + c)
//!
//! which is oer_min under anoxia, oer_max when fully oxic and exactly the
//! mean of the two at O = c. The cumulative OER weights OER(t) by the
//! dose delivered at t:
//!
//!   OER_cum = ∫ OER(O(t))·Ḋ(t) dt / ∫ Ḋ(t) dt
//!
//! so dose given while oxygen is depleted sensitises less.
//!
//! References:
//! - Alper T, Howard-Flanders P. Nature. 1956;178:978-979
//! - Petersson K et al. Int J Radiat Oncol Biol Phys. 2020;107:539-547

use crate::config::{KineticsParameters, OerCurveParameters};
use crate::error::{FlashError, Result};
use crate::exposure::Exposure;
use crate::kinetics::{
    analytic, oxygen_curve_with, ExactExponential, IntegrationStrategy, OxygenTrajectory,
};

impl OerCurveParameters {
    /// Instantaneous OER at oxygen level `o2`
    #[inline]
    pub fn oer(&self, o2: f64) -> f64 {
        (self.oer_max * o2 + self.oer_min * self.center_o2) / (o2 + self.center_o2)
    }

    /// OER at the curve midpoint, (oer_max + oer_min) / 2
    pub fn midpoint_oer(&self) -> f64 {
        0.5 * (self.oer_max + self.oer_min)
    }

    /// OER relative to fully oxic cells: 1 when oxic, oer_min/oer_max anoxic
    pub fn relative_sensitivity(&self, oer: f64) -> f64 {
        oer / self.oer_max
    }
}

/// Instantaneous OER at every sample of a trajectory
pub fn oer_series(trajectory: &OxygenTrajectory, curve: &OerCurveParameters) -> Vec<f64> {
    trajectory.o2.iter().map(|&o2| curve.oer(o2)).collect()
}

/// Dose-weighted cumulative OER of an exposure and its oxygen trajectory.
///
/// Uses trapezoidal quadrature of OER over each held segment, so the grid
/// must resolve the oxygen time scale; see [`cumulative_oer_exact`].
/// Fails with `DivisionUndefined` when the exposure delivers no dose and
/// with `InvalidParameter` when the trajectory does not match the exposure.
pub fn cumulative_oer(
    exposure: &Exposure,
    trajectory: &OxygenTrajectory,
    curve: &OerCurveParameters,
) -> Result<f64> {
    curve.validate()?;
    if trajectory.len() != exposure.len() || trajectory.times_sec.len() != exposure.len() {
        return Err(FlashError::invalid(
            "trajectory",
            format!(
                "{} oxygen samples for an exposure of {} samples",
                trajectory.len(),
                exposure.len()
            ),
        ));
    }
    if let Some(o2) = trajectory.o2.iter().find(|o2| !o2.is_finite() || **o2 < 0.0) {
        return Err(FlashError::invalid(
            "trajectory",
            format!("oxygen must be finite and >= 0, got {}", o2),
        ));
    }

    let total_dose = exposure.total_dose_Gy();
    if total_dose <= 0.0 {
        return Err(FlashError::DivisionUndefined(
            "cumulative OER of an exposure delivering no dose".to_string(),
        ));
    }

    let weighted: f64 = exposure
        .segments()
        .zip(trajectory.o2.windows(2))
        .map(|(segment, o2)| segment.dose_Gy() * 0.5 * (curve.oer(o2[0]) + curve.oer(o2[1])))
        .sum();

    let oer = (weighted / total_dose).clamp(curve.oer_min, curve.oer_max);
    log::debug!("Cumulative OER {:.4} over {:.3} Gy", oer, total_dose);
    Ok(oer)
}

/// Cumulative OER integrating the closed-form oxygen curve over each held
/// segment, so the result does not depend on how coarse the grid is.
///
/// Each segment contributes Ḋ·(oer_max·Δt - (oer_max - oer_min)·c·∫ dt / (O + c)).
pub fn cumulative_oer_exact(
    exposure: &Exposure,
    kinetics: &KineticsParameters,
    curve: &OerCurveParameters,
) -> Result<f64> {
    kinetics.validate()?;
    curve.validate()?;

    let total_dose = exposure.total_dose_Gy();
    if total_dose <= 0.0 {
        return Err(FlashError::DivisionUndefined(
            "cumulative OER of an exposure delivering no dose".to_string(),
        ));
    }

    let spread = (curve.oer_max - curve.oer_min) * curve.center_o2;
    let mut o2 = kinetics.start_o2();
    let mut weighted = 0.0;
    for segment in exposure.segments() {
        let rate = segment.dose_rate_Gy_per_sec;
        if rate > 0.0 {
            let integral = analytic::inverse_oxygen_integral(
                kinetics,
                o2,
                rate,
                segment.duration_sec,
                curve.center_o2,
            );
            weighted += rate * (curve.oer_max * segment.duration_sec - spread * integral);
        }
        o2 = ExactExponential.advance(kinetics, o2, rate, segment.duration_sec);
    }

    let oer = (weighted / total_dose).clamp(curve.oer_min, curve.oer_max);
    log::debug!("Exact cumulative OER {:.4} over {:.3} Gy", oer, total_dose);
    Ok(oer)
}

/// Cumulative OER with the oxygen trajectory computed internally.
///
/// Closed-form strategies integrate each segment exactly; numerical ones
/// average their own trajectory with the trapezoid rule.
pub fn cumulative_oer_with<S: IntegrationStrategy>(
    exposure: &Exposure,
    kinetics: &KineticsParameters,
    curve: &OerCurveParameters,
    strategy: &S,
) -> Result<f64> {
    if strategy.is_exact() {
        strategy.validate()?;
        return cumulative_oer_exact(exposure, kinetics, curve);
    }
    let trajectory = oxygen_curve_with(exposure, kinetics, strategy)?;
    trajectory_oer(exposure, kinetics, &trajectory, curve, strategy)
}

/// Cumulative OER for a trajectory already produced by `strategy`
pub(crate) fn trajectory_oer<S: IntegrationStrategy>(
    exposure: &Exposure,
    kinetics: &KineticsParameters,
    trajectory: &OxygenTrajectory,
    curve: &OerCurveParameters,
    strategy: &S,
) -> Result<f64> {
    if strategy.is_exact() {
        return cumulative_oer_exact(exposure, kinetics, curve);
    }
    warn_if_coarse(exposure, kinetics);
    cumulative_oer(exposure, trajectory, curve)
}

/// Warn when a dose-delivering segment outlasts the kinetics time scale,
/// where the trapezoid rule misjudges the OER.
fn warn_if_coarse(exposure: &Exposure, kinetics: &KineticsParameters) {
    let coarsest = exposure
        .segments()
        .filter(|segment| segment.dose_rate_Gy_per_sec > 0.0)
        .map(|segment| segment.duration_sec * kinetics.stiffness(segment.dose_rate_Gy_per_sec))
        .fold(0.0, f64::max);
    if coarsest > 1.0 {
        log::warn!(
            "Exposure segment spans {:.2} oxygen time constants; \
             the trapezoidal OER may be inaccurate, refine the grid",
            coarsest
        );
    }
}
