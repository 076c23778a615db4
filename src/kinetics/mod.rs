//! Oxygen depletion and recovery during an exposure.
//!
//! Radiation consumes dissolved oxygen through radiolytic reactions while
//! diffusion from capillaries restores it. Two laws are supported:
//! - Proportional: dO/dt = -k·Ḋ(t)·O + r·(b - O)
//! - Linear:       dO/dt = -k·Ḋ(t) + r·(b - O), floored at O = 0
//!
//! with k the depletion per Gy, r the recovery rate and b the baseline.
//!
//! References:
//! - Petersson K et al. Int J Radiat Oncol Biol Phys. 2020;107:539-547
//! - Spitz DR et al. Radiother Oncol. 2019;139:23-27 (radiolytic O2 consumption)

pub mod analytic;
pub mod integrator;

pub use integrator::{
    AdaptiveRk4, ExactExponential, ExplicitEuler, IntegrationMethod, IntegrationStrategy,
    IntegratorConfig, RungeKutta4, StepControl,
};

use serde::Serialize;

use crate::config::{DepletionModel, KineticsParameters};
use crate::error::Result;
use crate::exposure::Exposure;

/// Oxygen concentration aligned with an exposure's time samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OxygenTrajectory {
    /// Sample times (s)
    pub times_sec: Vec<f64>,
    /// Oxygen at each sample (fraction of 100% O2)
    pub o2: Vec<f64>,
}

impl OxygenTrajectory {
    pub fn len(&self) -> usize {
        self.o2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.o2.is_empty()
    }

    /// Oxygen at the end of the exposure
    pub fn final_o2(&self) -> f64 {
        self.o2.last().copied().unwrap_or(0.0)
    }

    /// Lowest oxygen reached
    pub fn min_o2(&self) -> f64 {
        self.o2.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// (time, oxygen) pairs
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times_sec.iter().copied().zip(self.o2.iter().copied())
    }
}

/// dO/dt at oxygen level `o2` under a held dose rate
#[inline]
pub fn oxygen_derivative(kinetics: &KineticsParameters, o2: f64, dose_rate: f64) -> f64 {
    let recovery = kinetics.recovery_per_sec * (kinetics.baseline_o2 - o2);
    match kinetics.model {
        DepletionModel::Proportional => -kinetics.depletion_per_Gy * dose_rate * o2 + recovery,
        DepletionModel::Linear => {
            let rate = -kinetics.depletion_per_Gy * dose_rate + recovery;
            // Oxygen cannot be consumed below zero
            if o2 <= 0.0 && rate < 0.0 {
                0.0
            } else {
                rate
            }
        }
    }
}

/// Oxygen trajectory over an exposure using the exact segment solution.
///
/// Pass `KineticsParameters::default()` to use the reference constants.
pub fn oxygen_curve(
    exposure: &Exposure,
    kinetics: &KineticsParameters,
) -> Result<OxygenTrajectory> {
    oxygen_curve_with(exposure, kinetics, &ExactExponential)
}

/// Oxygen trajectory over an exposure with a chosen integration strategy.
///
/// Starts from `kinetics.start_o2()` at the first sample and advances
/// segment by segment. Fails with `InvalidParameter` for negative rate
/// constants or an invalid strategy configuration.
pub fn oxygen_curve_with<S: IntegrationStrategy>(
    exposure: &Exposure,
    kinetics: &KineticsParameters,
    strategy: &S,
) -> Result<OxygenTrajectory> {
    kinetics.validate()?;
    strategy.validate()?;
    strategy.check_step(kinetics, exposure.max_dose_rate());

    let mut o2 = Vec::with_capacity(exposure.len());
    let mut current = kinetics.start_o2();
    o2.push(current);
    for segment in exposure.segments() {
        current = strategy.advance(
            kinetics,
            current,
            segment.dose_rate_Gy_per_sec,
            segment.duration_sec,
        );
        o2.push(current);
    }

    let trajectory = OxygenTrajectory {
        times_sec: exposure.times_sec().to_vec(),
        o2,
    };
    log::debug!(
        "Oxygen curve: {} samples, {:.3} Gy, O2 {:.4} -> {:.4} (min {:.4})",
        trajectory.len(),
        exposure.total_dose_Gy(),
        kinetics.start_o2(),
        trajectory.final_o2(),
        trajectory.min_o2()
    );
    Ok(trajectory)
}
