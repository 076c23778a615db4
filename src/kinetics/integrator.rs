//! Integration strategies for the oxygen ODE.
//!
//! Every strategy advances the oxygen level across one exposure segment,
//! during which the dose rate is constant. Four methods are provided:
//! - Explicit Euler (first order, fixed sub-steps)
//! - 4th-order Runge-Kutta (fixed sub-steps)
//! - Adaptive RK4 with step doubling and Richardson extrapolation
//! - Exact exponential solution of the constant-coefficient segment ODE
//!
//! Fixed-step methods sub-divide a segment so that h ≤ max_step_sec. When
//! no step is configured, h = step_fraction / (k·Ḋ + r), i.e. a fixed
//! fraction of the fastest relaxation time. Explicit Euler is unstable
//! above h = 2 / (k·Ḋ + r) and inaccurate well before that, so a
//! configured step above 1 / (k·Ḋ + r) is reported with a warning.
//!
//! Reference: Press et al., Numerical Recipes, 3rd ed., Cambridge University Press 2007

use serde::{Deserialize, Serialize};

use super::{analytic, oxygen_derivative};
use crate::config::KineticsParameters;
use crate::error::{ensure_positive, Result};

/// Upper bound on sub-steps within one segment
pub const MAX_SUBSTEPS: usize = 1_000_000;

/// Selects the integration strategy in serialized configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    Euler,
    RungeKutta4,
    AdaptiveRk4,
    #[default]
    Exact,
}

/// Configuration for the ODE integrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub method: IntegrationMethod,
    /// Largest sub-step in seconds; derived from the kinetics when absent
    pub max_step_sec: Option<f64>,
    /// Default sub-step as a fraction of 1 / (k·Ḋ + r)
    pub step_fraction: f64,
    /// Adaptive method: allowed local error per step, relative to baseline
    pub tolerance: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            method: IntegrationMethod::Exact,
            max_step_sec: None,
            step_fraction: 0.05,
            tolerance: 1e-9,
        }
    }
}

impl IntegratorConfig {
    pub fn with_method(method: IntegrationMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(h) = self.max_step_sec {
            ensure_positive("max_step_sec", h)?;
        }
        ensure_positive("step_fraction", self.step_fraction)?;
        ensure_positive("tolerance", self.tolerance)
    }

    fn step_control(&self) -> StepControl {
        StepControl {
            max_step_sec: self.max_step_sec,
            step_fraction: self.step_fraction,
        }
    }
}

/// Advances the oxygen level across a segment of constant dose rate
pub trait IntegrationStrategy {
    /// Oxygen after `duration_sec` at `dose_rate`, starting from `o2`
    fn advance(
        &self,
        kinetics: &KineticsParameters,
        o2: f64,
        dose_rate: f64,
        duration_sec: f64,
    ) -> f64;

    /// Check strategy settings before integrating
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Whether `advance` solves each held segment in closed form
    fn is_exact(&self) -> bool {
        false
    }

    /// Warn when the step is too coarse for the fastest segment
    fn check_step(&self, _kinetics: &KineticsParameters, _max_dose_rate: f64) {}
}

/// Sub-step selection for fixed-step methods
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepControl {
    pub max_step_sec: Option<f64>,
    pub step_fraction: f64,
}

impl Default for StepControl {
    fn default() -> Self {
        IntegratorConfig::default().step_control()
    }
}

impl StepControl {
    /// Step length for a segment at `dose_rate`
    pub fn step_for(
        &self,
        kinetics: &KineticsParameters,
        dose_rate: f64,
        duration_sec: f64,
    ) -> f64 {
        let auto = {
            let stiffness = kinetics.stiffness(dose_rate);
            if stiffness > 0.0 {
                self.step_fraction / stiffness
            } else {
                duration_sec
            }
        };
        let h = self.max_step_sec.map_or(auto, |h| h.min(duration_sec));
        h.min(duration_sec).max(duration_sec / MAX_SUBSTEPS as f64)
    }

    fn validate(&self) -> Result<()> {
        if let Some(h) = self.max_step_sec {
            ensure_positive("max_step_sec", h)?;
        }
        ensure_positive("step_fraction", self.step_fraction)
    }

    fn check(&self, kinetics: &KineticsParameters, max_dose_rate: f64) {
        if let Some(h) = self.max_step_sec {
            let limit = 1.0 / kinetics.stiffness(max_dose_rate);
            if h > limit {
                log::warn!(
                    "Integration step {:.3e} s exceeds recommended maximum {:.3e} s at {} Gy/s; \
                     the oxygen curve may oscillate",
                    h,
                    limit,
                    max_dose_rate
                );
            }
        }
    }
}

/// Keep oxygen inside [0, baseline]
#[inline]
fn clamp_o2(kinetics: &KineticsParameters, o2: f64) -> f64 {
    o2.max(0.0).min(kinetics.baseline_o2)
}

/// Run `step` over the segment in equal sub-steps no longer than `h`
fn substep<F>(duration_sec: f64, h: f64, mut o2: f64, mut step: F) -> f64
where
    F: FnMut(f64, f64) -> f64,
{
    if duration_sec <= 0.0 {
        return o2;
    }
    let n_steps = ((duration_sec / h).ceil() as usize).clamp(1, MAX_SUBSTEPS);
    let dt = duration_sec / n_steps as f64;
    for _ in 0..n_steps {
        o2 = step(o2, dt);
    }
    o2
}

/// First-order explicit Euler
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitEuler {
    pub step: StepControl,
}

impl IntegrationStrategy for ExplicitEuler {
    fn advance(
        &self,
        kinetics: &KineticsParameters,
        o2: f64,
        dose_rate: f64,
        duration_sec: f64,
    ) -> f64 {
        let h = self.step.step_for(kinetics, dose_rate, duration_sec);
        substep(duration_sec, h, o2, |y, dt| {
            clamp_o2(kinetics, y + dt * oxygen_derivative(kinetics, y, dose_rate))
        })
    }

    fn validate(&self) -> Result<()> {
        self.step.validate()
    }

    fn check_step(&self, kinetics: &KineticsParameters, max_dose_rate: f64) {
        self.step.check(kinetics, max_dose_rate);
    }
}

/// One classic RK4 step
///
/// k1 = f(y)
/// k2 = f(y + h/2 * k1)
/// k3 = f(y + h/2 * k2)
/// k4 = f(y + h * k3)
/// y_new = y + h/6 * (k1 + 2*k2 + 2*k3 + k4)
fn rk4_step(kinetics: &KineticsParameters, y: f64, dose_rate: f64, h: f64) -> f64 {
    let f = |state: f64| oxygen_derivative(kinetics, clamp_o2(kinetics, state), dose_rate);
    let k1 = f(y);
    let k2 = f(y + 0.5 * h * k1);
    let k3 = f(y + 0.5 * h * k2);
    let k4 = f(y + h * k3);
    y + h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
}

/// 4th-order Runge-Kutta with fixed sub-steps
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKutta4 {
    pub step: StepControl,
}

impl IntegrationStrategy for RungeKutta4 {
    fn advance(
        &self,
        kinetics: &KineticsParameters,
        o2: f64,
        dose_rate: f64,
        duration_sec: f64,
    ) -> f64 {
        let h = self.step.step_for(kinetics, dose_rate, duration_sec);
        substep(duration_sec, h, o2, |y, dt| {
            clamp_o2(kinetics, rk4_step(kinetics, y, dose_rate, dt))
        })
    }

    fn validate(&self) -> Result<()> {
        self.step.validate()
    }

    fn check_step(&self, kinetics: &KineticsParameters, max_dose_rate: f64) {
        self.step.check(kinetics, max_dose_rate);
    }
}

/// RK4 with step-doubling error control.
///
/// Each trial step is compared against two half steps; the difference
/// estimates the local error, which must stay below
/// `tolerance × max(baseline, 1)`. Accepted steps use the Richardson
/// extrapolated value.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveRk4 {
    pub tolerance: f64,
    pub initial_step: StepControl,
}

impl Default for AdaptiveRk4 {
    fn default() -> Self {
        Self {
            tolerance: IntegratorConfig::default().tolerance,
            initial_step: StepControl::default(),
        }
    }
}

impl IntegrationStrategy for AdaptiveRk4 {
    fn advance(
        &self,
        kinetics: &KineticsParameters,
        o2: f64,
        dose_rate: f64,
        duration_sec: f64,
    ) -> f64 {
        if duration_sec <= 0.0 {
            return o2;
        }
        let scale = kinetics.baseline_o2.max(1.0);
        let min_step = duration_sec / MAX_SUBSTEPS as f64;
        let mut h = self.initial_step.step_for(kinetics, dose_rate, duration_sec);
        let mut t = 0.0;
        let mut y = o2;

        while t < duration_sec {
            let h_try = h.min(duration_sec - t);
            let full = rk4_step(kinetics, y, dose_rate, h_try);
            let half = rk4_step(kinetics, y, dose_rate, 0.5 * h_try);
            let double = rk4_step(kinetics, half, dose_rate, 0.5 * h_try);

            let error = (double - full).abs() / scale;
            let factor = if error > 0.0 {
                0.9 * (self.tolerance / error).powf(0.2)
            } else {
                2.0
            };

            if error <= self.tolerance || h_try <= min_step {
                y = clamp_o2(kinetics, double + (double - full) / 15.0);
                t += h_try;
                h = h_try * factor.clamp(1.0, 2.0);
            } else {
                h = (h_try * factor.clamp(0.1, 0.9)).max(min_step);
            }
        }
        y
    }

    fn validate(&self) -> Result<()> {
        ensure_positive("tolerance", self.tolerance)?;
        self.initial_step.validate()
    }
}

/// Closed-form solution of the segment ODE; exact for held dose rates
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactExponential;

impl IntegrationStrategy for ExactExponential {
    fn advance(
        &self,
        kinetics: &KineticsParameters,
        o2: f64,
        dose_rate: f64,
        duration_sec: f64,
    ) -> f64 {
        clamp_o2(kinetics, analytic::relax(kinetics, o2, dose_rate, duration_sec))
    }

    fn is_exact(&self) -> bool {
        true
    }
}

impl IntegrationStrategy for IntegratorConfig {
    fn advance(
        &self,
        kinetics: &KineticsParameters,
        o2: f64,
        dose_rate: f64,
        duration_sec: f64,
    ) -> f64 {
        let step = self.step_control();
        match self.method {
            IntegrationMethod::Euler => {
                ExplicitEuler { step }.advance(kinetics, o2, dose_rate, duration_sec)
            }
            IntegrationMethod::RungeKutta4 => {
                RungeKutta4 { step }.advance(kinetics, o2, dose_rate, duration_sec)
            }
            IntegrationMethod::AdaptiveRk4 => AdaptiveRk4 {
                tolerance: self.tolerance,
                initial_step: step,
            }
            .advance(kinetics, o2, dose_rate, duration_sec),
            IntegrationMethod::Exact => {
                ExactExponential.advance(kinetics, o2, dose_rate, duration_sec)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        IntegratorConfig::validate(self)
    }

    fn is_exact(&self) -> bool {
        self.method == IntegrationMethod::Exact
    }

    fn check_step(&self, kinetics: &KineticsParameters, max_dose_rate: f64) {
        if matches!(self.method, IntegrationMethod::Euler | IntegrationMethod::RungeKutta4) {
            self.step_control().check(kinetics, max_dose_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DepletionModel;

    fn kinetics() -> KineticsParameters {
        KineticsParameters::with_baseline(0.05)
    }

    #[test]
    fn test_exact_matches_closed_form() {
        // dO/dt = -(kḊ + r)O + r·b  ⇒  O(t) = O_eq + (b - O_eq)·exp(-(kḊ + r)t)
        let k = kinetics();
        let rate = 100.0;
        let lambda = k.depletion_per_Gy * rate + k.recovery_per_sec;
        let o_eq = k.recovery_per_sec * k.baseline_o2 / lambda;
        let t = 0.05;
        let expected = o_eq + (k.baseline_o2 - o_eq) * (-lambda * t).exp();

        let o2 = ExactExponential.advance(&k, k.baseline_o2, rate, t);
        assert!((o2 - expected).abs() < 1e-15, "{} vs {}", o2, expected);
    }

    #[test]
    fn test_rk4_tracks_exact_solution() {
        let k = kinetics();
        let exact = ExactExponential.advance(&k, k.baseline_o2, 100.0, 0.1);
        let rk4 = RungeKutta4::default().advance(&k, k.baseline_o2, 100.0, 0.1);
        let error = (rk4 - exact).abs() / k.baseline_o2;
        assert!(error < 1e-6, "RK4 error too large: {} vs expected {}", rk4, exact);
    }

    #[test]
    fn test_euler_converges_first_order() {
        let k = kinetics();
        let exact = ExactExponential.advance(&k, k.baseline_o2, 50.0, 0.2);
        let coarse = ExplicitEuler {
            step: StepControl { max_step_sec: Some(1e-3), step_fraction: 0.05 },
        }
        .advance(&k, k.baseline_o2, 50.0, 0.2);
        let fine = ExplicitEuler {
            step: StepControl { max_step_sec: Some(1e-4), step_fraction: 0.05 },
        }
        .advance(&k, k.baseline_o2, 50.0, 0.2);

        let coarse_err = (coarse - exact).abs();
        let fine_err = (fine - exact).abs();
        assert!(fine_err < coarse_err, "refining the step should reduce the error");
        assert!(
            coarse_err / fine_err > 5.0,
            "expected ~10x error reduction, got {}",
            coarse_err / fine_err
        );
    }

    #[test]
    fn test_adaptive_meets_tolerance() {
        let k = kinetics();
        let exact = ExactExponential.advance(&k, k.baseline_o2, 1000.0, 0.01);
        let adaptive = AdaptiveRk4 {
            tolerance: 1e-10,
            initial_step: StepControl { max_step_sec: Some(1e-3), step_fraction: 0.05 },
        }
        .advance(&k, k.baseline_o2, 1000.0, 0.01);
        assert!((adaptive - exact).abs() < 1e-8, "{} vs {}", adaptive, exact);
    }

    #[test]
    fn test_huge_euler_step_stays_in_bounds() {
        // kḊ·h ≫ 2: explicit Euler would overshoot below zero without clamping
        let k = kinetics();
        let euler = ExplicitEuler {
            step: StepControl { max_step_sec: Some(1.0), step_fraction: 0.05 },
        };
        let o2 = euler.advance(&k, k.baseline_o2, 1e4, 1.0);
        assert!((0.0..=k.baseline_o2).contains(&o2));
    }

    #[test]
    fn test_linear_model_floors_at_zero() {
        let k = KineticsParameters {
            model: DepletionModel::Linear,
            depletion_per_Gy: 0.001,
            ..KineticsParameters::with_baseline(0.01)
        };
        // Depletes 0.001 per Gy at 1000 Gy/s, far faster than recovery restores
        let exact = ExactExponential.advance(&k, 0.01, 1000.0, 1.0);
        let rk4 = RungeKutta4::default().advance(&k, 0.01, 1000.0, 1.0);
        assert_eq!(exact, 0.0);
        assert!(rk4.abs() < 1e-6, "RK4 should settle at zero oxygen, got {}", rk4);
    }

    #[test]
    fn test_step_for_respects_bounds() {
        let k = kinetics();
        let control = StepControl::default();
        let h = control.step_for(&k, 0.0, 10.0);
        assert!((h - 0.05).abs() < 1e-15);
        let h_short = control.step_for(&k, 0.0, 0.01);
        assert_eq!(h_short, 0.01);
    }

    #[test]
    fn test_config_rejects_bad_step() {
        let config = IntegratorConfig {
            max_step_sec: Some(0.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(IntegratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_dispatch_matches_strategy() {
        let k = kinetics();
        let config = IntegratorConfig::with_method(IntegrationMethod::RungeKutta4);
        let direct = RungeKutta4::default().advance(&k, 0.05, 10.0, 0.3);
        let dispatched = config.advance(&k, 0.05, 10.0, 0.3);
        assert_eq!(direct, dispatched);
    }
}
