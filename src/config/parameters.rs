//! Parameter structures with citation metadata.
//!
//! Oxygen is expressed as a fraction of 100% O2 throughout (0.21 = air).
//! Reference values follow Petersson et al., IJROBP 2020;107(3):539-547.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_positive, FlashError, Result};
use crate::kinetics::IntegratorConfig;

/// Oxygen depletion per Gy for the concentration-proportional model
/// Source: Petersson et al. 2020, fitted to Adrian et al. 2019 cell data
pub const REF_OX_DEP: f64 = 0.053;

/// Oxygen depletion per Gy for the linear (concentration-independent) model
/// Source: Petersson et al. 2020
pub const LINEAR_REF_OX_DEP: f64 = 0.000518;

/// First-order oxygen recovery rate (per second)
/// Source: Petersson et al. 2020
pub const REF_OX_REC: f64 = 1.0;

/// Oxygen level at the midpoint of the OER curve (1% O2)
pub const REF_OER_CENTER: f64 = 0.010;

/// Fully oxic OER asymptote
/// Reference: Wenzl & Wilkens, Radiat Oncol 2011
pub const REF_OER_MAX: f64 = 3.0;

/// Anoxic OER asymptote
pub const REF_OER_MIN: f64 = 1.0;

/// How radiation consumes oxygen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepletionModel {
    /// dO/dt = -k·Ḋ·O + r·(b - O)
    #[default]
    Proportional,
    /// dO/dt = -k·Ḋ + r·(b - O), floored at zero oxygen
    Linear,
}

impl DepletionModel {
    /// Reference depletion constant for this law (Gy⁻¹)
    pub fn reference_depletion(self) -> f64 {
        match self {
            DepletionModel::Proportional => REF_OX_DEP,
            DepletionModel::Linear => LINEAR_REF_OX_DEP,
        }
    }
}

/// Oxygen depletion/recovery kinetics
///
/// When a parameter file omits `depletion_per_Gy`, the reference constant
/// of the selected `model` is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "KineticsFile")]
pub struct KineticsParameters {
    /// Depletion rate per unit dose (Gy⁻¹)
    pub depletion_per_Gy: f64,
    /// Relaxation rate towards the baseline (s⁻¹)
    pub recovery_per_sec: f64,
    /// Normoxic baseline the tissue relaxes to (fraction of 100% O2)
    pub baseline_o2: f64,
    /// Oxygen level at t = 0; the baseline when absent
    pub initial_o2: Option<f64>,
    /// Depletion law
    pub model: DepletionModel,
}

impl Default for KineticsParameters {
    fn default() -> Self {
        Self {
            depletion_per_Gy: REF_OX_DEP,
            recovery_per_sec: REF_OX_REC,
            baseline_o2: 1.0,
            initial_o2: None,
            model: DepletionModel::Proportional,
        }
    }
}

/// Kinetics as written in a parameter file, before model defaults apply
#[derive(Deserialize)]
#[serde(default)]
struct KineticsFile {
    depletion_per_Gy: Option<f64>,
    recovery_per_sec: f64,
    baseline_o2: f64,
    initial_o2: Option<f64>,
    model: DepletionModel,
}

impl Default for KineticsFile {
    fn default() -> Self {
        let reference = KineticsParameters::default();
        Self {
            depletion_per_Gy: None,
            recovery_per_sec: reference.recovery_per_sec,
            baseline_o2: reference.baseline_o2,
            initial_o2: reference.initial_o2,
            model: reference.model,
        }
    }
}

impl From<KineticsFile> for KineticsParameters {
    fn from(file: KineticsFile) -> Self {
        Self {
            depletion_per_Gy: file
                .depletion_per_Gy
                .unwrap_or_else(|| file.model.reference_depletion()),
            recovery_per_sec: file.recovery_per_sec,
            baseline_o2: file.baseline_o2,
            initial_o2: file.initial_o2,
            model: file.model,
        }
    }
}

impl KineticsParameters {
    /// Reference kinetics at a given baseline oxygen level
    pub fn with_baseline(baseline_o2: f64) -> Self {
        Self {
            baseline_o2,
            ..Default::default()
        }
    }

    /// Reference kinetics for the linear depletion model
    pub fn linear(baseline_o2: f64) -> Self {
        Self {
            depletion_per_Gy: DepletionModel::Linear.reference_depletion(),
            recovery_per_sec: REF_OX_REC,
            baseline_o2,
            initial_o2: None,
            model: DepletionModel::Linear,
        }
    }

    /// Starting concentration
    pub fn start_o2(&self) -> f64 {
        self.initial_o2.unwrap_or(self.baseline_o2)
    }

    /// Slowest relaxation rate (s⁻¹) seen at the given dose rate.
    ///
    /// Sets the time scale used to pick integration steps.
    pub fn stiffness(&self, dose_rate_Gy_per_sec: f64) -> f64 {
        match self.model {
            DepletionModel::Proportional => {
                self.depletion_per_Gy * dose_rate_Gy_per_sec + self.recovery_per_sec
            }
            DepletionModel::Linear => self.recovery_per_sec,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("depletion_per_Gy", self.depletion_per_Gy)?;
        ensure_non_negative("recovery_per_sec", self.recovery_per_sec)?;
        ensure_non_negative("baseline_o2", self.baseline_o2)?;
        if let Some(initial) = self.initial_o2 {
            ensure_non_negative("initial_o2", initial)?;
            if initial > self.baseline_o2 {
                return Err(FlashError::invalid(
                    "initial_o2",
                    format!(
                        "must not exceed baseline {}, got {}",
                        self.baseline_o2, initial
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Oxygen-to-OER response curve
///
/// OER(O) = (oer_max·O + oer_min·c) / (O + c), hyperbolic in O with its
/// midpoint at O = c.
/// Source: Petersson et al. 2020, Eq. 3 (after Alper & Howard-Flanders 1956)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OerCurveParameters {
    /// Oxygen level at the curve midpoint (fraction of 100% O2)
    pub center_o2: f64,
    /// OER approached at high oxygen
    pub oer_max: f64,
    /// OER approached under anoxia
    pub oer_min: f64,
}

impl Default for OerCurveParameters {
    fn default() -> Self {
        Self {
            center_o2: REF_OER_CENTER,
            oer_max: REF_OER_MAX,
            oer_min: REF_OER_MIN,
        }
    }
}

impl OerCurveParameters {
    /// Reference curve with a different midpoint
    pub fn with_center(center_o2: f64) -> Self {
        Self {
            center_o2,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("center_o2", self.center_o2)?;
        ensure_positive("oer_min", self.oer_min)?;
        ensure_positive("oer_max", self.oer_max)?;
        if self.oer_max < self.oer_min {
            return Err(FlashError::invalid(
                "oer_max",
                format!(
                    "must be >= oer_min ({}), got {}",
                    self.oer_min, self.oer_max
                ),
            ));
        }
        Ok(())
    }
}

/// Which oxygen condition the LQ parameters were measured under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LqReference {
    /// α, β describe anoxic cells; both scale up with OER (α·OER, β·OER²)
    #[default]
    Anoxic,
    /// α, β describe fully oxic cells; the dose is scaled by OER/oer_max
    Normoxic,
}

/// Linear-quadratic survival parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LqParameters {
    /// Linear coefficient (Gy⁻¹)
    pub alpha_per_Gy: f64,
    /// Quadratic coefficient (Gy⁻²)
    pub beta_per_Gy2: f64,
    /// Reference oxygen condition of α and β
    #[serde(default)]
    pub reference: LqReference,
}

impl LqParameters {
    /// Parameters measured under anoxia
    pub fn new(alpha_per_Gy: f64, beta_per_Gy2: f64) -> Self {
        Self {
            alpha_per_Gy,
            beta_per_Gy2,
            reference: LqReference::Anoxic,
        }
    }

    /// Parameters measured on fully oxic cells
    pub fn normoxic(alpha_per_Gy: f64, beta_per_Gy2: f64) -> Self {
        Self {
            alpha_per_Gy,
            beta_per_Gy2,
            reference: LqReference::Normoxic,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("alpha_per_Gy", self.alpha_per_Gy)?;
        ensure_non_negative("beta_per_Gy2", self.beta_per_Gy2)
    }
}

/// Top-level parameters container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Oxygen kinetics
    pub kinetics: KineticsParameters,
    /// OER response curve
    pub oer_curve: OerCurveParameters,
    /// Numerical integration of the kinetics
    pub integrator: IntegratorConfig,
}

impl Parameters {
    /// Load and validate parameters from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let params: Self = serde_json::from_str(&contents)?;
        params.validate()?;
        log::info!("Loaded model parameters from {:?}", path.as_ref());
        Ok(params)
    }

    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(params) => params,
            Err(FlashError::Io(_)) => {
                log::info!("Model parameters file not found, using defaults");
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to load model parameters: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.kinetics.validate()?;
        self.oer_curve.validate()?;
        self.integrator.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kinetics_use_reference_constants() {
        let params = KineticsParameters::default();
        assert_eq!(params.depletion_per_Gy, REF_OX_DEP);
        assert_eq!(params.recovery_per_sec, REF_OX_REC);
        assert_eq!(params.start_o2(), 1.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_linear_kinetics() {
        let params = KineticsParameters::linear(0.05);
        assert_eq!(params.model, DepletionModel::Linear);
        assert_eq!(params.depletion_per_Gy, LINEAR_REF_OX_DEP);
        assert_eq!(params.stiffness(1000.0), REF_OX_REC);
    }

    #[test]
    fn test_negative_recovery_rejected() {
        let params = KineticsParameters {
            recovery_per_sec: -0.5,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(FlashError::InvalidParameter { name: "recovery_per_sec", .. })
        ));
    }

    #[test]
    fn test_initial_above_baseline_rejected() {
        let params = KineticsParameters {
            baseline_o2: 0.05,
            initial_o2: Some(0.08),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_oer_curve_ordering() {
        let inverted = OerCurveParameters {
            oer_max: 0.5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
        assert!(OerCurveParameters::with_center(0.0).validate().is_err());
        assert!(OerCurveParameters::default().validate().is_ok());
    }

    #[test]
    fn test_negative_lq_rejected() {
        assert!(LqParameters::new(-0.1, 0.03).validate().is_err());
        assert!(LqParameters::new(0.3, -0.03).validate().is_err());
        assert!(LqParameters::normoxic(0.12, 0.027).validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let params = Parameters::default();
        let json = serde_json::to_string_pretty(&params).unwrap();
        let parsed: Parameters = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "kinetics": { "baseline_o2": 0.05, "model": "linear" } }"#;
        let parsed: Parameters = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.kinetics.baseline_o2, 0.05);
        assert_eq!(parsed.kinetics.model, DepletionModel::Linear);
        assert_eq!(parsed.kinetics.depletion_per_Gy, LINEAR_REF_OX_DEP);
        assert_eq!(parsed.kinetics.recovery_per_sec, REF_OX_REC);
        assert_eq!(parsed.oer_curve, OerCurveParameters::default());
    }

    #[test]
    fn test_depletion_default_follows_model() {
        let proportional: KineticsParameters =
            serde_json::from_str(r#"{ "baseline_o2": 0.05 }"#).unwrap();
        assert_eq!(proportional.depletion_per_Gy, REF_OX_DEP);

        let linear: KineticsParameters = serde_json::from_str(r#"{ "model": "linear" }"#).unwrap();
        assert_eq!(linear, KineticsParameters::linear(1.0));

        let explicit: KineticsParameters =
            serde_json::from_str(r#"{ "model": "linear", "depletion_per_Gy": 0.002 }"#).unwrap();
        assert_eq!(explicit.depletion_per_Gy, 0.002);
    }

    #[test]
    fn test_linear_file_matches_linear_constructor() {
        let json = r#"{ "kinetics": { "baseline_o2": 0.05, "model": "linear" } }"#;
        let parsed: Parameters = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.kinetics, KineticsParameters::linear(0.05));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let params = Parameters::load_or_default("does/not/exist/model.json");
        assert_eq!(params, Parameters::default());
    }
}
