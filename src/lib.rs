//! FLASH Oxygen - oxygen depletion model for ultra-high dose rate radiotherapy
//!
//! This library follows dissolved oxygen through an exposure, turns it into
//! a dose-weighted oxygen enhancement ratio and predicts linear-quadratic
//! cell survival from it.
//!
//! Reference: Petersson K, Adrian G, Butterworth K, McMahon SJ.
//! A Quantitative Analysis of the Role of Oxygen Tension in FLASH Radiation
//! Therapy. Int J Radiat Oncol Biol Phys. 2020;107(3):539-547

// Allow non-snake-case for unit suffixes in names (dose_Gy, alpha_per_Gy, ...)
// This follows the project convention of including units in names.
#![allow(non_snake_case)]

pub mod config;
pub mod error;
pub mod export;
pub mod exposure;
pub mod kinetics;
pub mod oer;
pub mod survival;

pub use config::{
    DepletionModel, KineticsParameters, LqParameters, LqReference, OerCurveParameters, Parameters,
    LINEAR_REF_OX_DEP, REF_OER_CENTER, REF_OER_MAX, REF_OER_MIN, REF_OX_DEP, REF_OX_REC,
};
pub use error::{FlashError, Result};
pub use exposure::{Exposure, PulseTrain, Segment};
pub use kinetics::{
    oxygen_curve, oxygen_curve_with, IntegrationMethod, IntegrationStrategy, IntegratorConfig,
    OxygenTrajectory,
};
pub use oer::{cumulative_oer, cumulative_oer_exact, cumulative_oer_with, oer_series};
pub use survival::{
    dose_response, evaluate_exposure, predict_survival, predict_survival_batch,
    predict_survival_with, survival_from_oer, ExposureCondition, ExposureOutcome,
};
