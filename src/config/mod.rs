//! Configuration module for model parameters.
//!
//! Reference constants are immutable defaults; callers override them by
//! building their own parameter structs.

mod parameters;

pub use parameters::{
    DepletionModel, KineticsParameters, LqParameters, LqReference, OerCurveParameters, Parameters,
    LINEAR_REF_OX_DEP, REF_OER_CENTER, REF_OER_MAX, REF_OER_MIN, REF_OX_DEP, REF_OX_REC,
};
