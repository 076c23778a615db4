//! Error types for the oxygen kinetics, OER and survival calculations.

use std::io;

/// Result type alias using [`FlashError`]
pub type Result<T> = std::result::Result<T, FlashError>;

/// Errors reported by the model.
///
/// All calculations are deterministic, so an error always means the
/// caller has to correct its inputs and call again.
#[derive(Debug, thiserror::Error)]
pub enum FlashError {
    /// A parameter or input series violates the model's domain
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A dose-weighted average was requested for an exposure delivering no dose
    #[error("Division undefined: {0}")]
    DivisionUndefined(String),

    /// IO error while loading parameters or exporting results
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl FlashError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        FlashError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Reject NaN/infinite values and negatives.
pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(FlashError::invalid(name, format!("must be finite, got {}", value)));
    }
    if value < 0.0 {
        return Err(FlashError::invalid(name, format!("must be >= 0, got {}", value)));
    }
    Ok(())
}

/// Reject NaN/infinite values, zero and negatives.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(FlashError::invalid(name, format!("must be finite and > 0, got {}", value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative_guard() {
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", 2.5).is_ok());
        assert!(matches!(
            ensure_non_negative("x", -1e-12),
            Err(FlashError::InvalidParameter { name: "x", .. })
        ));
        assert!(ensure_non_negative("x", f64::NAN).is_err());
        assert!(ensure_non_negative("x", f64::INFINITY).is_err());
    }

    #[test]
    fn test_positive_guard() {
        assert!(ensure_positive("y", 1e-9).is_ok());
        assert!(ensure_positive("y", 0.0).is_err());
    }

    #[test]
    fn test_error_message_names_parameter() {
        let err = FlashError::invalid("recovery_per_sec", "must be >= 0, got -1");
        assert_eq!(
            err.to_string(),
            "Invalid parameter `recovery_per_sec`: must be >= 0, got -1"
        );
    }
}
