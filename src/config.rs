//! Numeric settings shared by the assembly and self-stress pipelines.

use serde::Deserialize;

use crate::errors::SettingsError;

/// Largest bounding extent divided by this value gives the coincidence tolerance.
pub const DEFAULT_TOLERANCE_DIVISOR: f64 = 100_000.0;

/// Relative out-of-balance allowed when validating a self-stress combination.
pub const SELF_STRESS_TOLERANCE: f64 = 1.0e-3;

/// Explicit configuration passed into each pipeline call.
///
/// Missing fields fall back to the named defaults when deserialising.
///
/// # Examples
/// ```
/// use trusskit::Settings;
///
/// let settings = Settings::from_json(r#"{ "tolerance_divisor": 1000.0 }"#).unwrap();
/// assert_eq!(settings.tolerance_divisor, 1000.0);
/// assert_eq!(settings.self_stress_tolerance, 1.0e-3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Divisor applied to the largest bounding extent of the geometry.
    pub tolerance_divisor: f64,
    /// Allowed ratio between a free-axis residual and the summed level magnitude.
    pub self_stress_tolerance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tolerance_divisor: DEFAULT_TOLERANCE_DIVISOR,
            self_stress_tolerance: SELF_STRESS_TOLERANCE,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document and check them.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] when the document is malformed and the
    /// matching [`SettingsError`] variant when a value is out of range.
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidToleranceDivisor`] unless the divisor is
    /// positive and finite, and [`SettingsError::InvalidSelfStressTolerance`]
    /// unless the self-stress tolerance is non-negative and finite.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.tolerance_divisor.is_finite() && self.tolerance_divisor > 0.0) {
            return Err(SettingsError::InvalidToleranceDivisor(self.tolerance_divisor));
        }
        if !(self.self_stress_tolerance.is_finite() && self.self_stress_tolerance >= 0.0) {
            return Err(SettingsError::InvalidSelfStressTolerance(
                self.self_stress_tolerance,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_json("{}").expect("valid json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(matches!(
            Settings::from_json("{ tolerance_divisor: }"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            Settings::from_json(r#"{ "tolerance_divisor": 0.0 }"#),
            Err(SettingsError::InvalidToleranceDivisor(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "tolerance_divisor": -10.0 }"#),
            Err(SettingsError::InvalidToleranceDivisor(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "self_stress_tolerance": -1.0e-3 }"#),
            Err(SettingsError::InvalidSelfStressTolerance(_))
        ));

        let nan_divisor = Settings {
            tolerance_divisor: f64::NAN,
            ..Settings::default()
        };
        assert!(matches!(
            nan_divisor.validate(),
            Err(SettingsError::InvalidToleranceDivisor(_))
        ));
        assert!(Settings::default().validate().is_ok());
    }
}
