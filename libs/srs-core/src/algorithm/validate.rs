//! Bounds check for forecast values received from outside the process.
//!
//! The model itself never clamps stability; callers that accept values
//! computed elsewhere run them through [`validate`] before persisting.

use serde::{Deserialize, Serialize};

use super::Forecast;
use crate::error::{BoundViolation, ForecastBoundsError};

/// Stability ceiling in days (100 years).
pub const MAX_STABILITY: f64 = 36_500.0;

/// Forecast values as they arrive at a trust boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastValues {
    pub difficulty: f64,
    pub stability: f64,
    pub retrievability: Option<f64>,
}

impl From<&Forecast> for ForecastValues {
    fn from(forecast: &Forecast) -> Self {
        Self {
            difficulty: forecast.difficulty,
            stability: forecast.stability,
            retrievability: forecast.retrievability,
        }
    }
}

/// Check every bound and report each violation separately.
///
/// NaN fails every range it is checked against.
pub fn validate(values: &ForecastValues) -> Result<(), ForecastBoundsError> {
    let mut violations = Vec::new();

    if !(1.0..=10.0).contains(&values.difficulty) {
        violations.push(BoundViolation::Difficulty(values.difficulty));
    }
    if values.stability.is_nan() || values.stability < 0.0 {
        violations.push(BoundViolation::NegativeStability(values.stability));
    }
    if values.stability.is_nan() || values.stability > MAX_STABILITY {
        violations.push(BoundViolation::StabilityTooLarge(values.stability));
    }
    if let Some(r) = values.retrievability {
        if !(0.0..=1.0).contains(&r) {
            violations.push(BoundViolation::Retrievability(r));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ForecastBoundsError { violations })
    }
}
