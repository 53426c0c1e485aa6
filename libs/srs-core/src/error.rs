//! Error types for srs-core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised when input to the scheduler is malformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid score {0}: expected 1 (again) to 4 (easy)")]
    InvalidScore(i64),

    #[error("missing score")]
    MissingScore,

    #[error("invalid day session {0:?}: expected YYYY-MM-DD")]
    InvalidDaySession(String),

    #[error("invalid language code {0:?}")]
    InvalidLanguage(String),

    #[error("desired retention {0} must be strictly between 0 and 1")]
    InvalidRetention(f64),

    #[error("day reset hour {0} must be within 0..=23")]
    InvalidResetHour(u32),

    #[error(transparent)]
    ForecastBounds(#[from] ForecastBoundsError),
}

/// A single forecast value outside its documented range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundViolation {
    #[error("difficulty {0} out of range [1, 10]")]
    Difficulty(f64),

    #[error("stability {0} cannot be negative")]
    NegativeStability(f64),

    #[error("stability {0} exceeds maximum of {max} days", max = crate::algorithm::validate::MAX_STABILITY)]
    StabilityTooLarge(f64),

    #[error("retrievability {0} out of range [0, 1]")]
    Retrievability(f64),
}

/// Forecast values rejected by the validator, one entry per violated bound.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("forecast values rejected: {}", join_violations(.violations))]
pub struct ForecastBoundsError {
    pub violations: Vec<BoundViolation>,
}

impl ForecastBoundsError {
    /// Human-readable message for every violated bound.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

fn join_violations(violations: &[BoundViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_score() {
        assert_eq!(
            CoreError::InvalidScore(7).to_string(),
            "invalid score 7: expected 1 (again) to 4 (easy)"
        );
    }

    #[test]
    fn test_error_display_day_session() {
        assert_eq!(
            CoreError::InvalidDaySession("2025-13-01".into()).to_string(),
            "invalid day session \"2025-13-01\": expected YYYY-MM-DD"
        );
    }

    #[test]
    fn test_bounds_error_joins_messages() {
        let error = ForecastBoundsError {
            violations: vec![
                BoundViolation::Difficulty(11.0),
                BoundViolation::NegativeStability(-1.0),
            ],
        };
        assert_eq!(
            error.to_string(),
            "forecast values rejected: difficulty 11 out of range [1, 10]; stability -1 cannot be negative"
        );
        assert_eq!(error.messages().len(), 2);
    }

    #[test]
    fn test_stability_maximum_message() {
        assert_eq!(
            BoundViolation::StabilityTooLarge(40000.0).to_string(),
            "stability 40000 exceeds maximum of 36500 days"
        );
    }
}
