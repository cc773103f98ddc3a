//! Type-safe enumerations for project settings.
//!
//! Project definitions arrive as text (TOML files, stored JSON), so every
//! setting here parses case-insensitively and reports unknown values as a
//! [`ConfigurationError`] instead of falling back to a default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Balance statistic applied to the rate-adjusted counts of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoringFunction {
    /// Largest adjusted count minus smallest adjusted count.
    Range,

    /// Population standard deviation of the adjusted counts.
    #[serde(rename = "StDev")]
    StDev,
}

impl ScoringFunction {
    /// Returns the canonical name as stored in project files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringFunction::Range => "Range",
            ScoringFunction::StDev => "StDev",
        }
    }
}

impl fmt::Display for ScoringFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScoringFunction {
    type Err = ConfigurationError;

    /// Parse a scoring function name.
    /// Accepts `Range`, `StDev`, `StdDev` and `SD` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "RANGE" => Ok(ScoringFunction::Range),
            "STDEV" | "STDDEV" | "SD" => Ok(ScoringFunction::StDev),
            _ => Err(ConfigurationError::UnknownScoringFunction(s.to_string())),
        }
    }
}

/// Determinism level of the biased coin, from 1 to 10.
///
/// Bias 1 gives every rank the same probability; bias 10 concentrates
/// probability on the most balanced ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Bias(u8);

impl Bias {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, ConfigurationError> {
        match u8::try_from(value) {
            Ok(level) if (Self::MIN..=Self::MAX).contains(&level) => Ok(Self(level)),
            _ => Err(ConfigurationError::BiasOutOfRange(value)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Bias {
    type Error = ConfigurationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Bias> for i64 {
    fn from(bias: Bias) -> Self {
        i64::from(bias.0)
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_function_from_str() {
        assert_eq!(
            "Range".parse::<ScoringFunction>().unwrap(),
            ScoringFunction::Range
        );
        assert_eq!(
            "stdev".parse::<ScoringFunction>().unwrap(),
            ScoringFunction::StDev
        );
        assert_eq!(
            " SD ".parse::<ScoringFunction>().unwrap(),
            ScoringFunction::StDev
        );
    }

    #[test]
    fn test_unknown_scoring_function_is_config_error() {
        let err = "Variance".parse::<ScoringFunction>().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownScoringFunction("Variance".to_string())
        );
    }

    #[test]
    fn test_bias_bounds() {
        assert_eq!(Bias::new(1).unwrap().get(), 1);
        assert_eq!(Bias::new(10).unwrap().get(), 10);
        assert_eq!(
            Bias::new(0).unwrap_err(),
            ConfigurationError::BiasOutOfRange(0)
        );
        assert_eq!(
            Bias::new(11).unwrap_err(),
            ConfigurationError::BiasOutOfRange(11)
        );
    }
}
