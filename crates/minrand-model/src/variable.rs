use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::ScoringFunction;
use crate::error::ConfigurationError;

/// A categorical covariate used to balance group composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Ordered, unique, non-empty level labels (at least two).
    pub levels: Vec<String>,
    /// Multiplier applied to this variable's imbalance score.
    pub weight: f64,
    pub scoring_function: ScoringFunction,
}

impl Variable {
    /// Build a variable, trimming the name and levels and validating them.
    pub fn new(
        name: impl Into<String>,
        levels: impl IntoIterator<Item = impl Into<String>>,
        weight: f64,
        scoring_function: ScoringFunction,
    ) -> Result<Self, ConfigurationError> {
        let variable = Self {
            name: name.into().trim().to_string(),
            levels: levels
                .into_iter()
                .map(|level| level.into().trim().to_string())
                .collect(),
            weight,
            scoring_function,
        };
        variable.validate()?;
        Ok(variable)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::InvalidVariable {
                name: self.name.clone(),
                reason: "the variable name is empty".to_string(),
            });
        }
        if self.levels.len() < 2 {
            return Err(self.invalid(format!(
                "at least 2 levels are required, found {}",
                self.levels.len()
            )));
        }
        let mut seen = BTreeSet::new();
        for level in &self.levels {
            if level.is_empty() {
                return Err(self.invalid("levels must not be empty".to_string()));
            }
            if !seen.insert(level.as_str()) {
                return Err(self.invalid(format!("level '{level}' is listed more than once")));
            }
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(self.invalid(format!(
                "weight must be a non-negative number, got {}",
                self.weight
            )));
        }
        Ok(())
    }

    /// Position of `value` among the levels, matched exactly.
    pub fn level_index(&self, value: &str) -> Option<usize> {
        self.levels.iter().position(|level| level == value)
    }

    fn invalid(&self, reason: String) -> ConfigurationError {
        ConfigurationError::InvalidVariable {
            name: self.name.clone(),
            reason,
        }
    }
}
