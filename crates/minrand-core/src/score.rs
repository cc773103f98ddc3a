//! Imbalance scoring for a hypothetical assignment.
//!
//! The score of placing a subject in a candidate group is the balance
//! statistic of the subject's level row after adding one to the candidate's
//! cell, with every cell divided by its group's sampling rate. Lower scores
//! mean better balance.

use minrand_model::{ConfigurationError, DataIntegrityError, Result, Variable};

use crate::stats::imbalance;

/// Score one variable for `value` placed in `group`.
///
/// `level_counts` is the variable's level-by-group count matrix.
pub fn score(
    value: &str,
    group: usize,
    level_counts: &[Vec<f64>],
    rates: &[f64],
    variable: &Variable,
) -> Result<f64> {
    let level = variable
        .level_index(value)
        .ok_or_else(|| DataIntegrityError::UnknownLevel {
            variable: variable.name.clone(),
            value: value.to_string(),
        })?;
    score_level(level, group, level_counts, rates, variable)
}

/// Score with the level already resolved.
///
/// The level row, the candidate group and the rates must all line up with
/// the count matrix; a mismatch is a configuration error.
pub fn score_level(
    level: usize,
    group: usize,
    level_counts: &[Vec<f64>],
    rates: &[f64],
    variable: &Variable,
) -> Result<f64> {
    let row = level_counts.get(level).ok_or_else(|| {
        ConfigurationError::Shape(format!(
            "variable '{}' has no count row for level {level}",
            variable.name
        ))
    })?;
    if rates.len() != row.len() {
        return Err(ConfigurationError::SamplingRateCount {
            expected: row.len(),
            found: rates.len(),
        }
        .into());
    }
    if group >= row.len() {
        return Err(ConfigurationError::Shape(format!(
            "group {group} is outside the {} counted groups of '{}'",
            row.len(),
            variable.name
        ))
        .into());
    }
    let hypothetical: Vec<f64> = row
        .iter()
        .zip(rates)
        .enumerate()
        .map(|(i, (count, rate))| {
            let count = if i == group { count + 1.0 } else { *count };
            count / rate
        })
        .collect();
    imbalance(variable.scoring_function, &hypothetical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minrand_model::{RandomizationError, ScoringFunction};

    fn sex(function: ScoringFunction) -> Variable {
        Variable::new("sex", ["M", "F"], 1.0, function).unwrap()
    }

    #[test]
    fn empty_counts_score_one_for_range() {
        let counts = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        let variable = sex(ScoringFunction::Range);
        assert_eq!(score("M", 0, &counts, &[1.0, 1.0], &variable).unwrap(), 1.0);
        assert_eq!(score("M", 1, &counts, &[1.0, 1.0], &variable).unwrap(), 1.0);
    }

    #[test]
    fn only_matching_level_is_scored() {
        // Heavy imbalance on F must not affect an M subject.
        let counts = vec![vec![2.0, 1.0], vec![10.0, 0.0]];
        let variable = sex(ScoringFunction::Range);
        assert_eq!(score("M", 0, &counts, &[1.0, 1.0], &variable).unwrap(), 2.0);
        assert_eq!(score("M", 1, &counts, &[1.0, 1.0], &variable).unwrap(), 0.0);
    }

    #[test]
    fn sampling_rates_scale_counts() {
        // 2:1 allocation: [2, 1] adjusted by [2, 1] is balanced.
        let counts = vec![vec![1.0, 1.0], vec![0.0, 0.0]];
        let variable = sex(ScoringFunction::Range);
        assert_eq!(score("M", 0, &counts, &[2.0, 1.0], &variable).unwrap(), 0.0);
        assert_eq!(score("M", 1, &counts, &[2.0, 1.0], &variable).unwrap(), 1.5);
    }

    #[test]
    fn stdev_scoring() {
        let counts = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        let variable = sex(ScoringFunction::StDev);
        let value = score("F", 1, &counts, &[1.0, 1.0], &variable).unwrap();
        assert!((value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn mismatched_shapes_are_configuration_errors() {
        let counts = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        let variable = sex(ScoringFunction::Range);
        assert_eq!(
            score_level(0, 0, &counts, &[1.0], &variable).unwrap_err(),
            RandomizationError::Configuration(ConfigurationError::SamplingRateCount {
                expected: 2,
                found: 1,
            })
        );
        assert!(matches!(
            score_level(0, 0, &counts, &[1.0, 1.0, 1.0], &variable),
            Err(RandomizationError::Configuration(
                ConfigurationError::SamplingRateCount { .. }
            ))
        ));
        assert!(matches!(
            score_level(2, 0, &counts, &[1.0, 1.0], &variable),
            Err(RandomizationError::Configuration(ConfigurationError::Shape(_)))
        ));
        assert!(matches!(
            score_level(0, 2, &counts, &[1.0, 1.0], &variable),
            Err(RandomizationError::Configuration(ConfigurationError::Shape(_)))
        ));
    }

    #[test]
    fn unknown_level_is_integrity_error() {
        let counts = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        let err = score("X", 0, &counts, &[1.0, 1.0], &sex(ScoringFunction::Range)).unwrap_err();
        assert_eq!(
            err,
            RandomizationError::DataIntegrity(DataIntegrityError::UnknownLevel {
                variable: "sex".to_string(),
                value: "X".to_string(),
            })
        );
    }
}
