//! Balance statistics over rate-adjusted group counts.

use minrand_model::{RandomizationError, Result, ScoringFunction};

/// Largest value minus smallest value.
pub fn range(values: &[f64]) -> Result<f64> {
    let (first, rest) = values
        .split_first()
        .ok_or_else(|| RandomizationError::InvalidInput("range of an empty vector".into()))?;
    let (min, max) = rest
        .iter()
        .fold((*first, *first), |(min, max), &x| (min.min(x), max.max(x)));
    Ok(max - min)
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn stdev(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(RandomizationError::InvalidInput(
            "standard deviation of an empty vector".into(),
        ));
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Ok(variance.sqrt())
}

/// Apply the statistic selected by `function`.
pub fn imbalance(function: ScoringFunction, values: &[f64]) -> Result<f64> {
    match function {
        ScoringFunction::Range => range(values),
        ScoringFunction::StDev => stdev(values),
    }
}

/// Divide each count by its group's sampling rate.
pub fn rate_adjusted(counts: &[f64], rates: &[f64]) -> Vec<f64> {
    counts
        .iter()
        .zip(rates)
        .map(|(count, rate)| count / rate)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_of_values() {
        assert_eq!(range(&[3.0, 1.0, 4.0, 1.5]).unwrap(), 3.0);
        assert_eq!(range(&[2.0]).unwrap(), 0.0);
    }

    #[test]
    fn stdev_is_population() {
        // Mean 5, squared deviations sum to 32 over 8 values.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((stdev(&values).unwrap() - 2.0).abs() < 1e-12);
        assert!((stdev(&[1.0, 0.0]).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_input_is_invalid() {
        assert!(matches!(
            range(&[]),
            Err(RandomizationError::InvalidInput(_))
        ));
        assert!(matches!(
            stdev(&[]),
            Err(RandomizationError::InvalidInput(_))
        ));
    }

    #[test]
    fn adjusts_by_rate() {
        assert_eq!(rate_adjusted(&[4.0, 4.0], &[1.0, 2.0]), vec![4.0, 2.0]);
    }
}
