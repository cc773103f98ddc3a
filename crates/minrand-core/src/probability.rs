//! Pocock-Simon biased-coin probabilities over score ranks.
//!
//! Rank 0 is the most balanced candidate. With `N` groups and bias `b`:
//!
//! ```text
//! qmin = 1 / N
//! qmax = 2 / (N - 1)
//! qq   = qmin + (b - 1) * (qmax - qmin) / 9
//! p[r] = qq - 2 * (N * qq - 1) * (r + 1) / (N * (N + 1))
//! ```
//!
//! The probabilities sum to one and never increase with rank. Bias 1 gives
//! the uniform distribution; bias 10 puts all mass on the better half.

use minrand_model::{Bias, ConfigurationError, Result};

/// Rank probabilities and their running sum.
#[derive(Debug, Clone, PartialEq)]
pub struct RankProbabilities {
    probabilities: Vec<f64>,
    cumulative: Vec<f64>,
}

impl RankProbabilities {
    pub fn new(group_count: usize, bias: Bias) -> Result<Self> {
        if group_count < 2 {
            return Err(ConfigurationError::TooFewGroups { found: group_count }.into());
        }
        let n = group_count as f64;
        let qmin = 1.0 / n;
        let qmax = 2.0 / (n - 1.0);
        let qq = qmin + f64::from(bias.get() - 1) * (qmax - qmin) / 9.0;

        let probabilities: Vec<f64> = (0..group_count)
            .map(|rank| qq - 2.0 * (n * qq - 1.0) * (rank as f64 + 1.0) / (n * (n + 1.0)))
            .collect();
        let cumulative = probabilities
            .iter()
            .scan(0.0, |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect();

        Ok(Self {
            probabilities,
            cumulative,
        })
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Smallest rank whose cumulative probability exceeds `draw`.
    ///
    /// A draw at or above the final cumulative value (rounding near 1) maps
    /// to the last rank.
    pub fn rank_for(&self, draw: f64) -> usize {
        self.cumulative
            .iter()
            .position(|&c| c > draw)
            .unwrap_or(self.cumulative.len() - 1)
    }
}
