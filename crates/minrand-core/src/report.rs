//! Read-only balance summary of a project.

use serde::Serialize;

use minrand_model::{Project, Result, ScoringFunction};

use crate::stats::{imbalance, rate_adjusted};

/// Enrollment per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    pub sampling_rate: f64,
    pub assignments: u64,
}

/// Counts for one `variable=level` row across groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelBalance {
    pub variable: String,
    pub level: String,
    pub scoring_function: ScoringFunction,
    /// Raw counts in group order.
    pub counts: Vec<f64>,
    /// The variable's statistic over the rate-adjusted counts.
    pub imbalance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    pub project: String,
    pub open: bool,
    pub num_assignments: u64,
    pub groups: Vec<GroupSummary>,
    pub levels: Vec<LevelBalance>,
}

impl BalanceReport {
    pub fn from_project(project: &Project) -> Result<Self> {
        project.validate()?;
        let groups = project
            .group_names
            .iter()
            .zip(&project.sampling_rates)
            .zip(&project.assignments)
            .map(|((name, rate), assignments)| GroupSummary {
                name: name.clone(),
                sampling_rate: *rate,
                assignments: *assignments,
            })
            .collect();

        let mut levels = Vec::new();
        for (index, variable) in project.variables.iter().enumerate() {
            for (level, counts) in variable
                .levels
                .iter()
                .zip(project.aggregate_counts.variable(index))
            {
                let adjusted = rate_adjusted(counts, &project.sampling_rates);
                levels.push(LevelBalance {
                    variable: variable.name.clone(),
                    level: level.clone(),
                    scoring_function: variable.scoring_function,
                    counts: counts.clone(),
                    imbalance: imbalance(variable.scoring_function, &adjusted)?,
                });
            }
        }

        Ok(Self {
            project: project.name.clone(),
            open: project.open,
            num_assignments: project.num_assignments,
            groups,
            levels,
        })
    }

    /// Largest per-level imbalance, or zero for a project without variables.
    pub fn worst_imbalance(&self) -> f64 {
        self.levels
            .iter()
            .map(|row| row.imbalance)
            .fold(0.0, f64::max)
    }
}
