//! Project state consumed and produced by the randomization engine.
//!
//! A [`Project`] carries the fixed design (groups, variables, sampling
//! rates, bias) together with the running aggregate counts that the
//! minimization scorer reads. The counts are the sufficient statistic for
//! future assignments; per-subject records are kept only when the project
//! stores raw data.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Bias;
use crate::error::ConfigurationError;
use crate::variable::Variable;

/// Running tally indexed by `[variable][level][group]`.
///
/// Counts are whole numbers held as `f64` so the scorer can divide them by
/// sampling rates directly. They only ever move by exactly one, which keeps
/// them integral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateCounts(Vec<Vec<Vec<f64>>>);

impl AggregateCounts {
    /// All-zero counts for the given variables and group count.
    pub fn zeros(variables: &[Variable], group_count: usize) -> Self {
        Self(
            variables
                .iter()
                .map(|variable| vec![vec![0.0; group_count]; variable.levels.len()])
                .collect(),
        )
    }

    /// Level-by-group counts for one variable.
    pub fn variable(&self, variable: usize) -> &[Vec<f64>] {
        &self.0[variable]
    }

    pub fn get(&self, variable: usize, level: usize, group: usize) -> f64 {
        self.0[variable][level][group]
    }

    /// Sum over all levels and groups of one variable.
    pub fn variable_total(&self, variable: usize) -> f64 {
        self.0[variable].iter().flatten().sum()
    }

    /// Add one to a cell. Callers go through the aggregate ledger.
    pub fn increment(&mut self, variable: usize, level: usize, group: usize) {
        self.0[variable][level][group] += 1.0;
    }

    /// Subtract one from a cell. Callers go through the aggregate ledger,
    /// which refuses to take a cell below zero.
    pub fn decrement(&mut self, variable: usize, level: usize, group: usize) {
        self.0[variable][level][group] -= 1.0;
    }

    pub fn as_nested(&self) -> &[Vec<Vec<f64>>] {
        &self.0
    }

    fn check_shape(&self, variables: &[Variable], group_count: usize) -> Result<(), String> {
        if self.0.len() != variables.len() {
            return Err(format!(
                "aggregate counts cover {} variables, expected {}",
                self.0.len(),
                variables.len()
            ));
        }
        for (levels, variable) in self.0.iter().zip(variables) {
            if levels.len() != variable.levels.len() {
                return Err(format!(
                    "aggregate counts for '{}' cover {} levels, expected {}",
                    variable.name,
                    levels.len(),
                    variable.levels.len()
                ));
            }
            for (groups, level) in levels.iter().zip(&variable.levels) {
                if groups.len() != group_count {
                    return Err(format!(
                        "aggregate counts for {}={} cover {} groups, expected {group_count}",
                        variable.name,
                        level,
                        groups.len()
                    ));
                }
                if let Some(bad) = groups.iter().find(|c| **c < 0.0 || c.fract() != 0.0) {
                    return Err(format!(
                        "aggregate count {bad} for {}={} is not a non-negative whole number",
                        variable.name, level
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Raw data for one randomized subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub subject_id: String,
    pub assigned_time: DateTime<Utc>,
    /// Group chosen by the randomization; never changes afterwards.
    pub assigned_group: String,
    /// Group the subject currently counts towards.
    pub current_group: String,
    pub included: bool,
    /// Covariate snapshot keyed by variable name.
    pub covariates: BTreeMap<String, String>,
    pub assigner: String,
}

/// Validated inputs for creating a new project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDefinition {
    pub name: String,
    pub group_names: Vec<String>,
    /// One rate per group; `None` means equal allocation.
    pub sampling_rates: Option<Vec<f64>>,
    pub variables: Vec<Variable>,
    pub bias: i64,
    pub store_raw_data: bool,
}

impl ProjectDefinition {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyProjectName);
        }
        validate_groups(&self.group_names)?;
        if let Some(rates) = &self.sampling_rates {
            validate_rates(&self.group_names, rates)?;
        }
        validate_variables(&self.variables)?;
        Bias::new(self.bias)?;
        Ok(())
    }
}

/// Complete state of one randomization project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub created: DateTime<Utc>,
    /// Time of the last assignment, removal or reassignment.
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    pub group_names: Vec<String>,
    pub variables: Vec<Variable>,
    /// Older project files may lack rates; see [`Project::normalize`].
    #[serde(default)]
    pub sampling_rates: Vec<f64>,
    pub bias: Bias,
    pub aggregate_counts: AggregateCounts,
    /// Number of included subjects per group.
    pub assignments: Vec<u64>,
    pub store_raw_data: bool,
    #[serde(default)]
    pub raw_data: Vec<SubjectRecord>,
    pub num_assignments: u64,
    #[serde(default)]
    pub removed_subjects: Vec<String>,
    /// Enrollment gate, checked by the caller before assigning.
    pub open: bool,
}

impl Project {
    /// Create a project with zeroed counts, open for enrollment.
    pub fn create(
        definition: ProjectDefinition,
        created: DateTime<Utc>,
    ) -> Result<Self, ConfigurationError> {
        definition.validate()?;
        let group_count = definition.group_names.len();
        let ProjectDefinition {
            name,
            group_names,
            sampling_rates,
            variables,
            bias,
            store_raw_data,
        } = definition;
        Ok(Self {
            name: name.trim().to_string(),
            created,
            modified: None,
            sampling_rates: sampling_rates.unwrap_or_else(|| vec![1.0; group_count]),
            aggregate_counts: AggregateCounts::zeros(&variables, group_count),
            assignments: vec![0; group_count],
            group_names,
            variables,
            bias: Bias::new(bias)?,
            store_raw_data,
            raw_data: Vec::new(),
            num_assignments: 0,
            removed_subjects: Vec::new(),
            open: true,
        })
    }

    pub fn group_count(&self) -> usize {
        self.group_names.len()
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.group_names.iter().position(|group| group == name)
    }

    /// Fill in defaults for fields that older project files may omit.
    pub fn normalize(&mut self) {
        if self.sampling_rates.is_empty() {
            self.sampling_rates = vec![1.0; self.group_count()];
        }
    }

    /// Check that the stored state is internally consistent.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyProjectName);
        }
        validate_groups(&self.group_names)?;
        validate_rates(&self.group_names, &self.sampling_rates)?;
        validate_variables(&self.variables)?;
        self.aggregate_counts
            .check_shape(&self.variables, self.group_count())
            .map_err(ConfigurationError::Shape)?;
        if self.assignments.len() != self.group_count() {
            return Err(ConfigurationError::Shape(format!(
                "assignment totals cover {} groups, expected {}",
                self.assignments.len(),
                self.group_count()
            )));
        }
        Ok(())
    }

    pub fn record(&self, subject_id: &str) -> Option<&SubjectRecord> {
        self.raw_data
            .iter()
            .find(|record| record.subject_id == subject_id)
    }

    pub fn record_position(&self, subject_id: &str) -> Option<usize> {
        self.raw_data
            .iter()
            .position(|record| record.subject_id == subject_id)
    }

    /// Update the last-modified timestamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.modified = Some(now);
    }
}

fn validate_groups(group_names: &[String]) -> Result<(), ConfigurationError> {
    if group_names.len() < 2 {
        return Err(ConfigurationError::TooFewGroups {
            found: group_names.len(),
        });
    }
    let mut seen = BTreeSet::new();
    for name in group_names {
        if name.trim().is_empty() {
            return Err(ConfigurationError::EmptyGroupName);
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigurationError::DuplicateGroup(name.clone()));
        }
    }
    Ok(())
}

fn validate_rates(group_names: &[String], rates: &[f64]) -> Result<(), ConfigurationError> {
    if rates.len() != group_names.len() {
        return Err(ConfigurationError::SamplingRateCount {
            expected: group_names.len(),
            found: rates.len(),
        });
    }
    for (group, &rate) in group_names.iter().zip(rates) {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigurationError::NonPositiveSamplingRate {
                group: group.clone(),
                rate,
            });
        }
    }
    Ok(())
}

fn validate_variables(variables: &[Variable]) -> Result<(), ConfigurationError> {
    let mut seen = BTreeSet::new();
    for variable in variables {
        variable.validate()?;
        if !seen.insert(variable.name.as_str()) {
            return Err(ConfigurationError::DuplicateVariable(variable.name.clone()));
        }
    }
    Ok(())
}
