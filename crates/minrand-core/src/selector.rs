//! Assignment selector: score every group, rank, draw, break ties, commit.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use minrand_model::{DataIntegrityError, Project, RandomizationError, Result, SubjectRecord};

use crate::ledger::{Cells, apply_add};
use crate::probability::RankProbabilities;
use crate::random::RandomSource;
use crate::score::score_level;

/// One subject to be randomized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    /// Observed level for every project variable, keyed by variable name.
    pub covariates: BTreeMap<String, String>,
    pub subject_id: String,
    pub assigner: String,
}

/// Details of a committed assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub group_index: usize,
    pub group_name: String,
    /// Weighted imbalance total per candidate group, in group order.
    pub scores: Vec<f64>,
    /// Rank drawn from the biased coin (0 = most balanced).
    pub rank: usize,
    /// Groups whose total tied the drawn rank's score.
    pub ties: Vec<usize>,
}

/// The assigned group together with the project state to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentOutcome {
    pub assigned_group: String,
    pub project: Project,
}

/// Checks the caller runs before assigning, mirroring the enrollment form.
///
/// The project must be open; when raw data is stored the subject id must be
/// non-blank and unused.
pub fn check_before_assigning(project: &Project, subject_id: &str) -> Result<()> {
    if !project.open {
        return Err(RandomizationError::EnrollmentClosed);
    }
    if project.store_raw_data {
        if subject_id.trim().is_empty() {
            return Err(RandomizationError::EmptySubjectId);
        }
        if project.record(subject_id).is_some() {
            return Err(RandomizationError::DuplicateSubject(subject_id.to_string()));
        }
    }
    Ok(())
}

/// Level index for every variable, or the first value that does not fit.
fn resolve_levels(
    project: &Project,
    covariates: &BTreeMap<String, String>,
) -> Result<Vec<(usize, usize)>> {
    project
        .variables
        .iter()
        .enumerate()
        .map(|(index, variable)| -> Result<(usize, usize)> {
            let value = covariates.get(&variable.name).ok_or_else(|| {
                DataIntegrityError::MissingCovariate {
                    variable: variable.name.clone(),
                }
            })?;
            let level =
                variable
                    .level_index(value)
                    .ok_or_else(|| DataIntegrityError::UnknownLevel {
                        variable: variable.name.clone(),
                        value: value.clone(),
                    })?;
            Ok((index, level))
        })
        .collect()
}

/// Weighted imbalance total for each candidate group.
pub fn group_scores(project: &Project, levels: &[(usize, usize)]) -> Result<Vec<f64>> {
    (0..project.group_count())
        .map(|group| {
            levels
                .iter()
                .try_fold(0.0, |total, &(variable, level)| -> Result<f64> {
                    let definition = &project.variables[variable];
                    let score = score_level(
                        level,
                        group,
                        project.aggregate_counts.variable(variable),
                        &project.sampling_rates,
                        definition,
                    )?;
                    Ok(total + definition.weight * score)
                })
        })
        .collect()
}

/// Randomize one subject and update `project` in place.
///
/// Every covariate is resolved before anything changes, so an error leaves
/// `project` exactly as it was. The enrollment gate is not checked here; see
/// [`check_before_assigning`].
pub fn assign<R: RandomSource + ?Sized>(
    project: &mut Project,
    request: &AssignmentRequest,
    rng: &mut R,
) -> Result<Assignment> {
    project.validate()?;
    let levels = resolve_levels(project, &request.covariates)?;
    let scores = group_scores(project, &levels)?;
    let probabilities = RankProbabilities::new(project.group_count(), project.bias)?;

    let mut sorted = scores.clone();
    sorted.sort_by(f64::total_cmp);

    let draw = rng.float64();
    let rank = probabilities.rank_for(draw);
    let target = sorted[rank];
    // Exact comparison: tied groups are those with bit-identical totals.
    let ties: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score == target)
        .map(|(group, _)| group)
        .collect();
    let group_index = ties[rng.intn(ties.len())];
    debug!(
        scores = ?scores,
        probabilities = ?probabilities.probabilities(),
        draw,
        rank,
        ties = ?ties,
        "scored candidate groups"
    );

    apply_add(
        project,
        &Cells {
            group: group_index,
            levels,
        },
    );
    let group_name = project.group_names[group_index].clone();
    let now = Utc::now();
    if project.store_raw_data {
        project.raw_data.push(SubjectRecord {
            subject_id: request.subject_id.clone(),
            assigned_time: now,
            assigned_group: group_name.clone(),
            current_group: group_name.clone(),
            included: true,
            covariates: project
                .variables
                .iter()
                .filter_map(|v| {
                    request
                        .covariates
                        .get(&v.name)
                        .map(|value| (v.name.clone(), value.clone()))
                })
                .collect(),
            assigner: request.assigner.clone(),
        });
    }
    project.num_assignments += 1;
    project.touch(now);

    info!(
        project = %project.name,
        subject_id = %request.subject_id,
        group = %group_name,
        "subject assigned"
    );
    Ok(Assignment {
        group_index,
        group_name,
        scores,
        rank,
        ties,
    })
}

/// By-value form of [`assign`]: consumes the project state and returns the
/// updated copy alongside the chosen group.
pub fn randomize<R: RandomSource + ?Sized>(
    mut project: Project,
    request: &AssignmentRequest,
    rng: &mut R,
) -> Result<AssignmentOutcome> {
    let assignment = assign(&mut project, request, rng)?;
    Ok(AssignmentOutcome {
        assigned_group: assignment.group_name,
        project,
    })
}
