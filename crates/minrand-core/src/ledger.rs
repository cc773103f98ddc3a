//! Aggregate ledger: the only code that moves aggregate counts.
//!
//! Every operation resolves all the cells it will touch and checks them
//! before the first mutation, so a failure leaves the project unchanged.
//! [`add_to_aggregate`] and [`remove_from_aggregate`] are exact inverses;
//! keeping them paired is the caller's job.

use chrono::Utc;
use tracing::info;

use minrand_model::{DataIntegrityError, Project, RandomizationError, Result, SubjectRecord};

/// The count cells one subject occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cells {
    pub(crate) group: usize,
    /// `(variable, level)` pairs for every variable the subject has a value for.
    pub(crate) levels: Vec<(usize, usize)>,
}

impl Cells {
    fn for_record(record: &SubjectRecord, project: &Project) -> Result<Self> {
        let group = project
            .group_index(&record.current_group)
            .ok_or_else(|| DataIntegrityError::UnknownGroup(record.current_group.clone()))?;
        let mut levels = Vec::with_capacity(project.variables.len());
        for (index, variable) in project.variables.iter().enumerate() {
            let Some(value) = record.covariates.get(&variable.name) else {
                continue;
            };
            let level =
                variable
                    .level_index(value)
                    .ok_or_else(|| DataIntegrityError::UnknownLevel {
                        variable: variable.name.clone(),
                        value: value.clone(),
                    })?;
            levels.push((index, level));
        }
        Ok(Self { group, levels })
    }

    fn with_group(&self, group: usize) -> Self {
        Self {
            group,
            levels: self.levels.clone(),
        }
    }
}

pub(crate) fn apply_add(project: &mut Project, cells: &Cells) {
    project.assignments[cells.group] += 1;
    for &(variable, level) in &cells.levels {
        project
            .aggregate_counts
            .increment(variable, level, cells.group);
    }
}

fn check_remove(project: &Project, cells: &Cells) -> Result<()> {
    let group_name = &project.group_names[cells.group];
    if project.assignments[cells.group] == 0 {
        return Err(DataIntegrityError::CountUnderflow {
            cell: format!("group '{group_name}'"),
        }
        .into());
    }
    for &(variable, level) in &cells.levels {
        if project.aggregate_counts.get(variable, level, cells.group) < 1.0 {
            let variable = &project.variables[variable];
            return Err(DataIntegrityError::CountUnderflow {
                cell: format!(
                    "{}={} in group '{group_name}'",
                    variable.name, variable.levels[level]
                ),
            }
            .into());
        }
    }
    Ok(())
}

fn apply_remove(project: &mut Project, cells: &Cells) {
    project.assignments[cells.group] -= 1;
    for &(variable, level) in &cells.levels {
        project
            .aggregate_counts
            .decrement(variable, level, cells.group);
    }
}

/// Count `record` towards its current group.
pub fn add_to_aggregate(record: &SubjectRecord, project: &mut Project) -> Result<()> {
    let cells = Cells::for_record(record, project)?;
    apply_add(project, &cells);
    Ok(())
}

/// Stop counting `record` towards its current group.
pub fn remove_from_aggregate(record: &SubjectRecord, project: &mut Project) -> Result<()> {
    let cells = Cells::for_record(record, project)?;
    check_remove(project, &cells)?;
    apply_remove(project, &cells);
    Ok(())
}

/// Index of an included raw record, or the reason there is none.
fn included_record(project: &Project, subject_id: &str) -> Result<usize> {
    if !project.store_raw_data {
        return Err(RandomizationError::RawDataNotStored);
    }
    let position = project
        .record_position(subject_id)
        .ok_or_else(|| RandomizationError::SubjectNotFound(subject_id.to_string()))?;
    if !project.raw_data[position].included {
        return Err(RandomizationError::SubjectAlreadyRemoved(
            subject_id.to_string(),
        ));
    }
    Ok(position)
}

/// Withdraw a subject: uncount it, mark it excluded and log the removal.
///
/// A removed subject cannot be included again.
pub fn remove_subject(project: &mut Project, subject_id: &str) -> Result<()> {
    let position = included_record(project, subject_id)?;
    let cells = Cells::for_record(&project.raw_data[position], project)?;
    check_remove(project, &cells)?;

    apply_remove(project, &cells);
    project.raw_data[position].included = false;
    project.removed_subjects.push(subject_id.to_string());
    project.num_assignments = project.num_assignments.saturating_sub(1);
    project.touch(Utc::now());

    info!(
        project = %project.name,
        subject_id,
        group = %project.raw_data[position].current_group,
        "subject removed"
    );
    Ok(())
}

/// Result of moving a subject between groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub subject_id: String,
    pub from: String,
    pub to: String,
}

/// Move an included subject to `new_group`.
pub fn reassign_subject(
    project: &mut Project,
    subject_id: &str,
    new_group: &str,
) -> Result<Reassignment> {
    let position = included_record(project, subject_id)?;
    let to = project
        .group_index(new_group)
        .ok_or_else(|| DataIntegrityError::UnknownGroup(new_group.to_string()))?;
    let old = Cells::for_record(&project.raw_data[position], project)?;
    if old.group == to {
        return Err(RandomizationError::SameGroup {
            subject_id: subject_id.to_string(),
            group: new_group.to_string(),
        });
    }
    check_remove(project, &old)?;

    apply_remove(project, &old);
    apply_add(project, &old.with_group(to));
    let record = &mut project.raw_data[position];
    let from = std::mem::replace(&mut record.current_group, new_group.to_string());
    project.touch(Utc::now());

    info!(
        project = %project.name,
        subject_id,
        from = %from,
        to = new_group,
        "group assignment changed"
    );
    Ok(Reassignment {
        subject_id: subject_id.to_string(),
        from,
        to: new_group.to_string(),
    })
}
