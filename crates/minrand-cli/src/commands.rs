use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use tracing::{debug, info_span, warn};

use minrand_core::{
    Assignment, AssignmentRequest, BalanceReport, RandomSource, Reassignment, RngSource, assign,
    check_before_assigning, reassign_subject, remove_subject,
};
use minrand_model::Project;
use minrand_store::{ProjectKey, ProjectStore, StoreError, update_project};

use crate::definition::load_definition;
use crate::logging::redact_value;

/// Inputs for `minrand assign`.
#[derive(Debug, Clone)]
pub struct AssignOptions {
    pub subject_id: String,
    pub assigner: String,
    /// `variable=level` pairs.
    pub values: Vec<String>,
    /// Fixed seed for a reproducible draw; entropy otherwise.
    pub seed: Option<u64>,
    /// Commit attempts before giving up on concurrent writers.
    pub max_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct AssignResult {
    pub project: String,
    pub subject_id: String,
    pub assignment: Assignment,
    /// Group names in index order, for display.
    pub group_names: Vec<String>,
    pub attempts: u32,
}

/// One row of `minrand list`.
#[derive(Debug, Clone)]
pub struct ProjectListing {
    pub key: ProjectKey,
    pub name: String,
    pub groups: Vec<String>,
    pub num_assignments: u64,
    pub open: bool,
    pub created: DateTime<Utc>,
    pub modified: Option<DateTime<Utc>>,
}

fn parse_key(project: &str) -> Result<ProjectKey> {
    Ok(ProjectKey::new(project)?)
}

/// Split `variable=level` arguments into a covariate map.
pub fn parse_values(values: &[String]) -> Result<BTreeMap<String, String>> {
    let mut covariates = BTreeMap::new();
    for value in values {
        let (name, level) = value
            .split_once('=')
            .ok_or_else(|| anyhow!("expected VARIABLE=LEVEL, got '{value}'"))?;
        let name = name.trim();
        if name.is_empty() {
            bail!("missing variable name in '{value}'");
        }
        if covariates
            .insert(name.to_string(), level.trim().to_string())
            .is_some()
        {
            bail!("variable '{name}' given more than once");
        }
    }
    Ok(covariates)
}

/// Store a new project from a definition file. The key defaults to the
/// file stem.
pub fn run_create(
    store: &dyn ProjectStore,
    definition_path: &Path,
    key: Option<&str>,
) -> Result<(ProjectKey, Project)> {
    let key = match key {
        Some(key) => parse_key(key)?,
        None => {
            let stem = definition_path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| {
                    anyhow!(
                        "cannot derive a project key from {}",
                        definition_path.display()
                    )
                })?;
            parse_key(stem).context("derive project key from file name; pass --key")?
        }
    };
    let definition = load_definition(definition_path)?;
    let project = Project::create(definition, Utc::now()).context("create project")?;
    store.create(&key, &project)?;
    Ok((key, project))
}

pub fn run_assign(
    store: &dyn ProjectStore,
    project: &str,
    options: &AssignOptions,
) -> Result<AssignResult> {
    let mut rng = match options.seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::from_entropy(),
    };
    run_assign_with(store, project, options, &mut rng)
}

/// [`run_assign`] with a caller-supplied random source. Every commit attempt
/// draws from the same stream.
pub fn run_assign_with(
    store: &dyn ProjectStore,
    project: &str,
    options: &AssignOptions,
    rng: &mut dyn RandomSource,
) -> Result<AssignResult> {
    let key = parse_key(project)?;
    let span = info_span!("assign", project = %key, subject_id = %options.subject_id);
    let _guard = span.enter();

    let request = AssignmentRequest {
        covariates: parse_values(&options.values)?,
        subject_id: options.subject_id.trim().to_string(),
        assigner: options.assigner.clone(),
    };
    let shown: Vec<String> = request
        .covariates
        .iter()
        .map(|(name, value)| format!("{name}={}", redact_value(value)))
        .collect();
    debug!(covariates = ?shown, "assignment requested");

    let max_attempts = options.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        let result = update_project(store, &key, |project| {
            check_before_assigning(project, &request.subject_id)?;
            let assignment = assign(project, &request, &mut *rng)?;
            Ok((assignment, project.group_names.clone()))
        });
        match result {
            Ok((assignment, group_names)) => {
                return Ok(AssignResult {
                    project: key.to_string(),
                    subject_id: request.subject_id,
                    assignment,
                    group_names,
                    attempts: attempt,
                });
            }
            Err(StoreError::Concurrency { .. }) if attempt < max_attempts => {
                warn!(attempt, "project changed during assignment, retrying");
            }
            Err(error) => return Err(error.into()),
        }
    }
    Err(StoreError::Concurrency {
        key: key.to_string(),
    }
    .into())
}

pub fn run_remove(store: &dyn ProjectStore, project: &str, subject_id: &str) -> Result<()> {
    let key = parse_key(project)?;
    update_project(store, &key, |project| remove_subject(project, subject_id))?;
    Ok(())
}

pub fn run_reassign(
    store: &dyn ProjectStore,
    project: &str,
    subject_id: &str,
    group: &str,
) -> Result<Reassignment> {
    let key = parse_key(project)?;
    Ok(update_project(store, &key, |project| {
        reassign_subject(project, subject_id, group)
    })?)
}

/// Open or close enrollment. Returns the previous state.
pub fn run_set_open(store: &dyn ProjectStore, project: &str, open: bool) -> Result<bool> {
    let key = parse_key(project)?;
    Ok(update_project(store, &key, |project| {
        Ok(std::mem::replace(&mut project.open, open))
    })?)
}

pub fn run_stats(store: &dyn ProjectStore, project: &str) -> Result<BalanceReport> {
    let key = parse_key(project)?;
    let project = store.load(&key)?;
    BalanceReport::from_project(&project).with_context(|| format!("summarize '{key}'"))
}

pub fn run_list(store: &dyn ProjectStore) -> Result<Vec<ProjectListing>> {
    store
        .keys()?
        .into_iter()
        .map(|key| -> Result<ProjectListing> {
            let project = store
                .load(&key)
                .with_context(|| format!("load '{key}'"))?;
            Ok(ProjectListing {
                name: project.name,
                groups: project.group_names,
                num_assignments: project.num_assignments,
                open: project.open,
                created: project.created,
                modified: project.modified,
                key,
            })
        })
        .collect()
}
