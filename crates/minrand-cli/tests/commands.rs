//! Integration tests for the command layer against a file store.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use tempfile::tempdir;

use minrand_cli::commands::{
    AssignOptions, parse_values, run_assign, run_assign_with, run_create, run_list, run_reassign,
    run_remove, run_set_open, run_stats,
};
use minrand_core::ScriptedSource;
use minrand_model::{Project, RandomizationError};
use minrand_store::{FileStore, InMemoryStore, ProjectKey, ProjectStore, StoreError};

const DEFINITION: &str = r#"
name = "Pilot"
groups = ["Control", "Treatment"]
bias = 5

[[variables]]
name = "sex"
levels = ["M", "F"]
scoring_function = "range"

[[variables]]
name = "site"
levels = ["north", "south"]
scoring_function = "stdev"
"#;

fn write_definition(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("pilot.toml");
    fs::write(&path, DEFINITION).unwrap();
    path
}

fn options(subject: &str, sex: &str, site: &str) -> AssignOptions {
    AssignOptions {
        subject_id: subject.to_string(),
        assigner: "tester".to_string(),
        values: vec![format!("sex={sex}"), format!("site = {site}")],
        seed: Some(42),
        max_attempts: 3,
    }
}

fn store_error(err: &anyhow::Error) -> &StoreError {
    err.downcast_ref::<StoreError>()
        .unwrap_or_else(|| panic!("not a store error: {err:#}"))
}

#[test]
fn parse_values_rejects_malformed_pairs() {
    let ok = parse_values(&["sex=M".to_string(), " site = north ".to_string()]).unwrap();
    assert_eq!(ok.get("sex").map(String::as_str), Some("M"));
    assert_eq!(ok.get("site").map(String::as_str), Some("north"));

    assert!(parse_values(&["sex".to_string()]).is_err());
    assert!(parse_values(&["=M".to_string()]).is_err());
    assert!(parse_values(&["sex=M".to_string(), "sex=F".to_string()]).is_err());
}

#[test]
fn project_lifecycle() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("store"));
    let definition = write_definition(dir.path());

    let (key, project) = run_create(&store, &definition, None).unwrap();
    assert_eq!(key.as_str(), "pilot");
    assert_eq!(project.name, "Pilot");
    let err = run_create(&store, &definition, None).unwrap_err();
    assert!(matches!(store_error(&err), StoreError::AlreadyExists { .. }));

    for (id, sex, site) in [("S1", "M", "north"), ("S2", "F", "south"), ("S3", "M", "south")] {
        let result = run_assign(&store, "pilot", &options(id, sex, site)).unwrap();
        assert_eq!(result.attempts, 1);
        assert_eq!(result.group_names, vec!["Control", "Treatment"]);
    }

    let err = run_assign(&store, "pilot", &options("S1", "F", "north")).unwrap_err();
    assert!(matches!(
        store_error(&err),
        StoreError::Randomization(RandomizationError::DuplicateSubject(_))
    ));

    let report = run_stats(&store, "pilot").unwrap();
    assert_eq!(report.num_assignments, 3);
    assert_eq!(report.levels.len(), 4);

    run_remove(&store, "pilot", "S2").unwrap();
    let err = run_remove(&store, "pilot", "S2").unwrap_err();
    assert!(matches!(
        store_error(&err),
        StoreError::Randomization(RandomizationError::SubjectAlreadyRemoved(_))
    ));

    let from = fs::read_to_string(dir.path().join("store/pilot.json")).unwrap();
    let stored: minrand_model::Project = serde_json::from_str(&from).unwrap();
    let current = stored.record("S1").unwrap().current_group.clone();
    let target = if current == "Control" { "Treatment" } else { "Control" };
    let moved = run_reassign(&store, "pilot", "S1", target).unwrap();
    assert_eq!(moved.from, current);
    assert_eq!(moved.to, target);

    assert!(run_set_open(&store, "pilot", false).unwrap());
    let err = run_assign(&store, "pilot", &options("S4", "F", "north")).unwrap_err();
    assert!(matches!(
        store_error(&err),
        StoreError::Randomization(RandomizationError::EnrollmentClosed)
    ));
    assert!(!run_set_open(&store, "pilot", true).unwrap());
    run_assign(&store, "pilot", &options("S4", "F", "north")).unwrap();

    let listings = run_list(&store).unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].num_assignments, 3);
    assert!(listings[0].open);
    assert!(listings[0].modified.is_some());
}

#[test]
fn seeded_assignments_repeat() {
    let groups: Vec<Vec<String>> = (0..2)
        .map(|_| {
            let dir = tempdir().unwrap();
            let store = FileStore::new(dir.path());
            run_create(&store, &write_definition(dir.path()), Some("seeded")).unwrap();
            (0..6)
                .map(|i| {
                    let sex = if i % 2 == 0 { "M" } else { "F" };
                    run_assign(&store, "seeded", &options(&format!("S{i}"), sex, "north"))
                        .unwrap()
                        .assignment
                        .group_name
                })
                .collect()
        })
        .collect();
    assert_eq!(groups[0], groups[1]);
}

#[test]
fn bad_input_is_rejected_before_storage() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    run_create(&store, &write_definition(dir.path()), None).unwrap();

    let err = run_assign(&store, "pilot", &options("S1", "X", "north")).unwrap_err();
    assert!(matches!(
        store_error(&err),
        StoreError::Randomization(RandomizationError::DataIntegrity(_))
    ));
    assert_eq!(run_stats(&store, "pilot").unwrap().num_assignments, 0);

    let err = run_stats(&store, "../pilot").unwrap_err();
    assert!(matches!(store_error(&err), StoreError::InvalidKey { .. }));
    let err = run_stats(&store, "missing").unwrap_err();
    assert!(matches!(store_error(&err), StoreError::NotFound { .. }));
}

/// Loses the first `conflicts` compare-and-swap calls, as if another writer
/// had committed in between.
struct ContendedStore {
    inner: InMemoryStore,
    conflicts: Cell<u32>,
}

impl ProjectStore for ContendedStore {
    fn load(&self, key: &ProjectKey) -> minrand_store::Result<Project> {
        self.inner.load(key)
    }

    fn create(&self, key: &ProjectKey, project: &Project) -> minrand_store::Result<()> {
        self.inner.create(key, project)
    }

    fn compare_and_swap(
        &self,
        key: &ProjectKey,
        expected: &Project,
        new: &Project,
    ) -> minrand_store::Result<bool> {
        let remaining = self.conflicts.get();
        if remaining > 0 {
            self.conflicts.set(remaining - 1);
            return Ok(false);
        }
        self.inner.compare_and_swap(key, expected, new)
    }

    fn keys(&self) -> minrand_store::Result<Vec<ProjectKey>> {
        self.inner.keys()
    }
}

#[test]
fn retry_continues_the_random_stream() {
    let dir = tempdir().unwrap();
    let store = ContendedStore {
        inner: InMemoryStore::new(),
        conflicts: Cell::new(1),
    };
    run_create(&store, &write_definition(dir.path()), None).unwrap();

    // The first subject ties every group, so each attempt spends one index
    // draw. Replaying the stream would pick group 0 again.
    let mut rng = ScriptedSource::new([0.0, 0.0], [0, 1]);
    let result = run_assign_with(&store, "pilot", &options("S1", "M", "north"), &mut rng).unwrap();
    assert_eq!(result.attempts, 2);
    assert_eq!(result.assignment.group_index, 1);
    assert_eq!(result.assignment.group_name, "Treatment");

    let stored = store.load(&ProjectKey::new("pilot").unwrap()).unwrap();
    assert_eq!(stored.assignments, vec![0, 1]);
}

#[test]
fn retries_stop_at_max_attempts() {
    let dir = tempdir().unwrap();
    let store = ContendedStore {
        inner: InMemoryStore::new(),
        conflicts: Cell::new(3),
    };
    run_create(&store, &write_definition(dir.path()), None).unwrap();

    let err = run_assign(&store, "pilot", &options("S1", "M", "north")).unwrap_err();
    assert!(matches!(store_error(&err), StoreError::Concurrency { .. }));
    assert_eq!(run_stats(&store, "pilot").unwrap().num_assignments, 0);
}
