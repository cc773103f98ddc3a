use chrono::{TimeZone, Utc};

use minrand_model::{
    ConfigurationError, Project, ProjectDefinition, ScoringFunction, Variable,
};

fn sample_definition() -> ProjectDefinition {
    ProjectDefinition {
        name: "Exercise study".to_string(),
        group_names: vec!["Placebo".to_string(), "Low".to_string(), "High".to_string()],
        sampling_rates: Some(vec![1.0, 1.0, 2.0]),
        variables: vec![
            Variable::new("sex", ["M", "F"], 1.0, ScoringFunction::Range).unwrap(),
            Variable::new("age", ["<40", "40-60", ">60"], 2.0, ScoringFunction::StDev).unwrap(),
        ],
        bias: 7,
        store_raw_data: true,
    }
}

fn created() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

#[test]
fn create_builds_zeroed_counts() {
    let project = Project::create(sample_definition(), created()).unwrap();

    assert!(project.open);
    assert_eq!(project.num_assignments, 0);
    assert_eq!(project.assignments, vec![0, 0, 0]);
    assert_eq!(project.aggregate_counts.as_nested().len(), 2);
    assert_eq!(project.aggregate_counts.variable(0).len(), 2);
    assert_eq!(project.aggregate_counts.variable(1).len(), 3);
    assert!(
        project
            .aggregate_counts
            .as_nested()
            .iter()
            .flatten()
            .all(|groups| groups.len() == 3 && groups.iter().all(|c| *c == 0.0))
    );
    assert!(project.validate().is_ok());
}

#[test]
fn missing_rates_default_to_one() {
    let mut definition = sample_definition();
    definition.sampling_rates = None;
    let project = Project::create(definition, created()).unwrap();
    assert_eq!(project.sampling_rates, vec![1.0, 1.0, 1.0]);
}

#[test]
fn rejects_single_group() {
    let mut definition = sample_definition();
    definition.group_names = vec!["Only".to_string()];
    definition.sampling_rates = None;
    assert_eq!(
        Project::create(definition, created()).unwrap_err(),
        ConfigurationError::TooFewGroups { found: 1 }
    );
}

#[test]
fn rejects_duplicate_groups() {
    let mut definition = sample_definition();
    definition.group_names = vec!["A".to_string(), "B".to_string(), "A".to_string()];
    assert_eq!(
        Project::create(definition, created()).unwrap_err(),
        ConfigurationError::DuplicateGroup("A".to_string())
    );
}

#[test]
fn rejects_non_positive_rate() {
    let mut definition = sample_definition();
    definition.sampling_rates = Some(vec![1.0, 0.0, 2.0]);
    assert!(matches!(
        Project::create(definition, created()).unwrap_err(),
        ConfigurationError::NonPositiveSamplingRate { ref group, .. } if group == "Low"
    ));
}

#[test]
fn rejects_rate_count_mismatch() {
    let mut definition = sample_definition();
    definition.sampling_rates = Some(vec![1.0, 1.0]);
    assert_eq!(
        Project::create(definition, created()).unwrap_err(),
        ConfigurationError::SamplingRateCount {
            expected: 3,
            found: 2
        }
    );
}

#[test]
fn rejects_bias_out_of_range() {
    let mut definition = sample_definition();
    definition.bias = 0;
    assert_eq!(
        Project::create(definition, created()).unwrap_err(),
        ConfigurationError::BiasOutOfRange(0)
    );
}

#[test]
fn rejects_duplicate_variables() {
    let mut definition = sample_definition();
    definition
        .variables
        .push(Variable::new("sex", ["X", "Y"], 1.0, ScoringFunction::Range).unwrap());
    assert_eq!(
        Project::create(definition, created()).unwrap_err(),
        ConfigurationError::DuplicateVariable("sex".to_string())
    );
}

#[test]
fn validate_detects_count_shape_mismatch() {
    let project = Project::create(sample_definition(), created()).unwrap();
    let mut json: serde_json::Value = serde_json::to_value(&project).unwrap();
    json["aggregate_counts"][0][0] = serde_json::json!([0.0, 0.0]);
    let broken: Project = serde_json::from_value(json).unwrap();
    assert!(matches!(
        broken.validate().unwrap_err(),
        ConfigurationError::Shape(_)
    ));
}

#[test]
fn validate_detects_fractional_counts() {
    let project = Project::create(sample_definition(), created()).unwrap();
    let mut json: serde_json::Value = serde_json::to_value(&project).unwrap();
    json["aggregate_counts"][1][2][0] = serde_json::json!(0.5);
    let broken: Project = serde_json::from_value(json).unwrap();
    assert!(broken.validate().is_err());
}

#[test]
fn normalize_fills_missing_rates() {
    let project = Project::create(sample_definition(), created()).unwrap();
    let mut json: serde_json::Value = serde_json::to_value(&project).unwrap();
    json.as_object_mut().unwrap().remove("sampling_rates");
    let mut legacy: Project = serde_json::from_value(json).unwrap();
    assert!(legacy.sampling_rates.is_empty());
    legacy.normalize();
    assert_eq!(legacy.sampling_rates, vec![1.0, 1.0, 1.0]);
    assert!(legacy.validate().is_ok());
}

#[test]
fn unknown_scoring_function_fails_to_load() {
    let project = Project::create(sample_definition(), created()).unwrap();
    let json = serde_json::to_string(&project)
        .unwrap()
        .replace("\"StDev\"", "\"Variance\"");
    assert!(serde_json::from_str::<Project>(&json).is_err());
}
