//! Integration tests for TOML project definitions.

use minrand_cli::definition::parse_definition;
use minrand_model::ScoringFunction;

#[test]
fn full_definition_parses() {
    let definition = parse_definition(
        r#"
name = "Hypertension pilot"
groups = ["Control", "Treatment"]
sampling_rates = [1.0, 2.0]
bias = 5
store_raw_data = false

[[variables]]
name = "sex"
levels = ["M", "F"]
scoring_function = "range"

[[variables]]
name = "age"
levels = ["<65", ">=65"]
weight = 2.5
scoring_function = "SD"
"#,
    )
    .unwrap();

    assert_eq!(definition.name, "Hypertension pilot");
    assert_eq!(definition.group_names, vec!["Control", "Treatment"]);
    assert_eq!(definition.sampling_rates, Some(vec![1.0, 2.0]));
    assert!(!definition.store_raw_data);
    assert_eq!(definition.variables.len(), 2);
    assert_eq!(definition.variables[0].weight, 1.0);
    assert_eq!(definition.variables[0].scoring_function, ScoringFunction::Range);
    assert_eq!(definition.variables[1].weight, 2.5);
    assert_eq!(definition.variables[1].scoring_function, ScoringFunction::StDev);
}

#[test]
fn defaults_apply() {
    let definition = parse_definition(
        r#"
name = "Minimal"
groups = ["A", "B", "C"]
bias = 1
"#,
    )
    .unwrap();
    assert_eq!(definition.sampling_rates, None);
    assert!(definition.store_raw_data);
    assert!(definition.variables.is_empty());
}

#[test]
fn unknown_scoring_function_names_the_variable() {
    let err = parse_definition(
        r#"
name = "Bad"
groups = ["A", "B"]
bias = 5

[[variables]]
name = "site"
levels = ["1", "2"]
scoring_function = "variance"
"#,
    )
    .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("site"), "{message}");
    assert!(message.contains("variance"), "{message}");
}

#[test]
fn validation_errors_surface() {
    for (text, needle) in [
        ("name = \"x\"\ngroups = [\"A\"]\nbias = 5\n", "group"),
        ("name = \"x\"\ngroups = [\"A\", \"B\"]\nbias = 11\n", "11"),
        (
            "name = \"x\"\ngroups = [\"A\", \"B\"]\nsampling_rates = [1.0, 0.0]\nbias = 5\n",
            "B",
        ),
        ("name = \"x\"\ngroups = [\"A\", \"B\"]\nbias = 5\ncolour = 1\n", "colour"),
    ] {
        let err = parse_definition(text).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains(needle), "{needle:?} not in {message}");
    }
}
