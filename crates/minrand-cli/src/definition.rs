//! TOML project definitions.
//!
//! ```toml
//! name = "Hypertension pilot"
//! groups = ["Control", "Treatment"]
//! sampling_rates = [1.0, 2.0]   # optional, equal allocation when absent
//! bias = 5
//! store_raw_data = true         # optional, default true
//!
//! [[variables]]
//! name = "sex"
//! levels = ["M", "F"]
//! weight = 1.0                  # optional, default 1.0
//! scoring_function = "range"    # range | stdev
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use minrand_model::{ProjectDefinition, ScoringFunction, Variable};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDefinition {
    name: String,
    groups: Vec<String>,
    #[serde(default)]
    sampling_rates: Option<Vec<f64>>,
    bias: i64,
    #[serde(default = "default_store_raw_data")]
    store_raw_data: bool,
    #[serde(default)]
    variables: Vec<RawVariable>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVariable {
    name: String,
    levels: Vec<String>,
    #[serde(default = "default_weight")]
    weight: f64,
    scoring_function: String,
}

fn default_store_raw_data() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

/// Parse and validate a definition.
pub fn parse_definition(text: &str) -> Result<ProjectDefinition> {
    let raw: RawDefinition = toml::from_str(text).context("parse project definition")?;
    let variables = raw
        .variables
        .into_iter()
        .map(|variable| -> Result<Variable> {
            let scoring_function: ScoringFunction = variable
                .scoring_function
                .parse()
                .with_context(|| format!("variable '{}'", variable.name))?;
            Variable::new(
                variable.name.clone(),
                variable.levels,
                variable.weight,
                scoring_function,
            )
            .with_context(|| format!("variable '{}'", variable.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let definition = ProjectDefinition {
        name: raw.name,
        group_names: raw
            .groups
            .into_iter()
            .map(|group| group.trim().to_string())
            .collect(),
        sampling_rates: raw.sampling_rates,
        variables,
        bias: raw.bias,
        store_raw_data: raw.store_raw_data,
    };
    definition
        .validate()
        .context("invalid project definition")?;
    Ok(definition)
}

/// Read a definition file.
pub fn load_definition(path: &Path) -> Result<ProjectDefinition> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_definition(&text).with_context(|| format!("load {}", path.display()))
}
