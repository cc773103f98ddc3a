//! Project loading.

use std::fs;
use std::path::Path;

use minrand_model::Project;

use crate::error::{Result, StoreError};

/// Read, normalize and validate a stored project.
pub fn read_project(path: &Path) -> Result<Project> {
    let bytes = fs::read(path).map_err(|e| StoreError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_project(&bytes, path)
}

fn parse_project(bytes: &[u8], path: &Path) -> Result<Project> {
    let mut project: Project =
        serde_json::from_slice(bytes).map_err(|source| StoreError::Deserialization {
            path: path.to_path_buf(),
            source,
        })?;
    project.normalize();
    project.validate()?;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_a_deserialization_error() {
        let err = parse_project(b"{not json", Path::new("x.json")).unwrap_err();
        assert!(matches!(err, StoreError::Deserialization { .. }));
    }

    #[test]
    fn missing_rates_are_filled_on_load() {
        let json = br#"{
            "name": "legacy",
            "created": "2024-01-01T00:00:00Z",
            "group_names": ["A", "B"],
            "variables": [
                {"name": "sex", "levels": ["M", "F"], "weight": 1.0, "scoring_function": "Range"}
            ],
            "bias": 4,
            "aggregate_counts": [[[0.0, 0.0], [0.0, 0.0]]],
            "assignments": [0, 0],
            "store_raw_data": false,
            "num_assignments": 0,
            "open": true
        }"#;
        let project = parse_project(json, Path::new("legacy.json")).unwrap();
        assert_eq!(project.sampling_rates, vec![1.0, 1.0]);
    }

    #[test]
    fn shape_errors_surface_as_configuration() {
        let json = br#"{
            "name": "broken",
            "created": "2024-01-01T00:00:00Z",
            "group_names": ["A", "B"],
            "variables": [
                {"name": "sex", "levels": ["M", "F"], "weight": 1.0, "scoring_function": "Range"}
            ],
            "sampling_rates": [1.0, 1.0],
            "bias": 4,
            "aggregate_counts": [[[0.0], [0.0, 0.0]]],
            "assignments": [0, 0],
            "store_raw_data": false,
            "num_assignments": 0,
            "open": true
        }"#;
        let err = parse_project(json, Path::new("broken.json")).unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }
}
