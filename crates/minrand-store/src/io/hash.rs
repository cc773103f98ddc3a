//! Revision digests for compare-and-swap.

use minrand_model::Project;
use sha2::{Digest, Sha256};

use crate::error::{Result, StoreError};

/// Canonical JSON bytes of a project.
///
/// Field order is fixed by the type definitions and covariate maps are
/// ordered, so equal projects always produce equal bytes.
pub fn canonical_json(project: &Project) -> Result<Vec<u8>> {
    serde_json::to_vec(project).map_err(|source| StoreError::Serialization { source })
}

/// SHA-256 of the canonical JSON, as lowercase hex.
pub fn revision(project: &Project) -> Result<String> {
    let bytes = canonical_json(project)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use minrand_model::{ProjectDefinition, ScoringFunction, Variable};

    use super::*;

    fn project() -> Project {
        Project::create(
            ProjectDefinition {
                name: "digest".to_string(),
                group_names: vec!["A".to_string(), "B".to_string()],
                sampling_rates: None,
                variables: vec![
                    Variable::new("sex", ["M", "F"], 1.0, ScoringFunction::Range).unwrap(),
                ],
                bias: 3,
                store_raw_data: false,
            },
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn digest_tracks_content() {
        let a = project();
        let mut b = a.clone();
        assert_eq!(revision(&a).unwrap(), revision(&b).unwrap());
        assert_eq!(revision(&a).unwrap().len(), 64);

        b.aggregate_counts.increment(0, 0, 1);
        assert_ne!(revision(&a).unwrap(), revision(&b).unwrap());
    }
}
