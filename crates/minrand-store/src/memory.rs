use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use minrand_model::Project;

use crate::error::{Result, StoreError};
use crate::key::ProjectKey;
use crate::store::ProjectStore;

/// Process-local store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    projects: Mutex<BTreeMap<ProjectKey, Project>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn projects(&self) -> MutexGuard<'_, BTreeMap<ProjectKey, Project>> {
        // Mutations are single inserts; a poisoned map is still consistent.
        self.projects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ProjectStore for InMemoryStore {
    fn load(&self, key: &ProjectKey) -> Result<Project> {
        self.projects()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    fn create(&self, key: &ProjectKey, project: &Project) -> Result<()> {
        let mut projects = self.projects();
        if projects.contains_key(key) {
            return Err(StoreError::AlreadyExists {
                key: key.to_string(),
            });
        }
        projects.insert(key.clone(), project.clone());
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &ProjectKey,
        expected: &Project,
        new: &Project,
    ) -> Result<bool> {
        let mut projects = self.projects();
        let current = projects.get_mut(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        if current != expected {
            return Ok(false);
        }
        *current = new.clone();
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<ProjectKey>> {
        Ok(self.projects().keys().cloned().collect())
    }
}
