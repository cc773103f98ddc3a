//! JSON file store: one `<key>.json` document per project in a directory.
//!
//! Writers serialize on an exclusive `<key>.lock` file and replace the
//! document atomically. Compare-and-swap compares revision digests of the
//! stored and expected states. A lock left by a writer that exited is taken
//! over by the next one.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use minrand_model::Project;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::io::{LockFile, read_project, revision, write_project};
use crate::key::ProjectKey;
use crate::store::ProjectStore;

const EXTENSION: &str = "json";

/// Age after which a lock with no identifiable owner counts as abandoned.
pub const DEFAULT_STALE_LOCK_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    stale_lock_after: Duration,
}

impl FileStore {
    /// Store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stale_lock_after: DEFAULT_STALE_LOCK_AFTER,
        }
    }

    #[must_use]
    pub fn with_stale_lock_after(mut self, after: Duration) -> Self {
        self.stale_lock_after = after;
        self
    }

    pub fn project_path(&self, key: &ProjectKey) -> PathBuf {
        self.root.join(format!("{key}.{EXTENSION}"))
    }

    fn lock_path(&self, key: &ProjectKey) -> PathBuf {
        self.root.join(format!("{key}.lock"))
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::Io {
            operation: "create directory",
            path: self.root.clone(),
            source: e,
        })
    }

    fn lock(&self, key: &ProjectKey) -> Result<Option<LockFile>> {
        self.ensure_root()?;
        LockFile::try_acquire(&self.lock_path(key), self.stale_lock_after)
    }
}

impl ProjectStore for FileStore {
    fn load(&self, key: &ProjectKey) -> Result<Project> {
        let path = self.project_path(key);
        if !path.exists() {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }
        let project = read_project(&path)?;
        debug!("Loaded project from {}", path.display());
        Ok(project)
    }

    fn create(&self, key: &ProjectKey, project: &Project) -> Result<()> {
        project.validate()?;
        let Some(_lock) = self.lock(key)? else {
            return Err(StoreError::Concurrency {
                key: key.to_string(),
            });
        };
        let path = self.project_path(key);
        if path.exists() {
            return Err(StoreError::AlreadyExists {
                key: key.to_string(),
            });
        }
        write_project(project, &path)?;
        info!(project = %key, path = %path.display(), "project created");
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &ProjectKey,
        expected: &Project,
        new: &Project,
    ) -> Result<bool> {
        let Some(_lock) = self.lock(key)? else {
            debug!(project = %key, "lock held by another writer");
            return Ok(false);
        };
        let current = self.load(key)?;
        let stored = revision(&current)?;
        if stored != revision(expected)? {
            debug!(project = %key, revision = %stored, "stored revision moved");
            return Ok(false);
        }
        write_project(new, &self.project_path(key))?;
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<ProjectKey>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    operation: "list",
                    path: self.root.clone(),
                    source: e,
                });
            }
        };
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io {
                operation: "list",
                path: self.root.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match ProjectKey::new(stem) {
                Ok(key) => keys.push(key),
                Err(_) => debug!("Skipping {}", path.display()),
            }
        }
        keys.sort();
        Ok(keys)
    }
}
