//! The storage port and the atomic update helper built on it.

use minrand_model::{Project, RandomizationError};
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::key::ProjectKey;

/// Persistent home for project state.
///
/// Implementations must make [`ProjectStore::compare_and_swap`] atomic with
/// respect to every other call on the same key.
pub trait ProjectStore {
    /// Current state of a stored project.
    fn load(&self, key: &ProjectKey) -> Result<Project>;

    /// Store a new project. Fails with [`StoreError::AlreadyExists`] if the
    /// key is taken.
    fn create(&self, key: &ProjectKey, project: &Project) -> Result<()>;

    /// Replace the stored project with `new` only if it still equals
    /// `expected`. Returns `Ok(false)` when it does not, or when another
    /// writer is mid-commit.
    fn compare_and_swap(&self, key: &ProjectKey, expected: &Project, new: &Project)
    -> Result<bool>;

    /// Keys of every stored project, sorted.
    fn keys(&self) -> Result<Vec<ProjectKey>>;
}

/// Load `key`, apply `update` to a copy and commit it with compare-and-swap.
///
/// Nothing is stored when `update` fails. When another writer committed in
/// between, returns [`StoreError::Concurrency`]; retrying is up to the caller.
pub fn update_project<S, T, F>(store: &S, key: &ProjectKey, update: F) -> Result<T>
where
    S: ProjectStore + ?Sized,
    F: FnOnce(&mut Project) -> std::result::Result<T, RandomizationError>,
{
    let current = store.load(key)?;
    let mut next = current.clone();
    let value = update(&mut next)?;
    if !store.compare_and_swap(key, &current, &next)? {
        warn!(project = %key, "compare-and-swap lost to a concurrent update");
        return Err(StoreError::Concurrency {
            key: key.to_string(),
        });
    }
    Ok(value)
}
