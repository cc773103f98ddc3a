//! Exclusive per-project lock files.
//!
//! A lock file holds the owner's pid. A writer that dies without releasing
//! its lock leaves the file behind; the next writer takes it over once the
//! owner is known to be gone, or once the file is older than the stale
//! timeout and the owner cannot be identified.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

/// Held while a writer owns a project. The lock file is removed on drop.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

/// What an existing lock file says about its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    /// A live writer, or one that may still be writing.
    Active,
    /// The owner exited or the file is stale; safe to take over.
    Gone,
    /// Old lock whose owner is still running.
    Stuck,
}

impl LockFile {
    /// Create `path` exclusively. Returns `Ok(None)` when another writer
    /// holds the lock, and [`StoreError::Locked`] when the lock is older than
    /// `stale_after` but its owner is still running.
    pub fn try_acquire(path: &Path, stale_after: Duration) -> Result<Option<Self>> {
        if let Some(lock) = Self::create(path)? {
            return Ok(Some(lock));
        }
        match inspect(path, stale_after)? {
            Holder::Active => Ok(None),
            Holder::Stuck => Err(StoreError::Locked {
                path: path.to_path_buf(),
            }),
            Holder::Gone => {
                warn!("Taking over stale lock {}", path.display());
                match fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(_) => {
                        return Err(StoreError::Locked {
                            path: path.to_path_buf(),
                        });
                    }
                }
                Self::create(path)
            }
        }
    }

    fn create(path: &Path) -> Result<Option<Self>> {
        let file = OpenOptions::new().write(true).create_new(true).open(path);
        match file {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Some(Self {
                    path: path.to_path_buf(),
                }))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(StoreError::Io {
                operation: "lock",
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to release lock {}: {e}", self.path.display());
        }
    }
}

fn inspect(path: &Path, stale_after: Duration) -> Result<Holder> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        // Released between our create attempt and this read.
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Holder::Gone),
        Err(e) => {
            return Err(StoreError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let owner = contents.trim().parse::<u32>().ok();
    let age = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .unwrap_or_default();
    let alive = owner.map(process_alive);
    debug!(
        path = %path.display(),
        owner = ?owner,
        alive = ?alive,
        age_ms = age.as_millis() as u64,
        "lock held"
    );

    Ok(match (alive, age > stale_after) {
        (Some(false), _) => Holder::Gone,
        (Some(true), true) => Holder::Stuck,
        (None, true) => Holder::Gone,
        (_, false) => Holder::Active,
    })
}

fn process_alive(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing(),
    );
    system.process(pid).is_some()
}
