//! Project storage for minrand.
//!
//! The randomization engine is pure: it takes a project and returns the
//! updated one. This crate supplies the atomic "load, assign, persist" unit
//! around it.
//!
//! # Architecture
//!
//! - `store.rs` - the [`ProjectStore`] port and [`update_project`]
//! - `memory.rs` - in-process adapter
//! - `file.rs` - JSON file adapter (lock file, atomic writes)
//! - `io/` - read, write, lock and revision digest helpers
//! - `key.rs` - validated project keys
//! - `error.rs` - error types with user-friendly messages

mod error;
mod file;
mod io;
mod key;
mod memory;
mod store;

pub use error::{Result, StoreError};
pub use file::{DEFAULT_STALE_LOCK_AFTER, FileStore};
pub use io::{canonical_json, revision};
pub use key::ProjectKey;
pub use memory::InMemoryStore;
pub use store::{ProjectStore, update_project};
