//! File I/O for the JSON project store.

mod hash;
mod load;
mod lock;
mod save;

pub use hash::{canonical_json, revision};
pub(crate) use load::read_project;
pub(crate) use lock::LockFile;
pub(crate) use save::write_project;
