// #![warn(missing_docs)]
//! Traits and structs for stashbox storage interaction.
//!
//! If you want implement your own cache storage, you in the right place.
mod backend;
mod error;

pub use backend::{CacheStorage, Generation, StorageResult};
pub use error::StorageError;

/// Status of a generation delete.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Generation deleted, with the number of entries it held.
    Deleted(usize),
    /// Generation did not exist.
    Missing,
}

impl DeleteStatus {
    /// Returns `true` if something was removed.
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteStatus::Deleted(_))
    }
}
