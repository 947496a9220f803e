//! Virtual-filesystem document store
//!
//! The browser side keeps its whole file tree as one JSON array and treats
//! this store as plain load/save. The array is opaque here: no domain logic,
//! no per-entry validation, whole-file writes with last-writer-wins. The
//! execution pipeline has no dependency on this crate.

mod store;

pub use store::FsStore;

/// Errors from store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("filesystem data is corrupt (invalid JSON): {0}")]
    Corrupt(serde_json::Error),

    #[error("failed to read filesystem data: {0}")]
    Read(std::io::Error),

    #[error("failed to write filesystem data: {0}")]
    Write(std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
