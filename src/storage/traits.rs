//! Storage traits and error types
//!
//! This module defines the trait interface for artifact storage backends and
//! associated error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cannot write {path}: {source}")]
    Unwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt cursor file {path}: {content:?}")]
    CorruptCursor { path: PathBuf, content: String },

    #[error("Cursor for {kind} cannot move backwards from {current} to {requested}")]
    CursorRegression {
        kind: String,
        current: u64,
        requested: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for backends that persist fetched documents
///
/// Writes are create-or-replace; callers never mutate an artifact after it
/// has been written. Every write creates missing parent directories first.
pub trait ArtifactStore: Send + Sync {
    /// Idempotently creates a directory and all of its parents
    fn ensure_dir(&self, path: &Path) -> StorageResult<()>;

    /// Writes a file, creating its parent directory if needed
    fn write_file(&self, path: &Path, contents: &[u8]) -> StorageResult<()>;

    /// Returns true if a non-empty file exists at `path`
    fn has_content(&self, path: &Path) -> bool;

    /// Reads a previously saved document
    fn read_to_string(&self, path: &Path) -> StorageResult<String>;
}
