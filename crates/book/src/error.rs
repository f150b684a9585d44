//! Book Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A book error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for book operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Internal names must be plain file names.
    #[display("invalid internal name: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// The output path is already taken; nothing was written.
    #[display("output already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// A builtin template is missing from the binary.
    #[display("asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
    /// A page template failed to compile or render.
    #[display("template error")]
    Template,
    /// Reading a source or writing the output failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}
