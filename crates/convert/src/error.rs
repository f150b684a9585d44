//! Conversion Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use mhtpub_archive::error::{Error as ArchiveError, ErrorKind as ArchiveErrorKind};
use mhtpub_book::error::{Error as BookError, ErrorKind as BookErrorKind};
use std::path::{Path, PathBuf};

/// A conversion error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing to convert.
    #[display("no archives given")]
    NoArchives,
    /// The archive could not be read, decoded or classified.
    #[display("{_0}")]
    Archive(ArchiveErrorKind),
    /// The book writer refused an item or failed to write.
    #[display("{_0}")]
    Book(BookErrorKind),
    /// The document's title or body could not be extracted.
    #[display("cannot extract markup from document")]
    MarkupExtraction,
    /// A referenced resource is unusable; the reference is left as it was.
    #[display("unusable resource: {_0}")]
    Resource(#[error(not(source))] String),
    /// The cover file is unreadable or not an image.
    #[display("invalid cover image: {}", _0.display())]
    Cover(#[error(not(source))] PathBuf),
    /// Converting one archive failed, aborting the whole run.
    #[display("parse {} failed: {kind}", path.display())]
    Failed {
        #[error(not(source))]
        path: PathBuf,
        #[error(not(source))]
        kind: Box<ErrorKind>,
    },
}

impl ErrorKind {
    /// Convert an archive error into a conversion error, preserving the
    /// archive crate's `Exn` frame as a child in its own error tree.
    #[track_caller]
    pub fn archive(err: ArchiveError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Archive(inner))
    }

    /// Convert a book error into a conversion error, preserving the book
    /// crate's `Exn` frame as a child in its own error tree.
    #[track_caller]
    pub fn book(err: BookError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Book(inner))
    }

    /// Attribute a failure to the archive at `path`.
    #[track_caller]
    pub fn failed(path: &Path, err: Error) -> Error {
        let kind = Box::new((*err).clone());
        err.raise(ErrorKind::Failed { path: path.to_path_buf(), kind })
    }

    /// The underlying kind, looking through [`ErrorKind::Failed`].
    pub fn innermost(&self) -> &ErrorKind {
        match self {
            Self::Failed { kind, .. } => kind.innermost(),
            other => other,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Archive(kind) => kind.is_retryable(),
            Self::Book(kind) => kind.is_retryable(),
            Self::Failed { kind, .. } => kind.is_retryable(),
            _ => false,
        }
    }
}
