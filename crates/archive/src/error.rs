//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The multipart structure is too broken to split into parts.
    #[display("malformed archive: {_0}")]
    Decode(#[error(not(source))] &'static str),
    /// A part declares no `Content-Type` at all.
    #[display("missing content type")]
    MissingContentType,
    /// A part declares a `Content-Type` that is not a media type.
    #[display("invalid content type: {_0}")]
    InvalidContentType(#[error(not(source))] String),
    /// The archive has no `text/html` part to use as the document.
    #[display("html not found")]
    NoDocument,
    /// A part's body could not be realized as a temporary resource.
    #[display("cannot materialize resource")]
    Resource,
    /// Reading the archive failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::Resource)
    }
}
