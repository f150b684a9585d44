//! Saved web page archives (MHTML).
//!
//! An archive is a multipart MIME document: one HTML page plus the images,
//! stylesheets and frames it referenced, each tagged with the URL it was
//! fetched from. This crate turns one into:
//!
//! - the **document**: the first `text/html` part, and
//! - a [`PartIndex`]: every other part keyed by its absolute
//!   `Content-Location`, ready for reference lookups.
//!
//! Parts are materialized lazily into temporary files ([`Resource`]) whose
//! content type is sniffed from the bytes, never taken from the headers.

mod classify;
mod decode;
pub mod error;
mod part;
mod resource;
mod trim;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::instrument;

pub use crate::classify::{PartIndex, classify};
pub use crate::decode::decode;
pub use crate::part::{CONTENT_LOCATION, CONTENT_TRANSFER_ENCODING, CONTENT_TYPE, Headers, MediaType, Part};
pub use crate::resource::{Kind, Resource, sniff};
pub use crate::trim::TrimReader;

/// Size of the first, trimmed, read of an archive stream.
pub const FIRST_READ_SIZE: usize = 8 * 1024;

/// A decoded and classified archive.
#[derive(Debug)]
pub struct Archive {
    document: Part,
    resources: PartIndex,
}

impl Archive {
    /// Reads, decodes and classifies the archive at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref()).or_raise(|| ErrorKind::Io)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reads the whole archive into memory, dropping leading whitespace, then
    /// decodes and classifies it.
    ///
    /// Only the first read is trimmed, so it is made with a buffer of
    /// [`FIRST_READ_SIZE`] bytes rather than whatever `read_to_end` would pick.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = TrimReader::new(reader);
        let mut raw = vec![0; FIRST_READ_SIZE];
        let first = reader.read(&mut raw).or_raise(|| ErrorKind::Io)?;
        raw.truncate(first);
        reader.read_to_end(&mut raw).or_raise(|| ErrorKind::Io)?;
        Self::from_parts(decode(&raw)?)
    }

    /// Classifies already decoded parts.
    pub fn from_parts(parts: Vec<Part>) -> Result<Self> {
        let (document, resources) = classify(parts)?;
        Ok(Self { document, resources })
    }

    /// The primary HTML document.
    pub fn document(&self) -> &Part {
        &self.document
    }

    pub fn resources(&self) -> &PartIndex {
        &self.resources
    }

    /// Borrows the document alongside a mutable index, as needed to resolve
    /// references while materializing parts.
    pub fn split_mut(&mut self) -> (&Part, &mut PartIndex) {
        (&self.document, &mut self.resources)
    }

    pub fn into_parts(self) -> (Part, PartIndex) {
        (self.document, self.resources)
    }
}
