//! Materialized resources and content sniffing.
//!
//! A resource is a part body written out to a temporary file. The file lives
//! for as long as any handle to it does, so package writers can read it
//! lazily long after the archive itself has been dropped.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempPath;

const TEMPFILE_PREFIX: &str = "mhtpub-";
/// How far into a text document to look for an `<svg` root element.
const SVG_SNIFF_WINDOW: usize = 1024;

/// The content type detected from a resource's actual bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Kind {
    mime: &'static str,
    extension: &'static str,
}

impl Kind {
    pub const SVG: Kind = Kind { mime: "image/svg+xml", extension: "svg" };

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

impl From<infer::Type> for Kind {
    fn from(value: infer::Type) -> Self {
        Self { mime: value.mime_type(), extension: value.extension() }
    }
}

/// Detects the content type of `bytes`, ignoring anything a header claims.
///
/// Binary formats are recognised by their magic bytes. SVG, being text, is
/// checked separately and before anything else so that an XML prolog does
/// not hide it.
pub fn sniff(bytes: &[u8]) -> Option<Kind> {
    if is_svg(bytes) {
        return Some(Kind::SVG);
    }
    infer::get(bytes).map(Kind::from)
}

fn is_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SVG_SNIFF_WINDOW)];
    let head = head.trim_ascii_start();
    let starts_like_markup = head.starts_with(b"<svg") || head.starts_with(b"<?xml") || head.starts_with(b"<!--");
    starts_like_markup && memchr::memmem::find(head, b"<svg").is_some()
}

/// A part body realized as a temporary file.
///
/// Cloning is cheap and every clone refers to the same file; the file is
/// deleted when the last clone is dropped.
#[derive(Clone, Debug)]
pub struct Resource {
    file: Arc<TempPath>,
    kind: Option<Kind>,
    length: usize,
}

impl Resource {
    pub(crate) fn realize(bytes: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new().prefix(TEMPFILE_PREFIX).tempfile().or_raise(|| ErrorKind::Resource)?;
        file.write_all(bytes).or_raise(|| ErrorKind::Resource)?;
        file.flush().or_raise(|| ErrorKind::Resource)?;
        Ok(Self {
            file: Arc::new(file.into_temp_path()),
            kind: sniff(bytes),
            length: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// A shared handle keeping the temporary file alive.
    pub fn handle(&self) -> Arc<TempPath> {
        Arc::clone(&self.file)
    }

    /// The sniffed content type, `None` if it could not be recognised.
    pub fn kind(&self) -> Option<Kind> {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if both values refer to the same temporary file.
    pub fn same_as(&self, other: &Resource) -> bool {
        Arc::ptr_eq(&self.file, &other.file)
    }
}
