//! Part classification: picking the document and indexing its resources.

use crate::error::{ErrorKind, Result};
use crate::part::Part;
use exn::OptionExt;
use std::collections::HashMap;
use tracing::instrument;

/// Parts addressable by their absolute `Content-Location`.
///
/// Keys are the literal header values; lookups are exact, with no URL
/// normalization of any kind.
#[derive(Debug, Default)]
pub struct PartIndex {
    parts: HashMap<String, Part>,
}

impl PartIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `part` under `location`, replacing (and returning) any part
    /// previously indexed under the same key.
    pub fn insert(&mut self, location: impl Into<String>, part: Part) -> Option<Part> {
        self.parts.insert(location.into(), part)
    }

    pub fn get(&self, location: &str) -> Option<&Part> {
        self.parts.get(location)
    }

    pub fn get_mut(&mut self, location: &str) -> Option<&mut Part> {
        self.parts.get_mut(location)
    }

    pub fn contains(&self, location: &str) -> bool {
        self.parts.contains_key(location)
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Only absolute web locations are addressable from the document.
fn is_indexable(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Splits decoded parts into the primary HTML document and an index of the
/// remaining parts.
///
/// The first `text/html` part becomes the document. Any later `text/html`
/// part is ignored entirely. Every other part with an `http://` or
/// `https://` location is indexed; when two parts share a location the later
/// one wins.
///
/// # Errors
///
/// - [`ErrorKind::MissingContentType`] or [`ErrorKind::InvalidContentType`]
///   for the first part with a defective `Content-Type`
/// - [`ErrorKind::NoDocument`] if there is no `text/html` part
#[instrument(skip_all, fields(parts = parts.len(), indexed))]
pub fn classify(parts: Vec<Part>) -> Result<(Part, PartIndex)> {
    let mut document: Option<Part> = None;
    let mut index = PartIndex::new();
    for part in parts {
        let media = part.media_type()?;
        if media.is_html() {
            if document.is_none() {
                tracing::debug!(location = part.location(), "Selected primary document");
                document = Some(part);
            } else {
                tracing::debug!(location = part.location(), "Ignoring additional HTML part");
            }
            continue;
        }
        let Some(location) = part.location().filter(|location| is_indexable(location)).map(str::to_string) else {
            tracing::trace!(content_type = media.essence(), "Part has no absolute location; not indexed");
            continue;
        };
        if index.insert(location.as_str(), part).is_some() {
            tracing::debug!(location = location.as_str(), "Duplicate location; later part replaces earlier one");
        }
    }
    tracing::Span::current().record("indexed", index.len());
    let document = document.ok_or_raise(|| ErrorKind::NoDocument)?;
    Ok((document, index))
}
