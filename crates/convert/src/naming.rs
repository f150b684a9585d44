//! Local names for materialized resources.
//!
//! A name is the BLAKE3 hash of the literal reference URL plus an extension,
//! so the same URL always lands on the same name and different URLs only
//! collide if their hashes do.

use mhtpub_archive::Kind;

const STYLESHEET_EXTENSION: &str = "css";

/// Name for an image referenced as `url` whose bytes sniffed as `kind`.
///
/// The URL's own extension is kept when it agrees with the sniffed one,
/// ignoring case; otherwise the sniffed extension is used.
pub fn local_name(url: &str, kind: Kind) -> String {
    let extension = match url_extension(url) {
        Some(extension) if extension.eq_ignore_ascii_case(kind.extension()) => extension,
        _ => kind.extension(),
    };
    format!("{}.{extension}", blake3::hash(url.as_bytes()))
}

pub fn stylesheet_name(url: &str) -> String {
    format!("{}.{STYLESHEET_EXTENSION}", blake3::hash(url.as_bytes()))
}

/// Extension of the last path segment, ignoring query and fragment.
fn url_extension(url: &str) -> Option<&str> {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path)?,
        None => url,
    };
    let file = path.rsplit('/').next()?;
    let (stem, extension) = file.rsplit_once('.')?;
    let plausible = !stem.is_empty() && !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric());
    plausible.then_some(extension)
}
