//! Book packaging.
//!
//! [`BookWriter`] is the narrow interface through which converted pages are
//! handed over: images and stylesheets under internal names, then one
//! [`Section`] per page, then a final [`write`](BookWriter::write). Writers
//! may read their [`Source`]s lazily, at write time.
//!
//! [`Bundle`] writes a browsable directory of HTML pages. With the `mock`
//! feature, [`MockBook`] records everything in memory for tests.

mod bundle;
mod contents;
pub mod error;
#[cfg(feature = "mock")]
mod mock;
mod source;
mod templates;

use crate::error::Result;
use std::path::Path;

pub use crate::bundle::Bundle;
pub use crate::contents::{Asset, Contents, Cover};
#[cfg(feature = "mock")]
pub use crate::mock::MockBook;
pub use crate::source::Source;

/// Directory (and reference prefix) for images inside a book.
pub const IMAGES_DIR: &str = "images";
/// Directory (and reference prefix) for stylesheets inside a book.
pub const STYLES_DIR: &str = "styles";

/// One page of the book.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub subtitle: String,
    /// Inner markup of the page body.
    pub body: String,
    /// Internal reference of the page's stylesheet, as returned by
    /// [`BookWriter::add_stylesheet`].
    pub stylesheet: Option<String>,
}

/// Position of a section within its book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SectionHandle(usize);

impl SectionHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Receives converted pages and assembles them into a book.
///
/// Adding an image or stylesheet returns the internal reference that markup
/// should use to point at it. Adding the same internal name twice returns the
/// reference issued the first time and keeps the first source.
pub trait BookWriter {
    fn set_author(&mut self, author: &str);

    fn set_description(&mut self, description: &str);

    fn add_image(&mut self, source: Source, name: &str) -> Result<String>;

    fn add_stylesheet(&mut self, source: Source, name: &str) -> Result<String>;

    fn add_section(&mut self, section: Section) -> Result<SectionHandle>;

    /// Uses a previously added image as the cover.
    fn set_cover(&mut self, image: &str, title: &str);

    /// Assembles the book at `output`.
    fn write(&mut self, output: &Path) -> Result<()>;
}
