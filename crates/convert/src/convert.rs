//! Turning a list of archives into a book.
//!
//! Archives are converted one at a time, in the order given, into one
//! section each. The book is only written once every archive converted.

use crate::error::{ErrorKind, Result};
use crate::resolve::resolve;
use exn::{OptionExt, ResultExt, bail};
use mhtpub_archive::{Archive, Kind, sniff};
use mhtpub_book::{BookWriter, Section, SectionHandle, Source};
use std::fs;
use std::path::{Path, PathBuf};
use time::{Date, UtcDateTime};
use tracing::instrument;

const COVER_NAME: &str = "cover";

/// Book description recording when it was generated.
pub fn description(date: Date) -> String {
    format!("Generated at {date} with mhtpub")
}

/// Converts archives, one section each, into the book held by `W`.
pub struct Converter<W> {
    writer: W,
    author: String,
    cover: Option<PathBuf>,
}

impl<W: BookWriter> Converter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, author: String::new(), cover: None }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// An image file to use as the book cover.
    pub fn with_cover(mut self, cover: impl Into<Option<PathBuf>>) -> Self {
        self.cover = cover.into();
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Converts `archives` in order and writes the book to `output`.
    ///
    /// The first archive that fails aborts the run before anything is
    /// written.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::NoArchives`] if `archives` is empty
    /// - [`ErrorKind::Cover`] if the cover is unreadable or not an image
    /// - [`ErrorKind::Failed`] naming the archive that could not be converted
    /// - [`ErrorKind::Book`] if the writer fails
    #[instrument(skip_all, fields(archives = archives.len(), output = %output.display()))]
    pub fn run<P: AsRef<Path>>(&mut self, archives: &[P], output: &Path) -> Result<()> {
        if archives.is_empty() {
            bail!(ErrorKind::NoArchives);
        }
        self.writer.set_author(&self.author);
        self.writer.set_description(&description(UtcDateTime::now().date()));
        if let Some(cover) = self.cover.clone() {
            self.add_cover(&cover)?;
        }
        for path in archives {
            let path = path.as_ref();
            self.add_archive(path).map_err(|err| ErrorKind::failed(path, err))?;
        }
        self.writer.write(output).map_err(ErrorKind::book)?;
        tracing::info!(archives = archives.len(), "Converted archives");
        Ok(())
    }

    /// Converts the archive at `path` into the next section.
    #[instrument(skip_all, fields(path = %path.display(), title))]
    pub fn add_archive(&mut self, path: &Path) -> Result<SectionHandle> {
        let mut archive = Archive::open(path).map_err(ErrorKind::archive)?;
        let (document, resources) = archive.split_mut();
        let resolved = resolve(document, resources, &mut self.writer)?;
        tracing::Span::current().record("title", resolved.title.as_str());
        self.writer
            .add_section(Section {
                title: resolved.title,
                subtitle: String::new(),
                body: resolved.body,
                stylesheet: resolved.stylesheet,
            })
            .map_err(ErrorKind::book)
    }

    fn add_cover(&mut self, path: &Path) -> Result<()> {
        let bytes = fs::read(path).or_raise(|| ErrorKind::Cover(path.to_path_buf()))?;
        let kind = sniff(&bytes).filter(Kind::is_image).ok_or_raise(|| ErrorKind::Cover(path.to_path_buf()))?;
        let name = format!("{COVER_NAME}.{}", kind.extension());
        let reference = self.writer.add_image(Source::Path(path.to_path_buf()), &name).map_err(ErrorKind::book)?;
        self.writer.set_cover(&reference, "");
        tracing::debug!(reference = reference.as_str(), "Added cover");
        Ok(())
    }
}
