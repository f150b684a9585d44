use crate::error::{ErrorKind, Result};
use crate::{BookWriter, Contents, Cover, Section, SectionHandle, Source};
use exn::bail;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Records everything handed to it; [`write`](BookWriter::write) only
/// remembers the output path.
#[derive(Debug, Default)]
pub struct MockBook {
    contents: Contents,
    written: Vec<PathBuf>,
    fail_on_write: bool,
}

impl MockBook {
    pub fn new(title: impl Into<String>) -> Self {
        Self { contents: Contents::new(title), ..Self::default() }
    }

    /// A book whose every write fails with [`ErrorKind::Io`].
    pub fn failing(title: impl Into<String>) -> Self {
        Self { fail_on_write: true, ..Self::new(title) }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl Deref for MockBook {
    type Target = Contents;

    fn deref(&self) -> &Self::Target {
        &self.contents
    }
}

impl BookWriter for MockBook {
    fn set_author(&mut self, author: &str) {
        self.contents.author = Some(author.to_string());
    }

    fn set_description(&mut self, description: &str) {
        self.contents.description = Some(description.to_string());
    }

    fn add_image(&mut self, source: Source, name: &str) -> Result<String> {
        self.contents.add_image(source, name)
    }

    fn add_stylesheet(&mut self, source: Source, name: &str) -> Result<String> {
        self.contents.add_stylesheet(source, name)
    }

    fn add_section(&mut self, section: Section) -> Result<SectionHandle> {
        Ok(self.contents.add_section(section))
    }

    fn set_cover(&mut self, image: &str, title: &str) {
        self.contents.cover = Some(Cover { image: image.to_string(), title: title.to_string() });
    }

    fn write(&mut self, output: &Path) -> Result<()> {
        if self.fail_on_write {
            bail!(ErrorKind::Io);
        }
        self.written.push(output.to_path_buf());
        Ok(())
    }
}
