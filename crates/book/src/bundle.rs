//! A browsable directory of HTML pages.
//!
//! ```text
//! <output>/
//!   index.html             title, author, description, cover, contents
//!   0001-<title-slug>.html one page per section, in order
//!   images/<name>
//!   styles/<name>
//! ```

use crate::error::{ErrorKind, Result};
use crate::templates::Templates;
use crate::{BookWriter, Contents, Cover, IMAGES_DIR, STYLES_DIR, Section, SectionHandle, Source};
use exn::{ResultExt, bail};
use rslug::slugify;
use std::path::Path;
use std::{fs, io};
use tracing::instrument;

const INDEX_FILE: &str = "index.html";
const MAX_SLUG_LENGTH: usize = 48;
const STAGING_PREFIX: &str = ".mhtpub-";

/// Writes a book as a directory of HTML pages.
///
/// Sources are only read during [`write`](BookWriter::write).
#[derive(Debug)]
pub struct Bundle {
    contents: Contents,
}

impl Bundle {
    pub fn new(title: impl Into<String>) -> Self {
        Self { contents: Contents::new(title) }
    }

    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    fn write_assets(&self, output: &Path) -> Result<()> {
        for (dir, assets) in [(IMAGES_DIR, &self.contents.images), (STYLES_DIR, &self.contents.stylesheets)] {
            if assets.is_empty() {
                continue;
            }
            let dir = output.join(dir);
            fs::create_dir(&dir).or_raise(|| ErrorKind::Io)?;
            for asset in assets {
                let bytes = asset.source.copy_to(&dir.join(&asset.name)).or_raise(|| ErrorKind::Io)?;
                tracing::trace!(reference = asset.reference.as_str(), bytes, "Copied asset");
            }
        }
        Ok(())
    }

    fn write_pages(&self, output: &Path, templates: &Templates) -> Result<()> {
        let mut entries = Vec::with_capacity(self.contents.sections.len());
        for (position, section) in self.contents.sections.iter().enumerate() {
            let file = section_file_name(position, &section.title);
            let html = templates.section(upon::value! {
                title: &section.title,
                subtitle: &section.subtitle,
                body: &section.body,
                stylesheet: section.stylesheet.as_deref(),
            })?;
            fs::write(output.join(&file), html).or_raise(|| ErrorKind::Io)?;
            entries.push(upon::value! { file: file, title: &section.title });
        }
        let cover = self.contents.cover.as_ref().map(|cover| {
            upon::value! {
                image: &cover.image,
                title: &cover.title,
            }
        });
        let index = templates.index(upon::value! {
            title: &self.contents.title,
            author: self.contents.author.as_deref(),
            description: self.contents.description.as_deref(),
            cover: cover,
            sections: entries,
        })?;
        fs::write(output.join(INDEX_FILE), index).or_raise(|| ErrorKind::Io)
    }
}

impl BookWriter for Bundle {
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

    /// Fills a staging directory next to `output`, then moves it into place.
    ///
    /// Nothing is left at `output` if writing fails.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::AlreadyExists`] if anything exists at `output`
    /// - [`ErrorKind::Io`] if a source cannot be read or a file cannot be written
    #[instrument(skip(self), fields(sections = self.contents.sections.len(), images = self.contents.images.len()))]
    fn write(&mut self, output: &Path) -> Result<()> {
        if output.exists() {
            bail!(ErrorKind::AlreadyExists(output.to_path_buf()));
        }
        let templates = Templates::load()?;
        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
        let staging = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir_in(parent).or_raise(|| ErrorKind::Io)?;
        self.write_assets(staging.path())?;
        self.write_pages(staging.path(), &templates)?;
        let staged = staging.keep();
        if let Err(err) = publish(&staged, output) {
            let _ = fs::remove_dir_all(&staged);
            return Err(err).or_raise(|| ErrorKind::Io);
        }
        tracing::info!(output = %output.display(), "Wrote book");
        Ok(())
    }
}

/// Moves a finished staging directory to `output`.
fn publish(staged: &Path, output: &Path) -> io::Result<()> {
    // Staging directories are created owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staged, fs::Permissions::from_mode(0o755))?;
    }
    fs::rename(staged, output)
}

/// Section pages are numbered from one so they sort in reading order.
fn section_file_name(position: usize, title: &str) -> String {
    let slug = slugify!(title);
    let slug: String = slug.chars().take(MAX_SLUG_LENGTH).collect();
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        format!("{:04}.html", position + 1)
    } else {
        format!("{:04}-{slug}.html", position + 1)
    }
}
