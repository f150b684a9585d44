use crate::error::{ErrorKind, Result};
use crate::{IMAGES_DIR, STYLES_DIR, Section, SectionHandle, Source};
use exn::bail;

/// An image or stylesheet registered under an internal name.
#[derive(Clone, Debug)]
pub struct Asset {
    pub name: String,
    /// What markup uses to point at the asset, relative to the book root.
    pub reference: String,
    pub source: Source,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cover {
    /// Internal reference of the cover image.
    pub image: String,
    pub title: String,
}

/// Everything handed to a writer so far.
#[derive(Debug, Default)]
pub struct Contents {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub images: Vec<Asset>,
    pub stylesheets: Vec<Asset>,
    pub sections: Vec<Section>,
    pub cover: Option<Cover>,
}

impl Contents {
    pub(crate) fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    pub(crate) fn add_image(&mut self, source: Source, name: &str) -> Result<String> {
        register(&mut self.images, IMAGES_DIR, source, name)
    }

    pub(crate) fn add_stylesheet(&mut self, source: Source, name: &str) -> Result<String> {
        register(&mut self.stylesheets, STYLES_DIR, source, name)
    }

    pub(crate) fn add_section(&mut self, section: Section) -> SectionHandle {
        self.sections.push(section);
        SectionHandle(self.sections.len() - 1)
    }

    pub fn image(&self, reference: &str) -> Option<&Asset> {
        self.images.iter().find(|asset| asset.reference == reference)
    }

    pub fn stylesheet(&self, reference: &str) -> Option<&Asset> {
        self.stylesheets.iter().find(|asset| asset.reference == reference)
    }
}

fn register(assets: &mut Vec<Asset>, dir: &str, source: Source, name: &str) -> Result<String> {
    validate_name(name)?;
    if let Some(existing) = assets.iter().find(|asset| asset.name == name) {
        tracing::trace!(name, "Asset already registered");
        return Ok(existing.reference.clone());
    }
    let reference = format!("{dir}/{name}");
    assets.push(Asset { name: name.to_string(), reference: reference.clone(), source });
    Ok(reference)
}

/// Internal names become file names, so they must be a single path segment.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        bail!(ErrorKind::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn duplicate_name_returns_first_reference() {
        let mut contents = Contents::new("Book");
        let first = contents.add_image(Source::from(b"first".to_vec()), "a.png").unwrap();
        let second = contents.add_image(Source::from(b"second".to_vec()), "a.png").unwrap();
        assert_eq!(first, "images/a.png");
        assert_eq!(first, second);
        assert_eq!(contents.images.len(), 1);
        assert_eq!(contents.image(&first).unwrap().source.read().unwrap().as_ref(), b"first");
    }

    #[test]
    fn images_and_stylesheets_are_separate() {
        let mut contents = Contents::new("Book");
        let image = contents.add_image(Source::from(Vec::new()), "x").unwrap();
        let stylesheet = contents.add_stylesheet(Source::from(Vec::new()), "x").unwrap();
        assert_eq!(image, "images/x");
        assert_eq!(stylesheet, "styles/x");
        assert!(contents.stylesheet(&stylesheet).is_some());
        assert!(contents.image(&stylesheet).is_none());
    }

    #[test]
    fn sections_keep_their_order() {
        let mut contents = Contents::new("Book");
        for title in ["one", "two", "three"] {
            contents.add_section(Section { title: title.to_string(), ..Section::default() });
        }
        let handle = contents.add_section(Section::default());
        assert_eq!(handle.index(), 3);
        let titles: Vec<_> = contents.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["one", "two", "three", ""]);
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("a/b.png")]
    #[case("..\\b.png")]
    fn rejects_names_that_are_not_file_names(#[case] name: &str) {
        let mut contents = Contents::new("Book");
        let err = contents.add_image(Source::from(Vec::new()), name).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidName(name.to_string()));
    }
}
