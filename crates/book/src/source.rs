use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;

/// Where the bytes of an image or stylesheet come from.
///
/// Writers may defer reading until [`write`](crate::BookWriter::write), so a
/// [`Source::Temporary`] keeps its file alive for as long as the writer holds
/// on to it.
#[derive(Clone, Debug)]
pub enum Source {
    Bytes(Vec<u8>),
    Path(PathBuf),
    /// A temporary file, deleted once the last handle is dropped.
    Temporary(Arc<TempPath>),
}

impl Source {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Bytes(_) => None,
            Self::Path(path) => Some(path),
            Self::Temporary(file) => {
                let path: &Path = file;
                Some(path)
            },
        }
    }

    pub fn read(&self) -> io::Result<Cow<'_, [u8]>> {
        match (self, self.path()) {
            (Self::Bytes(bytes), _) => Ok(Cow::Borrowed(bytes.as_slice())),
            (_, Some(path)) => fs::read(path).map(Cow::Owned),
            (_, None) => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    /// Copies the content to `target`, returning the number of bytes written.
    pub(crate) fn copy_to(&self, target: &Path) -> io::Result<u64> {
        match (self, self.path()) {
            (Self::Bytes(bytes), _) => fs::write(target, bytes).map(|()| bytes.len() as u64),
            (_, Some(path)) => fs::copy(path, target),
            (_, None) => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}

impl From<Vec<u8>> for Source {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Arc<TempPath>> for Source {
    fn from(file: Arc<TempPath>) -> Self {
        Self::Temporary(file)
    }
}
