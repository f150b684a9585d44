//! Command-line Error Types

use derive_more::{Display, Error};
use mhtpub_config::error::{Error as ConfigError, ErrorKind as ConfigErrorKind};
use mhtpub_convert::error::{Error as ConvertError, ErrorKind as ConvertErrorKind};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("{_0}")]
    Config(ConfigErrorKind),
    /// Refusing to overwrite anything at the output path.
    #[display("output already exists: {}", _0.display())]
    OutputExists(#[error(not(source))] PathBuf),
    #[display("{_0}")]
    Convert(ConvertErrorKind),
}

impl ErrorKind {
    #[track_caller]
    pub fn config(err: ConfigError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Config(inner))
    }

    #[track_caller]
    pub fn convert(err: ConvertError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Convert(inner))
    }
}
