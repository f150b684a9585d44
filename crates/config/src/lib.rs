//! Layered configuration.
//!
//! Values are merged in order, later layers winning:
//!
//! 1. builtin defaults,
//! 2. a config file (TOML, YAML or JSON, chosen by extension),
//! 3. `MHTPUB_*` environment variables (`MHTPUB_TITLE`, `MHTPUB_AUTHOR`, ...).
//!
//! Command-line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{ResultExt, bail};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

const APPLICATION: &str = "mhtpub";
const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "MHTPUB_";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Book title.
    pub title: String,
    pub author: String,
    /// Image file used as the book cover.
    pub cover: Option<PathBuf>,
    /// Where the book is written.
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "MHTML".to_string(),
            author: "MHTML to Book".to_string(),
            cover: None,
            output: PathBuf::from("book"),
        }
    }
}

impl Config {
    /// Loads the configuration, reading `file` if given and the default
    /// config file otherwise.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::NotFound`] if `file` is given but does not exist
    /// - [`ErrorKind::UnsupportedFormat`] if the file extension is unknown
    /// - [`ErrorKind::Invalid`] if a layer holds values of the wrong type
    #[instrument(skip_all, fields(file))]
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(file) if !file.exists() => {
                bail!(ErrorKind::NotFound(file.to_path_buf()));
            },
            Some(file) => Some(file.to_path_buf()),
            None => default_path().filter(|path| path.exists()),
        };
        if let Some(file) = &file {
            tracing::Span::current().record("file", tracing::field::display(file.display()));
        }
        Self::figment(file.as_deref())?.merge(Env::prefixed(ENV_PREFIX)).extract::<Self>().or_raise(|| ErrorKind::Invalid)
    }

    /// Defaults merged with `file`, without the environment layer.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let Some(file) = file else {
            return Ok(figment);
        };
        let extension = file.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file(file)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
            Some("json") => figment.merge(Json::file(file)),
            _ => {
                bail!(ErrorKind::UnsupportedFormat(file.to_path_buf()));
            },
        })
    }
}

/// `config.toml` in the platform's config directory for mhtpub.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
