//! Page templates embedded into the binary at compile time using
//! [`rust-embed`](rust_embed) and rendered with [upon].
//!
//! Every value is HTML-escaped unless piped through the `raw` formatter.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use upon::{Engine, Template, Value};

const SECTION: &str = "section.html";
const INDEX: &str = "index.html";

#[derive(Embed)]
#[folder = "../../assets/templates/"]
struct Builtins;

impl Builtins {
    fn load(name: &str) -> Result<String> {
        let data = Self::get(name).map(|f| f.data).ok_or_raise(|| ErrorKind::AssetNotFound(name.to_string()))?;
        String::from_utf8(data.into_owned()).or_raise(|| ErrorKind::Template)
    }
}

pub(crate) struct Templates {
    engine: Engine<'static>,
    section: Template<'static>,
    index: Template<'static>,
}

impl Templates {
    pub(crate) fn load() -> Result<Self> {
        let mut engine = Engine::new();
        engine.set_default_formatter(&formatters::escape_html);
        engine.add_formatter("raw", formatters::raw);
        let section = engine.compile(Builtins::load(SECTION)?).or_raise(|| ErrorKind::Template)?;
        let index = engine.compile(Builtins::load(INDEX)?).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, section, index })
    }

    pub(crate) fn section(&self, parameters: Value) -> Result<String> {
        self.section.render(&self.engine, parameters).to_string().or_raise(|| ErrorKind::Template)
    }

    pub(crate) fn index(&self, parameters: Value) -> Result<String> {
        self.index.render(&self.engine, parameters).to_string().or_raise(|| ErrorKind::Template)
    }
}

mod formatters {
    use std::fmt::Write;
    use upon::{Value, fmt as upon_fmt};

    /// Escapes strings for use in element content and quoted attributes.
    pub(super) fn escape_html(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                for c in s.chars() {
                    match c {
                        '&' => f.write_str("&amp;")?,
                        '<' => f.write_str("&lt;")?,
                        '>' => f.write_str("&gt;")?,
                        '"' => f.write_str("&quot;")?,
                        '\'' => f.write_str("&#39;")?,
                        c => f.write_char(c)?,
                    }
                }
            },
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    /// Writes strings verbatim, for markup that is already HTML.
    pub(super) fn raw(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => write!(f, "{s}")?,
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }
}
