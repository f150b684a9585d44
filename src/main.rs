mod error;

use crate::error::{ErrorKind, Result};
use clap::{ArgAction, Parser};
use exn::bail;
use mhtpub_book::Bundle;
use mhtpub_config::Config;
use mhtpub_convert::Converter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Convert saved MHTML web pages into a book, one section per page.
#[derive(Debug, Parser)]
#[command(name = "mhtpub", version)]
struct Cli {
    /// Saved pages, in reading order.
    #[arg(value_name = "ARCHIVE")]
    archives: Vec<PathBuf>,
    /// Where to write the book; must not exist yet.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    /// Image file to use as the cover.
    #[arg(long, value_name = "IMAGE")]
    cover: Option<PathBuf>,
    /// Config file (TOML, YAML or JSON); defaults to the user config directory.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// More output; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Applies command-line flags over the loaded configuration.
    fn settle(&self, config: Config) -> Config {
        Config {
            title: self.title.clone().unwrap_or(config.title),
            author: self.author.clone().unwrap_or(config.author),
            cover: self.cover.clone().or(config.cover),
            output: self.output.clone().unwrap_or(config.output),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder().with_default_directive(level.into()).from_env_lossy())
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).map_err(ErrorKind::config)?;
    let config = cli.settle(config);
    if config.output.exists() {
        bail!(ErrorKind::OutputExists(config.output));
    }
    tracing::debug!(title = config.title.as_str(), output = %config.output.display(), "Starting conversion");
    Converter::new(Bundle::new(config.title))
        .with_author(config.author)
        .with_cover(config.cover)
        .run(&cli.archives, &config.output)
        .map_err(ErrorKind::convert)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}
