//! CLI argument definitions using clap derive macros.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use is_terminal::IsTerminal;
use steamroller_config::{ConfigLoader, ResourceOverride};
use steamroller_core::{ResourceMap, Steamroller};
use steamroller_log::{LogConfig, LogFormat, LogLevel};
use tracing::{debug, info};

use crate::error::CliError;

/// Flatten a Concourse pipeline.
///
/// Inlines task files referenced by `file:` and scripts referenced by
/// `run.path` for every resource root with a local directory, then writes the
/// self-contained pipeline to stdout.
#[derive(Debug, Parser)]
#[command(name = "steamroller", author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline file to flatten; read from stdin when omitted
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub pipeline: Option<PathBuf>,

    /// Config file with a `resource_map` of root names to directories
    #[arg(short, long, env = "STEAMROLLER_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Map a resource root to a local directory (repeatable)
    #[arg(short = 'r', long = "resource-config", value_name = "ROOT=DIR")]
    pub resource_config: Vec<ResourceOverride>,

    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress everything but errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Format of log lines written to stderr
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Cli {
    /// Environment settings, with flags taking precedence.
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_env();
        if self.verbose > 0 || self.quiet {
            config = config.with_level(LogLevel::from_verbosity(self.verbose, self.quiet));
        }
        if let Some(format) = self.log_format {
            config = config.with_format(format.into());
        }
        config
    }

    /// Config file first, then `--resource-config` overrides.
    pub fn resource_map(&self) -> Result<ResourceMap, CliError> {
        let mut loader = ConfigLoader::new().with_overrides(self.resource_config.iter().cloned());
        if let Some(path) = &self.config {
            loader = loader.with_file(path);
        }
        Ok(loader.resource_map()?)
    }

    /// Read the pipeline from `--pipeline`, falling back to piped stdin.
    pub fn read_pipeline(&self) -> Result<Vec<u8>, CliError> {
        let bytes = match &self.pipeline {
            Some(path) => fs::read(path).map_err(|source| {
                CliError::io(
                    format!("failed to read pipeline {}: {source}", path.display()),
                    source,
                    Some(path.clone()),
                )
            })?,
            None if !io::stdin().is_terminal() => {
                let mut buf = Vec::new();
                io::stdin()
                    .lock()
                    .read_to_end(&mut buf)
                    .map_err(|source| CliError::io(format!("failed to read stdin: {source}"), source, None))?;
                buf
            }
            None => {
                return Err(CliError::usage(
                    "no pipeline given: pass --pipeline or pipe one on stdin",
                ))
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(CliError::usage("pipeline is empty"));
        }
        Ok(bytes)
    }

    pub fn execute(&self) -> Result<(), CliError> {
        let resources = self.resource_map()?;
        debug!(roots = resources.len(), "resolved resource map");

        let pipeline = self.read_pipeline()?;
        let flattened = Steamroller::new(&resources).steamroll(&pipeline)?;

        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        out.write_all(&flattened)
            .and_then(|()| out.flush())
            .map_err(|source| CliError::io(format!("failed to write output: {source}"), source, None))?;

        info!(bytes = flattened.len(), "wrote flattened pipeline");
        Ok(())
    }
}
