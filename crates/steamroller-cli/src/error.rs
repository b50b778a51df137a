//! CLI error handling and exit codes.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use steamroller_config::ConfigError;
use steamroller_core::SteamrollError;
use steamroller_log::LogError;
use thiserror::Error;

/// Application exit codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    Usage = 1,
    Config = 2,
    Io = 3,
    Rewrite = 4,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Usage { message: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
    },

    #[error("{0}")]
    Rewrite(#[from] SteamrollError),

    #[error("{0}")]
    Log(#[from] LogError),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error, path: Option<PathBuf>) -> Self {
        Self::Io {
            message: message.into(),
            source,
            path,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usage { .. } => "E001",
            Self::Config(_) => "E002",
            Self::Io { .. } => "E003",
            Self::Rewrite(_) => "E004",
            Self::Log(_) => "E005",
        }
    }

    /// Get the exit code for this error
    pub fn exit(&self) -> Exit {
        match self {
            Self::Usage { .. } => Exit::Usage,
            Self::Config(_) => Exit::Config,
            Self::Io { .. } | Self::Log(LogError::FileError(_)) => Exit::Io,
            Self::Rewrite(_) => Exit::Rewrite,
            Self::Log(_) => Exit::Usage,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steamroller_core::{DocumentError, PatchError, Pointer};

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::usage("no pipeline").exit(), Exit::Usage);
        assert_eq!(
            CliError::from(ConfigError::ValidationError {
                message: "bad".into()
            })
            .exit(),
            Exit::Config
        );
        assert_eq!(
            CliError::io("read failed", io::Error::other("boom"), None).exit(),
            Exit::Io
        );
        let patch = PatchError::AmbiguousOrMissingSelector {
            op: steamroller_core::OpKind::Add,
            path: Pointer::root().key("jobs").select("file", "x"),
            selector: "file=x".into(),
            matches: 0,
        };
        assert_eq!(CliError::from(SteamrollError::from(patch)).exit(), Exit::Rewrite);
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            CliError::usage("x"),
            CliError::from(ConfigError::EnvVarNotFound { var: "X".into() }),
            CliError::io("x", io::Error::other("x"), None),
            CliError::from(SteamrollError::Pipeline(DocumentError::Emit {
                message: "x".into(),
            })),
            CliError::from(LogError::InitError("x".into())),
        ];
        let mut codes: Vec<_> = errors.iter().map(CliError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
