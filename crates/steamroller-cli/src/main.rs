//! steamroller - flatten Concourse pipelines.
//!
//! Main entry point for the `steamroller` binary.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod cli;
mod error;

use cli::Cli;
use error::{CliError, Exit};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = steamroller_log::init(cli.log_config()) {
        // No subscriber to report through.
        let e = CliError::from(e);
        eprintln!("steamroller: {e}");
        return e.exit_code();
    }

    match cli.execute() {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            error!(code = e.code(), "{e}");
            e.exit_code()
        }
    }
}
