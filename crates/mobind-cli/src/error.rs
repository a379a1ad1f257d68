use std::path::PathBuf;

use miette::Diagnostic;
use mobind_driver::DriverError;
use mobind_source::SourceError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Driver(#[from] DriverError),

    #[error("Configuration file {path} does not exist")]
    #[diagnostic(
        code("CLI-001"),
        help("Pass an existing bind.toml with --config, or omit the flag")
    )]
    MissingConfig { path: PathBuf },
}

pub type CliResult<T> = Result<T, CliError>;
