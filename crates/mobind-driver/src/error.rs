use std::path::PathBuf;

use miette::Diagnostic;
use mobind_source::{BindDiagnostic, SourceError};
use thiserror::Error;

/// Why a binding run produced no output.
#[derive(Debug, Error, Diagnostic)]
pub enum DriverError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    /// The run found at least one error. `diagnostics` holds every problem
    /// found up to the failing stage, warnings included.
    #[error("binding aborted with {errors} error(s)")]
    #[diagnostic(
        code("DRIVER-001"),
        help("No files were written; fix the reported declarations and run again")
    )]
    Aborted {
        errors: usize,
        #[related]
        diagnostics: Vec<BindDiagnostic>,
    },

    #[error("Could not write {path}: {message}")]
    #[diagnostic(code("DRIVER-002"))]
    Io { path: PathBuf, message: String },

    #[error("{0} emitter panicked")]
    #[diagnostic(code("DRIVER-003"))]
    EmitterPanicked(String),
}

impl DriverError {
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        DriverError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Diagnostics carried by an aborted run; empty for other errors.
    pub fn diagnostics(&self) -> &[BindDiagnostic] {
        match self {
            DriverError::Aborted { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;
