use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while reading generator inputs.
#[derive(Debug, Error, Diagnostic, Clone)]
pub enum SourceError {
    #[error("Unknown target backend: {0}")]
    #[diagnostic(
        code("SOURCE-001"),
        help("Valid targets are `java`, `objc` and `go`, separated by commas")
    )]
    InvalidTarget(String),

    #[error("Could not read {path}: {message}")]
    #[diagnostic(code("SOURCE-002"))]
    Io { path: PathBuf, message: String },

    #[error("Invalid bind configuration: {0}")]
    #[diagnostic(
        code("SOURCE-003"),
        help("Check your bind.toml syntax against the documented sections [bind], [java] and [objc]")
    )]
    ConfigParse(String),

    #[error("Invalid export metadata: {0}")]
    #[diagnostic(
        code("SOURCE-004"),
        help("Export metadata is a JSON document with a top-level `packages` array")
    )]
    MetadataParse(String),
}

impl From<toml::de::Error> for SourceError {
    fn from(err: toml::de::Error) -> Self {
        SourceError::ConfigParse(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::MetadataParse(err.to_string())
    }
}
