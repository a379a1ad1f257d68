use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// A malformed type expression in the export metadata.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
#[error("{message}")]
#[diagnostic(code("EXTRACT-001"))]
pub struct ParseError {
    #[label("here")]
    pub span: SourceSpan,
    pub message: String,
}

pub type ParseResult<T> = Result<T, ParseError>;
