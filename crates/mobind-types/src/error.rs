use thiserror::Error;

/// A type that has no representation on a backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{ty}: {reason}")]
pub struct Unmappable {
    /// The offending type in source syntax.
    pub ty: String,
    pub reason: String,
}

impl Unmappable {
    pub fn new(ty: impl ToString, reason: impl Into<String>) -> Self {
        Unmappable {
            ty: ty.to_string(),
            reason: reason.into(),
        }
    }
}

pub type MapResult<T> = Result<T, Unmappable>;
