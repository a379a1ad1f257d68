use thiserror::Error;

use crate::handle::Handle;

/// Malformed data met while decoding a value crossing the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    #[error("buffer truncated: needed {needed} byte(s), {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("invalid UTF-8 text at byte {0}")]
    InvalidUtf8(usize),

    #[error("invalid UTF-16 text: unpaired surrogate")]
    InvalidUtf16,

    #[error("unexpected value tag {found}, expected {expected}")]
    UnexpectedTag { expected: String, found: u8 },

    #[error("unknown value tag {0}")]
    UnknownTag(u8),

    #[error("length {0} does not fit the boundary encoding")]
    TooLong(usize),
}

/// Errors raised by the binding runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("marshalling failed: {0}")]
    Marshal(#[from] MarshalError),

    #[error("handle {0} is not registered")]
    HandleNotFound(Handle),

    #[error("handle {0} released more times than it was retained")]
    DoubleRelease(Handle),

    #[error("handle {handle} refers to a {found}, not a {expected}")]
    WrongKind {
        handle: Handle,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{interface} has no method {method}")]
    MethodNotFound { interface: String, method: String },

    #[error("buffer is pinned by {0} view(s) and cannot be resized")]
    Pinned(usize),

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("call failed: {0}")]
    CallFailed(String),

    #[error("could not dispatch onto the owner thread: {0}")]
    ThreadDispatch(String),

    #[error("handle space exhausted")]
    HandlesExhausted,
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
