//! Runtime failure translation.
//!
//! Every failure that reaches a boundary is turned into the calling
//! runtime's native signal: a throwable for the JVM, an `NSError` for
//! Objective-C. Failures raised by target implementations come back to the
//! source as `RuntimeError::CallFailed`.

use crate::error::{RuntimeError, RuntimeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRuntime {
    Jvm,
    ObjC,
}

/// Error domain of failures returned by source functions.
pub const SOURCE_ERROR_DOMAIN: &str = "go";
/// Error domain of failures raised by the binding runtime itself.
pub const RUNTIME_ERROR_DOMAIN: &str = "mobind";

/// A failure in the target runtime's own terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetFailure {
    Throwable { class: String, message: String },
    NsError { domain: String, code: i64, message: String },
}

impl TargetFailure {
    pub fn message(&self) -> &str {
        match self {
            TargetFailure::Throwable { message, .. } | TargetFailure::NsError { message, .. } => {
                message
            }
        }
    }
}

/// Stable `NSError` code of a runtime error.
pub fn error_code(err: &RuntimeError) -> i64 {
    match err {
        RuntimeError::Marshal(_) => 1,
        RuntimeError::HandleNotFound(_) => 2,
        RuntimeError::DoubleRelease(_) => 3,
        RuntimeError::WrongKind { .. } => 4,
        RuntimeError::MethodNotFound { .. } => 5,
        RuntimeError::Pinned(_) => 6,
        RuntimeError::IndexOutOfRange { .. } => 7,
        RuntimeError::CallFailed(_) => 8,
        RuntimeError::ThreadDispatch(_) => 9,
        RuntimeError::HandlesExhausted => 10,
    }
}

fn throwable_class(err: &RuntimeError) -> &'static str {
    match err {
        RuntimeError::Marshal(_) => "java.lang.IllegalArgumentException",
        RuntimeError::HandleNotFound(_)
        | RuntimeError::DoubleRelease(_)
        | RuntimeError::WrongKind { .. }
        | RuntimeError::Pinned(_) => "java.lang.IllegalStateException",
        RuntimeError::MethodNotFound { .. } => "java.lang.UnsupportedOperationException",
        RuntimeError::IndexOutOfRange { .. } => "java.lang.IndexOutOfBoundsException",
        RuntimeError::CallFailed(_) => "java.lang.Exception",
        RuntimeError::ThreadDispatch(_) | RuntimeError::HandlesExhausted => {
            "java.lang.RuntimeException"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorTranslator {
    target: TargetRuntime,
}

impl ErrorTranslator {
    pub fn new(target: TargetRuntime) -> Self {
        ErrorTranslator { target }
    }

    /// The failure indicator returned by a source function.
    pub fn source_failure(&self, message: &str) -> TargetFailure {
        match self.target {
            TargetRuntime::Jvm => TargetFailure::Throwable {
                class: "java.lang.Exception".to_string(),
                message: message.to_string(),
            },
            TargetRuntime::ObjC => TargetFailure::NsError {
                domain: SOURCE_ERROR_DOMAIN.to_string(),
                code: 1,
                message: message.to_string(),
            },
        }
    }

    /// A runtime error raised while performing a call.
    pub fn runtime_failure(&self, err: &RuntimeError) -> TargetFailure {
        if let RuntimeError::CallFailed(message) = err {
            return self.source_failure(message);
        }
        log::debug!("Translating runtime error for {:?}: {}", self.target, err);
        match self.target {
            TargetRuntime::Jvm => TargetFailure::Throwable {
                class: throwable_class(err).to_string(),
                message: err.to_string(),
            },
            TargetRuntime::ObjC => TargetFailure::NsError {
                domain: RUNTIME_ERROR_DOMAIN.to_string(),
                code: error_code(err),
                message: err.to_string(),
            },
        }
    }

    /// A failure raised by a target implementation, as seen by the source.
    pub fn from_target(&self, failure: &TargetFailure) -> RuntimeError {
        let message = match failure {
            TargetFailure::Throwable { class, message } if message.is_empty() => class.clone(),
            TargetFailure::NsError { domain, code, message } if message.is_empty() => {
                format!("{} error {}", domain, code)
            }
            other => other.message().to_string(),
        };
        RuntimeError::CallFailed(message)
    }

    pub fn translate<T>(&self, result: RuntimeResult<T>) -> Result<T, TargetFailure> {
        result.map_err(|err| self.runtime_failure(&err))
    }
}
