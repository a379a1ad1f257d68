//! Inputs of a binding run.
//!
//! This crate is responsible for:
//! - Reading export metadata documents produced by the source toolchain
//! - Loading generation options from `bind.toml` and the target selector
//! - The diagnostic types every later stage reports through

mod config;
mod diagnostic;
mod error;
mod metadata;

pub use config::{
    Backend, BindConfigFile, BindOptions, BindSection, JavaSection, ObjcSection, ThreadAffinity,
};
pub use diagnostic::{BindDiagnostic, DiagnosticKind, Diagnostics};
pub use error::SourceError;
pub use metadata::{
    ExportConst, ExportData, ExportField, ExportFunc, ExportMethod, ExportPackage, ExportParam,
    ExportType, ExportTypeDef, ExportVar,
};
