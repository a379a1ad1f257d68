//! Type mapping engine.
//!
//! Decides, per backend, how each IR type is represented on the other side
//! of the boundary and which conversions generated code applies to it.

mod check;
mod error;
mod mapping;
mod naming;
mod translate;

pub use check::check_backends;
pub use error::{MapResult, Unmappable};
pub use mapping::{
    abi_scalar, java_boxed, Conversion, MappingTable, MarshalOp, Ownership, Rule, TypeMapper,
    TypeMapping, ABI_HANDLE, ABI_VIEW,
};
pub use naming::{package_name, Naming};
pub use translate::{failure_idiom, FailureIdiom, MappedParam, MappedSignature};
