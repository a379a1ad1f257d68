//! Runtime support for generated bindings.
//!
//! This crate is responsible for:
//! - The reference tables bridging the two runtimes' memory management
//! - The boundary value codec and pinned buffer views
//! - Dispatch tables of target-implemented interfaces and thread affinity
//! - Translating runtime failures into each target's native signal
//! - The C ABI generated glue links against

pub mod abi;
mod affinity;
mod bridge;
mod dispatch;
mod error;
pub mod ffi;
mod handle;
mod proxy;
#[cfg(test)]
mod property_tests;
mod table;
mod translate;
mod value;
mod view;
mod wire;

pub use affinity::{Affinity, OwnerThread};
pub use bridge::{global, Bridge, ReleaseHook};
pub use dispatch::{Implementation, ImplementationBuilder, Trampoline};
pub use error::{MarshalError, RuntimeError, RuntimeResult};
pub use handle::{Handle, Side};
pub use proxy::{HashMapSource, ListProxy, MapProxy, ObjectProxy, SourceList, SourceMap, VecList};
pub use table::{RefEntry, RefObject, RefTable, ReferenceLeakWarning};
pub use translate::{
    error_code, ErrorTranslator, TargetFailure, TargetRuntime, RUNTIME_ERROR_DOMAIN,
    SOURCE_ERROR_DOMAIN,
};
pub use value::Value;
pub use view::{PinnedBuffer, SliceView};
pub use wire::{utf16_to_utf8, utf8_to_utf16, WireReader, WireWriter};
