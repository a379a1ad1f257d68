//! Per-backend code emitters.
//!
//! Emission is a pure function of an [`EmitContext`]: the same packages,
//! mapping table, naming and proxies always print the same bytes. Each
//! backend is independent of the others, so callers may run them in
//! parallel.

mod cabi;
mod context;
mod emit;
mod go;
mod java;
mod names;
mod objc;
mod printer;
mod unit;

pub use context::{escape, literal, EmitContext, SEQ_IMPORT};
pub use emit::emit_backend;
pub use java::{jni_descriptor, jni_mangle};
pub use names::{check_collisions, java_method, objc_selector};
pub use printer::Printer;
pub use unit::{EmissionUnit, UnitSet, GLUE_DIR};
