//! Callback and interface proxy generation.
//!
//! Produces, per declared struct or interface and per backend, the
//! handle-backed wrapper description emitters turn into code: bound
//! methods, field accessors, constructors and, for implementable
//! interfaces, the registration symbol and one trampoline per method.

mod generator;
mod stub;

pub use generator::{
    generate_proxies, register_symbol, trampoline_symbol, ProxyGenerator, ProxyOutput, ProxySet,
};
pub use stub::{
    ConstructorStub, FieldStub, Implementable, MethodStub, ProxyStub, StubKind, TrampolineStub,
};
