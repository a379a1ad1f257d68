use mobind_ir::{Receiver, Signature, TypeName};
use mobind_source::{Backend, ThreadAffinity};
use mobind_types::{MappedSignature, TypeMapping};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubKind {
    Struct,
    Interface,
}

/// A bound method and the glue symbol that reaches the source object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodStub {
    pub name: String,
    pub doc: String,
    pub receiver: Receiver,
    /// Exported symbol of the source-side entry point.
    pub symbol: String,
    pub source: Signature,
    pub sig: MappedSignature,
}

/// Accessor pair of an exported struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStub {
    pub name: String,
    pub doc: String,
    pub getter: String,
    pub setter: String,
    pub mapping: TypeMapping,
}

/// A `New<T>` function bound as a constructor of `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorStub {
    pub func: String,
    pub doc: String,
    pub symbol: String,
    pub source: Signature,
    pub sig: MappedSignature,
}

/// Entry point the source runtime calls to reach one method of a
/// target-side implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrampolineStub {
    pub method: String,
    pub symbol: String,
    pub source: Signature,
    pub sig: MappedSignature,
}

/// The implementable side of an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Implementable {
    /// Called by the target to register an implementation; returns its handle.
    pub register: String,
    /// Called by the target finalizer of an implementation.
    pub unregister: String,
    pub trampolines: Vec<TrampolineStub>,
    pub affinity: ThreadAffinity,
}

impl Implementable {
    /// Whether generated trampolines check the current thread and
    /// redispatch onto the owner thread.
    pub fn redispatches(&self) -> bool {
        self.affinity == ThreadAffinity::Main
    }
}

/// The handle-backed wrapper of one declared type on one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyStub {
    pub backend: Backend,
    pub decl: TypeName,
    pub kind: StubKind,
    pub doc: String,
    /// Generated type name on the backend.
    pub class: String,
    pub methods: Vec<MethodStub>,
    pub fields: Vec<FieldStub>,
    pub constructors: Vec<ConstructorStub>,
    /// `None` for structs and for interfaces bound as value proxies only.
    pub implementable: Option<Implementable>,
}

impl ProxyStub {
    pub fn is_implementable(&self) -> bool {
        self.implementable.is_some()
    }
}
