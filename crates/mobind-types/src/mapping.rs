//! The mapping table.
//!
//! Rules are keyed by `(TypeKind, Backend)`. A rule receives the type being
//! mapped (possibly a named type, which it resolves itself) and returns the
//! target representation together with the conversions generated code
//! applies at the boundary.

use fxhash::FxHashMap;
use mobind_ir::{BasicKind, PackageSet, Type, TypeKind, TypeName};
use mobind_source::Backend;

use crate::error::{MapResult, Unmappable};
use crate::naming::{package_name, Naming};

/// Who owns a value once it crossed the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Copied; no lifetime link to the other runtime.
    Value,
    /// Referenced through a handle in the reference table.
    ProxyByHandle,
    /// A failure indicator, translated to the target's failure idiom.
    Error,
}

/// What happens to a value at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarshalOp {
    /// Bit-preserving scalar copy.
    Scalar(BasicKind),
    /// UTF-8 text recoded to and from 16-bit code units.
    Utf16Text,
    /// UTF-8 text passed as a length-prefixed byte view.
    Utf8Text,
    /// Zero-copy view over a pinned buffer of numeric elements.
    PinnedView(BasicKind),
    /// Index-addressed proxy over a source slice.
    ListProxy,
    /// Associative proxy over a source map.
    MapProxy,
    /// Handle to a struct or interface object.
    ObjectHandle,
    Failure,
}

/// How generated code converts an expression at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Conversion {
    Identity,
    Cast(String),
    Call(String),
}

impl Conversion {
    fn cast(ty: &str) -> Self {
        Conversion::Cast(ty.to_string())
    }

    fn call(f: &str) -> Self {
        Conversion::Call(f.to_string())
    }

    /// Applies the conversion to `expr`, using C cast syntax.
    pub fn apply(&self, expr: &str) -> String {
        match self {
            Conversion::Identity => expr.to_string(),
            Conversion::Cast(ty) => format!("({}){}", ty, expr),
            Conversion::Call(f) => format!("{}({})", f, expr),
        }
    }

    /// Applies the conversion using Go conversion syntax.
    pub fn apply_go(&self, expr: &str) -> String {
        match self {
            Conversion::Identity => expr.to_string(),
            Conversion::Cast(ty) | Conversion::Call(ty) => format!("{}({})", ty, expr),
        }
    }
}

/// The representation of one type on one backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeMapping {
    /// Type in the backend's own language (`String`, `NSString*`, `int32`).
    pub target: String,
    /// Type in the backend's native glue layer (JNI, Objective-C, cgo).
    pub native: String,
    /// C type the value crosses the boundary as.
    pub abi: String,
    /// Boundary value to native glue value.
    pub encode: Conversion,
    /// Native glue value to boundary value.
    pub decode: Conversion,
    pub op: MarshalOp,
    pub ownership: Ownership,
    pub nullable: bool,
}

pub type Rule = fn(&TypeMapper<'_>, &Type) -> MapResult<TypeMapping>;

/// Rules indexed by `(TypeKind, Backend)`.
pub struct MappingTable {
    rules: FxHashMap<(TypeKind, Backend), Rule>,
}

impl MappingTable {
    pub fn empty() -> Self {
        MappingTable {
            rules: FxHashMap::default(),
        }
    }

    /// The rule set every run uses.
    pub fn standard() -> Self {
        let mut table = MappingTable::empty();
        let per_backend: [(Backend, [(TypeKind, Rule); 8]); 3] = [
            (
                Backend::Java,
                [
                    (TypeKind::Basic, java::basic),
                    (TypeKind::Struct, java::object),
                    (TypeKind::Interface, java::object),
                    (TypeKind::Slice, java::slice),
                    (TypeKind::Map, java::map),
                    (TypeKind::Pointer, pointer),
                    (TypeKind::Func, func),
                    (TypeKind::Error, java::error),
                ],
            ),
            (
                Backend::ObjC,
                [
                    (TypeKind::Basic, objc::basic),
                    (TypeKind::Struct, objc::object),
                    (TypeKind::Interface, objc::object),
                    (TypeKind::Slice, objc::slice),
                    (TypeKind::Map, objc::map),
                    (TypeKind::Pointer, pointer),
                    (TypeKind::Func, func),
                    (TypeKind::Error, objc::error),
                ],
            ),
            (
                Backend::Go,
                [
                    (TypeKind::Basic, go::basic),
                    (TypeKind::Struct, go::object),
                    (TypeKind::Interface, go::object),
                    (TypeKind::Slice, go::slice),
                    (TypeKind::Map, go::map),
                    (TypeKind::Pointer, pointer),
                    (TypeKind::Func, func),
                    (TypeKind::Error, go::error),
                ],
            ),
        ];
        for (backend, rules) in per_backend {
            for (kind, rule) in rules {
                table.insert(kind, backend, rule);
            }
        }
        table
    }

    pub fn insert(&mut self, kind: TypeKind, backend: Backend, rule: Rule) {
        self.rules.insert((kind, backend), rule);
    }

    pub fn rule(&self, kind: TypeKind, backend: Backend) -> Option<Rule> {
        self.rules.get(&(kind, backend)).copied()
    }
}

/// Maps types of one run onto one backend.
pub struct TypeMapper<'a> {
    pub table: &'a MappingTable,
    pub set: &'a PackageSet,
    pub naming: &'a Naming,
    pub backend: Backend,
}

impl<'a> TypeMapper<'a> {
    pub fn new(
        table: &'a MappingTable,
        set: &'a PackageSet,
        naming: &'a Naming,
        backend: Backend,
    ) -> Self {
        TypeMapper {
            table,
            set,
            naming,
            backend,
        }
    }

    pub fn map(&self, ty: &Type) -> MapResult<TypeMapping> {
        let kind = self
            .set
            .kind_of(ty)
            .ok_or_else(|| Unmappable::new(ty, "type is not bound in this run"))?;
        let rule = self
            .table
            .rule(kind, self.backend)
            .ok_or_else(|| Unmappable::new(ty, format!("no {} rule for {} types", self.backend, kind)))?;
        rule(self, ty)
    }

    /// Follows named non-struct, non-interface types to their definition.
    pub fn resolve(&self, ty: &Type) -> MapResult<Type> {
        self.set
            .underlying(ty)
            .ok_or_else(|| Unmappable::new(ty, "type is not bound in this run"))
    }

    fn named<'t>(&self, ty: &'t Type) -> MapResult<(&'t str, &'t TypeName)>
    where
        'a: 't,
    {
        let name = ty
            .as_named()
            .ok_or_else(|| Unmappable::new(ty, "expected a declared type"))?;
        Ok((package_name(self.set, name), name))
    }

    /// Renders a type the way the source-side glue package refers to it.
    pub fn go_type(&self, ty: &Type) -> String {
        match ty {
            Type::Basic(kind) => kind.source_name().to_string(),
            Type::Named(name) => format!("{}.{}", package_name(self.set, name), name.name),
            Type::Slice { elem, len: None } => format!("[]{}", self.go_type(elem)),
            Type::Slice { elem, len: Some(n) } => format!("[{}]{}", n, self.go_type(elem)),
            Type::Map { key, value } => {
                format!("map[{}]{}", self.go_type(key), self.go_type(value))
            }
            Type::Pointer(inner) => format!("*{}", self.go_type(inner)),
            Type::Func(sig) => {
                let params: Vec<String> = sig.params.iter().map(|p| self.go_type(&p.ty)).collect();
                let ret = match (&sig.ret, sig.fallible) {
                    (None, false) => String::new(),
                    (None, true) => " error".to_string(),
                    (Some(r), false) => format!(" {}", self.go_type(r)),
                    (Some(r), true) => format!(" ({}, error)", self.go_type(r)),
                };
                format!("func({}){}", params.join(", "), ret)
            }
            Type::Error => "error".to_string(),
        }
    }
}

/// C type of a basic value on the boundary.
pub fn abi_scalar(kind: BasicKind) -> &'static str {
    match kind {
        BasicKind::Bool => "char",
        BasicKind::Int8 => "int8_t",
        BasicKind::Int16 => "int16_t",
        BasicKind::Int32 => "int32_t",
        BasicKind::Int | BasicKind::Int64 => "int64_t",
        BasicKind::Uint8 => "uint8_t",
        BasicKind::Uint16 => "uint16_t",
        BasicKind::Uint32 => "uint32_t",
        BasicKind::Uint | BasicKind::Uint64 => "uint64_t",
        BasicKind::Uintptr => "uintptr_t",
        BasicKind::Float32 => "float",
        BasicKind::Float64 => "double",
        BasicKind::String => "nstring",
    }
}

/// C type handles cross the boundary as.
pub const ABI_HANDLE: &str = "int64_t";
/// C type pinned numeric views cross the boundary as.
pub const ABI_VIEW: &str = "nbyteslice";

fn pointer(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
    let Type::Pointer(inner) = ty else {
        return Err(Unmappable::new(ty, "expected a pointer type"));
    };
    match mapper.set.kind_of(inner) {
        Some(TypeKind::Struct) => {
            let mut mapping = mapper.map(inner)?;
            if mapper.backend == Backend::Go {
                mapping.target = format!("*{}", mapping.target);
            }
            mapping.nullable = true;
            Ok(mapping)
        }
        _ => Err(Unmappable::new(ty, "pointers are only supported to struct types")),
    }
}

fn func(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
    Err(Unmappable::new(
        ty,
        format!("func values cannot be represented by the {} backend", mapper.backend),
    ))
}

/// Element kind of a slice that maps to a pinned view, if any.
fn pinned_elem(mapper: &TypeMapper<'_>, elem: &Type) -> MapResult<Option<BasicKind>> {
    let resolved = mapper.resolve(elem)?;
    Ok(resolved.as_basic().filter(|k| k.is_numeric()))
}

fn object_mapping(target: String, native: String, encode: &str, decode: &str, nullable: bool) -> TypeMapping {
    TypeMapping {
        target,
        native,
        abi: ABI_HANDLE.to_string(),
        encode: Conversion::call(encode),
        decode: Conversion::call(decode),
        op: MarshalOp::ObjectHandle,
        ownership: Ownership::ProxyByHandle,
        nullable,
    }
}

mod java {
    use super::*;

    /// Java and JNI types of a scalar, `None` when Java has no such type.
    pub fn scalar(kind: BasicKind) -> Option<(&'static str, &'static str)> {
        let pair = match kind {
            BasicKind::Bool => ("boolean", "jboolean"),
            BasicKind::Int8 | BasicKind::Uint8 => ("byte", "jbyte"),
            BasicKind::Int16 => ("short", "jshort"),
            BasicKind::Int32 => ("int", "jint"),
            BasicKind::Int | BasicKind::Int64 => ("long", "jlong"),
            BasicKind::Float32 => ("float", "jfloat"),
            BasicKind::Float64 => ("double", "jdouble"),
            BasicKind::Uint16
            | BasicKind::Uint32
            | BasicKind::Uint64
            | BasicKind::Uint
            | BasicKind::Uintptr
            | BasicKind::String => return None,
        };
        Some(pair)
    }

    pub fn boxed(target: &str) -> String {
        let boxed = match target {
            "boolean" => "Boolean",
            "byte" => "Byte",
            "short" => "Short",
            "int" => "Integer",
            "long" => "Long",
            "float" => "Float",
            "double" => "Double",
            other => other,
        };
        boxed.to_string()
    }

    fn buffer_class(kind: BasicKind) -> &'static str {
        match kind {
            BasicKind::Int16 => "java.nio.ShortBuffer",
            BasicKind::Int32 => "java.nio.IntBuffer",
            BasicKind::Int | BasicKind::Int64 => "java.nio.LongBuffer",
            BasicKind::Float32 => "java.nio.FloatBuffer",
            BasicKind::Float64 => "java.nio.DoubleBuffer",
            _ => "java.nio.ByteBuffer",
        }
    }

    pub fn basic(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let resolved = mapper.resolve(ty)?;
        let Some(kind) = resolved.as_basic() else {
            return Err(Unmappable::new(ty, "expected a basic type"));
        };
        if kind == BasicKind::String {
            return Ok(TypeMapping {
                target: "String".to_string(),
                native: "jstring".to_string(),
                abi: abi_scalar(kind).to_string(),
                encode: Conversion::call("mobind_to_jstring"),
                decode: Conversion::call("mobind_from_jstring"),
                op: MarshalOp::Utf16Text,
                ownership: Ownership::Value,
                nullable: false,
            });
        }
        let (target, native) = scalar(kind).ok_or_else(|| {
            Unmappable::new(ty, format!("Java has no unsigned {}-bit type", kind.wire_bits()))
        })?;
        Ok(TypeMapping {
            target: target.to_string(),
            native: native.to_string(),
            abi: abi_scalar(kind).to_string(),
            encode: Conversion::cast(native),
            decode: Conversion::cast(abi_scalar(kind)),
            op: MarshalOp::Scalar(kind),
            ownership: Ownership::Value,
            nullable: false,
        })
    }

    pub fn object(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let (pkg, name) = mapper.named(ty)?;
        let nullable = mapper.set.kind_of(ty) == Some(TypeKind::Interface);
        Ok(object_mapping(
            mapper.naming.java_class(pkg, &name.name),
            "jobject".to_string(),
            "mobind_to_jobject",
            "mobind_from_jobject",
            nullable,
        ))
    }

    pub fn slice(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let resolved = mapper.resolve(ty)?;
        let Type::Slice { elem, .. } = &resolved else {
            return Err(Unmappable::new(ty, "expected a slice type"));
        };
        if let Some(kind) = pinned_elem(mapper, elem)? {
            if scalar(kind).is_none() {
                return Err(Unmappable::new(
                    ty,
                    format!("Java has no unsigned {}-bit type", kind.wire_bits()),
                ));
            }
            return Ok(TypeMapping {
                target: buffer_class(kind).to_string(),
                native: "jobject".to_string(),
                abi: ABI_VIEW.to_string(),
                encode: Conversion::call("mobind_to_jbuffer"),
                decode: Conversion::call("mobind_from_jbuffer"),
                op: MarshalOp::PinnedView(kind),
                ownership: Ownership::ProxyByHandle,
                nullable: false,
            });
        }
        let elem = mapper.map(elem)?;
        Ok(TypeMapping {
            target: format!("java.util.List<{}>", boxed(&elem.target)),
            native: "jobject".to_string(),
            abi: ABI_HANDLE.to_string(),
            encode: Conversion::call("mobind_to_jlist"),
            decode: Conversion::call("mobind_from_jlist"),
            op: MarshalOp::ListProxy,
            ownership: Ownership::ProxyByHandle,
            nullable: false,
        })
    }

    pub fn map(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let resolved = mapper.resolve(ty)?;
        let Type::Map { key, value } = &resolved else {
            return Err(Unmappable::new(ty, "expected a map type"));
        };
        let key = mapper.map(key)?;
        let value = mapper.map(value)?;
        Ok(TypeMapping {
            target: format!("java.util.Map<{}, {}>", boxed(&key.target), boxed(&value.target)),
            native: "jobject".to_string(),
            abi: ABI_HANDLE.to_string(),
            encode: Conversion::call("mobind_to_jmap"),
            decode: Conversion::call("mobind_from_jmap"),
            op: MarshalOp::MapProxy,
            ownership: Ownership::ProxyByHandle,
            nullable: false,
        })
    }

    pub fn error(_: &TypeMapper<'_>, _: &Type) -> MapResult<TypeMapping> {
        Ok(TypeMapping {
            target: "java.lang.Exception".to_string(),
            native: "jthrowable".to_string(),
            abi: ABI_HANDLE.to_string(),
            encode: Conversion::call("mobind_to_jthrowable"),
            decode: Conversion::call("mobind_from_jthrowable"),
            op: MarshalOp::Failure,
            ownership: Ownership::Error,
            nullable: true,
        })
    }
}

mod objc {
    use super::*;

    pub fn scalar(kind: BasicKind) -> &'static str {
        match kind {
            BasicKind::Bool => "BOOL",
            BasicKind::Int => "long",
            BasicKind::Uint => "unsigned long",
            BasicKind::String => "NSString*",
            other => abi_scalar(other),
        }
    }

    pub fn basic(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let resolved = mapper.resolve(ty)?;
        let Some(kind) = resolved.as_basic() else {
            return Err(Unmappable::new(ty, "expected a basic type"));
        };
        let target = scalar(kind).to_string();
        let (encode, decode, op) = if kind == BasicKind::String {
            (
                Conversion::call("mobind_to_nsstring"),
                Conversion::call("mobind_from_nsstring"),
                MarshalOp::Utf8Text,
            )
        } else {
            (
                Conversion::cast(scalar(kind)),
                Conversion::cast(abi_scalar(kind)),
                MarshalOp::Scalar(kind),
            )
        };
        Ok(TypeMapping {
            native: target.clone(),
            target,
            abi: abi_scalar(kind).to_string(),
            encode,
            decode,
            op,
            ownership: Ownership::Value,
            nullable: false,
        })
    }

    pub fn object(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let (pkg, name) = mapper.named(ty)?;
        let class = mapper.naming.objc_type(pkg, &name.name);
        let (target, nullable) = if mapper.set.kind_of(ty) == Some(TypeKind::Interface) {
            (format!("id<{}>", class), true)
        } else {
            (format!("{}*", class), false)
        };
        Ok(object_mapping(
            target.clone(),
            target,
            "mobind_to_objc",
            "mobind_from_objc",
            nullable,
        ))
    }

    pub fn slice(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let resolved = mapper.resolve(ty)?;
        let Type::Slice { elem, .. } = &resolved else {
            return Err(Unmappable::new(ty, "expected a slice type"));
        };
        if let Some(kind) = pinned_elem(mapper, elem)? {
            return Ok(TypeMapping {
                target: "NSMutableData*".to_string(),
                native: "NSMutableData*".to_string(),
                abi: ABI_VIEW.to_string(),
                encode: Conversion::call("mobind_to_nsdata"),
                decode: Conversion::call("mobind_from_nsdata"),
                op: MarshalOp::PinnedView(kind),
                ownership: Ownership::ProxyByHandle,
                nullable: false,
            });
        }
        mapper.map(elem)?;
        Ok(TypeMapping {
            target: "MobindList*".to_string(),
            native: "MobindList*".to_string(),
            abi: ABI_HANDLE.to_string(),
            encode: Conversion::call("mobind_to_list"),
            decode: Conversion::call("mobind_from_list"),
            op: MarshalOp::ListProxy,
            ownership: Ownership::ProxyByHandle,
            nullable: false,
        })
    }

    pub fn map(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let resolved = mapper.resolve(ty)?;
        let Type::Map { key, value } = &resolved else {
            return Err(Unmappable::new(ty, "expected a map type"));
        };
        mapper.map(key)?;
        mapper.map(value)?;
        Ok(TypeMapping {
            target: "MobindMap*".to_string(),
            native: "MobindMap*".to_string(),
            abi: ABI_HANDLE.to_string(),
            encode: Conversion::call("mobind_to_map"),
            decode: Conversion::call("mobind_from_map"),
            op: MarshalOp::MapProxy,
            ownership: Ownership::ProxyByHandle,
            nullable: false,
        })
    }

    pub fn error(_: &TypeMapper<'_>, _: &Type) -> MapResult<TypeMapping> {
        Ok(TypeMapping {
            target: "NSError*".to_string(),
            native: "NSError*".to_string(),
            abi: ABI_HANDLE.to_string(),
            encode: Conversion::call("mobind_to_nserror"),
            decode: Conversion::call("mobind_from_nserror"),
            op: MarshalOp::Failure,
            ownership: Ownership::Error,
            nullable: true,
        })
    }
}

/// Handles of the go backend come from the glue's own `toRefnum` family,
/// which allocates them in the runtime's table.
mod go {
    use super::*;

    fn cgo(abi: &str) -> String {
        format!("C.{}", abi)
    }

    pub fn basic(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let resolved = mapper.resolve(ty)?;
        let Some(kind) = resolved.as_basic() else {
            return Err(Unmappable::new(ty, "expected a basic type"));
        };
        let target = mapper.go_type(ty);
        let abi = abi_scalar(kind);
        let (encode, decode, op) = match kind {
            BasicKind::String => (
                Conversion::call("seq.ToCString"),
                Conversion::call("seq.FromCString"),
                MarshalOp::Utf8Text,
            ),
            BasicKind::Bool => (
                Conversion::call("seq.ToCBool"),
                Conversion::call("seq.FromCBool"),
                MarshalOp::Scalar(kind),
            ),
            _ => (
                Conversion::Cast(cgo(abi)),
                Conversion::Cast(target.clone()),
                MarshalOp::Scalar(kind),
            ),
        };
        Ok(TypeMapping {
            target,
            native: cgo(abi),
            abi: abi.to_string(),
            encode,
            decode,
            op,
            ownership: Ownership::Value,
            nullable: false,
        })
    }

    pub fn object(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let nullable = mapper.set.kind_of(ty) == Some(TypeKind::Interface);
        Ok(object_mapping(
            mapper.go_type(ty),
            cgo(ABI_HANDLE),
            "toRefnum",
            "fromRefnum",
            nullable,
        ))
    }

    pub fn slice(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let resolved = mapper.resolve(ty)?;
        let Type::Slice { elem, .. } = &resolved else {
            return Err(Unmappable::new(ty, "expected a slice type"));
        };
        if let Some(kind) = pinned_elem(mapper, elem)? {
            return Ok(TypeMapping {
                target: mapper.go_type(ty),
                native: cgo(ABI_VIEW),
                abi: ABI_VIEW.to_string(),
                encode: Conversion::call("seq.ToCView"),
                decode: Conversion::call("seq.FromCView"),
                op: MarshalOp::PinnedView(kind),
                ownership: Ownership::ProxyByHandle,
                nullable: false,
            });
        }
        mapper.map(elem)?;
        Ok(TypeMapping {
            target: mapper.go_type(ty),
            native: cgo(ABI_HANDLE),
            abi: ABI_HANDLE.to_string(),
            encode: Conversion::call("toRefnum"),
            decode: Conversion::call("fromRefnum"),
            op: MarshalOp::ListProxy,
            ownership: Ownership::ProxyByHandle,
            nullable: false,
        })
    }

    pub fn map(mapper: &TypeMapper<'_>, ty: &Type) -> MapResult<TypeMapping> {
        let resolved = mapper.resolve(ty)?;
        let Type::Map { key, value } = &resolved else {
            return Err(Unmappable::new(ty, "expected a map type"));
        };
        mapper.map(key)?;
        mapper.map(value)?;
        Ok(TypeMapping {
            target: mapper.go_type(ty),
            native: cgo(ABI_HANDLE),
            abi: ABI_HANDLE.to_string(),
            encode: Conversion::call("toRefnum"),
            decode: Conversion::call("fromRefnum"),
            op: MarshalOp::MapProxy,
            ownership: Ownership::ProxyByHandle,
            nullable: false,
        })
    }

    pub fn error(_: &TypeMapper<'_>, _: &Type) -> MapResult<TypeMapping> {
        Ok(TypeMapping {
            target: "error".to_string(),
            native: cgo(ABI_HANDLE),
            abi: ABI_HANDLE.to_string(),
            encode: Conversion::call("toErrorRefnum"),
            decode: Conversion::call("fromErrorRefnum"),
            op: MarshalOp::Failure,
            ownership: Ownership::Error,
            nullable: true,
        })
    }
}

pub use java::boxed as java_boxed;
