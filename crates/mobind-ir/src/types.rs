//! Type references used by declarations.
//!
//! `Type` is a closed enumeration: anything the extractor could not express
//! with one of these variants never enters the IR.

use std::fmt;

/// Built-in scalar kinds of the source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    String,
}

impl BasicKind {
    pub const ALL: [BasicKind; 15] = [
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::String,
    ];

    /// Looks up a predeclared type name (`int32`, `byte`, `rune`, ...).
    pub fn from_source_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => BasicKind::Bool,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" | "rune" => BasicKind::Int32,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" | "byte" => BasicKind::Uint8,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            "string" => BasicKind::String,
            _ => return None,
        };
        Some(kind)
    }

    pub fn source_name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::String => "string",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, BasicKind::Bool | BasicKind::String)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicKind::Float32 | BasicKind::Float64)
    }

    /// Width in bits of the value on the wire. `int`, `uint` and `uintptr`
    /// always travel as 64-bit values.
    pub fn wire_bits(self) -> u32 {
        match self {
            BasicKind::Bool | BasicKind::Int8 | BasicKind::Uint8 => 8,
            BasicKind::Int16 | BasicKind::Uint16 => 16,
            BasicKind::Int32 | BasicKind::Uint32 | BasicKind::Float32 => 32,
            BasicKind::Int
            | BasicKind::Int64
            | BasicKind::Uint
            | BasicKind::Uint64
            | BasicKind::Uintptr
            | BasicKind::Float64 => 64,
            BasicKind::String => 0,
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

/// Fully qualified name of a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    /// Import path of the declaring package.
    pub package: String,
    /// Exported identifier within that package.
    pub name: String,
}

impl TypeName {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeName {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.package.rsplit('/').next().unwrap_or(&self.package);
        write!(f, "{}.{}", short, self.name)
    }
}

/// A reference to a type from a signature, field, variable or another type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Basic(BasicKind),
    /// A declared type, resolved against the `PackageSet` of the run.
    Named(TypeName),
    /// A slice, or a fixed-size array when `len` is set.
    Slice { elem: Box<Type>, len: Option<u64> },
    Map { key: Box<Type>, value: Box<Type> },
    Pointer(Box<Type>),
    Func(Box<Signature>),
    /// The predeclared failure indicator.
    Error,
}

/// Discriminant of `Type` after resolving named types to their declaration.
///
/// This is the key the type mapping table is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Basic,
    Struct,
    Interface,
    Slice,
    Map,
    Pointer,
    Func,
    Error,
}

impl TypeKind {
    pub const ALL: [TypeKind; 8] = [
        TypeKind::Basic,
        TypeKind::Struct,
        TypeKind::Interface,
        TypeKind::Slice,
        TypeKind::Map,
        TypeKind::Pointer,
        TypeKind::Func,
        TypeKind::Error,
    ];
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeKind::Basic => "basic",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Slice => "slice",
            TypeKind::Map => "map",
            TypeKind::Pointer => "pointer",
            TypeKind::Func => "func",
            TypeKind::Error => "error",
        };
        f.write_str(s)
    }
}

impl Type {
    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        Type::Named(TypeName::new(package, name))
    }

    pub fn slice(elem: Type) -> Self {
        Type::Slice {
            elem: Box::new(elem),
            len: None,
        }
    }

    pub fn pointer(to: Type) -> Self {
        Type::Pointer(Box::new(to))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn as_basic(&self) -> Option<BasicKind> {
        match self {
            Type::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&TypeName> {
        match self {
            Type::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Calls `f` for every type name reachable from this type, outermost first.
    pub fn for_each_named<'a>(&'a self, f: &mut impl FnMut(&'a TypeName)) {
        match self {
            Type::Basic(_) | Type::Error => {}
            Type::Named(name) => f(name),
            Type::Slice { elem, .. } => elem.for_each_named(f),
            Type::Map { key, value } => {
                key.for_each_named(f);
                value.for_each_named(f);
            }
            Type::Pointer(inner) => inner.for_each_named(f),
            Type::Func(sig) => sig.for_each_named(f),
        }
    }

    /// Renders the type in source syntax, qualifying names from packages
    /// other than `local`.
    pub fn to_source(&self, local: &str) -> String {
        match self {
            Type::Basic(kind) => kind.source_name().to_string(),
            Type::Named(name) if name.package == local => name.name.clone(),
            Type::Named(name) => name.to_string(),
            Type::Slice { elem, len: None } => format!("[]{}", elem.to_source(local)),
            Type::Slice { elem, len: Some(n) } => format!("[{}]{}", n, elem.to_source(local)),
            Type::Map { key, value } => {
                format!("map[{}]{}", key.to_source(local), value.to_source(local))
            }
            Type::Pointer(inner) => format!("*{}", inner.to_source(local)),
            Type::Func(sig) => format!("func{}", sig.to_source(local)),
            Type::Error => "error".to_string(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source(""))
    }
}

/// A named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Param {
            name: name.into(),
            ty,
        }
    }
}

/// A normalized function signature.
///
/// The extractor folds the source convention of trailing results into at
/// most one value result plus a flag for a trailing failure indicator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    pub params: Vec<Param>,
    pub ret: Option<Type>,
    /// The last source result is `error`.
    pub fallible: bool,
}

impl Signature {
    pub fn new(params: Vec<Param>, ret: Option<Type>, fallible: bool) -> Self {
        Signature {
            params,
            ret,
            fallible,
        }
    }

    pub fn for_each_named<'a>(&'a self, f: &mut impl FnMut(&'a TypeName)) {
        for param in &self.params {
            param.ty.for_each_named(f);
        }
        if let Some(ret) = &self.ret {
            ret.for_each_named(f);
        }
    }

    /// All types mentioned by the signature, parameters first.
    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.params.iter().map(|p| &p.ty).chain(self.ret.iter())
    }

    pub fn to_source(&self, local: &str) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{} {}", p.name, p.ty.to_source(local)))
            .collect();
        let results = match (&self.ret, self.fallible) {
            (None, false) => String::new(),
            (None, true) => " error".to_string(),
            (Some(ret), false) => format!(" {}", ret.to_source(local)),
            (Some(ret), true) => format!(" ({}, error)", ret.to_source(local)),
        };
        format!("({}){}", params.join(", "), results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_names_round_trip_through_source_syntax() {
        for kind in BasicKind::ALL {
            assert_eq!(BasicKind::from_source_name(kind.source_name()), Some(kind));
        }
        assert_eq!(BasicKind::from_source_name("byte"), Some(BasicKind::Uint8));
        assert_eq!(BasicKind::from_source_name("rune"), Some(BasicKind::Int32));
        assert_eq!(BasicKind::from_source_name("complex128"), None);
    }

    #[test]
    fn renders_nested_types() {
        let ty = Type::map(
            Type::Basic(BasicKind::String),
            Type::slice(Type::pointer(Type::named("example.com/pkg", "Node"))),
        );
        assert_eq!(ty.to_source("example.com/pkg"), "map[string][]*Node");
        assert_eq!(ty.to_source("other"), "map[string][]*pkg.Node");
    }

    #[test]
    fn collects_named_references_from_signatures() {
        let sig = Signature::new(
            vec![Param::new("a", Type::named("p", "A"))],
            Some(Type::slice(Type::named("p", "B"))),
            true,
        );
        let mut names = Vec::new();
        sig.for_each_named(&mut |n| names.push(n.name.clone()));
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(sig.to_source("p"), "(a A) ([]B, error)");
    }
}
