//! Syntax tree of a type expression as written in export metadata.
//!
//! This tree covers more than the IR can express (channels, anonymous
//! structs, generics); lowering decides what is bindable.

use std::fmt;

/// Direction of a channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `int32`, `Node`, `error`
    Ident(String),
    /// `other.Node` or `"example.com/other".Node`
    Qualified { package: Qualifier, name: String },
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`
    Array(u64, Box<TypeExpr>),
    /// `map[K]V`
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `func(params) results`
    Func(FuncExpr),
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan(ChanDir, Box<TypeExpr>),
    /// `...T`, only valid as the last parameter
    Variadic(Box<TypeExpr>),
    /// `interface{ ... }` literal
    InterfaceLit,
    /// `struct{ ... }` literal
    StructLit,
    /// `Name[T1, T2]`
    Generic(Box<TypeExpr>, Vec<TypeExpr>),
}

/// How a qualified name names its package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    /// Package identifier, e.g. `other`.
    Name(String),
    /// Full import path, e.g. `example.com/other`.
    Path(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncExpr {
    pub params: Vec<TypeExpr>,
    pub results: Vec<TypeExpr>,
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Ident(name) => f.write_str(name),
            TypeExpr::Qualified { package: Qualifier::Name(pkg), name } => {
                write!(f, "{}.{}", pkg, name)
            }
            TypeExpr::Qualified { package: Qualifier::Path(path), name } => {
                write!(f, "\"{}\".{}", path, name)
            }
            TypeExpr::Slice(elem) => write!(f, "[]{}", elem),
            TypeExpr::Array(len, elem) => write!(f, "[{}]{}", len, elem),
            TypeExpr::Map(key, value) => write!(f, "map[{}]{}", key, value),
            TypeExpr::Pointer(inner) => write!(f, "*{}", inner),
            TypeExpr::Func(func) => write!(f, "func{}", func),
            TypeExpr::Chan(ChanDir::Both, elem) => write!(f, "chan {}", elem),
            TypeExpr::Chan(ChanDir::Send, elem) => write!(f, "chan<- {}", elem),
            TypeExpr::Chan(ChanDir::Recv, elem) => write!(f, "<-chan {}", elem),
            TypeExpr::Variadic(elem) => write!(f, "...{}", elem),
            TypeExpr::InterfaceLit => f.write_str("interface{...}"),
            TypeExpr::StructLit => f.write_str("struct{...}"),
            TypeExpr::Generic(base, args) => {
                write!(f, "{}[", base)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for FuncExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: &[TypeExpr]| {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "({})", join(&self.params))?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {}", single),
            many => write!(f, " ({})", join(many)),
        }
    }
}
