//! Lowering of parsed type expressions into IR types.
//!
//! Lowering is where bindability is decided: every shape the IR cannot
//! express comes back as an `Unsupported` with a human readable reason.

use fxhash::FxHashMap;
use mobind_ir::{BasicKind, Param, Signature, Type, TypeName};

use crate::ast::{Qualifier, TypeExpr};

/// Why a type expression cannot be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    /// The offending (sub)expression in source syntax.
    pub ty: String,
    pub reason: String,
}

impl Unsupported {
    fn new(ty: impl Into<String>, reason: impl Into<String>) -> Self {
        Unsupported {
            ty: ty.into(),
            reason: reason.into(),
        }
    }
}

/// Coarse shape of a declared type, known before any member is lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Struct,
    Interface,
    Basic(BasicKind),
    Other,
}

/// Names visible while lowering the declarations of one package.
pub struct Scope<'a> {
    /// Import path of the package being lowered.
    pub local: &'a str,
    /// Package identifier → import path, for every bound package.
    pub packages: &'a FxHashMap<String, String>,
    /// Every type declared in the metadata of a bound package.
    pub shapes: &'a FxHashMap<TypeName, Shape>,
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}

impl<'a> Scope<'a> {
    pub fn shape(&self, name: &TypeName) -> Option<Shape> {
        self.shapes.get(name).copied()
    }

    pub fn lower(&self, expr: &TypeExpr) -> Result<Type, Unsupported> {
        match expr {
            TypeExpr::Ident(name) => self.lower_ident(name),
            TypeExpr::Qualified { package, name } => {
                let path = match package {
                    Qualifier::Name(pkg) => self.packages.get(pkg).cloned(),
                    Qualifier::Path(path) => self
                        .packages
                        .values()
                        .find(|p| *p == path)
                        .cloned(),
                };
                let Some(path) = path else {
                    let shown = match package {
                        Qualifier::Name(n) | Qualifier::Path(n) => n,
                    };
                    return Err(Unsupported::new(
                        format!("{}.{}", shown, name),
                        format!("package {} is not bound in this run", shown),
                    ));
                };
                self.lower_named(TypeName::new(path, name.clone()))
            }
            TypeExpr::Slice(elem) => Ok(Type::slice(self.lower(elem)?)),
            TypeExpr::Array(len, elem) => {
                let elem = self.lower(elem)?;
                match elem.as_basic() {
                    Some(kind) if kind.is_numeric() => Ok(Type::Slice {
                        elem: Box::new(elem),
                        len: Some(*len),
                    }),
                    _ => Err(Unsupported::new(
                        format!("[{}]{}", len, elem),
                        "fixed-size arrays must have numeric elements",
                    )),
                }
            }
            TypeExpr::Map(key, value) => {
                let key = self.lower(key)?;
                if key.as_basic().is_none() {
                    return Err(Unsupported::new(
                        format!("map[{}]...", key),
                        "map keys must be basic types",
                    ));
                }
                Ok(Type::map(key, self.lower(value)?))
            }
            TypeExpr::Pointer(inner) => {
                let inner = self.lower(inner)?;
                match inner.as_named().and_then(|n| self.shape(n)) {
                    Some(Shape::Struct) => Ok(Type::pointer(inner)),
                    _ => Err(Unsupported::new(
                        format!("*{}", inner),
                        "pointers are only supported to struct types",
                    )),
                }
            }
            TypeExpr::Func(_) => Err(Unsupported::new(
                expr.to_string(),
                "func values are not supported",
            )),
            TypeExpr::Chan(..) => Err(Unsupported::new(
                expr.to_string(),
                "channel types are not supported",
            )),
            TypeExpr::Variadic(_) => Err(Unsupported::new(
                expr.to_string(),
                "variadic parameters are not supported",
            )),
            TypeExpr::InterfaceLit => Err(Unsupported::new(
                expr.to_string(),
                "empty or anonymous interfaces are not supported",
            )),
            TypeExpr::StructLit => Err(Unsupported::new(
                expr.to_string(),
                "anonymous struct types are not supported",
            )),
            TypeExpr::Generic(..) => Err(Unsupported::new(
                expr.to_string(),
                "generic types are not supported",
            )),
        }
    }

    fn lower_ident(&self, name: &str) -> Result<Type, Unsupported> {
        if let Some(kind) = BasicKind::from_source_name(name) {
            return Ok(Type::Basic(kind));
        }
        match name {
            "error" => Ok(Type::Error),
            "any" => Err(Unsupported::new(name, "empty or anonymous interfaces are not supported")),
            "complex64" | "complex128" => Err(Unsupported::new(name, "complex numbers are not supported")),
            "unsafe" | "Pointer" => Err(Unsupported::new(name, "unsafe pointers are not supported")),
            _ => self.lower_named(TypeName::new(self.local, name)),
        }
    }

    fn lower_named(&self, name: TypeName) -> Result<Type, Unsupported> {
        if !is_exported(&name.name) {
            return Err(Unsupported::new(name.to_string(), "type is not exported"));
        }
        if self.shape(&name).is_none() {
            return Err(Unsupported::new(name.to_string(), "unknown type"));
        }
        Ok(Type::Named(name))
    }

    /// Folds parameter and result lists into a normalized signature.
    pub fn lower_signature(
        &self,
        params: &[(String, TypeExpr)],
        results: &[TypeExpr],
    ) -> Result<Signature, Unsupported> {
        let mut lowered = Vec::with_capacity(params.len());
        for (i, (name, expr)) in params.iter().enumerate() {
            let name = if name.is_empty() || name == "_" {
                format!("p{}", i)
            } else {
                name.clone()
            };
            lowered.push(Param::new(name, self.lower(expr)?));
        }

        let results = results
            .iter()
            .map(|r| self.lower(r))
            .collect::<Result<Vec<_>, _>>()?;
        let (ret, fallible) = match results.as_slice() {
            [] => (None, false),
            [Type::Error] => (None, true),
            [single] => (Some(single.clone()), false),
            [value, Type::Error] if *value != Type::Error => (Some(value.clone()), true),
            [_, second] => {
                return Err(Unsupported::new(
                    second.to_string(),
                    "the second result must be the error indicator",
                ))
            }
            _ => {
                return Err(Unsupported::new(
                    format!("{} results", results.len()),
                    "functions may return at most two results",
                ))
            }
        };
        Ok(Signature::new(lowered, ret, fallible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_type;

    fn fixture() -> (FxHashMap<String, String>, FxHashMap<TypeName, Shape>) {
        let mut packages = FxHashMap::default();
        packages.insert("p".to_string(), "example.com/p".to_string());
        packages.insert("q".to_string(), "example.com/q".to_string());
        let mut shapes = FxHashMap::default();
        shapes.insert(TypeName::new("example.com/p", "Node"), Shape::Struct);
        shapes.insert(TypeName::new("example.com/p", "Greeter"), Shape::Interface);
        shapes.insert(TypeName::new("example.com/q", "Thing"), Shape::Struct);
        shapes.insert(
            TypeName::new("example.com/p", "Celsius"),
            Shape::Basic(BasicKind::Float64),
        );
        (packages, shapes)
    }

    fn lower(src: &str) -> Result<Type, Unsupported> {
        let (packages, shapes) = fixture();
        let scope = Scope {
            local: "example.com/p",
            packages: &packages,
            shapes: &shapes,
        };
        scope.lower(&parse_type(src).unwrap())
    }

    #[test]
    fn lowers_supported_shapes() {
        assert_eq!(
            lower("[]*Node").unwrap(),
            Type::slice(Type::pointer(Type::named("example.com/p", "Node")))
        );
        assert_eq!(
            lower("*q.Thing").unwrap(),
            Type::pointer(Type::named("example.com/q", "Thing"))
        );
        assert_eq!(
            lower("[4]float32").unwrap(),
            Type::Slice {
                elem: Box::new(Type::Basic(BasicKind::Float32)),
                len: Some(4)
            }
        );
        assert_eq!(
            lower("map[string]Greeter").unwrap(),
            Type::map(Type::Basic(BasicKind::String), Type::named("example.com/p", "Greeter"))
        );
    }

    #[test]
    fn rejects_unsupported_shapes() {
        let reason = |src: &str| lower(src).unwrap_err().reason;
        assert_eq!(reason("chan int"), "channel types are not supported");
        assert_eq!(reason("[2]string"), "fixed-size arrays must have numeric elements");
        assert_eq!(reason("*Celsius"), "pointers are only supported to struct types");
        assert_eq!(reason("map[*Node]int"), "map keys must be basic types");
        assert_eq!(reason("hidden"), "type is not exported");
        assert_eq!(reason("Missing"), "unknown type");
        assert_eq!(reason("r.Thing"), "package r is not bound in this run");
        assert_eq!(reason("interface{}"), "empty or anonymous interfaces are not supported");
        assert_eq!(reason("func(int) error"), "func values are not supported");
    }

    #[test]
    fn normalizes_results() {
        let (packages, shapes) = fixture();
        let scope = Scope {
            local: "example.com/p",
            packages: &packages,
            shapes: &shapes,
        };
        let sig = |results: &[&str]| {
            let results: Vec<TypeExpr> = results.iter().map(|r| parse_type(r).unwrap()).collect();
            scope.lower_signature(&[], &results)
        };

        assert_eq!(sig(&[]).unwrap(), Signature::new(vec![], None, false));
        assert_eq!(sig(&["error"]).unwrap(), Signature::new(vec![], None, true));
        assert_eq!(
            sig(&["int", "error"]).unwrap(),
            Signature::new(vec![], Some(Type::Basic(BasicKind::Int)), true)
        );
        assert!(sig(&["error", "int"]).is_err());
        assert!(sig(&["int", "string"]).is_err());
        assert!(sig(&["int", "int", "error"]).is_err());
    }
}
