use crate::types::{BasicKind, Signature, Type, TypeKind, TypeName};

/// How a method receives its receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    Value,
    Pointer,
}

/// An exported struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub doc: String,
    pub ty: Type,
}

/// A method of a struct or interface.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub doc: String,
    pub receiver: Receiver,
    pub sig: Signature,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructDecl {
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceDecl {
    pub methods: Vec<MethodDecl>,
    /// Source methods left out of `methods` because their signatures are
    /// unsupported. A non-empty list makes the interface impossible to
    /// implement from target code.
    pub omitted: Vec<String>,
}

/// The underlying shape of a declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDeclKind {
    Basic(BasicKind),
    Struct(StructDecl),
    Interface(InterfaceDecl),
    Slice(Type),
    Map { key: Type, value: Type },
    Pointer(Type),
    Func(Signature),
    Error,
}

impl TypeDeclKind {
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeDeclKind::Basic(_) => TypeKind::Basic,
            TypeDeclKind::Struct(_) => TypeKind::Struct,
            TypeDeclKind::Interface(_) => TypeKind::Interface,
            TypeDeclKind::Slice(_) => TypeKind::Slice,
            TypeDeclKind::Map { .. } => TypeKind::Map,
            TypeDeclKind::Pointer(_) => TypeKind::Pointer,
            TypeDeclKind::Func(_) => TypeKind::Func,
            TypeDeclKind::Error => TypeKind::Error,
        }
    }
}

/// An exported type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub doc: String,
    pub kind: TypeDeclKind,
}

impl TypeDecl {
    pub fn as_struct(&self) -> Option<&StructDecl> {
        match &self.kind {
            TypeDeclKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceDecl> {
        match &self.kind {
            TypeDeclKind::Interface(i) => Some(i),
            _ => None,
        }
    }

    /// Methods owned by this declaration; empty for non struct/interface kinds.
    pub fn methods(&self) -> &[MethodDecl] {
        match &self.kind {
            TypeDeclKind::Struct(s) => &s.methods,
            TypeDeclKind::Interface(i) => &i.methods,
            _ => &[],
        }
    }
}

/// An exported package-level function.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    pub doc: String,
    pub sig: Signature,
}

impl FuncDecl {
    /// Returns the struct this function constructs, if it follows the
    /// `New<T>` convention and returns `*T` (optionally with an error).
    pub fn constructed_struct(&self) -> Option<&TypeName> {
        let Some(Type::Pointer(inner)) = &self.sig.ret else {
            return None;
        };
        let name = inner.as_named()?;
        let suffix = self.name.strip_prefix("New")?;
        if suffix == name.name {
            Some(name)
        } else {
            None
        }
    }
}

/// Literal value of an exported constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub name: String,
    pub doc: String,
    pub ty: BasicKind,
    pub value: ConstValue,
}

/// An exported package-level variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub doc: String,
    pub ty: Type,
}

/// Any exported declaration of a package.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Type(TypeDecl),
    Func(FuncDecl),
    Const(ConstDecl),
    Var(VarDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Type(d) => &d.name,
            Decl::Func(d) => &d.name,
            Decl::Const(d) => &d.name,
            Decl::Var(d) => &d.name,
        }
    }

    pub fn doc(&self) -> &str {
        match self {
            Decl::Type(d) => &d.doc,
            Decl::Func(d) => &d.doc,
            Decl::Const(d) => &d.doc,
            Decl::Var(d) => &d.doc,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Decl::Type(_) => "type",
            Decl::Func(_) => "func",
            Decl::Const(_) => "const",
            Decl::Var(_) => "var",
        }
    }

    /// Calls `f` for every type name this declaration depends on.
    pub fn for_each_named<'a>(&'a self, f: &mut impl FnMut(&'a TypeName)) {
        match self {
            Decl::Type(decl) => match &decl.kind {
                TypeDeclKind::Basic(_) | TypeDeclKind::Error => {}
                TypeDeclKind::Struct(s) => {
                    for field in &s.fields {
                        field.ty.for_each_named(f);
                    }
                    for method in &s.methods {
                        method.sig.for_each_named(f);
                    }
                }
                TypeDeclKind::Interface(i) => {
                    for method in &i.methods {
                        method.sig.for_each_named(f);
                    }
                }
                TypeDeclKind::Slice(elem) | TypeDeclKind::Pointer(elem) => elem.for_each_named(f),
                TypeDeclKind::Map { key, value } => {
                    key.for_each_named(f);
                    value.for_each_named(f);
                }
                TypeDeclKind::Func(sig) => sig.for_each_named(f),
            },
            Decl::Func(decl) => decl.sig.for_each_named(f),
            Decl::Const(_) => {}
            Decl::Var(decl) => decl.ty.for_each_named(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Param;

    fn func(name: &str, ret: Option<Type>, fallible: bool) -> FuncDecl {
        FuncDecl {
            name: name.to_string(),
            doc: String::new(),
            sig: Signature::new(vec![Param::new("v", Type::Basic(BasicKind::Int))], ret, fallible),
        }
    }

    #[test]
    fn recognizes_constructors() {
        let ctor = func("NewNode", Some(Type::pointer(Type::named("p", "Node"))), true);
        assert_eq!(ctor.constructed_struct().map(|n| n.name.as_str()), Some("Node"));

        let wrong_name = func("MakeNode", Some(Type::pointer(Type::named("p", "Node"))), false);
        assert!(wrong_name.constructed_struct().is_none());

        let by_value = func("NewNode", Some(Type::named("p", "Node")), false);
        assert!(by_value.constructed_struct().is_none());
    }
}
