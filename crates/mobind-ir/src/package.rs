use fxhash::FxHashMap;

use crate::decl::{ConstDecl, Decl, FuncDecl, TypeDecl, TypeDeclKind, VarDecl};
use crate::types::{Type, TypeKind, TypeName};

/// The exported surface of one source package.
///
/// Built once by the extractor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageModel {
    /// Import path, e.g. `example.com/mobile/testpkg`.
    pub path: String,
    /// Package identifier, e.g. `testpkg`.
    pub name: String,
    /// Package doc comment.
    pub doc: String,
    /// Declarations in source order.
    pub decls: Vec<Decl>,
}

impl PackageModel {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        PackageModel {
            path: path.into(),
            name: name.into(),
            doc: String::new(),
            decls: Vec::new(),
        }
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Type(t) => Some(t),
            _ => None,
        })
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f),
            _ => None,
        })
    }

    pub fn consts(&self) -> impl Iterator<Item = &ConstDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Const(c) => Some(c),
            _ => None,
        })
    }

    pub fn vars(&self) -> impl Iterator<Item = &VarDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Var(v) => Some(v),
            _ => None,
        })
    }

    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types().find(|t| t.name == name)
    }

    /// Constructor functions of the struct named `name`, in source order.
    pub fn constructors<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FuncDecl> + 'a {
        self.funcs().filter(move |f| {
            f.constructed_struct()
                .map_or(false, |t| t.package == self.path && t.name == name)
        })
    }

    pub fn qualify(&self, name: &str) -> TypeName {
        TypeName::new(self.path.clone(), name)
    }
}

/// All packages bound in one generation run.
#[derive(Debug, Clone, Default)]
pub struct PackageSet {
    packages: Vec<PackageModel>,
    by_path: FxHashMap<String, usize>,
}

impl PackageSet {
    pub fn new(packages: Vec<PackageModel>) -> Self {
        let by_path = packages
            .iter()
            .enumerate()
            .map(|(i, p)| (p.path.clone(), i))
            .collect();
        PackageSet { packages, by_path }
    }

    pub fn packages(&self) -> &[PackageModel] {
        &self.packages
    }

    pub fn into_packages(self) -> Vec<PackageModel> {
        self.packages
    }

    pub fn package(&self, path: &str) -> Option<&PackageModel> {
        self.by_path.get(path).map(|&i| &self.packages[i])
    }

    pub fn lookup(&self, name: &TypeName) -> Option<&TypeDecl> {
        self.package(&name.package)?.type_decl(&name.name)
    }

    /// Resolves the kind of a type reference, following named types to their
    /// declaration. Returns `None` for names that are not bound in this run.
    pub fn kind_of(&self, ty: &Type) -> Option<TypeKind> {
        let kind = match ty {
            Type::Basic(_) => TypeKind::Basic,
            Type::Named(name) => return self.lookup(name).map(|d| d.kind.kind()),
            Type::Slice { .. } => TypeKind::Slice,
            Type::Map { .. } => TypeKind::Map,
            Type::Pointer(_) => TypeKind::Pointer,
            Type::Func(_) => TypeKind::Func,
            Type::Error => TypeKind::Error,
        };
        Some(kind)
    }

    /// Replaces a named type by its underlying definition when that
    /// definition is not a struct or interface. Struct and interface names
    /// are kept, they map to proxies of the declared type.
    pub fn underlying(&self, ty: &Type) -> Option<Type> {
        match ty {
            Type::Named(name) => {
                let decl = self.lookup(name)?;
                let resolved = match &decl.kind {
                    TypeDeclKind::Struct(_) | TypeDeclKind::Interface(_) => ty.clone(),
                    TypeDeclKind::Basic(kind) => Type::Basic(*kind),
                    TypeDeclKind::Slice(elem) => Type::slice(elem.clone()),
                    TypeDeclKind::Map { key, value } => Type::map(key.clone(), value.clone()),
                    TypeDeclKind::Pointer(inner) => Type::pointer(inner.clone()),
                    TypeDeclKind::Func(sig) => Type::Func(Box::new(sig.clone())),
                    TypeDeclKind::Error => Type::Error,
                };
                Some(resolved)
            }
            other => Some(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::StructDecl;
    use crate::types::BasicKind;

    fn sample() -> PackageSet {
        let mut pkg = PackageModel::new("example.com/p", "p");
        pkg.decls.push(Decl::Type(TypeDecl {
            name: "Node".into(),
            doc: String::new(),
            kind: TypeDeclKind::Struct(StructDecl::default()),
        }));
        pkg.decls.push(Decl::Type(TypeDecl {
            name: "Celsius".into(),
            doc: String::new(),
            kind: TypeDeclKind::Basic(BasicKind::Float64),
        }));
        PackageSet::new(vec![pkg])
    }

    #[test]
    fn resolves_named_kinds() {
        let set = sample();
        assert_eq!(set.kind_of(&Type::named("example.com/p", "Node")), Some(TypeKind::Struct));
        assert_eq!(set.kind_of(&Type::named("example.com/p", "Celsius")), Some(TypeKind::Basic));
        assert_eq!(set.kind_of(&Type::named("example.com/q", "Node")), None);
    }

    #[test]
    fn underlying_keeps_struct_names() {
        let set = sample();
        let node = Type::named("example.com/p", "Node");
        assert_eq!(set.underlying(&node), Some(node.clone()));
        let celsius = Type::named("example.com/p", "Celsius");
        assert_eq!(set.underlying(&celsius), Some(Type::Basic(BasicKind::Float64)));
    }
}
