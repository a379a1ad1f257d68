use mobind_ir::{Decl, PackageModel, PackageSet, Type, TypeDeclKind};
use mobind_source::{Backend, BindDiagnostic, Diagnostics};

use crate::mapping::{MappingTable, TypeMapper};
use crate::naming::Naming;

/// Maps every surviving declaration onto each requested backend and
/// reports the ones a backend cannot represent.
pub fn check_backends(
    set: &PackageSet,
    table: &MappingTable,
    naming: &Naming,
    backends: &[Backend],
) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for &backend in backends {
        let mapper = TypeMapper::new(table, set, naming, backend);
        for pkg in set.packages() {
            check_package(&mapper, pkg, &mut diagnostics);
        }
    }
    log::info!(
        "Checked {} backend(s): {} error(s)",
        backends.len(),
        diagnostics.errors().count()
    );
    diagnostics
}

fn check_package(mapper: &TypeMapper<'_>, pkg: &PackageModel, diagnostics: &mut Diagnostics) {
    let mut check = |decl: String, ty: &Type| {
        if let Err(err) = mapper.map(ty) {
            diagnostics.push(BindDiagnostic::UnsupportedOnBackend {
                decl,
                ty: err.ty,
                backend: mapper.backend,
                reason: err.reason,
            });
        }
    };

    for decl in &pkg.decls {
        let what = format!("{} {}.{}", decl.describe(), pkg.name, decl.name());
        match decl {
            Decl::Type(t) => match &t.kind {
                TypeDeclKind::Struct(s) => {
                    for field in &s.fields {
                        check(format!("field {}.{}.{}", pkg.name, t.name, field.name), &field.ty);
                    }
                    for method in &s.methods {
                        let name = format!("method {}.{}.{}", pkg.name, t.name, method.name);
                        for ty in method.sig.types() {
                            check(name.clone(), ty);
                        }
                    }
                }
                TypeDeclKind::Interface(i) => {
                    for method in &i.methods {
                        let name = format!("method {}.{}.{}", pkg.name, t.name, method.name);
                        for ty in method.sig.types() {
                            check(name.clone(), ty);
                        }
                    }
                }
                _ => check(what, &Type::Named(pkg.qualify(&t.name))),
            },
            Decl::Func(f) => {
                for ty in f.sig.types() {
                    check(what.clone(), ty);
                }
            }
            Decl::Const(c) => check(what, &Type::Basic(c.ty)),
            Decl::Var(v) => check(what, &v.ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobind_ir::{BasicKind, FuncDecl, Param, Signature};

    #[test]
    fn reports_each_backend_separately() {
        let mut pkg = PackageModel::new("example.com/hash", "hash");
        pkg.decls.push(Decl::Func(FuncDecl {
            name: "Sum".into(),
            doc: String::new(),
            sig: Signature::new(
                vec![Param::new("b", Type::slice(Type::Basic(BasicKind::Uint8)))],
                Some(Type::Basic(BasicKind::Uint64)),
                false,
            ),
        }));
        let set = PackageSet::new(vec![pkg]);
        let table = MappingTable::standard();
        let naming = Naming::default();

        let diags = check_backends(&set, &table, &naming, &[Backend::ObjC, Backend::Go]);
        assert!(diags.is_empty());

        let diags = check_backends(&set, &table, &naming, &Backend::ALL);
        let errors: Vec<_> = diags.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "unsupported construct in func hash.Sum: uint64 cannot be represented by the java backend (Java has no unsigned 64-bit type)"
        );
    }
}
