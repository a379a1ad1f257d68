//! Generated identifiers and collision detection.
//!
//! Every emitter asks this module for the names it prints, and
//! [`check_collisions`] walks the same names per namespace before any
//! emitter runs. Two declarations claiming one generated name abort the run.

use indexmap::IndexMap;
use mobind_ir::{lower_first, Decl, PackageModel, TypeDeclKind};
use mobind_source::{Backend, BindDiagnostic, Diagnostics};
use mobind_types::Naming;

use crate::context::EmitContext;

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long", "native",
    "new", "package", "private", "protected", "public", "return", "short", "static", "strictfp",
    "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try", "void",
    "volatile", "while", "true", "false", "null",
];

/// Selectors with a fixed meaning in Foundation.
const OBJC_RESERVED: &[&str] = &[
    "alloc", "autorelease", "class", "copy", "dealloc", "description", "hash", "id", "init",
    "new", "release", "retain", "self", "super",
];

pub fn java_ident(name: &str) -> String {
    if JAVA_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Java name of a source func or method: `Greet` becomes `greet`.
pub fn java_method(name: &str) -> String {
    java_ident(&lower_first(name))
}

pub fn java_getter(field: &str) -> String {
    format!("get{}", field)
}

pub fn java_setter(field: &str) -> String {
    format!("set{}", field)
}

/// First selector part of a source func, method or field.
pub fn objc_selector(name: &str) -> String {
    let s = lower_first(name);
    if OBJC_RESERVED.contains(&s.as_str()) {
        format!("{}_", s)
    } else {
        s
    }
}

pub fn objc_setter(name: &str) -> String {
    format!("set{}", name)
}

/// Exported C symbols of a package variable's accessors.
pub fn go_var_getter(naming: &Naming, pkg: &str, var: &str) -> String {
    format!("{}_Get", naming.go_func_symbol(pkg, var))
}

pub fn go_var_setter(naming: &Naming, pkg: &str, var: &str) -> String {
    format!("{}_Set", naming.go_func_symbol(pkg, var))
}

/// Names generated into one namespace of a backend.
struct NameScope {
    backend: Backend,
    names: IndexMap<String, String>,
}

impl NameScope {
    fn new(backend: Backend) -> Self {
        NameScope {
            backend,
            names: IndexMap::new(),
        }
    }

    fn claim(&mut self, generated: String, owner: String, diagnostics: &mut Diagnostics) {
        match self.names.get(&generated) {
            Some(first) if *first != owner => diagnostics.push(BindDiagnostic::NameCollision {
                backend: self.backend,
                generated,
                first: first.clone(),
                second: owner,
            }),
            Some(_) => {}
            None => {
                self.names.insert(generated, owner);
            }
        }
    }
}

/// Reports every pair of declarations that generate the same name in any
/// namespace of a requested backend.
pub fn check_collisions(ctx: &EmitContext<'_>) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for &backend in &ctx.options.targets {
        match backend {
            Backend::Java => {
                for pkg in ctx.set.packages() {
                    java_names(ctx.naming, pkg, &mut diagnostics);
                }
            }
            Backend::ObjC => {
                let mut global = NameScope::new(backend);
                for pkg in ctx.set.packages() {
                    objc_names(ctx.naming, pkg, &mut global, &mut diagnostics);
                }
            }
            Backend::Go => {
                let mut global = NameScope::new(backend);
                for pkg in ctx.set.packages() {
                    go_names(ctx.naming, pkg, &mut global, &mut diagnostics);
                }
            }
        }
    }
    if !diagnostics.is_empty() {
        log::info!("Found {} name collision(s)", diagnostics.len());
    }
    diagnostics
}

fn java_names(naming: &Naming, pkg: &PackageModel, diagnostics: &mut Diagnostics) {
    let p = &pkg.name;
    let mut classes = NameScope::new(Backend::Java);
    let mut statics = NameScope::new(Backend::Java);
    let mut fields = NameScope::new(Backend::Java);
    classes.claim(naming.java_package_class(p), format!("package {}", p), diagnostics);

    for decl in &pkg.decls {
        let owner = format!("{} {}.{}", decl.describe(), p, decl.name());
        match decl {
            Decl::Type(t) => {
                if !matches!(t.kind, TypeDeclKind::Struct(_) | TypeDeclKind::Interface(_)) {
                    continue;
                }
                classes.claim(t.name.clone(), owner, diagnostics);
                let mut members = NameScope::new(Backend::Java);
                if let TypeDeclKind::Struct(s) = &t.kind {
                    for field in &s.fields {
                        let owner = format!("field {}.{}.{}", p, t.name, field.name);
                        members.claim(java_getter(&field.name), owner.clone(), diagnostics);
                        members.claim(java_setter(&field.name), owner, diagnostics);
                    }
                }
                for method in t.methods() {
                    let owner = format!("method {}.{}.{}", p, t.name, method.name);
                    members.claim(java_method(&method.name), owner, diagnostics);
                }
            }
            Decl::Func(f) => statics.claim(java_method(&f.name), owner, diagnostics),
            Decl::Const(c) => fields.claim(java_ident(&c.name), owner, diagnostics),
            Decl::Var(v) => {
                statics.claim(java_getter(&v.name), owner.clone(), diagnostics);
                statics.claim(java_setter(&v.name), owner, diagnostics);
            }
        }
    }
}

fn objc_names(
    naming: &Naming,
    pkg: &PackageModel,
    global: &mut NameScope,
    diagnostics: &mut Diagnostics,
) {
    let p = &pkg.name;
    if pkg.vars().next().is_some() {
        global.claim(naming.objc_package(p), format!("package {}", p), diagnostics);
    }
    let mut class_methods = NameScope::new(Backend::ObjC);
    for decl in &pkg.decls {
        let owner = format!("{} {}.{}", decl.describe(), p, decl.name());
        match decl {
            Decl::Type(t) => {
                if !matches!(t.kind, TypeDeclKind::Struct(_) | TypeDeclKind::Interface(_)) {
                    continue;
                }
                global.claim(naming.objc_type(p, &t.name), owner, diagnostics);
                let mut members = NameScope::new(Backend::ObjC);
                if let TypeDeclKind::Struct(s) = &t.kind {
                    for field in &s.fields {
                        let owner = format!("field {}.{}.{}", p, t.name, field.name);
                        members.claim(objc_selector(&field.name), owner.clone(), diagnostics);
                        members.claim(objc_setter(&field.name), owner, diagnostics);
                    }
                }
                for method in t.methods() {
                    let owner = format!("method {}.{}.{}", p, t.name, method.name);
                    members.claim(objc_selector(&method.name), owner, diagnostics);
                }
            }
            Decl::Func(f) => global.claim(naming.objc_type(p, &f.name), owner, diagnostics),
            Decl::Const(c) => global.claim(naming.objc_type(p, &c.name), owner, diagnostics),
            Decl::Var(v) => {
                class_methods.claim(objc_selector(&v.name), owner.clone(), diagnostics);
                class_methods.claim(objc_setter(&v.name), owner, diagnostics);
            }
        }
    }
}

fn go_names(naming: &Naming, pkg: &PackageModel, global: &mut NameScope, diagnostics: &mut Diagnostics) {
    let p = &pkg.name;
    for decl in &pkg.decls {
        let owner = format!("{} {}.{}", decl.describe(), p, decl.name());
        match decl {
            Decl::Type(t) => {
                match &t.kind {
                    TypeDeclKind::Struct(s) => {
                        for field in &s.fields {
                            let owner = format!("field {}.{}.{}", p, t.name, field.name);
                            let base = naming.go_member_symbol(p, &t.name, &field.name);
                            global.claim(format!("{}_Get", base), owner.clone(), diagnostics);
                            global.claim(format!("{}_Set", base), owner, diagnostics);
                        }
                    }
                    TypeDeclKind::Interface(_) => {
                        global.claim(naming.go_proxy(p, &t.name), owner, diagnostics);
                    }
                    _ => continue,
                }
                for method in t.methods() {
                    let owner = format!("method {}.{}.{}", p, t.name, method.name);
                    global.claim(
                        naming.go_member_symbol(p, &t.name, &method.name),
                        owner,
                        diagnostics,
                    );
                }
            }
            Decl::Func(f) => global.claim(naming.go_func_symbol(p, &f.name), owner, diagnostics),
            Decl::Const(_) => {}
            Decl::Var(v) => {
                global.claim(go_var_getter(naming, p, &v.name), owner.clone(), diagnostics);
                global.claim(go_var_setter(naming, p, &v.name), owner, diagnostics);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_avoid_reserved_words() {
        assert_eq!(java_method("New"), "new_");
        assert_eq!(java_method("Greet"), "greet");
        assert_eq!(objc_selector("Init"), "init_");
        assert_eq!(objc_selector("URLPath"), "urlPath");
        assert_eq!(java_getter("Label"), "getLabel");
    }
}
