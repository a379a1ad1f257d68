use mobind_ir::{ConstValue, PackageModel, Type, TypeDeclKind};
use mobind_proxy::{ProxyStub, StubKind};
use mobind_source::Backend;

use super::{c_params, register_function, return_type, selector, selector_from, REF_HEADER};
use crate::context::{escape, literal, EmitContext};
use crate::names::{objc_selector, objc_setter};
use crate::printer::Printer;

fn const_value(value: &ConstValue) -> String {
    match value {
        ConstValue::Bool(true) => "YES".to_string(),
        ConstValue::Bool(false) => "NO".to_string(),
        other => literal(other),
    }
}

fn ref_members(p: &mut Printer) {
    p.line("@property(readonly) int64_t refnum;");
    p.line("- (nonnull instancetype)initWithRefnum:(int64_t)refnum;");
    p.doc_block("Drops this proxy's reference now instead of on dealloc.");
    p.line("- (void)releaseRef;");
}

fn struct_interface(p: &mut Printer, stub: &ProxyStub) {
    p.doc_block(&stub.doc);
    p.line(format!("@interface {} : NSObject <MobindRef>", stub.class));
    ref_members(p);
    for ctor in &stub.constructors {
        p.doc_block(&ctor.doc);
        p.line(format!("- (nullable instancetype){};", selector_from("init", &ctor.sig)));
    }
    for field in &stub.fields {
        p.doc_block(&field.doc);
        p.line(format!("- ({}){};", field.mapping.target, objc_selector(&field.name)));
        p.line(format!(
            "- (void){}:({})v;",
            objc_setter(&field.name),
            field.mapping.target
        ));
    }
    for method in &stub.methods {
        p.doc_block(&method.doc);
        p.line(format!(
            "- ({}){};",
            return_type(&method.sig),
            selector(&method.name, &method.sig)
        ));
    }
    p.line("@end");
}

fn protocol(p: &mut Printer, stub: &ProxyStub) {
    p.doc_block(&stub.doc);
    p.line(format!("@protocol {} <NSObject>", stub.class));
    for method in &stub.methods {
        p.doc_block(&method.doc);
        p.line(format!(
            "- ({}){};",
            return_type(&method.sig),
            selector(&method.name, &method.sig)
        ));
    }
    p.line("@end");
}

/// The class wrapping a source value of an interface type.
fn value_proxy(p: &mut Printer, stub: &ProxyStub) {
    p.line(format!(
        "@interface {} : NSObject <MobindRef, {}>",
        stub.class, stub.class
    ));
    ref_members(p);
    for method in &stub.methods {
        p.line(format!(
            "- ({}){};",
            return_type(&method.sig),
            selector(&method.name, &method.sig)
        ));
    }
    p.line("@end");
}

pub(super) fn emit(ctx: &EmitContext<'_>, pkg: &PackageModel) -> String {
    let mapper = ctx.mapper(Backend::ObjC);
    let prefix = ctx.naming.objc_package(&pkg.name);
    let stubs: Vec<&ProxyStub> = ctx.stubs(pkg, Backend::ObjC).collect();
    let guard = format!("__{}_H__", prefix);
    let mut p = Printer::tabs();

    p.line(ctx.banner("//"));
    p.blank();
    p.line(format!("// Objective-C API for the Go package {}.", pkg.path));
    p.doc_lines(&pkg.doc);
    p.blank();
    p.line(format!("#ifndef {}", guard));
    p.line(format!("#define {}", guard));
    p.blank();
    p.line("@import Foundation;");
    p.line(format!("#include \"{}\"", REF_HEADER));
    // Packages this one refers to.
    for other in ctx.set.packages() {
        if other.path != pkg.path && refers_to(pkg, &other.path) {
            p.line(format!(
                "#include \"{}.objc.h\"",
                ctx.naming.objc_package(&other.name)
            ));
        }
    }
    p.blank();

    for stub in &stubs {
        if stub.kind == StubKind::Interface {
            p.line(format!("@protocol {};", stub.class));
        }
        p.line(format!("@class {};", stub.class));
    }
    if !stubs.is_empty() {
        p.blank();
    }

    for stub in stubs.iter().filter(|s| s.kind == StubKind::Interface) {
        protocol(&mut p, stub);
        p.blank();
    }
    for stub in &stubs {
        match stub.kind {
            StubKind::Struct => struct_interface(&mut p, stub),
            StubKind::Interface => value_proxy(&mut p, stub),
        }
        p.blank();
    }

    for stub in stubs.iter().filter(|s| s.is_implementable()) {
        p.doc_block(&format!(
            "Hands an object adopting {} to Go, registering it on first use.",
            stub.class
        ));
        p.line(format!(
            "FOUNDATION_EXPORT int64_t {}(id<{}> _Nullable obj);",
            register_function(&pkg.name, &stub.decl.name),
            stub.class
        ));
        p.blank();
    }

    for t in pkg.types() {
        if matches!(t.kind, TypeDeclKind::Struct(_) | TypeDeclKind::Interface(_)) {
            continue;
        }
        let Ok(mapping) = mapper.map(&Type::Named(pkg.qualify(&t.name))) else {
            continue;
        };
        p.doc_block(&t.doc);
        p.line(format!(
            "typedef {} {};",
            mapping.target,
            ctx.naming.objc_type(&pkg.name, &t.name)
        ));
        p.blank();
    }

    for c in pkg.consts() {
        let Ok(mapping) = mapper.map(&Type::Basic(c.ty)) else {
            continue;
        };
        let name = ctx.naming.objc_type(&pkg.name, &c.name);
        p.doc_block(&c.doc);
        match &c.value {
            ConstValue::String(s) => p.line(format!("#define {} @\"{}\"", name, escape(s))),
            value => p.line(format!(
                "static const {} {} = {};",
                mapping.target,
                name,
                const_value(value)
            )),
        }
    }
    if pkg.consts().next().is_some() {
        p.blank();
    }

    let vars: Vec<_> = pkg.vars().collect();
    if !vars.is_empty() {
        p.line(format!("@interface {} : NSObject", prefix));
        for v in vars {
            let Ok(mapping) = mapper.map(&v.ty) else {
                continue;
            };
            p.doc_block(&v.doc);
            p.line(format!("+ ({}){};", mapping.target, objc_selector(&v.name)));
            p.line(format!("+ (void){}:({})v;", objc_setter(&v.name), mapping.target));
        }
        p.line("@end");
        p.blank();
    }

    for f in pkg.funcs() {
        let Ok(sig) = mapper.map_signature(&f.sig) else {
            continue;
        };
        p.doc_block(&f.doc);
        p.line(format!(
            "FOUNDATION_EXPORT {} {}({});",
            return_type(&sig),
            ctx.naming.objc_type(&pkg.name, &f.name),
            c_params(&sig)
        ));
        p.blank();
    }

    p.line("#endif");
    p.finish()
}

/// Whether any declaration of `pkg` names a type of the package at `path`.
fn refers_to(pkg: &PackageModel, path: &str) -> bool {
    let mut found = false;
    for decl in &pkg.decls {
        decl.for_each_named(&mut |name| found |= name.package == path);
    }
    found
}
