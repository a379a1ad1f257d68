//! The java backend: one class per bound struct and interface, a package
//! class for funcs, constants and variables, and the JNI translation unit.

mod jni;

use std::path::PathBuf;

use mobind_ir::{ConstDecl, ConstValue, PackageModel, TypeDeclKind};
use mobind_proxy::{ProxyStub, StubKind};
use mobind_source::Backend;
use mobind_types::{MappedSignature, TypeMapper};

use crate::context::{escape, literal, EmitContext};
use crate::names::{java_getter, java_ident, java_method, java_setter};
use crate::printer::Printer;
use crate::unit::{EmissionUnit, GLUE_DIR};

pub use jni::{jni_descriptor, jni_mangle};

/// Support package of the Java runtime library.
const SEQ: &str = "mobind.Seq";

pub fn emit(ctx: &EmitContext<'_>, pkg: &PackageModel) -> Vec<EmissionUnit> {
    let java_package = ctx.naming.java_package(&pkg.name);
    let dir = PathBuf::from("java").join(java_package.replace('.', "/"));
    let mapper = ctx.mapper(Backend::Java);
    let mut units = Vec::new();

    let class = ctx.naming.java_package_class(&pkg.name);
    units.push(EmissionUnit::new(
        Backend::Java,
        dir.join(format!("{}.java", class)),
        package_class(ctx, &mapper, pkg, &java_package, &class),
    ));
    for stub in ctx.stubs(pkg, Backend::Java) {
        let contents = match stub.kind {
            StubKind::Struct => struct_class(ctx, pkg, &java_package, stub),
            StubKind::Interface => interface_class(ctx, pkg, &java_package, stub),
        };
        units.push(EmissionUnit::new(
            Backend::Java,
            dir.join(format!("{}.java", stub.decl.name)),
            contents,
        ));
    }
    units.push(EmissionUnit::new(
        Backend::Java,
        PathBuf::from(GLUE_DIR).join(format!("java_{}.c", pkg.name)),
        jni::emit(ctx, &mapper, pkg),
    ));
    units
}

fn header(ctx: &EmitContext<'_>, p: &mut Printer, pkg: &PackageModel, java_package: &str) {
    p.line(ctx.banner("//"));
    p.blank();
    p.line(format!("// Java bindings for Go package {}.", pkg.path));
    p.line(format!("package {};", java_package));
    p.blank();
    p.line("import java.lang.ref.Cleaner;");
    p.line(format!("import {};", SEQ));
    p.blank();
}

pub(crate) fn params(sig: &MappedSignature) -> String {
    sig.params
        .iter()
        .map(|p| format!("{} {}", p.mapping.target, java_ident(&p.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn args(sig: &MappedSignature) -> String {
    sig.params
        .iter()
        .map(|p| java_ident(&p.name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn return_type(sig: &MappedSignature) -> &str {
    sig.ret.as_ref().map_or("void", |r| r.target.as_str())
}

fn throws(sig: &MappedSignature) -> &'static str {
    if sig.is_fallible() {
        " throws Exception"
    } else {
        ""
    }
}

fn const_literal(java_type: &str, c: &ConstDecl) -> String {
    match (&c.value, java_type) {
        (ConstValue::Int(i), "long") => format!("{}L", i),
        (ConstValue::Uint(u), "long") => format!("{}L", u),
        (ConstValue::Int(i), "byte" | "short") => format!("({}) {}", java_type, i),
        (ConstValue::Uint(u), "byte" | "short") => format!("({}) {}", java_type, u),
        (ConstValue::Float(_), "float") => format!("{}f", literal(&c.value)),
        (ConstValue::String(s), _) => format!("\"{}\"", escape(s)),
        (value, _) => literal(value),
    }
}

fn package_class(
    ctx: &EmitContext<'_>,
    mapper: &TypeMapper<'_>,
    pkg: &PackageModel,
    java_package: &str,
    class: &str,
) -> String {
    let mut p = Printer::tabs();
    header(ctx, &mut p, pkg, java_package);
    p.doc_block(&pkg.doc);
    p.block(format!("public abstract class {} {{", class), "}", |p| {
        p.block("static {", "}", |p| {
            p.line("Seq.touch();");
            p.line("_init();");
        });
        p.blank();
        p.line(format!("private {}() {{}}", class));
        p.blank();
        p.line("// Loads the package; bound types call this before first use.");
        p.line("public static void touch() {}");
        p.blank();
        p.line("private static native void _init();");
        p.blank();
        p.line("// Drops the references of collected proxies.");
        p.line("static final Cleaner CLEANER = Cleaner.create();");
        p.blank();
        p.line("static native int __decRef(long refnum);");

        for t in pkg.types() {
            if matches!(t.kind, TypeDeclKind::Struct(_) | TypeDeclKind::Interface(_)) || t.doc.is_empty() {
                continue;
            }
            let Ok(mapping) = mapper.map(&mobind_ir::Type::Named(pkg.qualify(&t.name))) else {
                continue;
            };
            p.blank();
            p.line(format!("// {} is bound as {}.", t.name, mapping.target));
            p.doc_lines(&t.doc);
        }

        for c in pkg.consts() {
            let Ok(mapping) = mapper.map(&mobind_ir::Type::Basic(c.ty)) else {
                continue;
            };
            p.blank();
            p.doc_block(&c.doc);
            p.line(format!(
                "public static final {} {} = {};",
                mapping.target,
                java_ident(&c.name),
                const_literal(&mapping.target, c)
            ));
        }

        for v in pkg.vars() {
            let Ok(mapping) = mapper.map(&v.ty) else {
                continue;
            };
            p.blank();
            p.doc_block(&v.doc);
            p.line(format!(
                "public static native void {}({} v);",
                java_setter(&v.name),
                mapping.target
            ));
            p.line(format!(
                "public static native {} {}();",
                mapping.target,
                java_getter(&v.name)
            ));
        }

        for f in pkg.funcs() {
            let Ok(sig) = mapper.map_signature(&f.sig) else {
                continue;
            };
            p.blank();
            p.doc_block(&f.doc);
            p.line(format!(
                "public static native {} {}({}){};",
                return_type(&sig),
                java_method(&f.name),
                params(&sig),
                throws(&sig)
            ));
        }
    });
    p.finish()
}

fn handle_members(p: &mut Printer) {
    p.line("private final long handle;");
    p.line("private final Cleaner.Cleanable cleanable;");
    p.blank();
    p.line("@Override public final long handle() {");
    p.line("\treturn handle;");
    p.line("}");
}

/// The members every handle-backed proxy class carries. The proxy owns one
/// reference, dropped through the package class when it is collected.
fn proxy_members(p: &mut Printer, class: &str, package_class: &str) {
    handle_members(p);
    p.blank();
    p.block(format!("{}(long handle) {{", class), "}", |p| {
        p.line("this.handle = handle;");
        p.line(format!(
            "this.cleanable = {}.CLEANER.register(this, () -> {}.__decRef(handle));",
            package_class, package_class
        ));
    });
}

fn release_method(p: &mut Printer, doc: &str) {
    p.blank();
    p.doc_block(doc);
    p.block("public void release() {", "}", |p| {
        p.line("cleanable.clean();");
    });
}

const RELEASE_PROXY: &str = "Drops this proxy's reference now instead of when it is collected.";

fn struct_class(
    ctx: &EmitContext<'_>,
    pkg: &PackageModel,
    java_package: &str,
    stub: &ProxyStub,
) -> String {
    let name = &stub.decl.name;
    let package_class = ctx.naming.java_package_class(&pkg.name);
    let mut p = Printer::tabs();
    header(ctx, &mut p, pkg, java_package);
    p.doc_block(&stub.doc);
    p.block(
        format!("public final class {} implements Seq.Proxy {{", name),
        "}",
        |p| {
            p.block("static {", "}", |p| p.line(format!("{}.touch();", package_class)));
            p.blank();
            proxy_members(p, name, &package_class);

            for ctor in &stub.constructors {
                p.blank();
                p.doc_block(&ctor.doc);
                p.block(
                    format!("public {}({}){} {{", name, params(&ctor.sig), throws(&ctor.sig)),
                    "}",
                    |p| p.line(format!("this(__{}({}));", ctor.func, args(&ctor.sig))),
                );
                p.blank();
                p.line(format!(
                    "private static native long __{}({}){};",
                    ctor.func,
                    params(&ctor.sig),
                    throws(&ctor.sig)
                ));
            }

            for field in &stub.fields {
                p.blank();
                p.doc_block(&field.doc);
                p.line(format!(
                    "public final native {} {}();",
                    field.mapping.target,
                    java_getter(&field.name)
                ));
                p.line(format!(
                    "public final native void {}({} v);",
                    java_setter(&field.name),
                    field.mapping.target
                ));
            }

            for method in &stub.methods {
                p.blank();
                p.doc_block(&method.doc);
                p.line(format!(
                    "public native {} {}({}){};",
                    return_type(&method.sig),
                    java_method(&method.name),
                    params(&method.sig),
                    throws(&method.sig)
                ));
            }

            release_method(p, RELEASE_PROXY);
        },
    );
    p.finish()
}

/// Name of the static method the JNI trampoline calls for `method`.
pub(crate) fn dispatch_method(method: &str) -> String {
    format!("__dispatch_{}", java_method(method))
}

fn interface_class(
    ctx: &EmitContext<'_>,
    pkg: &PackageModel,
    java_package: &str,
    stub: &ProxyStub,
) -> String {
    let name = &stub.decl.name;
    let package_class = ctx.naming.java_package_class(&pkg.name);
    let mut p = Printer::tabs();
    header(ctx, &mut p, pkg, java_package);
    p.doc_block(&stub.doc);
    p.block(format!("public interface {} {{", name), "}", |p| {
        for (i, method) in stub.methods.iter().enumerate() {
            if i > 0 {
                p.blank();
            }
            p.doc_block(&method.doc);
            p.line(format!(
                "{} {}({}){};",
                return_type(&method.sig),
                java_method(&method.name),
                params(&method.sig),
                throws(&method.sig)
            ));
        }

        if let Some(imp) = &stub.implementable {
            p.blank();
            p.doc_block(&format!("Base class of Java implementations of {}.", name));
            p.block(
                format!("abstract class Stub implements {}, Seq.Proxy {{", name),
                "}",
                |p| {
                    p.block("static {", "}", |p| p.line(format!("{}.touch();", package_class)));
                    p.blank();
                    handle_members(p);
                    p.blank();
                    p.block("protected Stub() {", "}", |p| {
                        p.line("long refnum = __register(this);");
                        p.line("this.handle = refnum;");
                        p.line(format!(
                            "this.cleanable = {}.CLEANER.register(this, () -> __unregister(refnum));",
                            package_class
                        ));
                    });
                    release_method(
                        p,
                        "Unregisters this implementation now instead of when it is collected.",
                    );
                    p.blank();
                    p.line(format!("private static native long __register({} impl);", name));
                    p.line("private static native void __unregister(long refnum);");

                    for t in &imp.trampolines {
                        let call = format!("impl.{}({})", java_method(&t.method), args(&t.sig));
                        let impl_param = if t.sig.params.is_empty() {
                            format!("{} impl", name)
                        } else {
                            format!("{} impl, {}", name, params(&t.sig))
                        };
                        p.blank();
                        p.block(
                            format!(
                                "static {} {}({}){} {{",
                                return_type(&t.sig),
                                dispatch_method(&t.method),
                                impl_param,
                                throws(&t.sig)
                            ),
                            "}",
                            |p| {
                                let returns = t.sig.ret.is_some();
                                if imp.redispatches() {
                                    p.block("if (!Seq.isMainThread()) {", "}", |p| {
                                        if returns {
                                            p.line(format!("return Seq.runOnMain(() -> {});", call));
                                        } else {
                                            p.line(format!(
                                                "Seq.runOnMain(() -> {{ {}; return null; }});",
                                                call
                                            ));
                                            p.line("return;");
                                        }
                                    });
                                }
                                if returns {
                                    p.line(format!("return {};", call));
                                } else {
                                    p.line(format!("{};", call));
                                }
                            },
                        );
                    }
                },
            );
        }

        p.blank();
        p.doc_block(&format!("Proxy of a Go value implementing {}.", name));
        p.block(
            format!("final class Proxy implements {}, Seq.Proxy {{", name),
            "}",
            |p| {
                proxy_members(p, "Proxy", &package_class);
                for method in &stub.methods {
                    p.blank();
                    p.line(format!(
                        "@Override public native {} {}({}){};",
                        return_type(&method.sig),
                        java_method(&method.name),
                        params(&method.sig),
                        throws(&method.sig)
                    ));
                }
                release_method(p, RELEASE_PROXY);
            },
        );
    });
    p.finish()
}
