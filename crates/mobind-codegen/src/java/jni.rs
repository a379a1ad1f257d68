//! The JNI translation unit of a package.
//!
//! Native methods of the generated Java classes land here. Each one decodes
//! its Java arguments into boundary values, calls the exported source
//! symbol and rethrows a returned failure. Trampolines run the other way,
//! from the source runtime into a Java implementation.

use mobind_ir::{PackageModel, Signature, Type};
use mobind_proxy::{ProxyStub, StubKind};
use mobind_rt::abi::REF_DEC;
use mobind_source::Backend;
use mobind_types::{package_name, Conversion, MappedSignature, MarshalOp, TypeMapper, TypeMapping};

use super::dispatch_method;
use crate::cabi::{self, c_ident, c_param, Results};
use crate::context::{escape, EmitContext};
use crate::names::{go_var_getter, go_var_setter, java_getter, java_method, java_setter};
use crate::printer::Printer;

/// Macro the JNI unit is compiled under.
pub const PLATFORM_GUARD: &str = "__ANDROID__";

/// Escapes a Java name for use in a JNI symbol.
pub fn jni_mangle(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '.' | '/' => out.push('_'),
            '_' => out.push_str("_1"),
            ';' => out.push_str("_2"),
            '[' => out.push_str("_3"),
            c if c.is_ascii_alphanumeric() => out.push(c),
            c => out.push_str(&format!("_0{:04x}", c as u32)),
        }
    }
    out
}

/// JNI field descriptor of a Java type as the emitter spells it.
pub fn jni_descriptor(target: &str) -> String {
    match target {
        "boolean" => "Z".to_string(),
        "byte" => "B".to_string(),
        "short" => "S".to_string(),
        "int" => "I".to_string(),
        "long" => "J".to_string(),
        "float" => "F".to_string(),
        "double" => "D".to_string(),
        "void" => "V".to_string(),
        "String" => "Ljava/lang/String;".to_string(),
        class => {
            let erased = class.split('<').next().unwrap_or(class);
            format!("L{};", erased.replace('.', "/"))
        }
    }
}

/// The `Call*Method` family member returning a value of JNI type `native`.
fn call_suffix(native: Option<&str>) -> &'static str {
    match native {
        None => "Void",
        Some("jboolean") => "Boolean",
        Some("jbyte") => "Byte",
        Some("jshort") => "Short",
        Some("jint") => "Int",
        Some("jlong") => "Long",
        Some("jfloat") => "Float",
        Some("jdouble") => "Double",
        Some(_) => "Object",
    }
}

fn class_path(ctx: &EmitContext<'_>, pkg: &str, class: &str) -> String {
    format!("{}/{}", ctx.naming.java_package(pkg).replace('.', "/"), class)
}

fn symbol(ctx: &EmitContext<'_>, pkg: &str, class: &str, method: &str) -> String {
    format!(
        "Java_{}_{}",
        jni_mangle(&format!("{}.{}", ctx.naming.java_package(pkg), class)),
        jni_mangle(method)
    )
}

/// C globals caching the proxy class of a bound type and its `(J)V`
/// constructor.
fn class_globals(pkg: &str, name: &str) -> (String, String) {
    (
        format!("mobind_class_{}_{}", pkg, name),
        format!("mobind_ctor_{}_{}", pkg, name),
    )
}

fn stub_globals(pkg: &str, name: &str) -> String {
    format!("mobind_stub_{}_{}", pkg, name)
}

fn dispatch_global(pkg: &str, iface: &str, method: &str) -> String {
    format!("mobind_dispatch_{}_{}_{}", pkg, iface, method)
}

/// Where a native's result goes.
enum Returns<'t> {
    /// Converted to its Java representation; the type picks the proxy class
    /// of object results.
    Java(Option<&'t Type>),
    /// Returned as the raw handle, for constructor natives.
    Handle,
}

struct JniUnit<'c, 'a> {
    ctx: &'c EmitContext<'a>,
    pkg: &'a PackageModel,
    p: Printer,
}

impl<'c, 'a> JniUnit<'c, 'a> {
    fn to_java(&self, mapping: &TypeMapping, ty: Option<&Type>, expr: &str) -> String {
        match &mapping.encode {
            Conversion::Call(f) if mapping.op == MarshalOp::ObjectHandle => {
                let (class, ctor) = match ty.and_then(|t| self.ctx.stub_of(t, Backend::Java)) {
                    Some(stub) => {
                        class_globals(package_name(self.ctx.set, &stub.decl), &stub.decl.name)
                    }
                    None => ("NULL".to_string(), "NULL".to_string()),
                };
                format!("{}(env, {}, {}, {})", f, expr, class, ctor)
            }
            Conversion::Call(f) => format!("{}(env, {})", f, expr),
            conversion => conversion.apply(expr),
        }
    }

    fn native_params(sig: &MappedSignature) -> String {
        sig.params
            .iter()
            .map(|p| format!(", {} {}", p.mapping.native, c_ident(&p.name)))
            .collect()
    }

    fn native_return(sig: &MappedSignature, returns: &Returns<'_>) -> String {
        match (returns, &sig.ret) {
            (Returns::Handle, _) => "jlong".to_string(),
            (_, Some(ret)) => ret.native.clone(),
            (_, None) => "void".to_string(),
        }
    }

    /// Body of a native that calls `symbol` on the source side.
    fn call_source(
        &mut self,
        symbol: &str,
        sig: &MappedSignature,
        receiver: bool,
        returns: Returns<'_>,
    ) {
        let mut args: Vec<String> = Vec::new();
        if receiver {
            self.p.line("int64_t refnum = mobind_from_jobject(env, obj);");
            args.push("refnum".to_string());
        }
        for param in &sig.params {
            let local = format!("_{}", param.name);
            let decode = from_java(&param.mapping, &c_ident(&param.name));
            self.p.line(format!("{} {} = {};", param.mapping.abi, local, decode));
            args.push(local);
        }
        let call = format!("{}({})", symbol, args.join(", "));
        let value = match cabi::results(sig) {
            Results::Void => {
                self.p.line(format!("{};", call));
                None
            }
            Results::Value(ret) => {
                self.p.line(format!("{} r0 = {};", ret.abi, call));
                Some((ret, "r0"))
            }
            Results::Error => {
                self.p.line(format!("int64_t r1 = {};", call));
                self.p.line("mobind_throw(env, r1);");
                None
            }
            Results::Pair(ret) => {
                self.p.line(format!("struct {}_return res = {};", symbol, call));
                self.p.line("mobind_throw(env, res.r1);");
                Some((ret, "res.r0"))
            }
        };
        if let Some((ret, expr)) = value {
            let converted = match returns {
                Returns::Handle => format!("(jlong){}", expr),
                Returns::Java(ty) => self.to_java(ret, ty, expr),
            };
            self.p.line(format!("return {};", converted));
        }
    }

    fn emit(mut self, mapper: &TypeMapper<'_>) -> String {
        let ctx = self.ctx;
        let pkg = self.pkg;
        let stubs: Vec<&ProxyStub> = ctx.stubs(pkg, Backend::Java).collect();

        self.p.line(ctx.banner("//"));
        self.p.blank();
        self.p.line(format!("// JNI functions for the Go package {}.", pkg.path));
        self.p.blank();
        // cgo compiles every C file of the glue directory on every platform.
        self.p.line(format!("#ifdef {}", PLATFORM_GUARD));
        self.p.blank();
        self.p.line("#include <jni.h>");
        self.p.line("#include <stdint.h>");
        self.p.line("#include \"seq_java.h\"");
        self.p.line(format!("#include \"{}.h\"", pkg.name));
        self.p.line("#include \"_cgo_export.h\"");
        self.p.blank();

        // Proxy classes of this package, and of other packages this one's
        // signatures may return.
        for stub in ctx.proxies.for_backend(Backend::Java) {
            let owner = package_name(ctx.set, &stub.decl);
            let (class, ctor) = class_globals(owner, &stub.decl.name);
            let storage = if stub.decl.package == pkg.path { "" } else { "extern " };
            self.p.line(format!("{}jclass {};", storage, class));
            self.p.line(format!("{}jmethodID {};", storage, ctor));
        }
        for stub in stubs.iter().filter(|s| s.is_implementable()) {
            self.p.line(format!("static jclass {};", stub_globals(&pkg.name, &stub.decl.name)));
            for method in &stub.methods {
                self.p.line(format!(
                    "static jmethodID {};",
                    dispatch_global(&pkg.name, &stub.decl.name, &method.name)
                ));
            }
        }
        self.p.blank();

        let package_class = ctx.naming.java_package_class(&pkg.name);
        self.init(&stubs, &package_class);

        self.p.blank();
        self.p.block(
            format!(
                "JNIEXPORT jint JNICALL {}(JNIEnv* env, jclass clazz, jlong refnum) {{",
                symbol(ctx, &pkg.name, &package_class, "__decRef")
            ),
            "}",
            |p| p.line(format!("return (jint){}((int64_t)refnum);", REF_DEC)),
        );

        for v in pkg.vars() {
            let Ok(mapping) = mapper.map(&v.ty) else {
                continue;
            };
            self.p.blank();
            self.p.block(
                format!(
                    "JNIEXPORT void JNICALL {}(JNIEnv* env, jclass clazz, {} v) {{",
                    symbol(ctx, &pkg.name, &package_class, &java_setter(&v.name)),
                    mapping.native
                ),
                "}",
                |p| {
                    let decode = from_java(&mapping, "v");
                    p.line(format!(
                        "{}({});",
                        go_var_setter(ctx.naming, &pkg.name, &v.name),
                        decode
                    ));
                },
            );
            self.p.blank();
            self.p.line(format!(
                "JNIEXPORT {} JNICALL {}(JNIEnv* env, jclass clazz) {{",
                mapping.native,
                symbol(ctx, &pkg.name, &package_class, &java_getter(&v.name))
            ));
            self.p.indent();
            self.p.line(format!(
                "{} r0 = {}();",
                mapping.abi,
                go_var_getter(ctx.naming, &pkg.name, &v.name)
            ));
            let converted = self.to_java(&mapping, Some(&v.ty), "r0");
            self.p.line(format!("return {};", converted));
            self.p.dedent();
            self.p.line("}");
        }

        for f in pkg.funcs() {
            let Ok(sig) = mapper.map_signature(&f.sig) else {
                continue;
            };
            self.p.blank();
            self.p.line(format!(
                "JNIEXPORT {} JNICALL {}(JNIEnv* env, jclass clazz{}) {{",
                Self::native_return(&sig, &Returns::Java(None)),
                symbol(ctx, &pkg.name, &package_class, &java_method(&f.name)),
                Self::native_params(&sig)
            ));
            self.p.indent();
            self.call_source(
                &ctx.naming.go_func_symbol(&pkg.name, &f.name),
                &sig,
                false,
                Returns::Java(f.sig.ret.as_ref()),
            );
            self.p.dedent();
            self.p.line("}");
        }

        for stub in &stubs {
            match stub.kind {
                StubKind::Struct => self.struct_natives(stub),
                StubKind::Interface => self.interface_natives(stub),
            }
        }
        self.p.blank();
        self.p.line(format!("#endif // {}", PLATFORM_GUARD));
        self.p.finish()
    }

    fn init(&mut self, stubs: &[&ProxyStub], package_class: &str) {
        let ctx = self.ctx;
        let pkg = self.pkg;
        self.p.block(
            format!(
                "JNIEXPORT void JNICALL {}(JNIEnv* env, jclass clazz) {{",
                symbol(ctx, &pkg.name, package_class, "_init")
            ),
            "}",
            |p| {
                p.line("jclass cls;");
                for stub in stubs {
                    let name = &stub.decl.name;
                    let proxy = match stub.kind {
                        StubKind::Struct => name.clone(),
                        StubKind::Interface => format!("{}$Proxy", name),
                    };
                    let (class, ctor) = class_globals(&pkg.name, name);
                    p.line(format!(
                        "cls = (*env)->FindClass(env, \"{}\");",
                        class_path(ctx, &pkg.name, &proxy)
                    ));
                    p.line(format!("{} = (*env)->NewGlobalRef(env, cls);", class));
                    p.line(format!(
                        "{} = (*env)->GetMethodID(env, cls, \"<init>\", \"(J)V\");",
                        ctor
                    ));
                    if stub.is_implementable() {
                        let global = stub_globals(&pkg.name, name);
                        p.line(format!(
                            "cls = (*env)->FindClass(env, \"{}\");",
                            class_path(ctx, &pkg.name, &format!("{}$Stub", name))
                        ));
                        p.line(format!("{} = (*env)->NewGlobalRef(env, cls);", global));
                        let iface = jni_descriptor(&ctx.naming.java_class(&pkg.name, name));
                        for method in &stub.methods {
                            let params: String = std::iter::once(iface.clone())
                                .chain(method.sig.params.iter().map(|param| jni_descriptor(&param.mapping.target)))
                                .collect();
                            let ret = jni_descriptor(super::return_type(&method.sig));
                            p.line(format!(
                                "{} = (*env)->GetStaticMethodID(env, cls, \"{}\", \"({}){}\");",
                                dispatch_global(&pkg.name, name, &method.name),
                                dispatch_method(&method.name),
                                params,
                                ret
                            ));
                        }
                    }
                }
            },
        );
    }

    fn field_type(&self, owner: &str, field: &str) -> Option<&'a Type> {
        self.pkg
            .type_decl(owner)?
            .as_struct()?
            .fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| &f.ty)
    }

    fn struct_natives(&mut self, stub: &ProxyStub) {
        let ctx = self.ctx;
        let model = self.pkg;
        let pkg = &model.name;
        let name = &stub.decl.name;

        for ctor in &stub.constructors {
            self.p.blank();
            self.p.line(format!(
                "JNIEXPORT jlong JNICALL {}(JNIEnv* env, jclass clazz{}) {{",
                symbol(ctx, pkg, name, &format!("__{}", ctor.func)),
                Self::native_params(&ctor.sig)
            ));
            self.p.indent();
            self.call_source(&ctor.symbol, &ctor.sig, false, Returns::Handle);
            self.p.dedent();
            self.p.line("}");
        }

        for field in &stub.fields {
            let ty = self.field_type(name, &field.name);
            self.p.blank();
            self.p.line(format!(
                "JNIEXPORT {} JNICALL {}(JNIEnv* env, jobject obj) {{",
                field.mapping.native,
                symbol(ctx, pkg, name, &java_getter(&field.name))
            ));
            self.p.indent();
            self.p.line("int64_t refnum = mobind_from_jobject(env, obj);");
            self.p.line(format!("{} r0 = {}(refnum);", field.mapping.abi, field.getter));
            let converted = self.to_java(&field.mapping, ty, "r0");
            self.p.line(format!("return {};", converted));
            self.p.dedent();
            self.p.line("}");

            self.p.blank();
            self.p.line(format!(
                "JNIEXPORT void JNICALL {}(JNIEnv* env, jobject obj, {} v) {{",
                symbol(ctx, pkg, name, &java_setter(&field.name)),
                field.mapping.native
            ));
            self.p.indent();
            self.p.line("int64_t refnum = mobind_from_jobject(env, obj);");
            let decode = from_java(&field.mapping, "v");
            self.p.line(format!("{}(refnum, {});", field.setter, decode));
            self.p.dedent();
            self.p.line("}");
        }

        self.methods(stub, name);
    }

    fn methods(&mut self, stub: &ProxyStub, class: &str) {
        let ctx = self.ctx;
        for method in &stub.methods {
            self.p.blank();
            self.p.line(format!(
                "JNIEXPORT {} JNICALL {}(JNIEnv* env, jobject obj{}) {{",
                Self::native_return(&method.sig, &Returns::Java(None)),
                symbol(ctx, &self.pkg.name, class, &java_method(&method.name)),
                Self::native_params(&method.sig)
            ));
            self.p.indent();
            self.call_source(
                &method.symbol,
                &method.sig,
                true,
                Returns::Java(method.source.ret.as_ref()),
            );
            self.p.dedent();
            self.p.line("}");
        }
    }

    fn interface_natives(&mut self, stub: &ProxyStub) {
        let name = stub.decl.name.clone();
        self.methods(stub, &format!("{}$Proxy", name));

        let Some(imp) = &stub.implementable else {
            return;
        };
        let ctx = self.ctx;
        let pkg = self.pkg.name.clone();
        let tag = format!("{}.{}", pkg, name);

        self.p.blank();
        self.p.block(
            format!(
                "JNIEXPORT jlong JNICALL {}(JNIEnv* env, jclass clazz, jobject impl) {{",
                symbol(ctx, &pkg, &format!("{}$Stub", name), "__register")
            ),
            "}",
            |p| {
                p.line(format!(
                    "int64_t refnum = mobind_import_jobject(env, impl, \"{}\");",
                    escape(&tag)
                ));
                p.line(format!("return (jlong){}(refnum);", imp.register));
            },
        );

        self.p.blank();
        self.p.block(
            format!(
                "JNIEXPORT void JNICALL {}(JNIEnv* env, jclass clazz, jlong refnum) {{",
                symbol(ctx, &pkg, &format!("{}$Stub", name), "__unregister")
            ),
            "}",
            |p| p.line(format!("{}((int64_t)refnum);", imp.unregister)),
        );

        for t in &imp.trampolines {
            self.p.blank();
            self.trampoline(stub, &t.symbol, &t.method, &t.sig, &t.source);
        }
    }

    /// The C function the source runtime calls to run `method` on a Java
    /// implementation.
    fn trampoline(
        &mut self,
        stub: &ProxyStub,
        symbol: &str,
        method: &str,
        sig: &MappedSignature,
        source: &Signature,
    ) {
        let model = self.pkg;
        let pkg = &model.name;
        let name = &stub.decl.name;
        self.p.line(format!("{} {{", cabi::prototype(symbol, sig, true)));
        self.p.indent();
        self.p.line("JNIEnv* env = mobind_jni_env();");
        self.p.line("jobject impl = mobind_jobject_for(env, refnum);");
        let mut args = vec!["impl".to_string()];
        for (param, source_param) in sig.params.iter().zip(&source.params) {
            let local = format!("_{}", param.name);
            let encode = self.to_java(&param.mapping, Some(&source_param.ty), &c_param(&param.name));
            self.p.line(format!("{} {} = {};", param.mapping.native, local, encode));
            args.push(local);
        }
        let ret_native = sig.ret.as_ref().map(|r| r.native.as_str());
        let call = format!(
            "(*env)->CallStatic{}Method(env, {}, {}, {})",
            call_suffix(ret_native),
            stub_globals(pkg, name),
            dispatch_global(pkg, name, method),
            args.join(", ")
        );
        match ret_native {
            Some(native) => self.p.line(format!("{} res = {};", native, call)),
            None => self.p.line(format!("{};", call)),
        }
        if sig.is_fallible() {
            self.p.line("int64_t failure = mobind_from_jthrowable(env, mobind_take_exception(env));");
        } else {
            self.p.line("mobind_check_exception(env);");
        }
        match cabi::results(sig) {
            Results::Void => {}
            Results::Value(ret) => {
                let decode = from_java(ret, "res");
                self.p.line(format!("return {};", decode));
            }
            Results::Error => self.p.line("return failure;"),
            Results::Pair(ret) => {
                let decode = from_java(ret, "res");
                self.p.line(format!("struct {}_return out = {{ {}, failure }};", symbol, decode));
                self.p.line("return out;");
            }
        }
        self.p.dedent();
        self.p.line("}");
    }
}

fn from_java(mapping: &TypeMapping, expr: &str) -> String {
    match &mapping.decode {
        Conversion::Call(f) => format!("{}(env, {})", f, expr),
        conversion => conversion.apply(expr),
    }
}

pub(super) fn emit(ctx: &EmitContext<'_>, mapper: &TypeMapper<'_>, pkg: &PackageModel) -> String {
    JniUnit {
        ctx,
        pkg,
        p: Printer::tabs(),
    }
    .emit(mapper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangles_like_javah() {
        assert_eq!(jni_mangle("go.testpkg.Greeter$Proxy"), "go_testpkg_Greeter_00024Proxy");
        assert_eq!(jni_mangle("__NewNode"), "_1_1NewNode");
        assert_eq!(jni_mangle("_init"), "_1init");
    }

    #[test]
    fn descriptors() {
        assert_eq!(jni_descriptor("long"), "J");
        assert_eq!(jni_descriptor("String"), "Ljava/lang/String;");
        assert_eq!(jni_descriptor("java.util.List<Long>"), "Ljava/util/List;");
        assert_eq!(jni_descriptor("go.testpkg.Node"), "Lgo/testpkg/Node;");
    }
}
