use mobind_ir::{PackageModel, Signature, Type};
use mobind_proxy::{Implementable, ProxyStub, StubKind};
use mobind_rt::abi::{REF_DEC, REF_INC};
use mobind_source::Backend;
use mobind_types::{MappedSignature, TypeMapper};

use super::{
    c_params, from_objc, message, register_function, registration_class, return_type, selector,
    selector_from, to_objc, PLATFORM_GUARD, REF_HEADER,
};
use crate::cabi::{self, c_ident, c_param, Results};
use crate::context::EmitContext;
use crate::names::{go_var_getter, go_var_setter, objc_selector, objc_setter};
use crate::printer::Printer;

struct Source<'c, 'a> {
    ctx: &'c EmitContext<'a>,
    pkg: &'a PackageModel,
    p: Printer,
}

impl<'c, 'a> Source<'c, 'a> {
    /// Statements calling `symbol` with Objective-C arguments and returning
    /// the result in the method's declared form.
    fn call_source(
        &mut self,
        symbol: &str,
        sig: &MappedSignature,
        source: &Signature,
        receiver: bool,
    ) {
        let ctx = self.ctx;
        let mut args: Vec<String> = Vec::new();
        if receiver {
            args.push("self.refnum".to_string());
        }
        for (param, source_param) in sig.params.iter().zip(&source.params) {
            let local = format!("_{}", param.name);
            let decode = from_objc(ctx, &param.mapping, Some(&source_param.ty), &c_ident(&param.name));
            self.p.line(format!("{} {} = {};", param.mapping.abi, local, decode));
            args.push(local);
        }
        let call = format!("{}({})", symbol, args.join(", "));
        match cabi::results(sig) {
            Results::Void => self.p.line(format!("{};", call)),
            Results::Value(ret) => {
                self.p.line(format!("{} r0 = {};", ret.abi, call));
                let converted = to_objc(ctx, ret, source.ret.as_ref(), "r0");
                self.p.line(format!("return {};", converted));
            }
            Results::Error => {
                self.p.line(format!("int64_t r1 = {};", call));
                self.report_error("r1");
                self.p.line("return _error == nil;");
            }
            Results::Pair(ret) => {
                self.p.line(format!("struct {}_return res = {};", symbol, call));
                let converted = to_objc(ctx, ret, source.ret.as_ref(), "res.r0");
                self.p.line(format!("{} _r0 = {};", ret.target, converted));
                self.report_error("res.r1");
                self.p.line("return _r0;");
            }
        }
    }

    fn report_error(&mut self, handle: &str) {
        self.p.line(format!("NSError* _error = mobind_to_nserror({});", handle));
        self.p.line("if (error != NULL) {");
        self.p.line("\t*error = _error;");
        self.p.line("}");
    }

    fn ref_members(&mut self) {
        self.p.block("- (nonnull instancetype)initWithRefnum:(int64_t)refnum {", "}", |p| {
            p.line("self = [super init];");
            p.line("if (self) {");
            p.line("\t_refnum = refnum;");
            p.line("}");
            p.line("return self;");
        });
        self.p.blank();
        self.p.block("- (void)releaseRef {", "}", |p| {
            p.line("if (_refnum != 0) {");
            p.line(format!("\t{}(_refnum);", REF_DEC));
            p.line("\t_refnum = 0;");
            p.line("}");
        });
        self.p.blank();
        self.p.block("- (void)dealloc {", "}", |p| p.line("[self releaseRef];"));
    }

    fn methods(&mut self, stub: &ProxyStub) {
        for method in &stub.methods {
            self.p.blank();
            self.p.line(format!(
                "- ({}){} {{",
                return_type(&method.sig),
                selector(&method.name, &method.sig)
            ));
            self.p.indent();
            self.call_source(&method.symbol, &method.sig, &method.source, true);
            self.p.dedent();
            self.p.line("}");
        }
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

    fn struct_impl(&mut self, stub: &ProxyStub) {
        let ctx = self.ctx;
        self.p.line(format!("@implementation {}", stub.class));
        self.p.blank();
        self.ref_members();

        for ctor in &stub.constructors {
            self.p.blank();
            self.p.line(format!(
                "- (nullable instancetype){} {{",
                selector_from("init", &ctor.sig)
            ));
            self.p.indent();
            let mut args = Vec::new();
            for (param, source_param) in ctor.sig.params.iter().zip(&ctor.source.params) {
                let local = format!("_{}", param.name);
                let decode =
                    from_objc(ctx, &param.mapping, Some(&source_param.ty), &c_ident(&param.name));
                self.p.line(format!("{} {} = {};", param.mapping.abi, local, decode));
                args.push(local);
            }
            let call = format!("{}({})", ctor.symbol, args.join(", "));
            if ctor.sig.is_fallible() {
                self.p.line(format!("struct {}_return res = {};", ctor.symbol, call));
                self.report_error("res.r1");
                self.p.line("if (_error != nil) {");
                self.p.line("\treturn nil;");
                self.p.line("}");
                self.p.line("return [self initWithRefnum:res.r0];");
            } else {
                self.p.line(format!("return [self initWithRefnum:{}];", call));
            }
            self.p.dedent();
            self.p.line("}");
        }

        for field in &stub.fields {
            let ty = self.field_type(&stub.decl.name, &field.name);
            self.p.blank();
            self.p.line(format!(
                "- ({}){} {{",
                field.mapping.target,
                objc_selector(&field.name)
            ));
            self.p.indent();
            self.p.line(format!("{} r0 = {}(self.refnum);", field.mapping.abi, field.getter));
            let converted = to_objc(ctx, &field.mapping, ty, "r0");
            self.p.line(format!("return {};", converted));
            self.p.dedent();
            self.p.line("}");
            self.p.blank();
            self.p.line(format!(
                "- (void){}:({})v {{",
                objc_setter(&field.name),
                field.mapping.target
            ));
            let decode = from_objc(ctx, &field.mapping, ty, "v");
            self.p.line(format!("\t{}(self.refnum, {});", field.setter, decode));
            self.p.line("}");
        }

        self.methods(stub);
        self.p.blank();
        self.p.line("@end");
    }

    fn value_proxy_impl(&mut self, stub: &ProxyStub) {
        self.p.line(format!("@implementation {}", stub.class));
        self.p.blank();
        self.ref_members();
        self.methods(stub);
        self.p.blank();
        self.p.line("@end");
    }

    /// The class tying a registration to the lifetime of the adopting object
    /// and the function handing such objects to the source side. The first
    /// crossing registers the object; every crossing adds one reference for
    /// the receiver.
    fn registration(&mut self, stub: &ProxyStub, imp: &Implementable) {
        let class = registration_class(stub);
        let key = format!("{}Key", class);
        let decode = self
            .ctx
            .mapper(Backend::ObjC)
            .map(&Type::Named(stub.decl.clone()))
            .map(|m| m.decode.apply("obj"))
            .unwrap_or_else(|_| "mobind_from_objc(obj)".to_string());

        self.p.blank();
        self.p.line(format!("@interface {} : NSObject", class));
        self.p.line("@property(readonly) int64_t refnum;");
        self.p.line("@end");
        self.p.blank();
        self.p.line(format!("@implementation {}", class));
        self.p.blank();
        self.p.block("- (nonnull instancetype)initWithRefnum:(int64_t)refnum {", "}", |p| {
            p.line("self = [super init];");
            p.line("if (self) {");
            p.line("\t_refnum = refnum;");
            p.line("}");
            p.line("return self;");
        });
        self.p.blank();
        self.p.block("- (void)dealloc {", "}", |p| {
            p.line(format!("{}(_refnum);", imp.unregister));
        });
        self.p.blank();
        self.p.line("@end");
        self.p.blank();
        self.p.line(format!("static char {};", key));
        self.p.blank();
        self.p.line(format!(
            "int64_t {}(id<{}> obj) {{",
            register_function(&self.pkg.name, &stub.decl.name),
            stub.class
        ));
        self.p.indent();
        self.p.line("if (obj == nil) {");
        self.p.line("\treturn 0;");
        self.p.line("}");
        self.p.line("if ([obj conformsToProtocol:@protocol(MobindRef)]) {");
        self.p.line(format!("\treturn {};", decode));
        self.p.line("}");
        self.p.block("@synchronized (obj) {", "}", |p| {
            p.line(format!("{}* reg = objc_getAssociatedObject(obj, &{});", class, key));
            p.line("if (reg == nil) {");
            p.line(format!("\tint64_t refnum = {}({});", imp.register, decode));
            p.line(format!("\treg = [[{} alloc] initWithRefnum:refnum];", class));
            p.line(format!(
                "\tobjc_setAssociatedObject(obj, &{}, reg, OBJC_ASSOCIATION_RETAIN_NONATOMIC);",
                key
            ));
            p.line("}");
            p.line(format!("{}(reg.refnum);", REF_INC));
            p.line("return reg.refnum;");
        });
        self.p.dedent();
        self.p.line("}");
    }

    /// C entry points the source runtime calls to reach an object adopting
    /// the protocol.
    fn trampolines(&mut self, stub: &ProxyStub, imp: &Implementable) {
        let ctx = self.ctx;
        for t in &imp.trampolines {
            self.p.blank();
            self.p.line(format!("{} {{", cabi::prototype(&t.symbol, &t.sig, true)));
            self.p.indent();
            self.p.line("@autoreleasepool {");
            self.p.indent();
            self.p.line(format!(
                "id<{}> impl = (id<{}>)mobind_objc_for(refnum);",
                stub.class, stub.class
            ));
            let mut args = Vec::new();
            for (param, source_param) in t.sig.params.iter().zip(&t.source.params) {
                let local = format!("_{}", param.name);
                let encode =
                    to_objc(ctx, &param.mapping, Some(&source_param.ty), &c_param(&param.name));
                self.p.line(format!("{} {} = {};", param.mapping.target, local, encode));
                args.push(local);
            }
            let send = format!("[impl {}]", message(&t.method, &t.sig, &args));
            let result_ty = return_type(&t.sig);
            let has_result = result_ty != "void";
            if t.sig.is_fallible() {
                self.p.line("__block NSError* error = nil;");
            }
            if has_result {
                self.p.line(format!("__block {} res;", result_ty));
            }
            let assign = if has_result {
                format!("res = {};", send)
            } else {
                format!("{};", send)
            };
            if imp.redispatches() {
                self.p.line(format!("void (^call)(void) = ^{{ {} }};", assign));
                self.p.line("if ([NSThread isMainThread]) {");
                self.p.line("\tcall();");
                self.p.line("} else {");
                self.p.line("\tdispatch_sync(dispatch_get_main_queue(), call);");
                self.p.line("}");
            } else {
                self.p.line(assign);
            }
            match cabi::results(&t.sig) {
                Results::Void => {}
                Results::Value(ret) => {
                    let decode = from_objc(ctx, ret, t.source.ret.as_ref(), "res");
                    self.p.line(format!("return {};", decode));
                }
                Results::Error => self.p.line("return mobind_from_nserror(error);"),
                Results::Pair(ret) => {
                    let decode = from_objc(ctx, ret, t.source.ret.as_ref(), "res");
                    self.p.line(format!(
                        "struct {}_return out = {{ {}, mobind_from_nserror(error) }};",
                        t.symbol, decode
                    ));
                    self.p.line("return out;");
                }
            }
            self.p.dedent();
            self.p.line("}");
            self.p.dedent();
            self.p.line("}");
        }
    }

    fn emit(mut self, mapper: &TypeMapper<'_>) -> String {
        let ctx = self.ctx;
        let pkg = self.pkg;
        let prefix = ctx.naming.objc_package(&pkg.name);
        let stubs: Vec<&ProxyStub> = ctx.stubs(pkg, Backend::ObjC).collect();

        self.p.line(ctx.banner("//"));
        self.p.blank();
        self.p.line(format!("// Objective-C glue for the Go package {}.", pkg.path));
        self.p.blank();
        self.p.line(format!("#ifdef {}", PLATFORM_GUARD));
        self.p.blank();
        self.p.line("#include <Foundation/Foundation.h>");
        self.p.line("#include <objc/runtime.h>");
        self.p.line(format!("#include \"{}\"", REF_HEADER));
        self.p.line("#include \"seq_objc.h\"");
        self.p.line("#include \"_cgo_export.h\"");
        self.p.line(format!("#include \"{}.h\"", pkg.name));
        self.p.line(format!("#include \"{}.objc.h\"", prefix));
        self.p.blank();

        for stub in &stubs {
            match stub.kind {
                StubKind::Struct => self.struct_impl(stub),
                StubKind::Interface => self.value_proxy_impl(stub),
            }
            self.p.blank();
        }

        let vars: Vec<_> = pkg.vars().collect();
        if !vars.is_empty() {
            self.p.line(format!("@implementation {}", prefix));
            for v in vars {
                let Ok(mapping) = mapper.map(&v.ty) else {
                    continue;
                };
                self.p.blank();
                self.p.line(format!("+ ({}){} {{", mapping.target, objc_selector(&v.name)));
                self.p.line(format!(
                    "\t{} r0 = {}();",
                    mapping.abi,
                    go_var_getter(ctx.naming, &pkg.name, &v.name)
                ));
                self.p.line(format!("\treturn {};", to_objc(ctx, &mapping, Some(&v.ty), "r0")));
                self.p.line("}");
                self.p.blank();
                self.p.line(format!(
                    "+ (void){}:({})v {{",
                    objc_setter(&v.name),
                    mapping.target
                ));
                self.p.line(format!(
                    "\t{}({});",
                    go_var_setter(ctx.naming, &pkg.name, &v.name),
                    from_objc(ctx, &mapping, Some(&v.ty), "v")
                ));
                self.p.line("}");
            }
            self.p.blank();
            self.p.line("@end");
            self.p.blank();
        }

        for f in pkg.funcs() {
            let Ok(sig) = mapper.map_signature(&f.sig) else {
                continue;
            };
            self.p.line(format!(
                "{} {}({}) {{",
                return_type(&sig),
                ctx.naming.objc_type(&pkg.name, &f.name),
                c_params(&sig)
            ));
            self.p.indent();
            self.call_source(&ctx.naming.go_func_symbol(&pkg.name, &f.name), &sig, &f.sig, false);
            self.p.dedent();
            self.p.line("}");
            self.p.blank();
        }

        for stub in &stubs {
            if let Some(imp) = &stub.implementable {
                self.registration(stub, imp);
                self.trampolines(stub, imp);
            }
        }
        self.p.blank();
        self.p.line(format!("#endif // {}", PLATFORM_GUARD));
        self.p.finish()
    }
}

pub(super) fn emit(ctx: &EmitContext<'_>, pkg: &PackageModel) -> String {
    let mapper = ctx.mapper(Backend::ObjC);
    Source {
        ctx,
        pkg,
        p: Printer::tabs(),
    }
    .emit(&mapper)
}
