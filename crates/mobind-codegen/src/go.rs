//! The go backend: the export layer compiled back into the source binary.
//!
//! `go_<pkg>main.go` exports one cgo function per bound func, method,
//! field accessor and variable accessor, plus a proxy type for every
//! implementable interface whose methods call the target trampolines.
//! `<pkg>.h` declares those trampolines for the cgo preamble and for the
//! target glue. `go_main.go`, one per run, keeps the Go objects behind the
//! handles of the runtime's reference table.

use std::path::Path;

use mobind_ir::{PackageModel, Signature, Type, TypeDeclKind, TypeKind};
use mobind_proxy::{ProxyStub, StubKind};
use mobind_rt::abi::SIDE_EXPORTED;
use mobind_source::Backend;
use mobind_types::{Conversion, MappedSignature, MarshalOp, TypeMapper, TypeMapping, ABI_HANDLE};

use crate::cabi::{self, c_param};
use crate::context::{EmitContext, SEQ_IMPORT};
use crate::names::{go_var_getter, go_var_setter};
use crate::printer::Printer;
use crate::unit::{EmissionUnit, GLUE_DIR};

pub fn emit(ctx: &EmitContext<'_>, pkg: &PackageModel) -> Vec<EmissionUnit> {
    let mapper = ctx.mapper(Backend::Go);
    vec![
        EmissionUnit::new(
            Backend::Go,
            Path::new(GLUE_DIR).join(format!("{}.h", pkg.name)),
            header(ctx, pkg),
        ),
        EmissionUnit::new(
            Backend::Go,
            Path::new(GLUE_DIR).join(format!("go_{}main.go", pkg.name)),
            GoUnit {
                ctx,
                mapper: &mapper,
                pkg,
                p: Printer::tabs(),
            }
            .emit(),
        ),
    ]
}

/// Table glue shared by every package of a run. Handles of Go objects are
/// allocated with `mobind_export` and counted by the runtime; the release
/// hook drops an object from `objects` once its last reference is gone.
const RUNTIME: &str = r#"import (
	"fmt"
	"reflect"
	"runtime"
	"sync"
	"unsafe"

	"@SEQ@"
)

// objects holds the Go object behind every live handle this side
// allocated. Pointers map back to their handle so a pointer crossing twice
// shares one entry.
var objects = struct {
	sync.Mutex
	byNum map[int64]interface{}
	byPtr map[uintptr]int64
}{
	byNum: make(map[int64]interface{}),
	byPtr: make(map[uintptr]int64),
}

func init() {
	C.mobind_set_release_hook(C.int32_t(@SIDE@), C.mobind_release_fn(C.mobind_go_release))
}

//export mobind_go_release
func mobind_go_release(num C.int64_t) {
	objects.Lock()
	defer objects.Unlock()
	obj, ok := objects.byNum[int64(num)]
	if !ok {
		return
	}
	delete(objects.byNum, int64(num))
	if p, ok := pointer(obj); ok && objects.byPtr[p] == int64(num) {
		delete(objects.byPtr, p)
	}
}

func pointer(obj interface{}) (uintptr, bool) {
	v := reflect.ValueOf(obj)
	if v.Kind() != reflect.Ptr || v.IsNil() {
		return 0, false
	}
	return v.Pointer(), true
}

// refnumer is implemented by Go stand-ins for objects of the other runtime.
type refnumer interface {
	refnum() int64
}

// toRefnum returns a handle carrying one new reference to obj for the
// receiver to release.
func toRefnum(obj interface{}) int64 {
	if obj == nil {
		return 0
	}
	if v := reflect.ValueOf(obj); v.Kind() == reflect.Ptr && v.IsNil() {
		return 0
	}
	if r, ok := obj.(refnumer); ok {
		num := r.refnum()
		C.mobind_ref_inc(C.int64_t(num))
		return num
	}
	objects.Lock()
	defer objects.Unlock()
	p, keyed := pointer(obj)
	if keyed {
		if num, ok := objects.byPtr[p]; ok && C.mobind_ref_inc(C.int64_t(num)) == 0 {
			return num
		}
	}
	tag := C.CString(fmt.Sprintf("%T", obj))
	defer C.free(unsafe.Pointer(tag))
	num := int64(C.mobind_export(tag))
	if num == 0 {
		panic(fmt.Sprintf("mobind: cannot allocate a handle for %T", obj))
	}
	objects.byNum[num] = obj
	if keyed {
		objects.byPtr[p] = num
	}
	return num
}

// fromRefnum returns the object behind a handle this side allocated.
func fromRefnum(num int64) interface{} {
	if num == 0 {
		return nil
	}
	objects.Lock()
	defer objects.Unlock()
	obj, ok := objects.byNum[num]
	if !ok {
		panic(fmt.Sprintf("mobind: unknown handle %d", num))
	}
	return obj
}

// ref is the Go side's reference to an object of the other runtime. It
// adopts the reference its handle carried and drops it when collected.
type ref struct {
	num int64
}

func (r *ref) refnum() int64 {
	return r.num
}

func importRef(num int64) *ref {
	if num >= 0 {
		panic(fmt.Sprintf("mobind: %d is not a handle of the other runtime", num))
	}
	r := &ref{num: num}
	runtime.SetFinalizer(r, func(r *ref) {
		C.mobind_ref_dec(C.int64_t(r.num))
	})
	return r
}

// targetError is a failure raised by the other runtime.
type targetError struct {
	*ref
}

func (e targetError) Error() string {
	return seq.ErrorMessage(e.num)
}

func toErrorRefnum(err error) int64 {
	if err == nil {
		return 0
	}
	return toRefnum(err)
}

func fromErrorRefnum(num int64) error {
	switch {
	case num == 0:
		return nil
	case num < 0:
		return targetError{importRef(num)}
	default:
		return fromRefnum(num).(error)
	}
}

func main() {}"#;

/// The shared `go_main.go` unit.
pub fn runtime(ctx: &EmitContext<'_>) -> EmissionUnit {
    let mut p = Printer::tabs();
    p.line(ctx.banner("//"));
    p.blank();
    p.line("// Package main links the bound packages into one library.");
    p.line("package main");
    p.blank();
    p.line("/*");
    p.line("#include <stdlib.h>");
    p.line("#include <stdint.h>");
    cabi::runtime_prototypes(&mut p);
    p.blank();
    p.line("extern void mobind_go_release(int64_t handle);");
    p.line("*/");
    p.line("import \"C\"");
    p.blank();
    let body = RUNTIME
        .replace("@SIDE@", &SIDE_EXPORTED.to_string())
        .replace("@SEQ@", SEQ_IMPORT);
    for line in body.lines() {
        p.line(line);
    }
    EmissionUnit::new(Backend::Go, Path::new(GLUE_DIR).join("go_main.go"), p.finish())
}

fn header(ctx: &EmitContext<'_>, pkg: &PackageModel) -> String {
    let guard = format!("__MOBIND_{}_H__", pkg.name.to_uppercase());
    let mut p = Printer::tabs();
    p.line(ctx.banner("//"));
    p.blank();
    p.line(format!("#ifndef {}", guard));
    p.line(format!("#define {}", guard));
    p.blank();
    p.line("#include <stdint.h>");
    p.line("#include \"seq.h\"");
    p.blank();
    cabi::runtime_prototypes(&mut p);
    for stub in ctx.stubs(pkg, Backend::Go) {
        let Some(imp) = &stub.implementable else {
            continue;
        };
        p.blank();
        p.line(format!("extern int64_t {}(int64_t refnum);", imp.register));
        for t in &imp.trampolines {
            cabi::return_struct(&mut p, &t.symbol, &t.sig);
            p.line(format!("extern {};", cabi::prototype(&t.symbol, &t.sig, true)));
        }
    }
    p.blank();
    p.line("#endif");
    p.finish()
}

/// Whether code outside comments qualifies an identifier with package
/// `name`.
fn references(body: &str, name: &str) -> bool {
    let qualifier = format!("{}.", name);
    body.lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .any(|line| {
            line.match_indices(&qualifier).any(|(at, _)| {
                !line[..at]
                    .chars()
                    .next_back()
                    .map_or(false, |c| c.is_alphanumeric() || c == '_')
            })
        })
}

/// `int64(x)` for handles crossing into the support package.
fn handle_arg(mapping: &TypeMapping, expr: &str) -> String {
    if mapping.abi == ABI_HANDLE {
        format!("int64({})", expr)
    } else {
        expr.to_string()
    }
}

struct GoUnit<'c, 'a> {
    ctx: &'c EmitContext<'a>,
    mapper: &'c TypeMapper<'a>,
    pkg: &'a PackageModel,
    p: Printer,
}

impl<'c, 'a> GoUnit<'c, 'a> {
    /// Go value to boundary value.
    fn encode(&self, mapping: &TypeMapping, ty: &Type, expr: &str) -> String {
        match &mapping.encode {
            Conversion::Call(f) if mapping.abi == ABI_HANDLE => {
                let arg = if matches!(self.ctx.set.kind_of(ty), Some(TypeKind::Struct))
                    && ty.as_named().is_some()
                {
                    format!("&{}", expr)
                } else {
                    expr.to_string()
                };
                format!("C.int64_t({}({}))", f, arg)
            }
            conversion => conversion.apply_go(expr),
        }
    }

    /// Declares `local` holding the Go value of the boundary value `expr`.
    fn decode_into(&mut self, local: &str, mapping: &TypeMapping, ty: &Type, expr: &str) {
        let Conversion::Call(f) = &mapping.decode else {
            self.p.line(format!("{} := {}", local, mapping.decode.apply_go(expr)));
            return;
        };
        let call = format!("{}({})", f, handle_arg(mapping, expr));
        match mapping.op {
            MarshalOp::ObjectHandle => {
                let target = &mapping.target;
                if ty.as_named().is_some()
                    && matches!(self.ctx.set.kind_of(ty), Some(TypeKind::Struct))
                {
                    self.p.line(format!("{} := *{}.(*{})", local, call, target));
                    return;
                }
                self.p.line(format!("var {} {}", local, target));
                let proxy = self
                    .ctx
                    .stub_of(ty, Backend::Go)
                    .filter(|s| s.is_implementable())
                    .map(|s| s.class.clone());
                if let Some(proxy) = proxy {
                    self.p.line(format!("if {} < 0 {{", expr));
                    self.p.line(format!(
                        "\t{} = (*{})(importRef(int64({})))",
                        local, proxy, expr
                    ));
                    self.p.line(format!("}} else if v := {}; v != nil {{", call));
                } else {
                    self.p.line(format!("if v := {}; v != nil {{", call));
                }
                self.p.line(format!("\t{} = v.({})", local, target));
                self.p.line("}");
            }
            MarshalOp::ListProxy | MarshalOp::MapProxy | MarshalOp::PinnedView(_) => {
                self.p.line(format!("{} := {}.({})", local, call, mapping.target));
            }
            _ => self.p.line(format!("{} := {}", local, call)),
        }
    }

    fn export_header(&mut self, symbol: &str, doc: &str, params: &[String], results: &str) {
        self.p.blank();
        self.p.doc_lines(doc);
        self.p.line(format!("//export {}", symbol));
        self.p.line(format!("func {}({}){} {{", symbol, params.join(", "), results));
    }

    fn c_params(sig: &MappedSignature, receiver: bool) -> Vec<String> {
        let mut params = Vec::new();
        if receiver {
            params.push(format!("refnum C.{}", ABI_HANDLE));
        }
        for param in &sig.params {
            params.push(format!("{} {}", c_param(&param.name), param.mapping.native));
        }
        params
    }

    fn c_results(sig: &MappedSignature) -> String {
        match cabi::results(sig) {
            cabi::Results::Void => String::new(),
            cabi::Results::Value(ret) => format!(" {}", ret.native),
            cabi::Results::Error => format!(" C.{}", ABI_HANDLE),
            cabi::Results::Pair(ret) => format!(" ({}, C.{})", ret.native, ABI_HANDLE),
        }
    }

    fn failure(&self) -> Option<TypeMapping> {
        self.mapper.map(&Type::Error).ok()
    }

    /// Decodes the parameters, calls `callee` and returns its encoded
    /// results.
    fn forward(&mut self, callee: &str, sig: &MappedSignature, source: &Signature) {
        let mut args = Vec::new();
        for (param, source_param) in sig.params.iter().zip(&source.params) {
            let name = c_param(&param.name);
            let local = format!("_{}", name);
            self.decode_into(&local, &param.mapping, &source_param.ty, &name);
            args.push(local);
        }
        let call = format!("{}({})", callee, args.join(", "));
        let failure = self.failure();
        match (cabi::results(sig), &failure, &source.ret) {
            (cabi::Results::Void, _, _) => self.p.line(call),
            (cabi::Results::Value(ret), _, Some(ty)) => {
                self.p.line(format!("res_0 := {}", call));
                let encoded = self.encode(ret, ty, "res_0");
                self.p.line(format!("return {}", encoded));
            }
            (cabi::Results::Error, Some(err), _) => {
                self.p.line(format!("res_0 := {}", call));
                let encoded = self.encode(err, &Type::Error, "res_0");
                self.p.line(format!("return {}", encoded));
            }
            (cabi::Results::Pair(ret), Some(err), Some(ty)) => {
                self.p.line(format!("res_0, res_1 := {}", call));
                let value = self.encode(ret, ty, "res_0");
                let error = self.encode(err, &Type::Error, "res_1");
                self.p.line(format!("return {}, {}", value, error));
            }
            _ => self.p.line(call),
        }
    }

    fn receiver(&mut self, stub: &ProxyStub) {
        let pkg = &self.pkg.name;
        let name = &stub.decl.name;
        let assertion = match stub.kind {
            StubKind::Struct => format!("*{}.{}", pkg, name),
            StubKind::Interface => format!("{}.{}", pkg, name),
        };
        self.p.line(format!(
            "ref := fromRefnum(int64(refnum)).({})",
            assertion
        ));
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

    fn stub_exports(&mut self, stub: &ProxyStub) {
        for field in &stub.fields {
            let Some(ty) = self.field_type(&stub.decl.name, &field.name) else {
                continue;
            };
            let refnum = vec![format!("refnum C.{}", ABI_HANDLE)];
            self.export_header(&field.getter, &field.doc, &refnum, &format!(" {}", field.mapping.native));
            self.p.indent();
            self.receiver(stub);
            let encoded = self.encode(&field.mapping, ty, &format!("ref.{}", field.name));
            self.p.line(format!("return {}", encoded));
            self.p.dedent();
            self.p.line("}");

            let params = vec![
                format!("refnum C.{}", ABI_HANDLE),
                format!("v {}", field.mapping.native),
            ];
            self.export_header(&field.setter, "", &params, "");
            self.p.indent();
            self.receiver(stub);
            self.decode_into("_v", &field.mapping, ty, "v");
            self.p.line(format!("ref.{} = _v", field.name));
            self.p.dedent();
            self.p.line("}");
        }

        for method in &stub.methods {
            let params = Self::c_params(&method.sig, true);
            self.export_header(&method.symbol, &method.doc, &params, &Self::c_results(&method.sig));
            self.p.indent();
            self.receiver(stub);
            self.forward(&format!("ref.{}", method.name), &method.sig, &method.source);
            self.p.dedent();
            self.p.line("}");
        }
    }

    /// Source-side stand-in for a target implementation of an interface.
    fn proxy_type(&mut self, stub: &ProxyStub) {
        let Some(imp) = &stub.implementable else {
            return;
        };
        let proxy = &stub.class;
        self.export_header(
            &imp.register,
            "Implementations live in the other runtime, so their handles are negative.",
            &[format!("refnum C.{}", ABI_HANDLE)],
            &format!(" C.{}", ABI_HANDLE),
        );
        self.p.line("\tif refnum >= 0 {");
        self.p.line(format!(
            "\t\tpanic(\"{}: not a handle of the other runtime\")",
            imp.register
        ));
        self.p.line("\t}");
        self.p.line("\treturn refnum");
        self.p.line("}");
        self.p.blank();
        self.p.line(format!("type {} ref", proxy));
        self.p.blank();
        self.p.line(format!("func (p *{}) refnum() int64 {{", proxy));
        self.p.line("\treturn (*ref)(p).num");
        self.p.line("}");

        let failure = self.failure();
        for t in &imp.trampolines {
            let params: Vec<String> = t
                .sig
                .params
                .iter()
                .map(|p| format!("{} {}", c_param(&p.name), p.mapping.target))
                .collect();
            let results = match (&t.sig.ret, t.sig.is_fallible()) {
                (None, false) => String::new(),
                (None, true) => " error".to_string(),
                (Some(r), false) => format!(" {}", r.target),
                (Some(r), true) => format!(" ({}, error)", r.target),
            };
            self.p.blank();
            self.p.line(format!(
                "func (p *{}) {}({}){} {{",
                proxy,
                t.method,
                params.join(", "),
                results
            ));
            self.p.indent();
            let mut args = vec![format!("C.{}(p.refnum())", ABI_HANDLE)];
            for (param, source_param) in t.sig.params.iter().zip(&t.source.params) {
                let name = c_param(&param.name);
                let local = format!("_{}", name);
                let encoded = self.encode(&param.mapping, &source_param.ty, &name);
                self.p.line(format!("{} := {}", local, encoded));
                args.push(local);
            }
            let call = format!("C.{}({})", t.symbol, args.join(", "));
            let decode_err = |expr: &str| {
                failure
                    .as_ref()
                    .map_or_else(|| "nil".to_string(), |f| f.decode.apply_go(&handle_arg(f, expr)))
            };
            match (cabi::results(&t.sig), &t.source.ret) {
                (cabi::Results::Void, _) => self.p.line(call),
                (cabi::Results::Value(ret), Some(ty)) => {
                    self.p.line(format!("res := {}", call));
                    self.decode_into("_res", ret, ty, "res");
                    self.p.line("return _res");
                }
                (cabi::Results::Error, _) => {
                    self.p.line(format!("res := {}", call));
                    self.p.line(format!("return {}", decode_err("res")));
                }
                (cabi::Results::Pair(ret), Some(ty)) => {
                    self.p.line(format!("res := {}", call));
                    self.decode_into("_res", ret, ty, "res.r0");
                    self.p.line(format!("return _res, {}", decode_err("res.r1")));
                }
                _ => self.p.line(call),
            }
            self.p.dedent();
            self.p.line("}");
        }
    }

    /// Bound packages whose identifiers appear in this package's glue.
    fn imports(&self) -> Vec<&'a str> {
        let mut paths = vec![self.pkg.path.as_str()];
        for other in self.ctx.set.packages() {
            if other.path == self.pkg.path {
                continue;
            }
            let mut used = false;
            for decl in &self.pkg.decls {
                decl.for_each_named(&mut |name| used |= name.package == other.path);
            }
            if used {
                paths.push(other.path.as_str());
            }
        }
        paths
    }

    /// Doc comments of declarations that have no export of their own, so
    /// the glue still carries them.
    fn doc_sections(&mut self) {
        let pkg = self.pkg;
        for c in pkg.consts().filter(|c| !c.doc.is_empty()) {
            self.p.blank();
            self.p.line(format!("// {}.{} (constant)", pkg.name, c.name));
            self.p.line("//");
            self.p.doc_lines(&c.doc);
        }
        let defined = pkg.types().filter(|t| {
            !matches!(t.kind, TypeDeclKind::Struct(_) | TypeDeclKind::Interface(_)) && !t.doc.is_empty()
        });
        for t in defined {
            self.p.blank();
            self.p.line(format!("// {}.{} (type)", pkg.name, t.name));
            self.p.line("//");
            self.p.doc_lines(&t.doc);
        }
    }

    fn emit(mut self) -> String {
        let ctx = self.ctx;
        let pkg = self.pkg;
        let mapper = self.mapper;

        self.doc_sections();
        let stubs: Vec<&ProxyStub> = ctx.stubs(pkg, Backend::Go).collect();
        for stub in &stubs {
            self.p.blank();
            self.p.line(format!("// {}.{}", pkg.name, stub.decl.name));
            if !stub.doc.is_empty() {
                self.p.line("//");
                self.p.doc_lines(&stub.doc);
            }
            self.stub_exports(stub);
            self.proxy_type(stub);
        }

        for v in pkg.vars() {
            let Ok(mapping) = mapper.map(&v.ty) else {
                continue;
            };
            let getter = go_var_getter(ctx.naming, &pkg.name, &v.name);
            self.export_header(&getter, &v.doc, &[], &format!(" {}", mapping.native));
            self.p.indent();
            self.p.line(format!("v := {}.{}", pkg.name, v.name));
            let encoded = self.encode(&mapping, &v.ty, "v");
            self.p.line(format!("return {}", encoded));
            self.p.dedent();
            self.p.line("}");

            let setter = go_var_setter(ctx.naming, &pkg.name, &v.name);
            self.export_header(&setter, "", &[format!("v {}", mapping.native)], "");
            self.p.indent();
            self.decode_into("_v", &mapping, &v.ty, "v");
            self.p.line(format!("{}.{} = _v", pkg.name, v.name));
            self.p.dedent();
            self.p.line("}");
        }

        for f in pkg.funcs() {
            let Ok(sig) = mapper.map_signature(&f.sig) else {
                continue;
            };
            let symbol = ctx.naming.go_func_symbol(&pkg.name, &f.name);
            self.export_header(&symbol, &f.doc, &Self::c_params(&sig, false), &Self::c_results(&sig));
            self.p.indent();
            self.forward(&format!("{}.{}", pkg.name, f.name), &sig, &f.sig);
            self.p.dedent();
            self.p.line("}");
        }
        let body = std::mem::replace(&mut self.p, Printer::tabs()).finish();

        let mut p = Printer::tabs();
        p.line(ctx.banner("//"));
        p.blank();
        p.line(format!("// Package main exports the Go package {} to foreign callers.", pkg.path));
        if !pkg.doc.is_empty() {
            p.line("//");
            p.doc_lines(&pkg.doc);
        }
        p.line("package main");
        p.blank();
        p.line("/*");
        p.line("#include <stdlib.h>");
        p.line("#include <stdint.h>");
        p.line("#include \"seq.h\"");
        p.line(format!("#include \"{}.h\"", pkg.name));
        p.line("*/");
        p.line("import \"C\"");
        let bound: Vec<&str> = self
            .imports()
            .into_iter()
            .filter(|path| {
                ctx.set
                    .package(path)
                    .map_or(false, |other| references(&body, &other.name))
            })
            .collect();
        let seq = references(&body, "seq");
        if !bound.is_empty() || seq {
            p.blank();
            p.line("import (");
            for path in &bound {
                p.line(format!("\t\"{}\"", path));
            }
            if seq {
                if !bound.is_empty() {
                    p.blank();
                }
                p.line(format!("\t\"{}\"", SEQ_IMPORT));
            }
            p.line(")");
        }
        let mut out = p.finish();
        out.push_str(&body);
        out
    }
}
