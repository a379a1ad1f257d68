//! The objc backend: a header declaring every bound symbol under the
//! configured prefix and an implementation file that forwards each call
//! through the C boundary.

mod header;
mod source;

use std::path::Path;

use mobind_ir::{PackageModel, Type};
use mobind_source::Backend;
use mobind_proxy::ProxyStub;
use mobind_types::{package_name, Conversion, MappedSignature, MarshalOp, TypeMapping};

use crate::cabi::c_ident;
use crate::context::EmitContext;
use crate::names::objc_selector;
use crate::unit::{EmissionUnit, GLUE_DIR};

/// Header of the Objective-C runtime support library.
const REF_HEADER: &str = "ref.h";

/// Macro the implementation file is compiled under.
pub const PLATFORM_GUARD: &str = "__APPLE__";

pub fn emit(ctx: &EmitContext<'_>, pkg: &PackageModel) -> Vec<EmissionUnit> {
    let prefix = ctx.naming.objc_package(&pkg.name);
    vec![
        EmissionUnit::new(
            Backend::ObjC,
            Path::new(GLUE_DIR).join(format!("{}.objc.h", prefix)),
            header::emit(ctx, pkg),
        ),
        EmissionUnit::new(
            Backend::ObjC,
            Path::new(GLUE_DIR).join(format!("{}.objc.m", prefix)),
            source::emit(ctx, pkg),
        ),
    ]
}

fn error_param(sig: &MappedSignature) -> Option<&str> {
    match &sig.failure {
        Some(mobind_types::FailureIdiom::OutParam { ty }) => Some(ty.as_str()),
        _ => None,
    }
}

/// Declared return type of a method or function.
fn return_type(sig: &MappedSignature) -> &str {
    if sig.returns_status() {
        "BOOL"
    } else {
        sig.ret.as_ref().map_or("void", |r| r.target.as_str())
    }
}

/// Selector of a method, with parameter types and names:
/// `greet:(NSString*)who error:(NSError* _Nullable* _Nullable)error`.
fn selector(name: &str, sig: &MappedSignature) -> String {
    selector_from(&objc_selector(name), sig)
}

/// [`selector`] with an explicit first label, for `init` selectors.
fn selector_from(base: &str, sig: &MappedSignature) -> String {
    let mut parts: Vec<(String, String)> = sig
        .params
        .iter()
        .map(|p| (p.mapping.target.clone(), c_ident(&p.name)))
        .collect();
    if let Some(ty) = error_param(sig) {
        parts.push((ty.to_string(), "error".to_string()));
    }
    if parts.is_empty() {
        return base.to_string();
    }
    parts
        .iter()
        .enumerate()
        .map(|(i, (ty, arg))| {
            let label = if i == 0 { base } else { arg.as_str() };
            format!("{}:({}){}", label, ty, arg)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Message send matching [`selector`], with `args` in parameter order.
fn message(name: &str, sig: &MappedSignature, args: &[String]) -> String {
    let mut args = args.to_vec();
    let mut labels: Vec<String> = sig.params.iter().map(|p| c_ident(&p.name)).collect();
    if error_param(sig).is_some() {
        labels.push("error".to_string());
        args.push("&error".to_string());
    }
    let base = objc_selector(name);
    if args.is_empty() {
        return base;
    }
    args.iter()
        .zip(&labels)
        .enumerate()
        .map(|(i, (arg, label))| {
            let label = if i == 0 { base.as_str() } else { label.as_str() };
            format!("{}:{}", label, arg)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parameter list of a package function in C form.
fn c_params(sig: &MappedSignature) -> String {
    let mut params: Vec<String> = sig
        .params
        .iter()
        .map(|p| format!("{} {}", p.mapping.target, c_ident(&p.name)))
        .collect();
    if let Some(ty) = error_param(sig) {
        params.push(format!("{} error", ty));
    }
    if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    }
}

/// Boundary value to Objective-C value.
fn to_objc(ctx: &EmitContext<'_>, mapping: &TypeMapping, ty: Option<&Type>, expr: &str) -> String {
    match &mapping.encode {
        Conversion::Call(f) if mapping.op == MarshalOp::ObjectHandle => {
            let class = ty
                .and_then(|t| ctx.stub_of(t, Backend::ObjC))
                .map_or_else(|| "Nil".to_string(), |s| format!("[{} class]", s.class));
            format!("({}){}({}, {})", mapping.target, f, expr, class)
        }
        conversion => conversion.apply(expr),
    }
}

/// C function registering an object adopting an implementable protocol,
/// defined next to the protocol's other glue.
fn register_function(pkg: &str, iface: &str) -> String {
    format!("mobind_objc_register_{}_{}", pkg, iface)
}

/// Class whose instances hold the registration of one adopting object.
fn registration_class(stub: &ProxyStub) -> String {
    format!("MobindReg{}", stub.class)
}

/// Objective-C value to boundary value. Objects adopting an implementable
/// protocol are registered with the source side on the way in.
fn from_objc(ctx: &EmitContext<'_>, mapping: &TypeMapping, ty: Option<&Type>, expr: &str) -> String {
    if mapping.op != MarshalOp::ObjectHandle {
        return mapping.decode.apply(expr);
    }
    match ty
        .and_then(|t| ctx.stub_of(t, Backend::ObjC))
        .filter(|s| s.is_implementable())
    {
        Some(stub) => format!(
            "{}({})",
            register_function(package_name(ctx.set, &stub.decl), &stub.decl.name),
            expr
        ),
        None => mapping.decode.apply(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobind_ir::{BasicKind, PackageSet, Param, Signature};
    use mobind_types::{MappingTable, Naming, TypeMapper};

    fn mapped(sig: Signature) -> MappedSignature {
        let table = MappingTable::standard();
        let set = PackageSet::default();
        let naming = Naming::default();
        TypeMapper::new(&table, &set, &naming, Backend::ObjC)
            .map_signature(&sig)
            .unwrap()
    }

    #[test]
    fn selectors_append_the_error_out_parameter() {
        let sig = mapped(Signature::new(
            vec![
                Param::new("who", Type::Basic(BasicKind::String)),
                Param::new("times", Type::Basic(BasicKind::Int)),
            ],
            Some(Type::Basic(BasicKind::String)),
            true,
        ));
        assert_eq!(
            selector("Greet", &sig),
            "greet:(NSString*)who times:(long)times error:(NSError* _Nullable* _Nullable)error"
        );
        assert_eq!(
            message("Greet", &sig, &["a".into(), "b".into()]),
            "greet:a times:b error:&error"
        );

        let bare = mapped(Signature::new(vec![], None, true));
        assert_eq!(return_type(&bare), "BOOL");
        assert_eq!(selector("Run", &bare), "run:(NSError* _Nullable* _Nullable)error");
    }
}
