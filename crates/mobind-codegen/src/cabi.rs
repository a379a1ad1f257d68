//! The C calling convention shared by every glue layer.
//!
//! Source exports and target trampolines take their receiver as an
//! `int64_t refnum` followed by the parameters in ABI types. One result
//! crosses as a plain return value; a value plus a failure indicator
//! crosses as `struct <symbol>_return { r0; r1; }`, the way cgo returns
//! multiple results.

use mobind_rt::abi::C_PROTOTYPES;
use mobind_types::{MappedSignature, TypeMapping, ABI_HANDLE};

use crate::printer::Printer;

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "id", "self", "super", "nil", "YES", "NO",
];

/// A source identifier usable as a C or Objective-C variable name.
pub fn c_ident(name: &str) -> String {
    if C_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Name of a parameter in C and Go glue functions.
pub fn c_param(name: &str) -> String {
    format!("param_{}", name)
}

/// What a glue function returns.
pub enum Results<'s> {
    Void,
    Value(&'s TypeMapping),
    /// Only the failure handle.
    Error,
    /// A value in `r0` and the failure handle in `r1`.
    Pair(&'s TypeMapping),
}

pub fn results(sig: &MappedSignature) -> Results<'_> {
    match (&sig.ret, sig.is_fallible()) {
        (None, false) => Results::Void,
        (Some(ret), false) => Results::Value(ret),
        (None, true) => Results::Error,
        (Some(ret), true) => Results::Pair(ret),
    }
}

pub fn return_type(symbol: &str, sig: &MappedSignature) -> String {
    match results(sig) {
        Results::Void => "void".to_string(),
        Results::Value(ret) => ret.abi.clone(),
        Results::Error => ABI_HANDLE.to_string(),
        Results::Pair(_) => format!("struct {}_return", symbol),
    }
}

/// Parameter list of a glue function, with a leading receiver if asked.
pub fn params(sig: &MappedSignature, receiver: bool) -> String {
    let mut out: Vec<String> = Vec::new();
    if receiver {
        out.push(format!("{} refnum", ABI_HANDLE));
    }
    for p in &sig.params {
        out.push(format!("{} {}", p.mapping.abi, c_param(&p.name)));
    }
    if out.is_empty() {
        "void".to_string()
    } else {
        out.join(", ")
    }
}

pub fn prototype(symbol: &str, sig: &MappedSignature, receiver: bool) -> String {
    format!("{} {}({})", return_type(symbol, sig), symbol, params(sig, receiver))
}

/// Declares the result struct of a two-result function, if it has one.
pub fn return_struct(p: &mut Printer, symbol: &str, sig: &MappedSignature) {
    if let Results::Pair(ret) = results(sig) {
        p.block(format!("struct {}_return {{", symbol), "};", |p| {
            p.line(format!("{} r0;", ret.abi));
            p.line(format!("{} r1;", ABI_HANDLE));
        });
    }
}

/// Prototypes of the runtime entry points every glue file may call. cgo
/// pastes several preambles into one `_cgo_export.h`, so they are guarded.
pub fn runtime_prototypes(p: &mut Printer) {
    p.line("#ifndef __MOBIND_RT_H__");
    p.line("#define __MOBIND_RT_H__");
    for line in C_PROTOTYPES.lines() {
        p.line(line);
    }
    p.line("#endif");
}
