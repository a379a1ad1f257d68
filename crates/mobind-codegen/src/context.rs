use mobind_ir::{ConstValue, PackageModel, PackageSet, Type};
use mobind_proxy::{ProxySet, ProxyStub};
use mobind_source::{Backend, BindOptions};
use mobind_types::{MappingTable, Naming, TypeMapper};

/// Import path of the source-side support package generated glue uses.
pub const SEQ_IMPORT: &str = "mobind/bind/seq";

/// Everything an emitter reads. Emitters never see anything else, so their
/// output is a function of this value alone.
pub struct EmitContext<'a> {
    pub set: &'a PackageSet,
    pub table: &'a MappingTable,
    pub naming: &'a Naming,
    pub options: &'a BindOptions,
    pub proxies: &'a ProxySet,
}

impl<'a> EmitContext<'a> {
    pub fn mapper(&self, backend: Backend) -> TypeMapper<'a> {
        TypeMapper::new(self.table, self.set, self.naming, backend)
    }

    pub fn stubs(&self, pkg: &'a PackageModel, backend: Backend) -> impl Iterator<Item = &'a ProxyStub> + 'a {
        self.proxies.for_package(&pkg.path, backend)
    }

    pub fn stub(&self, pkg: &PackageModel, name: &str, backend: Backend) -> Option<&'a ProxyStub> {
        self.proxies.get(&pkg.qualify(name), backend)
    }

    /// Stub of the struct or interface a type refers to, through pointers.
    pub fn stub_of(&self, ty: &Type, backend: Backend) -> Option<&'a ProxyStub> {
        match ty {
            Type::Named(name) => self.proxies.get(name, backend),
            Type::Pointer(inner) => self.stub_of(inner, backend),
            _ => None,
        }
    }

    /// First line of every generated file, in the comment syntax `prefix`.
    pub fn banner(&self, prefix: &str) -> String {
        if self.options.version_banner {
            format!("{} Code generated by mobind {}. DO NOT EDIT.", prefix, env!("CARGO_PKG_VERSION"))
        } else {
            format!("{} Code generated by mobind. DO NOT EDIT.", prefix)
        }
    }
}

/// Quotes text as a C, Java, Objective-C or Go string literal body.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// A constant's literal in C-family syntax. Strings come back quoted.
pub fn literal(value: &ConstValue) -> String {
    match value {
        ConstValue::Bool(b) => b.to_string(),
        ConstValue::Int(i) => i.to_string(),
        ConstValue::Uint(u) => u.to_string(),
        ConstValue::Float(f) => {
            let s = f.to_string();
            if s.contains(['.', 'e', 'E']) || !f.is_finite() {
                s
            } else {
                format!("{}.0", s)
            }
        }
        ConstValue::String(s) => format!("\"{}\"", escape(s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(literal(&ConstValue::Float(0.0)), "0.0");
        assert_eq!(literal(&ConstValue::Float(2.5)), "2.5");
        assert_eq!(literal(&ConstValue::Int(-7)), "-7");
        assert_eq!(literal(&ConstValue::String("a\"b\n".into())), "\"a\\\"b\\n\"");
    }
}
