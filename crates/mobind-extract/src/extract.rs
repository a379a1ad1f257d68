use fxhash::{FxHashMap, FxHashSet};
use mobind_ir::{
    BasicKind, ConstDecl, ConstValue, Decl, FieldDecl, FuncDecl, InterfaceDecl, MethodDecl,
    PackageModel, PackageSet, Receiver, Signature, StructDecl, Type, TypeDecl, TypeDeclKind,
    TypeName, VarDecl,
};
use mobind_source::{
    BindDiagnostic, Diagnostics, ExportConst, ExportData, ExportField, ExportMethod,
    ExportPackage, ExportParam, ExportType, ExportTypeDef,
};

use crate::ast::TypeExpr;
use crate::lower::{is_exported, Scope, Shape, Unsupported};
use crate::parser::parse_type;

/// Result of extracting a set of packages.
///
/// `packages` only holds declarations that survived validation. When
/// `diagnostics` contains an error the model must not be emitted.
#[derive(Debug)]
pub struct Extraction {
    pub packages: PackageSet,
    pub diagnostics: Diagnostics,
}

/// Builds the IR for every package in `data`.
pub fn extract(data: &ExportData) -> Extraction {
    let mut diagnostics = Diagnostics::new();

    let mut packages: FxHashMap<String, String> = FxHashMap::default();
    let mut paths = FxHashSet::default();
    let mut bound = Vec::new();
    for pkg in &data.packages {
        if !paths.insert(pkg.path.as_str()) {
            diagnostics.push(BindDiagnostic::InvalidMetadata {
                decl: format!("package {}", pkg.path),
                message: "package listed more than once".to_string(),
            });
            continue;
        }
        if let Some(other) = packages.get(&pkg.name) {
            diagnostics.push(BindDiagnostic::InvalidMetadata {
                decl: format!("package {}", pkg.path),
                message: format!("package name {} is already used by {}", pkg.name, other),
            });
            continue;
        }
        packages.insert(pkg.name.clone(), pkg.path.clone());
        bound.push(pkg);
    }

    let shapes = prescan(&bound);
    let models = bound
        .iter()
        .map(|pkg| {
            let scope = Scope {
                local: &pkg.path,
                packages: &packages,
                shapes: &shapes,
            };
            log::debug!("Extracting package {}", pkg.path);
            PackageExtractor::new(pkg, &scope, &mut diagnostics).run()
        })
        .collect();

    let set = check_requirements(models, &mut diagnostics);
    log::info!(
        "Extracted {} package(s) with {} diagnostic(s)",
        set.packages().len(),
        diagnostics.len()
    );

    Extraction {
        packages: set,
        diagnostics,
    }
}

/// Records the shape of every declared type so references can be checked
/// before the declarations themselves are lowered.
fn prescan(packages: &[&ExportPackage]) -> FxHashMap<TypeName, Shape> {
    let mut shapes = FxHashMap::default();
    for pkg in packages {
        for ty in &pkg.types {
            let shape = match &ty.def {
                ExportTypeDef::Struct { .. } => Shape::Struct,
                ExportTypeDef::Interface { .. } => Shape::Interface,
                ExportTypeDef::Defined { underlying, .. } => match parse_type(underlying) {
                    Ok(TypeExpr::Ident(name)) => BasicKind::from_source_name(&name)
                        .map_or(Shape::Other, Shape::Basic),
                    _ => Shape::Other,
                },
            };
            shapes.insert(TypeName::new(pkg.path.clone(), ty.name.clone()), shape);
        }
    }
    shapes
}

/// Reports and drops every declaration that refers to a type that is not
/// bound, repeating until no survivor refers to a dropped one.
fn check_requirements(mut models: Vec<PackageModel>, diagnostics: &mut Diagnostics) -> PackageSet {
    loop {
        let set = PackageSet::new(models);
        let mut failing: Vec<(usize, usize)> = Vec::new();
        for (p, pkg) in set.packages().iter().enumerate() {
            for (d, decl) in pkg.decls.iter().enumerate() {
                let mut missing: Vec<&TypeName> = Vec::new();
                decl.for_each_named(&mut |name| {
                    if set.lookup(name).is_none() && !missing.contains(&name) {
                        missing.push(name);
                    }
                });
                if missing.is_empty() {
                    continue;
                }
                for name in missing {
                    diagnostics.push(BindDiagnostic::UnsupportedConstruct {
                        decl: format!("{} {}.{}", decl.describe(), pkg.name, decl.name()),
                        ty: name.to_string(),
                        reason: "refers to a declaration that was excluded from the binding"
                            .to_string(),
                    });
                }
                failing.push((p, d));
            }
        }
        if failing.is_empty() {
            return set;
        }
        log::debug!("Dropping {} declaration(s) with unbound references", failing.len());
        models = set.into_packages();
        for (p, d) in failing.into_iter().rev() {
            models[p].decls.remove(d);
        }
    }
}

struct PackageExtractor<'a, 's> {
    pkg: &'a ExportPackage,
    scope: &'a Scope<'s>,
    diagnostics: &'a mut Diagnostics,
    seen: FxHashSet<&'a str>,
}

impl<'a, 's> PackageExtractor<'a, 's> {
    fn new(pkg: &'a ExportPackage, scope: &'a Scope<'s>, diagnostics: &'a mut Diagnostics) -> Self {
        PackageExtractor {
            pkg,
            scope,
            diagnostics,
            seen: FxHashSet::default(),
        }
    }

    fn run(mut self) -> PackageModel {
        let pkg = self.pkg;
        let mut model = PackageModel::new(pkg.path.clone(), pkg.name.clone());
        model.doc = pkg.doc.clone();

        for ty in &pkg.types {
            if self.admit("type", &ty.name) {
                if let Some(decl) = self.type_decl(ty) {
                    model.decls.push(Decl::Type(decl));
                }
            }
        }
        for func in &pkg.funcs {
            if !self.admit("func", &func.name) {
                continue;
            }
            let what = self.describe("func", &func.name);
            if let Some(sig) = self.signature(&what, &func.params, &func.results) {
                model.decls.push(Decl::Func(FuncDecl {
                    name: func.name.clone(),
                    doc: func.doc.clone(),
                    sig,
                }));
            }
        }
        for c in &pkg.consts {
            if self.admit("const", &c.name) {
                if let Some(decl) = self.const_decl(c) {
                    model.decls.push(Decl::Const(decl));
                }
            }
        }
        for var in &pkg.vars {
            if !self.admit("var", &var.name) {
                continue;
            }
            let what = self.describe("var", &var.name);
            if let Some(ty) = self.lower_text(&what, &var.ty) {
                model.decls.push(Decl::Var(VarDecl {
                    name: var.name.clone(),
                    doc: var.doc.clone(),
                    ty,
                }));
            }
        }

        model
    }

    fn describe(&self, kind: &str, name: &str) -> String {
        format!("{} {}.{}", kind, self.pkg.name, name)
    }

    /// Checks that a package level name is exported and unique.
    fn admit(&mut self, kind: &str, name: &'a str) -> bool {
        if !self.seen.insert(name) {
            let decl = self.describe(kind, name);
            self.diagnostics.push(BindDiagnostic::InvalidMetadata {
                decl,
                message: "name declared more than once".to_string(),
            });
            return false;
        }
        if !is_exported(name) {
            let decl = self.describe(kind, name);
            self.exclude(decl, "not exported");
            return false;
        }
        true
    }

    fn exclude(&mut self, decl: String, reason: impl Into<String>) {
        self.diagnostics.push(BindDiagnostic::Excluded {
            decl,
            reason: reason.into(),
        });
    }

    fn exclude_unsupported(&mut self, decl: String, err: Unsupported) {
        self.exclude(decl, format!("{}: {}", err.ty, err.reason));
    }

    fn parse(&mut self, decl: &str, text: &str) -> Option<TypeExpr> {
        match parse_type(text) {
            Ok(expr) => Some(expr),
            Err(err) => {
                self.diagnostics.push(BindDiagnostic::InvalidMetadata {
                    decl: decl.to_string(),
                    message: format!("{} in `{}`", err.message, text),
                });
                None
            }
        }
    }

    /// Parses and lowers a type, excluding `decl` when it is unsupported.
    fn lower_text(&mut self, decl: &str, text: &str) -> Option<Type> {
        let expr = self.parse(decl, text)?;
        match self.scope.lower(&expr) {
            Ok(ty) => Some(ty),
            Err(err) => {
                self.exclude_unsupported(decl.to_string(), err);
                None
            }
        }
    }

    fn signature(
        &mut self,
        decl: &str,
        params: &[ExportParam],
        results: &[String],
    ) -> Option<Signature> {
        let mut parsed_params = Vec::with_capacity(params.len());
        for param in params {
            parsed_params.push((param.name.clone(), self.parse(decl, &param.ty)?));
        }
        let mut parsed_results = Vec::with_capacity(results.len());
        for result in results {
            parsed_results.push(self.parse(decl, result)?);
        }
        match self.scope.lower_signature(&parsed_params, &parsed_results) {
            Ok(sig) => Some(sig),
            Err(err) => {
                self.exclude_unsupported(decl.to_string(), err);
                None
            }
        }
    }

    fn methods(&mut self, owner: &str, methods: &'a [ExportMethod]) -> (Vec<MethodDecl>, Vec<String>) {
        let mut kept = Vec::new();
        let mut omitted = Vec::new();
        let mut names = FxHashSet::default();
        for method in methods {
            let what = self.describe("method", &format!("{}.{}", owner, method.name));
            if !names.insert(method.name.as_str()) {
                self.diagnostics.push(BindDiagnostic::InvalidMetadata {
                    decl: what,
                    message: "method declared more than once".to_string(),
                });
                continue;
            }
            if !is_exported(&method.name) {
                self.exclude(what, "not exported");
                omitted.push(method.name.clone());
                continue;
            }
            match self.signature(&what, &method.params, &method.results) {
                Some(sig) => kept.push(MethodDecl {
                    name: method.name.clone(),
                    doc: method.doc.clone(),
                    receiver: if method.pointer_receiver {
                        Receiver::Pointer
                    } else {
                        Receiver::Value
                    },
                    sig,
                }),
                None => omitted.push(method.name.clone()),
            }
        }
        (kept, omitted)
    }

    fn fields(&mut self, owner: &str, fields: &'a [ExportField]) -> Vec<FieldDecl> {
        let mut kept = Vec::new();
        let mut names = FxHashSet::default();
        for field in fields {
            let what = self.describe("field", &format!("{}.{}", owner, field.name));
            if !names.insert(field.name.as_str()) {
                self.diagnostics.push(BindDiagnostic::InvalidMetadata {
                    decl: what,
                    message: "field declared more than once".to_string(),
                });
                continue;
            }
            if field.embedded {
                self.exclude(what, "embedded fields are not supported");
                continue;
            }
            if !is_exported(&field.name) {
                self.exclude(what, "not exported");
                continue;
            }
            if let Some(ty) = self.lower_text(&what, &field.ty) {
                kept.push(FieldDecl {
                    name: field.name.clone(),
                    doc: field.doc.clone(),
                    ty,
                });
            }
        }
        kept
    }

    fn type_decl(&mut self, ty: &'a ExportType) -> Option<TypeDecl> {
        let what = self.describe("type", &ty.name);
        let kind = match &ty.def {
            ExportTypeDef::Struct { fields, methods } => {
                let fields = self.fields(&ty.name, fields);
                let (methods, _) = self.methods(&ty.name, methods);
                TypeDeclKind::Struct(StructDecl { fields, methods })
            }
            ExportTypeDef::Interface { methods } => {
                let (methods, omitted) = self.methods(&ty.name, methods);
                if !omitted.is_empty() {
                    self.diagnostics.push(BindDiagnostic::NotImplementable {
                        interface: what.clone(),
                        reason: format!("methods {} cannot be bound", omitted.join(", ")),
                    });
                }
                TypeDeclKind::Interface(InterfaceDecl { methods, omitted })
            }
            ExportTypeDef::Defined {
                underlying,
                methods,
            } => {
                for method in methods {
                    let m = self.describe("method", &format!("{}.{}", ty.name, method.name));
                    self.exclude(m, "methods are only bound on struct types");
                }
                let lowered = self.lower_text(&what, underlying)?;
                match lowered {
                    Type::Basic(kind) => TypeDeclKind::Basic(kind),
                    Type::Error => TypeDeclKind::Error,
                    Type::Slice { elem, len: None } => TypeDeclKind::Slice(*elem),
                    Type::Map { key, value } => TypeDeclKind::Map {
                        key: *key,
                        value: *value,
                    },
                    Type::Pointer(inner) => TypeDeclKind::Pointer(*inner),
                    Type::Func(sig) => TypeDeclKind::Func(*sig),
                    Type::Slice { len: Some(_), .. } => {
                        self.exclude(what, "defined array types are not supported");
                        return None;
                    }
                    Type::Named(name) => {
                        self.exclude(
                            what,
                            format!("{}: defined types over named types are not supported", name),
                        );
                        return None;
                    }
                }
            }
        };
        Some(TypeDecl {
            name: ty.name.clone(),
            doc: ty.doc.clone(),
            kind,
        })
    }

    fn const_decl(&mut self, c: &ExportConst) -> Option<ConstDecl> {
        let what = self.describe("const", &c.name);
        let literal = c.value.trim();
        let ty = if c.ty.is_empty() || c.ty.starts_with("untyped") {
            infer_const_type(literal)
        } else {
            match self.lower_text(&what, &c.ty)? {
                Type::Basic(kind) => kind,
                Type::Named(name) => match self.scope.shape(&name) {
                    Some(Shape::Basic(kind)) => kind,
                    _ => {
                        self.exclude(what, format!("{}: constants must have a basic type", name));
                        return None;
                    }
                },
                other => {
                    self.exclude(what, format!("{}: constants must have a basic type", other));
                    return None;
                }
            }
        };
        match parse_const_value(ty, literal) {
            Some(value) => Some(ConstDecl {
                name: c.name.clone(),
                doc: c.doc.clone(),
                ty,
                value,
            }),
            None => {
                self.diagnostics.push(BindDiagnostic::InvalidMetadata {
                    decl: what,
                    message: format!("`{}` is not a valid {} literal", literal, ty),
                });
                None
            }
        }
    }
}

fn infer_const_type(literal: &str) -> BasicKind {
    if literal.starts_with('"') {
        BasicKind::String
    } else if literal == "true" || literal == "false" {
        BasicKind::Bool
    } else if literal.contains(['.', 'e', 'E']) && !literal.starts_with("0x") {
        BasicKind::Float64
    } else {
        BasicKind::Int64
    }
}

/// Parses a constant literal written in source syntax.
pub fn parse_const_value(ty: BasicKind, literal: &str) -> Option<ConstValue> {
    match ty {
        BasicKind::Bool => match literal {
            "true" => Some(ConstValue::Bool(true)),
            "false" => Some(ConstValue::Bool(false)),
            _ => None,
        },
        BasicKind::String => unquote(literal).map(ConstValue::String),
        BasicKind::Float32 | BasicKind::Float64 => {
            literal.parse::<f64>().ok().map(ConstValue::Float)
        }
        kind if kind.is_unsigned() => {
            let value = parse_uint(literal)?;
            fits_bits(value, kind.wire_bits()).then_some(ConstValue::Uint(value))
        }
        kind => {
            let (negative, digits) = match literal.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, literal),
            };
            let magnitude = i128::from(parse_uint(digits)?);
            let value = if negative { -magnitude } else { magnitude };
            let bits = kind.wire_bits();
            let min = -(1i128 << (bits - 1));
            let max = (1i128 << (bits - 1)) - 1;
            if value < min || value > max {
                return None;
            }
            i64::try_from(value).ok().map(ConstValue::Int)
        }
    }
}

fn fits_bits(value: u64, bits: u32) -> bool {
    bits >= 64 || value < (1u64 << bits)
}

fn parse_uint(literal: &str) -> Option<u64> {
    let cleaned: String = literal.chars().filter(|c| *c != '_').collect();
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
        u64::from_str_radix(oct, 8).ok()
    } else {
        cleaned.parse().ok()
    }
}

/// Decodes an interpreted or raw string literal.
fn unquote(literal: &str) -> Option<String> {
    if let Some(raw) = literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        return Some(raw.to_string());
    }
    let body = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'u' => {
                let code: String = chars.by_ref().take(4).collect();
                out.push(char::from_u32(u32::from_str_radix(&code, 16).ok()?)?);
            }
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_constant_literals() {
        assert_eq!(parse_const_value(BasicKind::Int8, "-128"), Some(ConstValue::Int(-128)));
        assert_eq!(parse_const_value(BasicKind::Int8, "128"), None);
        assert_eq!(parse_const_value(BasicKind::Uint16, "0xFFFF"), Some(ConstValue::Uint(0xFFFF)));
        assert_eq!(parse_const_value(BasicKind::Uint8, "256"), None);
        assert_eq!(
            parse_const_value(BasicKind::Int64, "-9223372036854775808"),
            Some(ConstValue::Int(i64::MIN))
        );
        assert_eq!(
            parse_const_value(BasicKind::Uint64, "18446744073709551615"),
            Some(ConstValue::Uint(u64::MAX))
        );
        assert_eq!(parse_const_value(BasicKind::Float64, "2.5"), Some(ConstValue::Float(2.5)));
        assert_eq!(
            parse_const_value(BasicKind::String, r#""a\"b\n""#),
            Some(ConstValue::String("a\"b\n".into()))
        );
        assert_eq!(parse_const_value(BasicKind::Bool, "yes"), None);
    }

    #[test]
    fn infers_untyped_constants() {
        assert_eq!(infer_const_type("\"x\""), BasicKind::String);
        assert_eq!(infer_const_type("1.5"), BasicKind::Float64);
        assert_eq!(infer_const_type("0xE0"), BasicKind::Int64);
        assert_eq!(infer_const_type("false"), BasicKind::Bool);
    }
}
