//! Builds the proxy stubs of a run.
//!
//! Every struct and interface gets one stub per requested backend. An
//! interface is implementable from target code only when none of its
//! methods were dropped by extraction and every method maps on every
//! requested backend; otherwise it is bound as a value proxy and a warning
//! says why.

use indexmap::IndexMap;
use mobind_ir::{
    InterfaceDecl, MethodDecl, PackageModel, PackageSet, StructDecl, TypeDecl, TypeDeclKind,
    TypeName,
};
use mobind_source::{Backend, BindDiagnostic, BindOptions, Diagnostics};
use mobind_types::{MappingTable, Naming, TypeMapper, Unmappable};

use crate::stub::{
    ConstructorStub, FieldStub, Implementable, MethodStub, ProxyStub, StubKind, TrampolineStub,
};

/// Exported symbol a target calls to register an implementation.
pub fn register_symbol(pkg: &str, iface: &str) -> String {
    format!("mobind_register_{}_{}", pkg, iface)
}

/// Exported symbol of the trampoline into a target implementation.
pub fn trampoline_symbol(naming: &Naming, pkg: &str, iface: &str, method: &str) -> String {
    format!("c{}", naming.go_member_symbol(pkg, iface, method))
}

/// Stubs of a run, in package, declaration and backend order.
#[derive(Debug, Clone, Default)]
pub struct ProxySet {
    stubs: IndexMap<(TypeName, Backend), ProxyStub>,
}

impl ProxySet {
    pub fn get(&self, decl: &TypeName, backend: Backend) -> Option<&ProxyStub> {
        self.stubs.get(&(decl.clone(), backend))
    }

    pub fn for_backend(&self, backend: Backend) -> impl Iterator<Item = &ProxyStub> {
        self.stubs.values().filter(move |s| s.backend == backend)
    }

    /// Stubs of one package on one backend.
    pub fn for_package<'a>(
        &'a self,
        path: &'a str,
        backend: Backend,
    ) -> impl Iterator<Item = &'a ProxyStub> + 'a {
        self.for_backend(backend)
            .filter(move |s| s.decl.package == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyStub> {
        self.stubs.values()
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}

pub struct ProxyOutput {
    pub proxies: ProxySet,
    pub diagnostics: Diagnostics,
}

pub struct ProxyGenerator<'a> {
    set: &'a PackageSet,
    table: &'a MappingTable,
    naming: &'a Naming,
    options: &'a BindOptions,
}

impl<'a> ProxyGenerator<'a> {
    pub fn new(
        set: &'a PackageSet,
        table: &'a MappingTable,
        naming: &'a Naming,
        options: &'a BindOptions,
    ) -> Self {
        ProxyGenerator {
            set,
            table,
            naming,
            options,
        }
    }

    fn mapper(&self, backend: Backend) -> TypeMapper<'a> {
        TypeMapper::new(self.table, self.set, self.naming, backend)
    }

    pub fn generate(&self) -> ProxyOutput {
        let mut proxies = ProxySet::default();
        let mut diagnostics = Diagnostics::new();

        for pkg in self.set.packages() {
            for decl in pkg.types() {
                let kind = match &decl.kind {
                    TypeDeclKind::Struct(_) => StubKind::Struct,
                    TypeDeclKind::Interface(_) => StubKind::Interface,
                    _ => continue,
                };
                let implementable = match &decl.kind {
                    TypeDeclKind::Interface(iface) => {
                        self.implementability(pkg, decl, iface, &mut diagnostics)
                    }
                    _ => false,
                };
                for &backend in &self.options.targets {
                    let stub = self.stub(pkg, decl, kind, implementable, backend);
                    proxies.stubs.insert((stub.decl.clone(), backend), stub);
                }
            }
        }

        log::info!("Generated {} proxy stub(s)", proxies.len());
        ProxyOutput {
            proxies,
            diagnostics,
        }
    }

    fn implementability(
        &self,
        pkg: &PackageModel,
        decl: &TypeDecl,
        iface: &InterfaceDecl,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        // Extraction already warned about dropped methods.
        if !iface.omitted.is_empty() {
            return false;
        }
        for &backend in &self.options.targets {
            let mapper = self.mapper(backend);
            for method in &iface.methods {
                if let Err(err) = mapper.map_signature(&method.sig) {
                    diagnostics.push(BindDiagnostic::NotImplementable {
                        interface: format!("{}.{}", pkg.name, decl.name),
                        reason: format!(
                            "method {} uses {}, which the {} backend cannot represent",
                            method.name, err.ty, backend
                        ),
                    });
                    return false;
                }
            }
        }
        true
    }

    fn stub(
        &self,
        pkg: &PackageModel,
        decl: &TypeDecl,
        kind: StubKind,
        implementable: bool,
        backend: Backend,
    ) -> ProxyStub {
        let mapper = self.mapper(backend);
        let mut stub = ProxyStub {
            backend,
            decl: pkg.qualify(&decl.name),
            kind,
            doc: decl.doc.clone(),
            class: self.naming.type_name(backend, &pkg.name, &decl.name),
            methods: self.methods(&mapper, pkg, decl),
            fields: Vec::new(),
            constructors: Vec::new(),
            implementable: None,
        };
        match &decl.kind {
            TypeDeclKind::Struct(s) => {
                stub.fields = self.fields(&mapper, pkg, decl, s);
                stub.constructors = self.constructors(&mapper, pkg, decl);
            }
            TypeDeclKind::Interface(iface) if implementable => {
                stub.implementable = Some(self.implementable(&mapper, pkg, decl, iface));
            }
            _ => {}
        }
        log::debug!(
            "{} proxy {}: {} method(s), implementable: {}",
            backend,
            stub.class,
            stub.methods.len(),
            stub.is_implementable()
        );
        stub
    }

    fn methods(&self, mapper: &TypeMapper<'_>, pkg: &PackageModel, decl: &TypeDecl) -> Vec<MethodStub> {
        decl.methods()
            .iter()
            .filter_map(|method| self.method(mapper, pkg, decl, method))
            .collect()
    }

    fn method(
        &self,
        mapper: &TypeMapper<'_>,
        pkg: &PackageModel,
        decl: &TypeDecl,
        method: &MethodDecl,
    ) -> Option<MethodStub> {
        let sig = skip_unmappable(
            mapper,
            || format!("method {}.{}.{}", pkg.name, decl.name, method.name),
            mapper.map_signature(&method.sig),
        )?;
        Some(MethodStub {
            name: method.name.clone(),
            doc: method.doc.clone(),
            receiver: method.receiver,
            symbol: self.naming.go_member_symbol(&pkg.name, &decl.name, &method.name),
            source: method.sig.clone(),
            sig,
        })
    }

    fn fields(
        &self,
        mapper: &TypeMapper<'_>,
        pkg: &PackageModel,
        decl: &TypeDecl,
        s: &StructDecl,
    ) -> Vec<FieldStub> {
        s.fields
            .iter()
            .filter_map(|field| {
                let mapping = skip_unmappable(
                    mapper,
                    || format!("field {}.{}.{}", pkg.name, decl.name, field.name),
                    mapper.map(&field.ty),
                )?;
                let base = self.naming.go_member_symbol(&pkg.name, &decl.name, &field.name);
                Some(FieldStub {
                    name: field.name.clone(),
                    doc: field.doc.clone(),
                    getter: format!("{}_Get", base),
                    setter: format!("{}_Set", base),
                    mapping,
                })
            })
            .collect()
    }

    fn constructors(
        &self,
        mapper: &TypeMapper<'_>,
        pkg: &PackageModel,
        decl: &TypeDecl,
    ) -> Vec<ConstructorStub> {
        pkg.constructors(&decl.name)
            .filter_map(|func| {
                let sig = skip_unmappable(
                    mapper,
                    || format!("constructor {}.{}", pkg.name, func.name),
                    mapper.map_signature(&func.sig),
                )?;
                Some(ConstructorStub {
                    func: func.name.clone(),
                    doc: func.doc.clone(),
                    symbol: self.naming.go_func_symbol(&pkg.name, &func.name),
                    source: func.sig.clone(),
                    sig,
                })
            })
            .collect()
    }

    fn implementable(
        &self,
        mapper: &TypeMapper<'_>,
        pkg: &PackageModel,
        decl: &TypeDecl,
        iface: &InterfaceDecl,
    ) -> Implementable {
        let trampolines = iface
            .methods
            .iter()
            .filter_map(|method| {
                let sig = skip_unmappable(
                    mapper,
                    || format!("trampoline {}.{}.{}", pkg.name, decl.name, method.name),
                    mapper.map_signature(&method.sig),
                )?;
                Some(TrampolineStub {
                    method: method.name.clone(),
                    symbol: trampoline_symbol(self.naming, &pkg.name, &decl.name, &method.name),
                    source: method.sig.clone(),
                    sig,
                })
            })
            .collect();
        Implementable {
            register: register_symbol(&pkg.name, &decl.name),
            unregister: mobind_rt::abi::REF_DEC.to_string(),
            trampolines,
            affinity: self.options.thread_affinity(mapper.backend),
        }
    }
}

/// Drops a member with no representation on the mapper's backend. The
/// backend check has already reported it.
fn skip_unmappable<T>(
    mapper: &TypeMapper<'_>,
    member: impl FnOnce() -> String,
    mapped: Result<T, Unmappable>,
) -> Option<T> {
    match mapped {
        Ok(value) => Some(value),
        Err(err) => {
            log::debug!("{}: skipping {}: {}", mapper.backend, member(), err);
            None
        }
    }
}

/// Builds every proxy stub of a run.
pub fn generate_proxies(
    set: &PackageSet,
    table: &MappingTable,
    naming: &Naming,
    options: &BindOptions,
) -> ProxyOutput {
    ProxyGenerator::new(set, table, naming, options).generate()
}
