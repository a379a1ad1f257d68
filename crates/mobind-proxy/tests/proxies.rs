use expect_test::expect;
use mobind_ir::{
    BasicKind, Decl, FieldDecl, FuncDecl, InterfaceDecl, MethodDecl, PackageModel, PackageSet,
    Param, Receiver, Signature, StructDecl, Type, TypeDecl, TypeDeclKind,
};
use mobind_proxy::{generate_proxies, ProxySet, StubKind};
use mobind_source::{Backend, BindDiagnostic, BindOptions, ThreadAffinity};
use mobind_types::{MappingTable, Naming};

const PATH: &str = "example.com/testpkg";

fn string() -> Type {
    Type::Basic(BasicKind::String)
}

fn method(name: &str, sig: Signature) -> MethodDecl {
    MethodDecl {
        name: name.into(),
        doc: String::new(),
        receiver: Receiver::Pointer,
        sig,
    }
}

fn testpkg(hash_param: Type) -> PackageSet {
    let mut pkg = PackageModel::new(PATH, "testpkg");
    pkg.decls.push(Decl::Type(TypeDecl {
        name: "Node".into(),
        doc: "This is a comment.".into(),
        kind: TypeDeclKind::Struct(StructDecl {
            fields: vec![FieldDecl {
                name: "Label".into(),
                doc: String::new(),
                ty: string(),
            }],
            methods: vec![method(
                "Split",
                Signature::new(vec![Param::new("sep", string())], Some(Type::slice(string())), false),
            )],
        }),
    }));
    pkg.decls.push(Decl::Type(TypeDecl {
        name: "Greeter".into(),
        doc: String::new(),
        kind: TypeDeclKind::Interface(InterfaceDecl {
            methods: vec![method(
                "Greet",
                Signature::new(vec![Param::new("who", string())], Some(string()), true),
            )],
            omitted: vec![],
        }),
    }));
    pkg.decls.push(Decl::Type(TypeDecl {
        name: "Hasher".into(),
        doc: String::new(),
        kind: TypeDeclKind::Interface(InterfaceDecl {
            methods: vec![method(
                "Hash",
                Signature::new(vec![Param::new("v", hash_param)], None, false),
            )],
            omitted: vec![],
        }),
    }));
    pkg.decls.push(Decl::Type(TypeDecl {
        name: "Stream".into(),
        doc: String::new(),
        kind: TypeDeclKind::Interface(InterfaceDecl {
            methods: vec![],
            omitted: vec!["Chan".into()],
        }),
    }));
    pkg.decls.push(Decl::Func(FuncDecl {
        name: "NewNode".into(),
        doc: String::new(),
        sig: Signature::new(
            vec![Param::new("label", string())],
            Some(Type::pointer(Type::named(PATH, "Node"))),
            true,
        ),
    }));
    PackageSet::new(vec![pkg])
}

fn outline(proxies: &ProxySet) -> String {
    let mut out = String::new();
    for stub in proxies.iter() {
        out.push_str(&format!(
            "{} {} {:?}: methods={:?} fields={:?} ctors={:?}",
            stub.backend,
            stub.class,
            stub.kind,
            stub.methods.iter().map(|m| m.symbol.as_str()).collect::<Vec<_>>(),
            stub.fields.iter().map(|f| f.getter.as_str()).collect::<Vec<_>>(),
            stub.constructors.iter().map(|c| c.func.as_str()).collect::<Vec<_>>(),
        ));
        if let Some(imp) = &stub.implementable {
            let symbols: Vec<_> = imp.trampolines.iter().map(|t| t.symbol.as_str()).collect();
            out.push_str(&format!(
                " impl={} {:?} redispatch={}",
                imp.register,
                symbols,
                imp.redispatches()
            ));
        }
        out.push('\n');
    }
    out
}

#[test]
fn builds_one_stub_per_type_and_backend() {
    let set = testpkg(Type::Basic(BasicKind::Int64));
    let options = BindOptions {
        targets: vec![Backend::Java, Backend::ObjC],
        objc_thread: ThreadAffinity::Main,
        ..BindOptions::default()
    };
    let naming = Naming::new("go", "Go");
    let out = generate_proxies(&set, &MappingTable::standard(), &naming, &options);
    assert!(out.diagnostics.is_empty());

    expect![[r#"
        java go.testpkg.Node Struct: methods=["proxytestpkg_Node_Split"] fields=["proxytestpkg_Node_Label_Get"] ctors=["NewNode"]
        objc GoTestpkgNode Struct: methods=["proxytestpkg_Node_Split"] fields=["proxytestpkg_Node_Label_Get"] ctors=["NewNode"]
        java go.testpkg.Greeter Interface: methods=["proxytestpkg_Greeter_Greet"] fields=[] ctors=[] impl=mobind_register_testpkg_Greeter ["cproxytestpkg_Greeter_Greet"] redispatch=false
        objc GoTestpkgGreeter Interface: methods=["proxytestpkg_Greeter_Greet"] fields=[] ctors=[] impl=mobind_register_testpkg_Greeter ["cproxytestpkg_Greeter_Greet"] redispatch=true
        java go.testpkg.Hasher Interface: methods=["proxytestpkg_Hasher_Hash"] fields=[] ctors=[] impl=mobind_register_testpkg_Hasher ["cproxytestpkg_Hasher_Hash"] redispatch=false
        objc GoTestpkgHasher Interface: methods=["proxytestpkg_Hasher_Hash"] fields=[] ctors=[] impl=mobind_register_testpkg_Hasher ["cproxytestpkg_Hasher_Hash"] redispatch=true
        java go.testpkg.Stream Interface: methods=[] fields=[] ctors=[]
        objc GoTestpkgStream Interface: methods=[] fields=[] ctors=[]
    "#]]
    .assert_eq(&outline(&out.proxies));
}

#[test]
fn interfaces_unmappable_on_a_backend_are_value_proxies_only() {
    let set = testpkg(Type::Basic(BasicKind::Uint32));
    let options = BindOptions::default();
    let out = generate_proxies(&set, &MappingTable::standard(), &Naming::default(), &options);

    let hasher = set.packages()[0].qualify("Hasher");
    for backend in Backend::ALL {
        let stub = out.proxies.get(&hasher, backend).unwrap();
        assert_eq!(stub.kind, StubKind::Interface);
        assert!(!stub.is_implementable(), "{} stub should not be implementable", backend);
    }
    let greeter = set.packages()[0].qualify("Greeter");
    assert!(out.proxies.get(&greeter, Backend::Go).unwrap().is_implementable());

    let warnings: Vec<_> = out.diagnostics.iter().collect();
    assert_eq!(
        warnings,
        vec![&BindDiagnostic::NotImplementable {
            interface: "testpkg.Hasher".into(),
            reason: "method Hash uses uint32, which the java backend cannot represent".into(),
        }]
    );
}

#[test]
fn interfaces_with_dropped_methods_are_not_implementable() {
    let set = testpkg(Type::Basic(BasicKind::Int64));
    let out = generate_proxies(
        &set,
        &MappingTable::standard(),
        &Naming::default(),
        &BindOptions::default(),
    );
    let stream = set.packages()[0].qualify("Stream");
    assert!(!out.proxies.get(&stream, Backend::Java).unwrap().is_implementable());
    assert_eq!(out.proxies.for_package(PATH, Backend::Go).count(), 4);
}

#[test]
fn unmappable_members_are_dropped_only_where_they_do_not_map() {
    let _ = env_logger::builder().is_test(true).try_init();
    let set = testpkg(Type::Basic(BasicKind::Uint32));
    let options = BindOptions {
        targets: vec![Backend::Java, Backend::ObjC],
        ..BindOptions::default()
    };
    let out = generate_proxies(&set, &MappingTable::standard(), &Naming::default(), &options);

    let hasher = set.packages()[0].qualify("Hasher");
    let java = out.proxies.get(&hasher, Backend::Java).unwrap();
    assert!(java.methods.is_empty());
    let objc = out.proxies.get(&hasher, Backend::ObjC).unwrap();
    let names: Vec<_> = objc.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Hash"]);

    let greeter = set.packages()[0].qualify("Greeter");
    let imp = out.proxies.get(&greeter, Backend::Java).unwrap().implementable.as_ref().unwrap();
    assert_eq!(imp.unregister, mobind_rt::abi::REF_DEC);
}
