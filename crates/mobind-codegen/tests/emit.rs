use expect_test::expect;
use mobind_codegen::{check_collisions, emit_backend, EmissionUnit, EmitContext, UnitSet};
use mobind_extract::extract;
use mobind_ir::PackageSet;
use mobind_proxy::{generate_proxies, ProxySet};
use mobind_source::{Backend, BindDiagnostic, BindOptions, ExportData, ThreadAffinity};
use mobind_types::{MappingTable, Naming};

struct Fixture {
    set: PackageSet,
    table: MappingTable,
    naming: Naming,
    options: BindOptions,
    proxies: ProxySet,
}

impl Fixture {
    fn new(json: &str, options: BindOptions) -> Self {
        let extraction = extract(&ExportData::from_json(json).unwrap());
        assert!(
            !extraction.diagnostics.has_errors(),
            "{:?}",
            extraction.diagnostics
        );
        let table = MappingTable::standard();
        let naming = Naming::from_options(&options);
        let proxies = generate_proxies(&extraction.packages, &table, &naming, &options).proxies;
        Fixture {
            set: extraction.packages,
            table,
            naming,
            options,
            proxies,
        }
    }

    fn ctx(&self) -> EmitContext<'_> {
        EmitContext {
            set: &self.set,
            table: &self.table,
            naming: &self.naming,
            options: &self.options,
            proxies: &self.proxies,
        }
    }

    fn emit(&self) -> UnitSet {
        let mut units = UnitSet::new();
        for &backend in &self.options.targets {
            units.extend(emit_backend(&self.ctx(), backend));
        }
        units
    }
}

fn options() -> BindOptions {
    BindOptions {
        java_package_prefix: "go".into(),
        objc_prefix: "Go".into(),
        version_banner: false,
        ..BindOptions::default()
    }
}

fn unit<'u>(units: &'u UnitSet, path: &str) -> &'u EmissionUnit {
    units
        .get(path)
        .unwrap_or_else(|| panic!("no unit {}; have {:?}", path, units.paths().collect::<Vec<_>>()))
}

const TESTPKG: &str = r#"{
  "packages": [{
    "path": "example.com/testpkg",
    "name": "testpkg",
    "types": [
      { "name": "Struct", "doc": "This is a comment.", "kind": "struct",
        "fields": [{ "name": "Value", "type": "int64" }],
        "methods": [
          { "name": "Sum", "pointer_receiver": true,
            "params": [{"name": "x", "type": "[]int32"}], "results": ["int64", "error"] }
        ] },
      { "name": "Greeter", "kind": "interface",
        "methods": [
          { "name": "Greet", "params": [{"name": "who", "type": "string"}], "results": ["string", "error"] }
        ] }
    ],
    "funcs": [
      { "name": "NewStruct", "params": [{"name": "v", "type": "int64"}], "results": ["*Struct"] },
      { "name": "Call", "params": [{"name": "g", "type": "Greeter"}], "results": ["string", "error"] }
    ],
    "vars": [{ "name": "Counter", "type": "int32" }]
  }]
}"#;

#[test]
fn lists_every_unit() {
    let units = Fixture::new(TESTPKG, options()).emit();
    let paths: Vec<String> = units.paths().map(|p| p.display().to_string()).collect();
    expect![[r#"
        [
            "java/go/testpkg/Greeter.java",
            "java/go/testpkg/Struct.java",
            "java/go/testpkg/Testpkg.java",
            "src/gobind/GoTestpkg.objc.h",
            "src/gobind/GoTestpkg.objc.m",
            "src/gobind/go_main.go",
            "src/gobind/go_testpkgmain.go",
            "src/gobind/java_testpkg.c",
            "src/gobind/testpkg.h",
        ]
    "#]]
    .assert_debug_eq(&paths);
}

#[test]
fn doc_comments_reach_every_backend() {
    let units = Fixture::new(TESTPKG, options()).emit();
    for path in [
        "java/go/testpkg/Struct.java",
        "src/gobind/GoTestpkg.objc.h",
        "src/gobind/go_testpkgmain.go",
    ] {
        assert!(
            unit(&units, path).contents.contains("This is a comment."),
            "{} lost the doc comment",
            path
        );
    }
}

#[test]
fn package_const_and_defined_type_docs_reach_every_backend() {
    let json = r#"{
      "packages": [{
        "path": "example.com/testpkg",
        "name": "testpkg",
        "doc": "Package testpkg measures things.",
        "types": [{ "name": "Celsius", "doc": "Celsius is a temperature.", "kind": "defined", "underlying": "float64" }],
        "consts": [{ "name": "Boiling", "doc": "Boiling is where water boils.", "type": "float64", "value": "100" }],
        "funcs": [{ "name": "Warm", "params": [{"name": "t", "type": "Celsius"}], "results": ["Celsius"] }]
      }]
    }"#;
    let units = Fixture::new(json, options()).emit();

    let java = &unit(&units, "java/go/testpkg/Testpkg.java").contents;
    let objc = &unit(&units, "src/gobind/GoTestpkg.objc.h").contents;
    let go = &unit(&units, "src/gobind/go_testpkgmain.go").contents;
    for doc in [
        "Package testpkg measures things.",
        "Celsius is a temperature.",
        "Boiling is where water boils.",
    ] {
        for (backend, contents) in [("java", java), ("objc", objc), ("go", go)] {
            assert!(contents.contains(doc), "{} lost {:?}", backend, doc);
        }
    }
    assert!(java.contains("// Celsius is bound as double."));
    assert!(objc.contains("typedef double GoTestpkgCelsius;"));
    assert!(go.contains("// testpkg.Celsius (type)"));
    assert!(go.contains("// testpkg.Boiling (constant)"));
}

#[test]
fn emission_is_deterministic() {
    let first = Fixture::new(TESTPKG, options()).emit();
    let second = Fixture::new(TESTPKG, options()).emit();
    assert_eq!(first, second);
}

#[test]
fn java_package_class() {
    let json = r#"{
      "packages": [{
        "path": "example.com/testpkg",
        "name": "testpkg",
        "doc": "Package testpkg is small.",
        "consts": [{ "name": "Answer", "type": "int64", "value": "42" }],
        "funcs": [{ "name": "Hello", "doc": "Hello greets.",
                    "params": [{"name": "who", "type": "string"}], "results": ["string", "error"] }]
      }]
    }"#;
    let units = Fixture::new(json, options()).emit();
    expect![[r#"
        // Code generated by mobind. DO NOT EDIT.

        // Java bindings for Go package example.com/testpkg.
        package go.testpkg;

        import java.lang.ref.Cleaner;
        import mobind.Seq;

        /**
         * Package testpkg is small.
         */
        public abstract class Testpkg {
        	static {
        		Seq.touch();
        		_init();
        	}

        	private Testpkg() {}

        	// Loads the package; bound types call this before first use.
        	public static void touch() {}

        	private static native void _init();

        	// Drops the references of collected proxies.
        	static final Cleaner CLEANER = Cleaner.create();

        	static native int __decRef(long refnum);

        	public static final long Answer = 42L;

        	/**
        	 * Hello greets.
        	 */
        	public static native String hello(String who) throws Exception;
        }
    "#]]
    .assert_eq(&unit(&units, "java/go/testpkg/Testpkg.java").contents);
}

#[test]
fn structs_get_constructors_accessors_and_release() {
    let units = Fixture::new(TESTPKG, options()).emit();
    let java = &unit(&units, "java/go/testpkg/Struct.java").contents;
    assert!(java.contains("public final class Struct implements Seq.Proxy {"));
    assert!(java.contains("public Struct(long v) {"));
    assert!(java.contains("private static native long __NewStruct(long v);"));
    assert!(java.contains("public final native long getValue();"));
    assert!(java.contains("public native long sum(java.nio.IntBuffer x) throws Exception;"));
    assert!(java.contains(
        "this.cleanable = Testpkg.CLEANER.register(this, () -> Testpkg.__decRef(handle));"
    ));
    assert!(java.contains("cleanable.clean();"));

    let header = &unit(&units, "src/gobind/GoTestpkg.objc.h").contents;
    assert!(header.contains("@interface GoTestpkgStruct : NSObject <MobindRef>"));
    assert!(header.contains("- (nullable instancetype)init:(int64_t)v;"));
    assert!(header.contains(
        "- (int64_t)sum:(NSMutableData*)x error:(NSError* _Nullable* _Nullable)error;"
    ));
    assert!(header.contains("+ (int32_t)counter;"));

    let jni = &unit(&units, "src/gobind/java_testpkg.c").contents;
    assert!(jni.contains("Java_go_testpkg_Struct__1_1NewStruct(JNIEnv* env, jclass clazz, jlong v)"));
    assert!(jni.contains("struct proxytestpkg_Struct_Sum_return res = proxytestpkg_Struct_Sum(refnum, _x);"));
    assert!(jni.contains("mobind_throw(env, res.r1);"));
    assert!(jni.contains(
        "JNIEXPORT jint JNICALL Java_go_testpkg_Testpkg__1_1decRef(JNIEnv* env, jclass clazz, jlong refnum) {"
    ));
    assert!(jni.contains("return (jint)mobind_ref_dec((int64_t)refnum);"));
}

#[test]
fn implementable_interfaces_get_trampolines_on_every_side() {
    let units = Fixture::new(TESTPKG, options()).emit();

    let java = &unit(&units, "java/go/testpkg/Greeter.java").contents;
    assert!(java.contains("abstract class Stub implements Greeter, Seq.Proxy {"));
    assert!(java.contains("static String __dispatch_greet(Greeter impl, String who) throws Exception {"));
    assert!(!java.contains("runOnMain"));

    let jni = &unit(&units, "src/gobind/java_testpkg.c").contents;
    assert!(jni.contains("return (jlong)mobind_register_testpkg_Greeter(refnum);"));
    assert!(jni.contains("cproxytestpkg_Greeter_Greet(int64_t refnum, nstring param_who)"));
    assert!(jni.contains("\"(Lgo/testpkg/Greeter;Ljava/lang/String;)Ljava/lang/String;\""));

    let glue = &unit(&units, "src/gobind/go_testpkgmain.go").contents;
    assert!(glue.contains("type proxytestpkg_Greeter ref"));
    assert!(glue.contains("func (p *proxytestpkg_Greeter) Greet(param_who string) (string, error) {"));
    assert!(glue.contains("_param_g = (*proxytestpkg_Greeter)(importRef(int64(param_g)))"));
    assert!(glue.contains(
        "\tif refnum >= 0 {\n\t\tpanic(\"mobind_register_testpkg_Greeter: not a handle of the other runtime\")\n\t}"
    ));
    assert!(!glue.contains("func main()"));

    let header = &unit(&units, "src/gobind/testpkg.h").contents;
    assert!(header.contains("struct cproxytestpkg_Greeter_Greet_return {"));
    assert!(header.contains("extern int64_t mobind_register_testpkg_Greeter(int64_t refnum);"));
}

#[test]
fn owner_thread_affinity_emits_redispatch() {
    let options = BindOptions {
        java_thread: ThreadAffinity::Main,
        objc_thread: ThreadAffinity::Main,
        ..options()
    };
    let units = Fixture::new(TESTPKG, options).emit();

    let java = &unit(&units, "java/go/testpkg/Greeter.java").contents;
    assert!(java.contains("if (!Seq.isMainThread()) {"));
    assert!(java.contains("return Seq.runOnMain(() -> impl.greet(who));"));

    let objc = &unit(&units, "src/gobind/GoTestpkg.objc.m").contents;
    assert!(objc.contains("dispatch_sync(dispatch_get_main_queue(), call);"));
}

#[test]
fn colliding_names_are_reported() {
    let json = r#"{
      "packages": [{
        "path": "example.com/testpkg",
        "name": "testpkg",
        "types": [{ "name": "Foo", "kind": "struct" }],
        "funcs": [{ "name": "Foo" }]
      }]
    }"#;
    let fixture = Fixture::new(json, options());
    let diagnostics = check_collisions(&fixture.ctx()).into_vec();
    assert_eq!(
        diagnostics,
        vec![BindDiagnostic::NameCollision {
            backend: Backend::ObjC,
            generated: "GoTestpkgFoo".into(),
            first: "type testpkg.Foo".into(),
            second: "func testpkg.Foo".into(),
        }]
    );
}

#[test]
fn implementations_are_unregistered_when_collected() {
    let units = Fixture::new(TESTPKG, options()).emit();

    let java = &unit(&units, "java/go/testpkg/Greeter.java").contents;
    assert!(java.contains("\t\t\tlong refnum = __register(this);"));
    assert!(java.contains(
        "this.cleanable = Testpkg.CLEANER.register(this, () -> __unregister(refnum));"
    ));
    assert!(java.contains("private static native void __unregister(long refnum);"));

    let jni = &unit(&units, "src/gobind/java_testpkg.c").contents;
    assert!(jni.contains(
        "JNIEXPORT void JNICALL Java_go_testpkg_Greeter_00024Stub__1_1unregister(JNIEnv* env, jclass clazz, jlong refnum) {\n\tmobind_ref_dec((int64_t)refnum);\n}"
    ));

    let objc = &unit(&units, "src/gobind/GoTestpkg.objc.m").contents;
    assert!(objc.contains("int64_t _g = mobind_objc_register_testpkg_Greeter(g);"));
    let start = objc.find("@interface MobindRegGoTestpkgGreeter").unwrap();
    let func = objc.find("int64_t mobind_objc_register_testpkg_Greeter(").unwrap();
    let end = func + objc[func..].find("\n}\n").unwrap() + 3;
    expect![[r#"
        @interface MobindRegGoTestpkgGreeter : NSObject
        @property(readonly) int64_t refnum;
        @end

        @implementation MobindRegGoTestpkgGreeter

        - (nonnull instancetype)initWithRefnum:(int64_t)refnum {
        	self = [super init];
        	if (self) {
        		_refnum = refnum;
        	}
        	return self;
        }

        - (void)dealloc {
        	mobind_ref_dec(_refnum);
        }

        @end

        static char MobindRegGoTestpkgGreeterKey;

        int64_t mobind_objc_register_testpkg_Greeter(id<GoTestpkgGreeter> obj) {
        	if (obj == nil) {
        		return 0;
        	}
        	if ([obj conformsToProtocol:@protocol(MobindRef)]) {
        		return mobind_from_objc(obj);
        	}
        	@synchronized (obj) {
        		MobindRegGoTestpkgGreeter* reg = objc_getAssociatedObject(obj, &MobindRegGoTestpkgGreeterKey);
        		if (reg == nil) {
        			int64_t refnum = mobind_register_testpkg_Greeter(mobind_from_objc(obj));
        			reg = [[MobindRegGoTestpkgGreeter alloc] initWithRefnum:refnum];
        			objc_setAssociatedObject(obj, &MobindRegGoTestpkgGreeterKey, reg, OBJC_ASSOCIATION_RETAIN_NONATOMIC);
        		}
        		mobind_ref_inc(reg.refnum);
        		return reg.refnum;
        	}
        }
    "#]]
    .assert_eq(&objc[start..end]);

    let header = &unit(&units, "src/gobind/GoTestpkg.objc.h").contents;
    assert!(header.contains(
        "FOUNDATION_EXPORT int64_t mobind_objc_register_testpkg_Greeter(id<GoTestpkgGreeter> _Nullable obj);"
    ));
}

/// Platform macro a C or Objective-C unit is compiled under, if its whole
/// body sits in one `#ifdef`.
fn platform_guard(contents: &str) -> Option<&str> {
    let open = contents.lines().find(|l| l.starts_with("#ifdef "))?;
    let guard = open.trim_start_matches("#ifdef ").trim();
    let closed = contents
        .trim_end()
        .lines()
        .last()
        .map_or(false, |l| l == format!("#endif // {}", guard));
    let first_code = contents
        .lines()
        .find(|l| !l.is_empty() && !l.starts_with("//"))?;
    (closed && first_code == open).then_some(guard)
}

#[test]
fn trampolines_are_defined_once_per_platform() {
    let units = Fixture::new(TESTPKG, options()).emit();
    let mut definers: std::collections::BTreeMap<String, Vec<(String, Option<String>)>> =
        Default::default();
    for u in units.iter() {
        let path = u.path.display().to_string();
        if !(path.ends_with(".c") || path.ends_with(".m")) {
            continue;
        }
        for line in u.contents.lines() {
            let Some(at) = line.find("cproxy") else {
                continue;
            };
            if line.starts_with(char::is_whitespace) || !line.ends_with(") {") {
                continue;
            }
            let name: String = line[at..]
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            definers
                .entry(name)
                .or_default()
                .push((path.clone(), platform_guard(&u.contents).map(str::to_string)));
        }
    }
    let greet = &definers["cproxytestpkg_Greeter_Greet"];
    assert_eq!(greet.len(), 2, "{:?}", greet);
    for (symbol, units) in &definers {
        if units.len() < 2 {
            continue;
        }
        let mut guards: Vec<&str> = units
            .iter()
            .map(|(path, guard)| {
                guard
                    .as_deref()
                    .unwrap_or_else(|| panic!("{} defines {} unguarded", path, symbol))
            })
            .collect();
        guards.sort_unstable();
        guards.dedup();
        assert_eq!(guards.len(), units.len(), "{} shares a platform: {:?}", symbol, units);
    }
    assert_eq!(
        platform_guard(&unit(&units, "src/gobind/java_testpkg.c").contents),
        Some("__ANDROID__")
    );
    assert_eq!(
        platform_guard(&unit(&units, "src/gobind/GoTestpkg.objc.m").contents),
        Some("__APPLE__")
    );
}
