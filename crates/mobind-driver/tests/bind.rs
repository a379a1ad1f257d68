use std::fs;
use std::path::Path;

use mobind_driver::{bind, DriverError, Generator};
use mobind_rt::abi;
use mobind_source::{Backend, BindDiagnostic, BindOptions, DiagnosticKind, ExportData};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn options(out_dir: &Path, targets: &[Backend]) -> BindOptions {
    BindOptions {
        targets: targets.to_vec(),
        java_package_prefix: "go".into(),
        objc_prefix: "Go".into(),
        out_dir: out_dir.to_path_buf(),
        version_banner: false,
        ..BindOptions::default()
    }
}

fn data(json: &str) -> ExportData {
    ExportData::from_json(json).unwrap()
}

fn files_under(dir: &Path) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(next) = stack.pop() {
        for entry in fs::read_dir(&next).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path.strip_prefix(dir).unwrap().display().to_string());
            }
        }
    }
    out.sort();
    out
}

const GREETER: &str = r#"{
  "packages": [{
    "path": "example.com/testpkg",
    "name": "testpkg",
    "types": [
      { "name": "Struct", "doc": "This is a comment.", "kind": "struct",
        "fields": [{ "name": "Name", "type": "string" }] },
      { "name": "Greeter", "kind": "interface",
        "methods": [{ "name": "Greet", "params": [{"name": "who", "type": "string"}], "results": ["string"] }] }
    ],
    "funcs": [{ "name": "Hello", "params": [{"name": "g", "type": "Greeter"}], "results": ["string", "error"] }]
  }]
}"#;

#[test]
fn writes_java_objc_and_glue() {
    init_logger();
    let out = tempfile::tempdir().unwrap();
    let report = bind(options(out.path(), &[Backend::Java, Backend::ObjC]), &data(GREETER)).unwrap();
    assert!(report.diagnostics.is_empty());
    assert_eq!(
        files_under(out.path()),
        vec![
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
    );
    assert_eq!(report.written.len(), 9);
}

#[test]
fn regeneration_is_byte_identical() {
    init_logger();
    let out = tempfile::tempdir().unwrap();
    let opts = options(out.path(), &[Backend::Java, Backend::ObjC]);
    bind(opts.clone(), &data(GREETER)).unwrap();
    let first: Vec<(String, Vec<u8>)> = files_under(out.path())
        .into_iter()
        .map(|f| {
            let bytes = fs::read(out.path().join(&f)).unwrap();
            (f, bytes)
        })
        .collect();

    bind(opts, &data(GREETER)).unwrap();
    for (file, bytes) in &first {
        assert_eq!(&fs::read(out.path().join(file)).unwrap(), bytes, "{} changed", file);
    }
    assert_eq!(files_under(out.path()).len(), first.len());
}

#[test]
fn unsupported_type_on_one_backend_writes_nothing() {
    init_logger();
    let out = tempfile::tempdir().unwrap();
    let json = r#"{
      "packages": [{
        "path": "example.com/testpkg",
        "name": "testpkg",
        "funcs": [
          { "name": "Hash", "params": [{"name": "v", "type": "uint64"}] },
          { "name": "Fine", "results": ["int32"] }
        ]
      }]
    }"#;
    let err = bind(options(out.path(), &[Backend::Java, Backend::ObjC]), &data(json)).unwrap_err();

    let errors: Vec<&BindDiagnostic> = err.diagnostics().iter().filter(|d| d.is_error()).collect();
    assert_eq!(errors.len(), 1);
    match errors[0] {
        BindDiagnostic::UnsupportedOnBackend { decl, ty, backend, .. } => {
            assert!(decl.contains("Hash"), "{}", decl);
            assert_eq!(ty, "uint64");
            assert_eq!(*backend, Backend::Java);
        }
        other => panic!("unexpected diagnostic {:?}", other),
    }
    assert!(files_under(out.path()).is_empty());
}

#[test]
fn name_collision_aborts_before_emission() {
    init_logger();
    let out = tempfile::tempdir().unwrap();
    let json = r#"{
      "packages": [{
        "path": "example.com/testpkg",
        "name": "testpkg",
        "types": [{ "name": "Foo", "kind": "struct" }],
        "funcs": [{ "name": "Foo" }]
      }]
    }"#;
    let err = bind(options(out.path(), &[Backend::ObjC]), &data(json)).unwrap_err();
    assert!(matches!(err, DriverError::Aborted { errors: 1, .. }));
    assert_eq!(err.diagnostics()[0].kind(), DiagnosticKind::NameCollision);
    assert!(files_under(out.path()).is_empty());
}

#[test]
fn every_error_is_reported_together_with_warnings() {
    init_logger();
    let json = r#"{
      "packages": [{
        "path": "example.com/testpkg",
        "name": "testpkg",
        "funcs": [
          { "name": "A", "params": [{"name": "c", "type": "chan int"}] },
          { "name": "B", "params": [{"name": "n", "type": "uint32"}] },
          { "name": "C", "results": ["uintptr"] }
        ]
      }]
    }"#;
    let generator = Generator::new(options(Path::new("unused"), &[Backend::Java]));
    let err = generator.generate(&data(json)).unwrap_err();
    assert!(matches!(err, DriverError::Aborted { errors: 2, .. }));
    // The excluded channel parameter is carried along as a warning.
    assert_eq!(err.diagnostics().len(), 3);
}

#[test]
fn excluded_declarations_do_not_hide_backend_errors() {
    init_logger();
    let json = r#"{
      "packages": [{
        "path": "example.com/p",
        "name": "p",
        "types": [{ "name": "Bad", "kind": "defined", "underlying": "chan int" }],
        "funcs": [
          { "name": "UsesBad", "params": [{"name": "b", "type": "Bad"}] },
          { "name": "Wide", "params": [{"name": "x", "type": "uint32"}] }
        ]
      }]
    }"#;
    let generator = Generator::new(options(Path::new("unused"), &[Backend::Java]));
    let err = generator.generate(&data(json)).unwrap_err();
    assert!(matches!(err, DriverError::Aborted { errors: 2, .. }));

    let diagnostics = err.diagnostics();
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, BindDiagnostic::Excluded { decl, .. } if decl.contains("Bad"))));
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        BindDiagnostic::UnsupportedConstruct { decl, .. } if decl == "func p.UsesBad"
    )));
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        BindDiagnostic::UnsupportedOnBackend { decl, ty, backend: Backend::Java, .. }
            if decl == "func p.Wide" && ty == "uint32"
    )));
}

#[test]
fn every_runtime_call_goes_through_one_table() {
    init_logger();
    let generator = Generator::new(options(Path::new("unused"), &[Backend::Java, Backend::ObjC]));
    let output = generator.generate(&data(GREETER)).unwrap();
    let unit = |suffix: &str| -> String {
        let found = output.units.iter().find(|u| u.path.to_string_lossy().ends_with(suffix));
        found.unwrap_or_else(|| panic!("no unit ending in {}", suffix)).contents.clone()
    };

    let go_main = unit("go_main.go");
    for symbol in [abi::EXPORT, abi::REF_INC, abi::REF_DEC, abi::SET_RELEASE_HOOK] {
        assert!(go_main.contains(&format!("{}(", symbol)), "go_main.go never calls {}", symbol);
    }
    assert!(unit("java_testpkg.c").contains(&format!("{}(", abi::REF_DEC)));
    assert!(unit("GoTestpkg.objc.m").contains(&format!("{}(", abi::REF_DEC)));

    for unit in output.units.iter() {
        let text = &unit.contents;
        for legacy in ["seq.ToRefnum", "seq.FromRefnum", "seq.ImportRef", "Seq.track", "Seq.release"] {
            assert!(!text.contains(legacy), "{} still uses {}", unit.path.display(), legacy);
        }
        for word in text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')) {
            let runtime = word.starts_with("mobind_ref_") || word == "mobind_export" || word == "mobind_import";
            if runtime {
                assert!(abi::SYMBOLS.contains(&word), "{} calls unknown {}", unit.path.display(), word);
            }
        }
    }
    for symbol in abi::ALLOCATE.iter().chain(abi::RELEASE.iter()) {
        assert!(abi::SYMBOLS.contains(symbol));
    }
}

#[test]
fn glue_is_always_generated() {
    let generator = Generator::new(options(Path::new("unused"), &[Backend::Java]));
    assert_eq!(generator.options().targets, vec![Backend::Java, Backend::Go]);
}
