//! Generated names for each backend.

use mobind_ir::{title_case, PackageSet, TypeName};
use mobind_source::{Backend, BindOptions};

/// Namespacing options shared by the mapping engine and the emitters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Naming {
    pub java_package_prefix: String,
    pub objc_prefix: String,
}

impl Naming {
    pub fn new(java_package_prefix: impl Into<String>, objc_prefix: impl Into<String>) -> Self {
        Naming {
            java_package_prefix: java_package_prefix.into(),
            objc_prefix: objc_prefix.into(),
        }
    }

    pub fn from_options(options: &BindOptions) -> Self {
        Naming::new(options.java_package_prefix.clone(), options.objc_prefix.clone())
    }

    /// Java package of a bound package: `go.testpkg` for prefix `go`.
    pub fn java_package(&self, pkg: &str) -> String {
        if self.java_package_prefix.is_empty() {
            pkg.to_string()
        } else {
            format!("{}.{}", self.java_package_prefix, pkg)
        }
    }

    /// Class holding package-level funcs, constants and variables.
    pub fn java_package_class(&self, pkg: &str) -> String {
        title_case(pkg)
    }

    pub fn java_class(&self, pkg: &str, name: &str) -> String {
        format!("{}.{}", self.java_package(pkg), name)
    }

    /// Prefix of every Objective-C symbol of a package: `GoTestpkg`.
    pub fn objc_package(&self, pkg: &str) -> String {
        format!("{}{}", self.objc_prefix, title_case(pkg))
    }

    pub fn objc_type(&self, pkg: &str, name: &str) -> String {
        format!("{}{}", self.objc_package(pkg), name)
    }

    /// Source-side proxy type for a target-implemented interface.
    pub fn go_proxy(&self, pkg: &str, name: &str) -> String {
        format!("proxy{}_{}", pkg, name)
    }

    /// Exported C symbol of a package function.
    pub fn go_func_symbol(&self, pkg: &str, func: &str) -> String {
        format!("proxy{}__{}", pkg, func)
    }

    /// Exported C symbol of a method or field accessor.
    pub fn go_member_symbol(&self, pkg: &str, owner: &str, member: &str) -> String {
        format!("proxy{}_{}_{}", pkg, owner, member)
    }

    /// The generated name of a declared type on `backend`.
    pub fn type_name(&self, backend: Backend, pkg: &str, name: &str) -> String {
        match backend {
            Backend::Java => self.java_class(pkg, name),
            Backend::ObjC => self.objc_type(pkg, name),
            Backend::Go => self.go_proxy(pkg, name),
        }
    }
}

/// Package identifier of a type name, falling back to the last path segment
/// for names outside the run.
pub fn package_name<'a>(set: &'a PackageSet, name: &'a TypeName) -> &'a str {
    match set.package(&name.package) {
        Some(pkg) => &pkg.name,
        None => name.package.rsplit('/').next().unwrap_or(&name.package),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_apply_per_backend() {
        let naming = Naming::new("go", "Go");
        assert_eq!(naming.java_package("testpkg"), "go.testpkg");
        assert_eq!(naming.java_package_class("testpkg"), "Testpkg");
        assert_eq!(naming.objc_type("testpkg", "Node"), "GoTestpkgNode");
        assert_eq!(naming.go_proxy("testpkg", "Greeter"), "proxytestpkg_Greeter");
        assert_eq!(naming.go_func_symbol("testpkg", "Hello"), "proxytestpkg__Hello");

        let bare = Naming::default();
        assert_eq!(bare.java_class("testpkg", "Node"), "testpkg.Node");
        assert_eq!(bare.objc_type("testpkg", "Node"), "TestpkgNode");
    }
}
