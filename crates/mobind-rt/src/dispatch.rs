//! Per-method dispatch tables of target-side implementations.

use std::fmt;
use std::sync::Arc;

use fxhash::FxHashMap;

use crate::error::{RuntimeError, RuntimeResult};
use crate::translate::TargetFailure;
use crate::value::Value;

/// Entry point into one method of a target-side implementation.
pub type Trampoline = Arc<dyn Fn(&[Value]) -> Result<Value, TargetFailure> + Send + Sync>;

/// A target object implementing a source interface, as a table of
/// trampolines keyed by method name.
pub struct Implementation {
    interface: String,
    methods: FxHashMap<String, Trampoline>,
}

impl Implementation {
    pub fn builder(interface: impl Into<String>) -> ImplementationBuilder {
        ImplementationBuilder {
            interface: interface.into(),
            methods: FxHashMap::default(),
        }
    }

    /// Qualified name of the implemented interface.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn trampoline(&self, method: &str) -> RuntimeResult<Trampoline> {
        self.methods
            .get(method)
            .cloned()
            .ok_or_else(|| RuntimeError::MethodNotFound {
                interface: self.interface.clone(),
                method: method.to_string(),
            })
    }

    /// Calls `method` on the current thread.
    pub fn call(&self, method: &str, args: &[Value]) -> RuntimeResult<Result<Value, TargetFailure>> {
        let trampoline = self.trampoline(method)?;
        Ok(trampoline(args))
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("Implementation")
            .field("interface", &self.interface)
            .field("methods", &methods)
            .finish()
    }
}

pub struct ImplementationBuilder {
    interface: String,
    methods: FxHashMap<String, Trampoline>,
}

impl ImplementationBuilder {
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, TargetFailure> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    pub fn build(self) -> Implementation {
        Implementation {
            interface: self.interface,
            methods: self.methods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_method_name() {
        let greeter = Implementation::builder("testpkg.Greeter")
            .method("Greet", |args| {
                let who = args.first().and_then(Value::as_str).unwrap_or("nobody");
                Ok(Value::from(format!("hello {}", who)))
            })
            .build();

        assert_eq!(greeter.interface(), "testpkg.Greeter");
        assert_eq!(
            greeter.call("Greet", &[Value::from("gopher")]).unwrap(),
            Ok(Value::from("hello gopher"))
        );
        assert_eq!(
            greeter.call("Wave", &[]).unwrap_err(),
            RuntimeError::MethodNotFound {
                interface: "testpkg.Greeter".into(),
                method: "Wave".into()
            }
        );
    }
}
