//! The pair of reference tables shared by both runtimes.
//!
//! The exported table holds source objects referenced by target proxies;
//! the imported table holds target implementations referenced by source
//! wrappers. Generated glue talks to the process-wide instance returned by
//! [`global`]; tests build isolated bridges.
//!
//! Glue that keeps its objects in a map of its own installs a release hook
//! per side and drops the object when the hook reports the last reference
//! gone.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::affinity::Affinity;
use crate::dispatch::Implementation;
use crate::error::{RuntimeError, RuntimeResult};
use crate::handle::{Handle, Side};
use crate::proxy::ObjectProxy;
use crate::table::{RefEntry, RefObject, RefTable, ReferenceLeakWarning};
use crate::value::Value;

lazy_static! {
    static ref GLOBAL: Bridge = Bridge::new();
}

/// The process-wide bridge.
pub fn global() -> &'static Bridge {
    &GLOBAL
}

/// Called with a handle whose last reference was released.
pub type ReleaseHook = Arc<dyn Fn(Handle) + Send + Sync>;

#[derive(Default)]
struct Hooks {
    exported: Option<ReleaseHook>,
    imported: Option<ReleaseHook>,
}

pub struct Bridge {
    exported: Arc<RefTable>,
    imported: Arc<RefTable>,
    affinity: Affinity,
    hooks: RwLock<Hooks>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    pub fn new() -> Self {
        Self::with_affinity(Affinity::Caller)
    }

    /// A bridge whose implementation calls run under `affinity`.
    pub fn with_affinity(affinity: Affinity) -> Self {
        Bridge {
            exported: Arc::new(RefTable::new(Side::Exported)),
            imported: Arc::new(RefTable::new(Side::Imported)),
            affinity,
            hooks: RwLock::new(Hooks::default()),
        }
    }

    pub fn exported(&self) -> &Arc<RefTable> {
        &self.exported
    }

    pub fn imported(&self) -> &Arc<RefTable> {
        &self.imported
    }

    fn table_for(&self, handle: Handle) -> RuntimeResult<&Arc<RefTable>> {
        match handle.side() {
            Some(Side::Exported) => Ok(&self.exported),
            Some(Side::Imported) => Ok(&self.imported),
            None => Err(RuntimeError::HandleNotFound(handle)),
        }
    }

    /// Exposes a source object to the target runtime.
    pub fn expose(&self, object: RefObject, tag: impl Into<String>) -> RuntimeResult<Handle> {
        self.exported.expose(object, tag)
    }

    /// Looks up a live entry on either side.
    pub fn get(&self, handle: Handle) -> RuntimeResult<Arc<RefEntry>> {
        self.table_for(handle)?.get(handle)
    }

    pub fn retain(&self, handle: Handle) -> RuntimeResult<u32> {
        self.table_for(handle)?.retain(handle)
    }

    /// Drops one reference. This is what target finalizers call. The
    /// side's release hook runs once the count reaches zero.
    pub fn release(&self, handle: Handle) -> RuntimeResult<u32> {
        let remaining = self.table_for(handle)?.release(handle)?;
        if remaining == 0 {
            self.released(handle);
        }
        Ok(remaining)
    }

    /// Installs (or with `None`, removes) the hook told about handles of
    /// `side` whose last reference is gone.
    pub fn set_release_hook(&self, side: Side, hook: Option<ReleaseHook>) {
        let mut hooks = self.hooks.write();
        match side {
            Side::Exported => hooks.exported = hook,
            Side::Imported => hooks.imported = hook,
        }
    }

    fn released(&self, handle: Handle) {
        let hook = {
            let hooks = self.hooks.read();
            match handle.side() {
                Some(Side::Exported) => hooks.exported.clone(),
                Some(Side::Imported) => hooks.imported.clone(),
                None => None,
            }
        };
        // Hooks may call back into the bridge, so no lock is held here.
        if let Some(hook) = hook {
            log::trace!("Running release hook for {}", handle);
            hook(handle);
        }
    }

    /// Wraps an exported handle in a proxy owning one reference.
    pub fn proxy(&self, handle: Handle) -> RuntimeResult<ObjectProxy> {
        self.exported.get(handle)?;
        Ok(ObjectProxy::adopt(self.exported.clone(), handle))
    }

    /// Registers a target implementation so source code can call it.
    pub fn register(&self, implementation: Implementation) -> RuntimeResult<Handle> {
        let tag = implementation.interface().to_string();
        let handle = self
            .imported
            .expose(RefObject::Impl(Arc::new(implementation)), tag)?;
        log::debug!("Registered implementation {}", handle);
        Ok(handle)
    }

    /// Calls `method` on a registered implementation. A failure raised by
    /// the implementation comes back as `CallFailed`.
    pub fn invoke(&self, handle: Handle, method: &str, args: &[Value]) -> RuntimeResult<Value> {
        let entry = self.imported.get(handle)?;
        let implementation = match &entry.object {
            RefObject::Impl(implementation) => implementation.clone(),
            other => {
                return Err(RuntimeError::WrongKind {
                    handle,
                    expected: "implementation",
                    found: other.kind_name(),
                })
            }
        };
        let trampoline = implementation.trampoline(method)?;
        let args = args.to_vec();
        let outcome = self.affinity.run(move || trampoline(&args))?;
        outcome.map_err(|failure| {
            log::debug!("{}.{} raised {:?}", implementation.interface(), method, failure);
            RuntimeError::CallFailed(failure.message().to_string())
        })
    }

    /// Drops the registration of a finalized implementation. Later calls
    /// through `handle` fail with `HandleNotFound`.
    pub fn unregister(&self, handle: Handle) -> RuntimeResult<()> {
        if handle.side() != Some(Side::Imported) {
            return Err(RuntimeError::HandleNotFound(handle));
        }
        if self.release(handle)? == 0 {
            self.imported.reclaim();
        }
        Ok(())
    }

    /// Reclaims released entries on both sides.
    pub fn collect(&self) -> usize {
        self.exported.reclaim() + self.imported.reclaim()
    }

    /// Live entries on both sides.
    pub fn live(&self) -> usize {
        self.exported.live() + self.imported.live()
    }

    /// Reports every entry still live; meant for teardown checks.
    pub fn leak_check(&self) -> Vec<ReferenceLeakWarning> {
        let mut leaks = self.exported.leaks();
        leaks.extend(self.imported.leaks());
        for leak in &leaks {
            log::warn!(
                "Reference leak: {} ({}) still has {} reference(s)",
                leak.handle,
                leak.tag,
                leak.count
            );
        }
        leaks
    }
}
