//! Handle-backed proxies.
//!
//! A proxy is what the target runtime holds in place of a source object.
//! Every operation goes through the reference table by handle, so list and
//! map element access is one boundary call per element with no bulk copy.
//! Dropping a proxy releases its reference; `release` does the same
//! explicitly and reports errors instead of logging them.

use std::sync::Arc;

use fxhash::FxHashMap;
use parking_lot::RwLock;

use crate::error::{RuntimeError, RuntimeResult};
use crate::handle::Handle;
use crate::table::{RefEntry, RefObject, RefTable};
use crate::value::Value;

/// An index-addressed source slice.
pub trait SourceList: Send + Sync {
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> RuntimeResult<Value>;
    fn set(&self, index: usize, value: Value) -> RuntimeResult<()>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A source map. Iteration order is unspecified.
pub trait SourceMap: Send + Sync {
    fn len(&self) -> usize;
    fn get(&self, key: &Value) -> Option<Value>;
    fn put(&self, key: Value, value: Value);
    fn delete(&self, key: &Value) -> Option<Value>;
    fn keys(&self) -> Vec<Value>;
}

/// A slice owned by the source runtime.
#[derive(Default)]
pub struct VecList {
    items: RwLock<Vec<Value>>,
}

impl VecList {
    pub fn new(items: Vec<Value>) -> Self {
        VecList {
            items: RwLock::new(items),
        }
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.items.read().clone()
    }
}

impl SourceList for VecList {
    fn len(&self) -> usize {
        self.items.read().len()
    }

    fn get(&self, index: usize) -> RuntimeResult<Value> {
        let items = self.items.read();
        items.get(index).cloned().ok_or(RuntimeError::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }

    fn set(&self, index: usize, value: Value) -> RuntimeResult<()> {
        let mut items = self.items.write();
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or(RuntimeError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }
}

/// A map owned by the source runtime.
#[derive(Default)]
pub struct HashMapSource {
    entries: RwLock<FxHashMap<Value, Value>>,
}

impl HashMapSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceMap for HashMapSource {
    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn get(&self, key: &Value) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn put(&self, key: Value, value: Value) {
        self.entries.write().insert(key, value);
    }

    fn delete(&self, key: &Value) -> Option<Value> {
        self.entries.write().remove(key)
    }

    fn keys(&self) -> Vec<Value> {
        self.entries.read().keys().cloned().collect()
    }
}

/// Shared reference-holding part of every proxy.
pub struct ObjectProxy {
    table: Arc<RefTable>,
    handle: Handle,
    released: bool,
}

impl ObjectProxy {
    /// Takes ownership of one reference to `handle`.
    pub fn adopt(table: Arc<RefTable>, handle: Handle) -> Self {
        ObjectProxy {
            table,
            handle,
            released: false,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn entry(&self) -> RuntimeResult<Arc<RefEntry>> {
        self.table.get(self.handle)
    }

    /// Gives up the reference now instead of at drop.
    pub fn release(mut self) -> RuntimeResult<u32> {
        self.released = true;
        self.table.release(self.handle)
    }
}

impl Drop for ObjectProxy {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.table.release(self.handle) {
            log::error!("Finalizing proxy for {}: {}", self.handle, err);
        }
    }
}

fn wrong_kind(handle: Handle, expected: &'static str, found: &RefObject) -> RuntimeError {
    RuntimeError::WrongKind {
        handle,
        expected,
        found: found.kind_name(),
    }
}

/// Target view of a source slice of composite elements.
pub struct ListProxy {
    inner: ObjectProxy,
}

impl ListProxy {
    pub fn adopt(table: Arc<RefTable>, handle: Handle) -> Self {
        ListProxy {
            inner: ObjectProxy::adopt(table, handle),
        }
    }

    pub fn handle(&self) -> Handle {
        self.inner.handle()
    }

    fn list(&self) -> RuntimeResult<Arc<dyn SourceList>> {
        let entry = self.inner.entry()?;
        match &entry.object {
            RefObject::List(list) => Ok(list.clone()),
            other => Err(wrong_kind(self.handle(), "list", other)),
        }
    }

    pub fn len(&self) -> RuntimeResult<usize> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> RuntimeResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, index: usize) -> RuntimeResult<Value> {
        self.list()?.get(index)
    }

    pub fn set(&self, index: usize, value: Value) -> RuntimeResult<()> {
        self.list()?.set(index, value)
    }

    pub fn release(self) -> RuntimeResult<u32> {
        self.inner.release()
    }
}

/// Target view of a source map.
pub struct MapProxy {
    inner: ObjectProxy,
}

impl MapProxy {
    pub fn adopt(table: Arc<RefTable>, handle: Handle) -> Self {
        MapProxy {
            inner: ObjectProxy::adopt(table, handle),
        }
    }

    pub fn handle(&self) -> Handle {
        self.inner.handle()
    }

    fn map(&self) -> RuntimeResult<Arc<dyn SourceMap>> {
        let entry = self.inner.entry()?;
        match &entry.object {
            RefObject::Map(map) => Ok(map.clone()),
            other => Err(wrong_kind(self.handle(), "map", other)),
        }
    }

    pub fn len(&self) -> RuntimeResult<usize> {
        Ok(self.map()?.len())
    }

    pub fn get(&self, key: &Value) -> RuntimeResult<Option<Value>> {
        Ok(self.map()?.get(key))
    }

    pub fn put(&self, key: Value, value: Value) -> RuntimeResult<()> {
        self.map()?.put(key, value);
        Ok(())
    }

    pub fn delete(&self, key: &Value) -> RuntimeResult<Option<Value>> {
        Ok(self.map()?.delete(key))
    }

    pub fn keys(&self) -> RuntimeResult<Vec<Value>> {
        Ok(self.map()?.keys())
    }

    pub fn release(self) -> RuntimeResult<u32> {
        self.inner.release()
    }
}
