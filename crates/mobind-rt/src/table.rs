//! The reference table.
//!
//! Maps handles to shared objects with an atomic reference count. Count
//! updates only take the read lock; inserting and reclaiming entries take
//! the write lock. An entry whose count drops to zero is queued for
//! reclamation and dies: it can no longer be retained, and exposing the
//! same object again allocates a fresh handle. Handles come from a
//! monotonic counter and are never reused.

use std::any::Any;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;

use crossbeam_queue::SegQueue;
use fxhash::FxHashMap;
use parking_lot::RwLock;

use crate::dispatch::Implementation;
use crate::error::{RuntimeError, RuntimeResult};
use crate::handle::{Handle, Side};
use crate::proxy::{SourceList, SourceMap};

/// Queue length above which `expose` reclaims on its way.
const RECLAIM_BATCH: usize = 64;

/// An object referenced through the table.
#[derive(Clone)]
pub enum RefObject {
    Opaque(Arc<dyn Any + Send + Sync>),
    List(Arc<dyn SourceList>),
    Map(Arc<dyn SourceMap>),
    /// A target-side implementation of an interface.
    Impl(Arc<Implementation>),
}

impl RefObject {
    pub fn kind_name(&self) -> &'static str {
        match self {
            RefObject::Opaque(_) => "object",
            RefObject::List(_) => "list",
            RefObject::Map(_) => "map",
            RefObject::Impl(_) => "implementation",
        }
    }

    /// Address of the shared allocation, used to recognize re-exposure.
    fn identity(&self) -> usize {
        match self {
            RefObject::Opaque(o) => Arc::as_ptr(o) as *const () as usize,
            RefObject::List(o) => Arc::as_ptr(o) as *const () as usize,
            RefObject::Map(o) => Arc::as_ptr(o) as *const () as usize,
            RefObject::Impl(o) => Arc::as_ptr(o) as *const () as usize,
        }
    }
}

pub struct RefEntry {
    pub object: RefObject,
    /// Source type name, for diagnostics.
    pub tag: String,
    count: AtomicU32,
}

impl RefEntry {
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    fn is_live(&self) -> bool {
        self.count() > 0
    }

    /// Increments unless the entry already died.
    fn try_retain(&self) -> Option<u32> {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                (c > 0).then(|| c + 1)
            })
            .ok()
            .map(|prev| prev + 1)
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match &self.object {
            RefObject::Opaque(o) => o.clone().downcast::<T>().ok(),
            _ => None,
        }
    }
}

/// A live entry that outlived its expected teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLeakWarning {
    pub handle: Handle,
    pub tag: String,
    pub count: u32,
}

#[derive(Default)]
struct Slots {
    entries: FxHashMap<Handle, Arc<RefEntry>>,
    by_identity: FxHashMap<usize, Handle>,
}

pub struct RefTable {
    side: Side,
    next: AtomicI64,
    slots: RwLock<Slots>,
    quarantine: SegQueue<Handle>,
}

impl RefTable {
    pub fn new(side: Side) -> Self {
        RefTable {
            side,
            next: AtomicI64::new(1),
            slots: RwLock::new(Slots::default()),
            quarantine: SegQueue::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    fn allocate(&self) -> RuntimeResult<Handle> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        if n <= 0 || n == i64::MAX {
            return Err(RuntimeError::HandlesExhausted);
        }
        Ok(self.side.handle(n))
    }

    /// Exposes an object across the boundary with one reference. Exposing
    /// an object that is still live returns its existing handle with the
    /// count incremented.
    pub fn expose(&self, object: RefObject, tag: impl Into<String>) -> RuntimeResult<Handle> {
        let identity = object.identity();
        let mut slots = self.slots.write();

        if self.quarantine.len() > RECLAIM_BATCH {
            self.reclaim_locked(&mut slots);
        }

        if let Some(handle) = slots.by_identity.get(&identity).copied() {
            if let Some(entry) = slots.entries.get(&handle) {
                if let Some(count) = entry.try_retain() {
                    log::trace!("Re-exposed {} ({}), count {}", handle, entry.tag, count);
                    return Ok(handle);
                }
            }
        }

        let handle = self.allocate()?;
        let tag = tag.into();
        log::trace!("Exposed {} as {}", tag, handle);
        slots.entries.insert(
            handle,
            Arc::new(RefEntry {
                object,
                tag,
                count: AtomicU32::new(1),
            }),
        );
        slots.by_identity.insert(identity, handle);
        Ok(handle)
    }

    /// Looks up a live entry. The returned `Arc` keeps the object alive for
    /// the duration of a call even if the handle is released meanwhile.
    pub fn get(&self, handle: Handle) -> RuntimeResult<Arc<RefEntry>> {
        let slots = self.slots.read();
        match slots.entries.get(&handle) {
            Some(entry) if entry.is_live() => Ok(entry.clone()),
            _ => Err(RuntimeError::HandleNotFound(handle)),
        }
    }

    /// Adds a reference, returning the new count.
    pub fn retain(&self, handle: Handle) -> RuntimeResult<u32> {
        let slots = self.slots.read();
        slots
            .entries
            .get(&handle)
            .and_then(|entry| entry.try_retain())
            .ok_or(RuntimeError::HandleNotFound(handle))
    }

    /// Drops a reference, returning the remaining count. At zero the handle
    /// is queued for reclamation.
    pub fn release(&self, handle: Handle) -> RuntimeResult<u32> {
        let slots = self.slots.read();
        let entry = slots
            .entries
            .get(&handle)
            .ok_or(RuntimeError::HandleNotFound(handle))?;
        let prev = entry
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1))
            .map_err(|_| RuntimeError::DoubleRelease(handle))?;
        if prev == 1 {
            log::trace!("Released last reference to {} ({})", handle, entry.tag);
            self.quarantine.push(handle);
        }
        Ok(prev - 1)
    }

    /// Removes every queued entry whose count is confirmed zero.
    pub fn reclaim(&self) -> usize {
        let mut slots = self.slots.write();
        self.reclaim_locked(&mut slots)
    }

    fn reclaim_locked(&self, slots: &mut Slots) -> usize {
        let mut reclaimed = 0;
        while let Some(handle) = self.quarantine.pop() {
            let dead = slots.entries.get(&handle).map_or(false, |e| !e.is_live());
            if !dead {
                continue;
            }
            if let Some(entry) = slots.entries.remove(&handle) {
                let identity = entry.object.identity();
                if slots.by_identity.get(&identity) == Some(&handle) {
                    slots.by_identity.remove(&identity);
                }
                reclaimed += 1;
            }
        }
        if reclaimed > 0 {
            log::debug!("Reclaimed {} {:?} handle(s)", reclaimed, self.side);
        }
        reclaimed
    }

    /// Number of entries with a positive count.
    pub fn live(&self) -> usize {
        self.slots
            .read()
            .entries
            .values()
            .filter(|e| e.is_live())
            .count()
    }

    /// Number of entries, including released ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.slots.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports live entries, sorted by handle.
    pub fn leaks(&self) -> Vec<ReferenceLeakWarning> {
        let slots = self.slots.read();
        let mut leaks: Vec<ReferenceLeakWarning> = slots
            .entries
            .iter()
            .filter(|(_, e)| e.is_live())
            .map(|(handle, e)| ReferenceLeakWarning {
                handle: *handle,
                tag: e.tag.clone(),
                count: e.count(),
            })
            .collect();
        leaks.sort_by_key(|l| l.handle);
        leaks
    }
}
