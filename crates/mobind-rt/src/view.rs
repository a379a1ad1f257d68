//! Zero-copy views over numeric source buffers.
//!
//! The source side owns a `PinnedBuffer`. Views handed to the target share
//! its storage, so writes through a view are visible to the source. While
//! any view exists the buffer is pinned and cannot be resized.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{RuntimeError, RuntimeResult};

struct Shared<T> {
    data: RwLock<Vec<T>>,
    pins: AtomicUsize,
}

pub struct PinnedBuffer<T: Copy> {
    shared: Arc<Shared<T>>,
}

impl<T: Copy + Default> PinnedBuffer<T> {
    pub fn new(data: Vec<T>) -> Self {
        PinnedBuffer {
            shared: Arc::new(Shared {
                data: RwLock::new(data),
                pins: AtomicUsize::new(0),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.shared.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pins(&self) -> usize {
        self.shared.pins.load(Ordering::Acquire)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.shared.data.read().clone()
    }

    /// Pins the buffer and returns a view over it.
    pub fn view(&self) -> SliceView<T> {
        self.shared.pins.fetch_add(1, Ordering::AcqRel);
        SliceView {
            shared: self.shared.clone(),
        }
    }

    pub fn resize(&self, len: usize) -> RuntimeResult<()> {
        let mut data = self.shared.data.write();
        let pins = self.pins();
        if pins > 0 {
            return Err(RuntimeError::Pinned(pins));
        }
        data.resize(len, T::default());
        Ok(())
    }
}

/// A target view of a pinned buffer. Unpins on drop.
pub struct SliceView<T: Copy> {
    shared: Arc<Shared<T>>,
}

impl<T: Copy> SliceView<T> {
    pub fn len(&self) -> usize {
        self.shared.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> RuntimeResult<T> {
        let data = self.shared.data.read();
        data.get(index).copied().ok_or(RuntimeError::IndexOutOfRange {
            index,
            len: data.len(),
        })
    }

    pub fn set(&self, index: usize, value: T) -> RuntimeResult<()> {
        let mut data = self.shared.data.write();
        let len = data.len();
        let slot = data
            .get_mut(index)
            .ok_or(RuntimeError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Runs `f` over the whole view without copying.
    pub fn with_slice<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.shared.data.read())
    }

    pub fn with_slice_mut<R>(&self, f: impl FnOnce(&mut [T]) -> R) -> R {
        f(&mut self.shared.data.write())
    }
}

impl<T: Copy> Drop for SliceView<T> {
    fn drop(&mut self) {
        self.shared.pins.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_through_views_are_visible_to_the_source() {
        let buffer = PinnedBuffer::new(vec![1u8, 2, 3]);
        let view = buffer.view();
        view.set(1, 20).unwrap();
        view.with_slice_mut(|s| s[2] = 30);
        assert_eq!(buffer.to_vec(), vec![1, 20, 30]);
        assert_eq!(view.with_slice(|s| s.iter().map(|&b| u32::from(b)).sum::<u32>()), 51);
    }

    #[test]
    fn pinned_buffers_cannot_resize() {
        let buffer = PinnedBuffer::new(vec![0i64; 4]);
        let a = buffer.view();
        let b = buffer.view();
        assert_eq!(buffer.resize(8), Err(RuntimeError::Pinned(2)));
        drop(a);
        drop(b);
        buffer.resize(8).unwrap();
        assert_eq!(buffer.len(), 8);
    }
}
