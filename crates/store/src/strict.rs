//! §4.I Strict Variant — a store that refuses to read past its current
//! logical size instead of zero-filling the tail.

use std::ops::{Deref, DerefMut};

use common::{StoreError, StoreResult};

use crate::backend::Backend;
use crate::store::Store;

/// Wraps a [`Store`] and overrides `read` to fail with
/// [`StoreError::OutOfRange`] instead of zero-filling past the current
/// size. Every other operation is inherited unchanged via `Deref`.
pub struct Strict<B: Backend> {
    inner: Store<B>,
}

impl<B: Backend> Strict<B> {
    pub fn new(inner: Store<B>) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> Store<B> {
        self.inner
    }

    /// Fails with `OutOfRange` if `offset + size` exceeds the current
    /// size, without issuing any page loads. Otherwise behaves exactly
    /// like [`Store::read`].
    pub fn read(&mut self, offset: u64, size: u64) -> StoreResult<Vec<u8>> {
        let current_size = self.inner.size();
        if offset.saturating_add(size) > current_size {
            return Err(StoreError::OutOfRange {
                offset,
                size,
                current_size,
            });
        }
        self.inner.read(offset, size)
    }
}

impl<B: Backend> Deref for Strict<B> {
    type Target = Store<B>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<B: Backend> DerefMut for Strict<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
