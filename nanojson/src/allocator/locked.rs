// SPDX-License-Identifier: Apache-2.0

//! Mutual-exclusion wrapper making any allocator shareable between threads.

use core::ptr::NonNull;

use spin::Mutex;

use super::Allocator;

/// Serializes all allocator traffic behind one spin lock.
///
/// The lock is held for the full duration of each operation; there is no
/// lock-free fast path and no fairness guarantee among waiting threads.
pub struct Locked<A> {
    inner: Mutex<A>,
}

impl<A> Locked<A> {
    pub const fn new(inner: A) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Direct access to the wrapped allocator, holding the lock for the
    /// guard's lifetime.
    pub fn lock(&self) -> spin::MutexGuard<'_, A> {
        self.inner.lock()
    }
}

unsafe impl<A: Allocator> Allocator for Locked<A> {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        self.inner.lock().allocate(size)
    }

    unsafe fn reallocate(&self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
        self.inner.lock().reallocate(ptr, size)
    }

    unsafe fn deallocate(&self, ptr: Option<NonNull<u8>>) {
        self.inner.lock().deallocate(ptr)
    }

    unsafe fn size_of(&self, ptr: Option<NonNull<u8>>) -> usize {
        self.inner.lock().size_of(ptr)
    }
}
