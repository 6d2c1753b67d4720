// SPDX-License-Identifier: Apache-2.0

//! Thin allocator adapters: the platform allocator and a null object.

use core::ptr::NonNull;

use super::Allocator;
#[cfg(feature = "alloc")]
use super::MAX_ALIGN;

/// Forwards every request to the platform's general allocator.
///
/// A size header is kept in front of each payload so `size_of` and
/// `deallocate` can recover the original layout.
#[cfg(feature = "alloc")]
pub struct StandardAllocator;

#[cfg(feature = "alloc")]
mod platform {
    use super::*;
    use alloc_crate::alloc::{alloc as raw_alloc, dealloc as raw_dealloc, realloc as raw_realloc, Layout};

    #[repr(C, align(16))]
    struct SizeHeader {
        size: usize,
    }

    const HEADER_SIZE: usize = core::mem::size_of::<SizeHeader>();

    fn layout_for(total: usize) -> Option<Layout> {
        Layout::from_size_align(total, MAX_ALIGN).ok()
    }

    unsafe impl Allocator for StandardAllocator {
        fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
            if size == 0 {
                return None;
            }
            let total = size.checked_add(HEADER_SIZE)?;
            let layout = layout_for(total)?;
            // SAFETY: layout has non-zero size.
            let base = unsafe { raw_alloc(layout) };
            let base = NonNull::new(base)?;
            // SAFETY: the header fits at the start of the allocation.
            unsafe {
                base.cast::<SizeHeader>().as_ptr().write(SizeHeader { size });
                Some(NonNull::new_unchecked(base.as_ptr().add(HEADER_SIZE)))
            }
        }

        unsafe fn reallocate(&self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
            let Some(payload) = ptr else {
                return self.allocate(size);
            };
            if size == 0 {
                self.deallocate(Some(payload));
                return None;
            }
            let base = payload.as_ptr().sub(HEADER_SIZE);
            let old_total = (*base.cast::<SizeHeader>()).size + HEADER_SIZE;
            let new_total = size.checked_add(HEADER_SIZE)?;
            let layout = layout_for(old_total)?;
            let grown = raw_realloc(base, layout, new_total);
            let grown = NonNull::new(grown)?;
            grown.cast::<SizeHeader>().as_ptr().write(SizeHeader { size });
            Some(NonNull::new_unchecked(grown.as_ptr().add(HEADER_SIZE)))
        }

        unsafe fn deallocate(&self, ptr: Option<NonNull<u8>>) {
            let Some(payload) = ptr else { return };
            let base = payload.as_ptr().sub(HEADER_SIZE);
            let total = (*base.cast::<SizeHeader>()).size + HEADER_SIZE;
            if let Some(layout) = layout_for(total) {
                raw_dealloc(base, layout);
            }
        }

        unsafe fn size_of(&self, ptr: Option<NonNull<u8>>) -> usize {
            match ptr {
                Some(payload) => {
                    let base = payload.as_ptr().sub(HEADER_SIZE);
                    (*base.cast::<SizeHeader>()).size
                }
                None => 0,
            }
        }
    }
}

/// Null-object allocator. Every request fails, which turns all dynamic
/// allocation in the library into silent no-ops.
pub struct FailAllocator;

unsafe impl Allocator for FailAllocator {
    fn allocate(&self, _size: usize) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn reallocate(&self, _ptr: Option<NonNull<u8>>, _size: usize) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn deallocate(&self, _ptr: Option<NonNull<u8>>) {}

    unsafe fn size_of(&self, _ptr: Option<NonNull<u8>>) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "alloc")]
    #[test]
    fn standard_round_trip() {
        let alloc = StandardAllocator;
        let a = alloc.allocate(100).unwrap();
        unsafe {
            core::ptr::write_bytes(a.as_ptr(), 0x77, 100);
            assert_eq!(alloc.size_of(Some(a)), 100);
            let b = alloc.reallocate(Some(a), 300).unwrap();
            assert_eq!(alloc.size_of(Some(b)), 300);
            assert_eq!(*b.as_ptr(), 0x77);
            assert_eq!(*b.as_ptr().add(99), 0x77);
            alloc.deallocate(Some(b));
        }
    }

    #[test]
    fn fail_allocator_refuses_everything() {
        let alloc = FailAllocator;
        assert!(alloc.allocate(1).is_none());
        unsafe {
            assert!(alloc.reallocate(None, 64).is_none());
            assert_eq!(alloc.size_of(None), 0);
            alloc.deallocate(None);
        }
    }
}
