// SPDX-License-Identifier: Apache-2.0

//! Chain of pool allocators over demand-allocated heap blocks.
//!
//! Each block is one raw allocation from the platform allocator, prefixed by
//! a [`BlockHeader`] and hosting exactly one [`PoolAllocator`] over the rest
//! of the block. Requests try every existing block's pool, most recent
//! first, and a fresh block is only obtained when all of them are full.
//! When a pool becomes empty its whole block is released back to the
//! platform; that is the only garbage-collection point in the crate.

use core::cell::Cell;
use core::ptr::{self, NonNull};

use alloc_crate::alloc::{alloc as raw_alloc, dealloc as raw_dealloc, Layout};
use log::{debug, trace};

use super::{align_up, Allocator, PoolAllocator, MAX_ALIGN};

/// Header at the start of every heap block.
#[repr(C, align(16))]
struct BlockHeader {
    prev: *mut BlockHeader,
    pool: PoolAllocator<'static>,
    raw_size: usize,
}

const BLOCK_HEADER_SIZE: usize = core::mem::size_of::<BlockHeader>();

/// Growable allocator chaining fixed-size pool blocks.
///
/// Single-threaded; wrap it in [`Locked`](super::Locked) (or use
/// [`ConcurrentBlockAllocator`](super::ConcurrentBlockAllocator)) to share
/// between threads.
pub struct BlockAllocator {
    last: Cell<*mut BlockHeader>,
    block_size: usize,
    bad_allocation: Cell<bool>,
}

// SAFETY: the allocator exclusively owns its block chain.
unsafe impl Send for BlockAllocator {}

impl BlockAllocator {
    /// Default byte size of a freshly grown block.
    pub const DEFAULT_BLOCK_SIZE: usize = 32768;

    pub const fn new() -> Self {
        Self::with_block_size(Self::DEFAULT_BLOCK_SIZE)
    }

    /// Use `block_size` bytes per grown block instead of
    /// [`Self::DEFAULT_BLOCK_SIZE`]. Oversized single requests still get a
    /// block large enough to hold them.
    pub const fn with_block_size(block_size: usize) -> Self {
        Self {
            last: Cell::new(ptr::null_mut()),
            block_size,
            bad_allocation: Cell::new(false),
        }
    }

    /// Sticky flag: set once the platform allocator ever refused a block.
    pub fn bad_allocation(&self) -> bool {
        self.bad_allocation.get()
    }

    /// Number of live heap blocks. O(n); test and diagnostics hook.
    pub fn block_count(&self) -> usize {
        let mut count = 0;
        let mut cur = self.last.get();
        while !cur.is_null() {
            count += 1;
            // SAFETY: cur walks the live block chain.
            cur = unsafe { (*cur).prev };
        }
        count
    }

    /// Obtain a fresh block able to satisfy a `size`-byte request and link
    /// it as the new head of the chain.
    fn grow(&self, size: usize) -> Option<*mut BlockHeader> {
        let needed = (BLOCK_HEADER_SIZE + PoolAllocator::MINIMAL_SIZE).checked_add(align_up(size))?;
        let raw_size = self.block_size.max(needed);
        let layout = Layout::from_size_align(raw_size, MAX_ALIGN).ok()?;
        // SAFETY: layout has non-zero size.
        let mem = unsafe { raw_alloc(layout) };
        let Some(mem) = NonNull::new(mem) else {
            self.bad_allocation.set(true);
            return None;
        };
        debug!("block allocator: grew by {} bytes", raw_size);
        // SAFETY: the block is freshly allocated with MAX_ALIGN alignment;
        // the pool takes everything past the header.
        unsafe {
            let pool = PoolAllocator::from_raw(
                mem.as_ptr().add(BLOCK_HEADER_SIZE),
                raw_size - BLOCK_HEADER_SIZE,
            );
            let header = mem.as_ptr().cast::<BlockHeader>();
            ptr::write(
                header,
                BlockHeader {
                    prev: self.last.get(),
                    pool,
                    raw_size,
                },
            );
            self.last.set(header);
            Some(header)
        }
    }

    /// Block whose pool owns `ptr`, most recent first.
    fn find_owner(&self, ptr: NonNull<u8>) -> Option<*mut BlockHeader> {
        let mut cur = self.last.get();
        while !cur.is_null() {
            // SAFETY: cur walks the live block chain.
            unsafe {
                if (*cur).pool.valid(ptr.as_ptr()) {
                    return Some(cur);
                }
                cur = (*cur).prev;
            }
        }
        None
    }

    /// Unlink `block` and hand its memory back to the platform. Must only be
    /// called with a block from this chain whose pool is empty.
    fn release(&self, block: *mut BlockHeader) {
        // SAFETY: block is a live member of the chain.
        unsafe {
            let prev = (*block).prev;
            if self.last.get() == block {
                self.last.set(prev);
            } else {
                let mut cur = self.last.get();
                while !cur.is_null() {
                    if (*cur).prev == block {
                        (*cur).prev = prev;
                        break;
                    }
                    cur = (*cur).prev;
                }
            }
            let raw_size = (*block).raw_size;
            trace!("block allocator: released a {} byte block", raw_size);
            // Layout construction mirrored from grow(); raw_size >= header.
            if let Ok(layout) = Layout::from_size_align(raw_size, MAX_ALIGN) {
                raw_dealloc(block.cast::<u8>(), layout);
            }
        }
    }

    fn release_if_empty(&self, block: *mut BlockHeader) {
        // SAFETY: block is a live member of the chain.
        if unsafe { (*block).pool.empty() } {
            self.release(block);
        }
    }
}

impl Default for BlockAllocator {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Allocator for BlockAllocator {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        let mut cur = self.last.get();
        while !cur.is_null() {
            // SAFETY: cur walks the live block chain.
            unsafe {
                if let Some(ptr) = (*cur).pool.allocate(size) {
                    return Some(ptr);
                }
                cur = (*cur).prev;
            }
        }
        let fresh = self.grow(size)?;
        // SAFETY: fresh is the new chain head; its pool was sized for this
        // request.
        match unsafe { (*fresh).pool.allocate(size) } {
            Some(ptr) => Some(ptr),
            None => {
                // Degenerate request the sizing arithmetic rejected.
                self.release(fresh);
                None
            }
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
        let owner = self.find_owner(payload)?;
        if let Some(moved) = (*owner).pool.reallocate(Some(payload), size) {
            return Some(moved);
        }
        // The owning pool is full; move the data to another block, growing
        // the chain if necessary.
        let fresh = self.allocate(size)?;
        let old_size = (*owner).pool.size_of(Some(payload));
        ptr::copy_nonoverlapping(payload.as_ptr(), fresh.as_ptr(), old_size.min(size));
        (*owner).pool.deallocate(Some(payload));
        self.release_if_empty(owner);
        Some(fresh)
    }

    unsafe fn deallocate(&self, ptr: Option<NonNull<u8>>) {
        let Some(payload) = ptr else { return };
        let Some(owner) = self.find_owner(payload) else {
            return;
        };
        (*owner).pool.deallocate(Some(payload));
        self.release_if_empty(owner);
    }

    unsafe fn size_of(&self, ptr: Option<NonNull<u8>>) -> usize {
        // Locates the owning block first, like deallocate and reallocate do.
        match ptr {
            Some(payload) => match self.find_owner(payload) {
                Some(owner) => (*owner).pool.size_of(Some(payload)),
                None => 0,
            },
            None => 0,
        }
    }
}

impl Drop for BlockAllocator {
    fn drop(&mut self) {
        let mut cur = self.last.get();
        while !cur.is_null() {
            // SAFETY: cur walks the live block chain; each block came from
            // grow() with the layout reconstructed here.
            unsafe {
                let prev = (*cur).prev;
                if let Ok(layout) = Layout::from_size_align((*cur).raw_size, MAX_ALIGN) {
                    raw_dealloc(cur.cast::<u8>(), layout);
                }
                cur = prev;
            }
        }
    }
}
