// SPDX-License-Identifier: Apache-2.0

//! First-fit free-list allocator over one fixed memory range.
//!
//! Every live allocation is preceded by a [`Header`] and the headers form a
//! singly linked chain from the most recently carved region downward through
//! memory. A gap between two regions (or between the top region and the end
//! of the range) is free space; allocation scans the gaps top-down and takes
//! the first one that fits.
//!
//! ```text
//! begin                                                          end
//!   |  [Hdr|payload]  ...gap...  [Hdr|payload] [Hdr|payload]  ...gap...
//!                                                    ^
//!                                                   last
//! ```
//!
//! The chain only points downward, so unlinking a region is an O(n) backward
//! scan. For the small, bounded pools this allocator targets that tradeoff
//! buys a header of just two words per allocation.

use core::cell::Cell;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use super::{align_up, Allocator, MAX_ALIGN};

/// Region header preceding every payload. `prev` points at the next header
/// *down* in memory, `size` is the exact byte count the caller requested.
#[repr(C, align(16))]
struct Header {
    prev: *mut Header,
    size: usize,
}

const HEADER_SIZE: usize = core::mem::size_of::<Header>();

// Header must tile exactly with MAX_ALIGN so payloads stay aligned.
const _: () = assert!(HEADER_SIZE == MAX_ALIGN);

/// First-fit pool allocator over a caller-provided byte range.
///
/// The `'mem` lifetime ties the allocator to the borrowed region. The range
/// is never grown; exhaustion returns `None` and leaves every live
/// allocation untouched.
pub struct PoolAllocator<'mem> {
    begin: *mut u8,
    end: *mut u8,
    last: Cell<*mut Header>,
    _mem: PhantomData<&'mem mut [u8]>,
}

// SAFETY: the allocator exclusively owns the region it manages; moving it to
// another thread moves that ownership with it.
unsafe impl Send for PoolAllocator<'_> {}

impl<'mem> PoolAllocator<'mem> {
    /// Smallest region the pool will carve: one header plus one header-sized
    /// payload. Used by the block allocator when sizing fresh blocks.
    pub const MINIMAL_SIZE: usize = 2 * HEADER_SIZE;

    /// Manage the given byte range. Regions smaller than
    /// [`Self::MINIMAL_SIZE`] (after alignment) never satisfy any request.
    pub fn new(region: &'mem mut [u8]) -> Self {
        let begin = region.as_mut_ptr();
        // SAFETY: one-past-the-end of the borrowed slice.
        let end = unsafe { begin.add(region.len()) };
        Self {
            begin,
            end,
            last: Cell::new(ptr::null_mut()),
            _mem: PhantomData,
        }
    }

    /// Manage `len` bytes starting at `begin`.
    ///
    /// # Safety
    ///
    /// `begin..begin + len` must be valid for reads and writes for the
    /// lifetime of the allocator and must not be touched by anything else.
    pub unsafe fn from_raw(begin: *mut u8, len: usize) -> PoolAllocator<'static> {
        PoolAllocator {
            begin,
            end: begin.add(len),
            last: Cell::new(ptr::null_mut()),
            _mem: PhantomData,
        }
    }

    /// True when no live allocations remain.
    pub fn empty(&self) -> bool {
        self.last.get().is_null()
    }

    /// Range-membership test: does `ptr` fall inside the managed range?
    pub fn valid(&self, ptr: *const u8) -> bool {
        ptr >= self.begin as *const u8 && ptr < self.end as *const u8
    }

    /// Total bytes in the managed range.
    pub fn capacity(&self) -> usize {
        self.end as usize - self.begin as usize
    }

    /// One past the last byte reserved for this header's region.
    fn region_end(header: *mut Header) -> usize {
        // SAFETY: header is a live header inside the managed range.
        let size = unsafe { (*header).size };
        header as usize + HEADER_SIZE + align_up(size)
    }

    /// Header address for a carve of `size` bytes inside `[gap_start,
    /// gap_end)`, or `None` when the gap is too small.
    fn fit(gap_start: usize, gap_end: usize, size: usize) -> Option<usize> {
        let header_at = align_up(gap_start);
        let payload = header_at.checked_add(HEADER_SIZE)?;
        let needed = align_up(size);
        if payload.checked_add(needed)? <= gap_end {
            Some(header_at)
        } else {
            None
        }
    }

    fn header_of(payload: NonNull<u8>) -> *mut Header {
        (payload.as_ptr() as usize - HEADER_SIZE) as *mut Header
    }

    /// Header of the live region whose payload starts at `payload`, or
    /// `None` for pointers this pool does not track. In-range pointers that
    /// never came out of [`PoolAllocator::allocate`] stay untouched.
    fn tracked_header(&self, payload: NonNull<u8>) -> Option<*mut Header> {
        let candidate = Self::header_of(payload);
        let mut cur = self.last.get();
        while !cur.is_null() {
            if cur == candidate {
                return Some(cur);
            }
            // SAFETY: cur walks the live header chain.
            cur = unsafe { (*cur).prev };
        }
        None
    }

    /// Free space above `header`: the address of the next header up in
    /// memory, or `end` when `header` is the top region. Returns `None` for
    /// pointers not in the chain.
    fn gap_end_above(&self, header: *mut Header) -> Option<usize> {
        let mut cur = self.last.get();
        if cur == header {
            return Some(self.end as usize);
        }
        while !cur.is_null() {
            // SAFETY: cur walks the live header chain.
            let prev = unsafe { (*cur).prev };
            if prev == header {
                return Some(cur as usize);
            }
            cur = prev;
        }
        None
    }
}

unsafe impl Allocator for PoolAllocator<'_> {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        // First-fit: start with the gap above the most recent region, then
        // walk the chain downward through the inter-region gaps.
        let mut above: *mut Header = ptr::null_mut();
        let mut cur = self.last.get();
        let mut gap_end = self.end as usize;
        loop {
            let gap_start = if cur.is_null() {
                self.begin as usize
            } else {
                Self::region_end(cur)
            };
            if let Some(header_at) = Self::fit(gap_start, gap_end, size) {
                let header = header_at as *mut Header;
                // SAFETY: fit() proved the region lies inside the managed
                // range and clear of every live region.
                unsafe {
                    ptr::write(header, Header { prev: cur, size });
                    if above.is_null() {
                        self.last.set(header);
                    } else {
                        (*above).prev = header;
                    }
                }
                return NonNull::new((header_at + HEADER_SIZE) as *mut u8);
            }
            if cur.is_null() {
                return None;
            }
            above = cur;
            gap_end = cur as usize;
            // SAFETY: cur is a live header.
            cur = unsafe { (*cur).prev };
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
        if !self.valid(payload.as_ptr()) {
            return None;
        }
        let header = self.tracked_header(payload)?;
        let gap_end = self.gap_end_above(header)?;
        // Grow (or shrink) in place when the space up to the next region
        // accommodates the new size.
        let in_place_end = align_up(size)
            .checked_add(HEADER_SIZE)
            .and_then(|reserved| (header as usize).checked_add(reserved));
        if let Some(end) = in_place_end {
            if end <= gap_end {
                (*header).size = size;
                return Some(payload);
            }
        }
        // Fall back to allocate + copy + deallocate. On failure the old
        // region stays live.
        let fresh = self.allocate(size)?;
        let old_size = (*header).size;
        ptr::copy_nonoverlapping(payload.as_ptr(), fresh.as_ptr(), old_size.min(size));
        self.deallocate(Some(payload));
        Some(fresh)
    }

    unsafe fn deallocate(&self, ptr: Option<NonNull<u8>>) {
        let Some(payload) = ptr else { return };
        if !self.valid(payload.as_ptr()) {
            return;
        }
        let header = Self::header_of(payload);
        let mut cur = self.last.get();
        if cur == header {
            self.last.set((*header).prev);
            return;
        }
        // The chain only points downward: scan for the region above.
        while !cur.is_null() {
            if (*cur).prev == header {
                (*cur).prev = (*header).prev;
                return;
            }
            cur = (*cur).prev;
        }
        // Untracked pointer: no-op.
    }

    unsafe fn size_of(&self, ptr: Option<NonNull<u8>>) -> usize {
        match ptr {
            Some(payload) if self.valid(payload.as_ptr()) => self
                .tracked_header(payload)
                .map_or(0, |header| (*header).size),
            _ => 0,
        }
    }
}
