// SPDX-License-Identifier: Apache-2.0

//! Pluggable allocation for value trees.
//!
//! Every container in this crate draws its item storage from an [`Allocator`].
//! The trait never panics and never unwinds: exhaustion is reported by a
//! `None` return and callers above degrade to no-ops. A process-wide default
//! instance is selected at build time through the `global-*` features and
//! reachable through [`default_allocator`].

use core::ptr::NonNull;

#[cfg(feature = "alloc")]
pub mod block;
pub mod locked;
pub mod pool;
pub mod standard;

#[cfg(feature = "alloc")]
pub use block::BlockAllocator;
pub use locked::Locked;
pub use pool::PoolAllocator;
pub use standard::FailAllocator;
#[cfg(feature = "alloc")]
pub use standard::StandardAllocator;

/// Payloads handed out by every allocator in this crate are aligned to this
/// many bytes, which covers all primitive types on the supported targets.
pub const MAX_ALIGN: usize = 16;

/// A lock-guarded block allocator, safe to share between threads. This is the
/// process-wide default when the `global-concurrent` feature is selected.
#[cfg(feature = "alloc")]
pub type ConcurrentBlockAllocator = Locked<BlockAllocator>;

/// Round `size` up to the next multiple of [`MAX_ALIGN`]. Saturates near
/// `usize::MAX` instead of wrapping to 0, so degenerate requests stay
/// degenerate and fail the allocators' capacity checks.
pub(crate) const fn align_up(size: usize) -> usize {
    size.saturating_add(MAX_ALIGN - 1) & !(MAX_ALIGN - 1)
}

/// Raw allocation capability.
///
/// All methods signal failure with a `None` sentinel instead of panicking or
/// unwinding. `None` pointer arguments are accepted everywhere: `reallocate`
/// with `None` behaves like `allocate`, `deallocate(None)` is a no-op and
/// `size_of(None)` is zero.
///
/// # Safety
///
/// Implementations must return payloads aligned to [`MAX_ALIGN`] that stay at
/// a stable address and remain valid until they are deallocated or the
/// allocator is dropped. Callers must only pass pointers obtained from the
/// same allocator instance; the pool and block allocators defensively ignore
/// foreign pointers, but the standard allocator cannot.
pub unsafe trait Allocator {
    /// Allocate `size` bytes. A zero `size` or exhaustion returns `None`.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Resize an existing allocation, preserving the first
    /// `min(old_size, size)` bytes. On failure the old allocation is left
    /// intact and `None` is returned.
    ///
    /// # Safety
    ///
    /// `ptr`, when `Some`, must have been returned by this allocator and not
    /// yet deallocated.
    unsafe fn reallocate(&self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>>;

    /// Return an allocation. `None` is a no-op.
    ///
    /// # Safety
    ///
    /// `ptr`, when `Some`, must have been returned by this allocator and not
    /// yet deallocated.
    unsafe fn deallocate(&self, ptr: Option<NonNull<u8>>);

    /// Size that was requested for an allocation, or 0 for `None`.
    ///
    /// # Safety
    ///
    /// `ptr`, when `Some`, must have been returned by this allocator and not
    /// yet deallocated.
    unsafe fn size_of(&self, ptr: Option<NonNull<u8>>) -> usize;
}

/// Typed convenience helpers over any [`Allocator`].
pub trait AllocatorExt: Allocator {
    /// Allocate storage for a single `T`. The storage is uninitialized.
    fn allocate_one<T>(&self) -> Option<NonNull<T>> {
        debug_assert!(core::mem::align_of::<T>() <= MAX_ALIGN);
        self.allocate(core::mem::size_of::<T>()).map(NonNull::cast)
    }

    /// Allocate storage for `count` contiguous `T`s. The storage is
    /// uninitialized.
    fn allocate_many<T>(&self, count: usize) -> Option<NonNull<T>> {
        debug_assert!(core::mem::align_of::<T>() <= MAX_ALIGN);
        let bytes = core::mem::size_of::<T>().checked_mul(count)?;
        self.allocate(bytes).map(NonNull::cast)
    }

    /// Drop a `T` previously placed in storage from this allocator and
    /// return the storage.
    ///
    /// # Safety
    ///
    /// `ptr` must point at an initialized `T` in storage obtained from this
    /// allocator, and must not be used afterwards.
    unsafe fn destroy<T>(&self, ptr: NonNull<T>) {
        core::ptr::drop_in_place(ptr.as_ptr());
        self.deallocate(Some(ptr.cast()));
    }
}

impl<A: Allocator + ?Sized> AllocatorExt for A {}

/// The process-wide default allocator.
///
/// Lives for the process lifetime and is selected at build time by exactly
/// one of the `global-*` features. Initialization is lazy and thread-safe
/// where runtime setup is needed (the static pool variant).
#[cfg(feature = "global-concurrent")]
pub fn default_allocator() -> &'static dyn Allocator {
    static GLOBAL: ConcurrentBlockAllocator = Locked::new(BlockAllocator::new());
    &GLOBAL
}

#[cfg(feature = "global-pool")]
pub fn default_allocator() -> &'static dyn Allocator {
    use core::cell::UnsafeCell;

    /// Byte size of the static pool backing the default allocator.
    const DEFAULT_POOL_BYTES: usize = 4096;

    #[repr(align(16))]
    struct PoolMemory(UnsafeCell<[u8; DEFAULT_POOL_BYTES]>);
    // SAFETY: the memory is handed to exactly one PoolAllocator, which is
    // only reached through the lock below.
    unsafe impl Sync for PoolMemory {}

    static MEMORY: PoolMemory = PoolMemory(UnsafeCell::new([0; DEFAULT_POOL_BYTES]));
    static GLOBAL: spin::Once<Locked<PoolAllocator<'static>>> = spin::Once::new();

    GLOBAL.call_once(|| {
        // SAFETY: MEMORY is static, aligned, and claimed exactly once.
        let pool =
            unsafe { PoolAllocator::from_raw(MEMORY.0.get().cast::<u8>(), DEFAULT_POOL_BYTES) };
        Locked::new(pool)
    })
}

#[cfg(feature = "global-standard")]
pub fn default_allocator() -> &'static dyn Allocator {
    static GLOBAL: standard::StandardAllocator = standard::StandardAllocator;
    &GLOBAL
}

#[cfg(feature = "global-none")]
pub fn default_allocator() -> &'static dyn Allocator {
    static GLOBAL: standard::FailAllocator = standard::FailAllocator;
    &GLOBAL
}
