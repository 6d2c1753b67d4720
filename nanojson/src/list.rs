// SPDX-License-Identifier: Apache-2.0

//! Intrusive doubly-linked list backing arrays and objects.
//!
//! Link fields live inside each element, so a list node costs no allocation
//! of its own: container items embed a [`ListLink`] as their first field and
//! the list only stores the two end pointers. The list never owns elements;
//! whoever allocated the embedding item frees it.
//!
//! # Safety contract
//!
//! Every link handed to the list must point at a `ListLink` that stays at a
//! stable address while linked (this crate keeps items in allocator memory,
//! which never moves or compacts), must be detached when pushed, and must
//! not be linked into two lists at once.

use core::ptr::{self, NonNull};

/// Link fields embedded in every list element.
pub(crate) struct ListLink {
    prev: *mut ListLink,
    next: *mut ListLink,
}

impl ListLink {
    /// A detached link.
    pub(crate) const fn new() -> Self {
        Self {
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }
}

/// Head/tail of an intrusive list. `first` is null iff `last` is null iff
/// the list is empty.
pub(crate) struct List {
    first: *mut ListLink,
    last: *mut ListLink,
}

impl List {
    pub(crate) const fn new() -> Self {
        Self {
            first: ptr::null_mut(),
            last: ptr::null_mut(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.first.is_null()
    }

    pub(crate) fn first(&self) -> Option<NonNull<ListLink>> {
        NonNull::new(self.first)
    }

    pub(crate) fn last(&self) -> Option<NonNull<ListLink>> {
        NonNull::new(self.last)
    }

    /// Element count. O(n): no cached count is kept.
    pub(crate) fn len(&self) -> usize {
        let mut count = 0;
        let mut cur = self.first;
        while !cur.is_null() {
            count += 1;
            // SAFETY: cur walks the linked chain.
            cur = unsafe { (*cur).next };
        }
        count
    }

    /// # Safety
    ///
    /// `link` must satisfy the module-level contract.
    pub(crate) unsafe fn push_back(&mut self, link: NonNull<ListLink>) {
        let link = link.as_ptr();
        (*link).prev = self.last;
        (*link).next = ptr::null_mut();
        if self.last.is_null() {
            self.first = link;
        } else {
            (*self.last).next = link;
        }
        self.last = link;
    }

    /// # Safety
    ///
    /// `link` must satisfy the module-level contract.
    pub(crate) unsafe fn push_front(&mut self, link: NonNull<ListLink>) {
        let link = link.as_ptr();
        (*link).next = self.first;
        (*link).prev = ptr::null_mut();
        if self.first.is_null() {
            self.last = link;
        } else {
            (*self.first).prev = link;
        }
        self.first = link;
    }

    pub(crate) fn pop_back(&mut self) -> Option<NonNull<ListLink>> {
        let link = NonNull::new(self.last)?;
        // SAFETY: last is a linked element per the list invariants.
        unsafe { self.unlink(link) };
        Some(link)
    }

    pub(crate) fn pop_front(&mut self) -> Option<NonNull<ListLink>> {
        let link = NonNull::new(self.first)?;
        // SAFETY: first is a linked element per the list invariants.
        unsafe { self.unlink(link) };
        Some(link)
    }

    /// Detach `link` from the list. O(1).
    ///
    /// # Safety
    ///
    /// `link` must currently be linked into this list.
    pub(crate) unsafe fn unlink(&mut self, link: NonNull<ListLink>) {
        let link = link.as_ptr();
        let prev = (*link).prev;
        let next = (*link).next;
        if prev.is_null() {
            self.first = next;
        } else {
            (*prev).next = next;
        }
        if next.is_null() {
            self.last = prev;
        } else {
            (*next).prev = prev;
        }
        (*link).prev = ptr::null_mut();
        (*link).next = ptr::null_mut();
    }

    /// Bidirectional cursor over the linked elements.
    pub(crate) fn iter(&self) -> LinkIter {
        LinkIter {
            front: self.first,
            back: self.last,
            done: self.first.is_null(),
        }
    }
}

/// Double-ended iterator over raw links. Holding it does not borrow the
/// elements; callers cast the links back to their embedding items.
pub(crate) struct LinkIter {
    front: *mut ListLink,
    back: *mut ListLink,
    done: bool,
}

impl Iterator for LinkIter {
    type Item = NonNull<ListLink>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let cur = NonNull::new(self.front)?;
        if self.front == self.back {
            self.done = true;
        } else {
            // SAFETY: front is a linked element not yet past back.
            self.front = unsafe { (*self.front).next };
        }
        Some(cur)
    }
}

impl DoubleEndedIterator for LinkIter {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let cur = NonNull::new(self.back)?;
        if self.front == self.back {
            self.done = true;
        } else {
            // SAFETY: back is a linked element not yet before front.
            self.back = unsafe { (*self.back).prev };
        }
        Some(cur)
    }
}
