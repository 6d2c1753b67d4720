// SPDX-License-Identifier: Apache-2.0

//! List-backed JSON array.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::allocator::{Allocator, AllocatorExt};
use crate::list::{LinkIter, List, ListLink};
use crate::value::Value;

/// One array element: the intrusive link plus the owned value, allocated as
/// a single region. The link must stay the first field so a link pointer can
/// be cast back to the item.
#[repr(C)]
pub(crate) struct ArrayItem<'alloc> {
    link: ListLink,
    value: Value<'alloc>,
}

fn item_of<'alloc>(link: NonNull<ListLink>) -> NonNull<ArrayItem<'alloc>> {
    // repr(C) with the link first makes this cast layout-correct.
    link.cast()
}

/// Sequence of JSON values, each element one allocation from the active
/// allocator.
pub struct Array<'alloc> {
    list: List,
    alloc: &'alloc dyn Allocator,
}

impl<'alloc> Array<'alloc> {
    pub fn new_in(alloc: &'alloc dyn Allocator) -> Self {
        Self {
            list: List::new(),
            alloc,
        }
    }

    pub(crate) fn allocator(&self) -> &'alloc dyn Allocator {
        self.alloc
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Element count. O(n).
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Append `value`. Returns a reference to the stored value, or `None`
    /// when the allocator is exhausted, in which case the array is unchanged
    /// and `value` is dropped.
    ///
    /// The stored value's upward link ([`Value::parent`]) is established
    /// when the push goes through [`Value::push`]; pushing directly on an
    /// `Array` leaves it detached for upward queries.
    pub fn push(&mut self, value: Value<'alloc>) -> Option<&mut Value<'alloc>> {
        let item: NonNull<ArrayItem<'alloc>> = self.alloc.allocate_one()?;
        // SAFETY: fresh storage from the allocator; the item is pinned there
        // until popped or cleared.
        unsafe {
            ptr::write(
                item.as_ptr(),
                ArrayItem {
                    link: ListLink::new(),
                    value,
                },
            );
            self.list.push_back(NonNull::from(&mut (*item.as_ptr()).link));
            let slot = &mut (*item.as_ptr()).value;
            slot.clear_parent();
            slot.reparent_children();
            Some(slot)
        }
    }

    /// Remove and return the last element.
    pub fn pop_back(&mut self) -> Option<Value<'alloc>> {
        let link = self.list.pop_back()?;
        // SAFETY: every linked element is an ArrayItem from self.alloc.
        unsafe { Some(self.take_item(item_of(link))) }
    }

    /// Remove and return the first element.
    pub fn pop_front(&mut self) -> Option<Value<'alloc>> {
        let link = self.list.pop_front()?;
        // SAFETY: every linked element is an ArrayItem from self.alloc.
        unsafe { Some(self.take_item(item_of(link))) }
    }

    /// Move the value out of an unlinked item and return its storage.
    ///
    /// # Safety
    ///
    /// `item` must be an item of this array that was just unlinked.
    unsafe fn take_item(&mut self, item: NonNull<ArrayItem<'alloc>>) -> Value<'alloc> {
        let mut value = ptr::read(&(*item.as_ptr()).value);
        self.alloc.deallocate(Some(item.cast()));
        value.clear_parent();
        value
    }

    /// Drop every element.
    pub fn clear(&mut self) {
        while let Some(link) = self.list.pop_front() {
            // SAFETY: every linked element is an ArrayItem from self.alloc.
            unsafe { self.alloc.destroy(item_of::<'alloc>(link)) };
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value<'alloc>> {
        self.iter().nth(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value<'alloc>> {
        self.iter_mut().nth(index)
    }

    pub fn first(&self) -> Option<&Value<'alloc>> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<&Value<'alloc>> {
        self.iter().next_back()
    }

    pub fn iter(&self) -> ArrayIter<'_, 'alloc> {
        ArrayIter {
            links: self.list.iter(),
            _items: PhantomData,
        }
    }

    pub fn iter_mut(&mut self) -> ArrayIterMut<'_, 'alloc> {
        ArrayIterMut {
            links: self.list.iter(),
            _items: PhantomData,
        }
    }
}

impl Drop for Array<'_> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for Array<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for Array<'_> {
    fn eq(&self, other: &Self) -> bool {
        let mut a = self.iter();
        let mut b = other.iter();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) if x == y => continue,
                _ => return false,
            }
        }
    }
}

/// Borrowing iterator over array elements.
pub struct ArrayIter<'s, 'alloc> {
    links: LinkIter,
    _items: PhantomData<&'s Value<'alloc>>,
}

impl<'s, 'alloc> Iterator for ArrayIter<'s, 'alloc> {
    type Item = &'s Value<'alloc>;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the links belong to ArrayItems borrowed for 's.
        self.links.next().map(|l| unsafe { &item_of(l).as_ref().value })
    }
}

impl DoubleEndedIterator for ArrayIter<'_, '_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: as in next().
        self.links
            .next_back()
            .map(|l| unsafe { &item_of(l).as_ref().value })
    }
}

/// Mutably borrowing iterator over array elements.
pub struct ArrayIterMut<'s, 'alloc> {
    links: LinkIter,
    _items: PhantomData<&'s mut Value<'alloc>>,
}

impl<'s, 'alloc> Iterator for ArrayIterMut<'s, 'alloc> {
    type Item = &'s mut Value<'alloc>;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the iterator yields each distinct item at most once while
        // the array is mutably borrowed for 's.
        self.links
            .next()
            .map(|l| unsafe { &mut (*item_of(l).as_ptr()).value })
    }
}
