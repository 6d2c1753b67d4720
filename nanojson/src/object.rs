// SPDX-License-Identifier: Apache-2.0

//! List-backed JSON object preserving insertion order.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::allocator::{Allocator, AllocatorExt};
use crate::json_string::JsonString;
use crate::list::{LinkIter, List, ListLink};
use crate::value::Value;

/// A name/value member of an object.
pub struct Pair<'alloc> {
    name: JsonString<'alloc>,
    value: Value<'alloc>,
}

impl<'alloc> Pair<'alloc> {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn value(&self) -> &Value<'alloc> {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value<'alloc> {
        &mut self.value
    }
}

/// One object member: the intrusive link plus the owned pair, allocated as a
/// single region. The link must stay the first field so a link pointer can
/// be cast back to the item.
#[repr(C)]
pub(crate) struct ObjectItem<'alloc> {
    link: ListLink,
    pair: Pair<'alloc>,
}

fn item_of<'alloc>(link: NonNull<ListLink>) -> NonNull<ObjectItem<'alloc>> {
    // repr(C) with the link first makes this cast layout-correct.
    link.cast()
}

/// Collection of name/value members, each one allocation from the active
/// allocator. Lookup is a linear scan; duplicate names replace in place.
pub struct Object<'alloc> {
    list: List,
    alloc: &'alloc dyn Allocator,
}

impl<'alloc> Object<'alloc> {
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

    /// Member count. O(n).
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Insert a member, replacing the value in place when `name` already
    /// exists. Returns the stored value, or `None` when the allocator is
    /// exhausted (the object is unchanged).
    ///
    /// As with [`Array::push`](crate::Array::push), the upward link of the
    /// stored value is established when going through [`Value::insert`].
    pub fn insert(&mut self, name: &str, value: Value<'alloc>) -> Option<&mut Value<'alloc>> {
        if let Some(existing) = self.find(name) {
            // SAFETY: existing is a live item of this object; the pair's
            // value is replaced in place, at a stable address.
            unsafe {
                let slot = &mut (*existing.as_ptr()).pair.value;
                *slot = value;
                slot.clear_parent();
                slot.reparent_children();
                return Some(slot);
            }
        }
        let name = JsonString::from_str_in(name, self.alloc)?;
        self.insert_pair(name, value)
    }

    /// Insert with an already-built key, always appending a new member. Used
    /// by the parser, which owns its key strings.
    pub(crate) fn insert_pair(
        &mut self,
        name: JsonString<'alloc>,
        value: Value<'alloc>,
    ) -> Option<&mut Value<'alloc>> {
        let item: NonNull<ObjectItem<'alloc>> = self.alloc.allocate_one()?;
        // SAFETY: fresh storage from the allocator; the item is pinned there
        // until removed or cleared.
        unsafe {
            ptr::write(
                item.as_ptr(),
                ObjectItem {
                    link: ListLink::new(),
                    pair: Pair { name, value },
                },
            );
            self.list.push_back(NonNull::from(&mut (*item.as_ptr()).link));
            let slot = &mut (*item.as_ptr()).pair.value;
            slot.clear_parent();
            slot.reparent_children();
            Some(slot)
        }
    }

    fn find(&self, name: &str) -> Option<NonNull<ObjectItem<'alloc>>> {
        self.list.iter().map(item_of).find(|item| {
            // SAFETY: every linked element is a live ObjectItem.
            unsafe { item.as_ref().pair.name.as_str() == name }
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Value<'alloc>> {
        // SAFETY: the item is borrowed for as long as &self.
        self.find(name).map(|item| unsafe { &(*item.as_ptr()).pair.value })
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value<'alloc>> {
        // SAFETY: the item is borrowed for as long as &mut self.
        self.find(name).map(|item| unsafe { &mut (*item.as_ptr()).pair.value })
    }

    /// Remove the member named `name`. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(item) = self.find(name) else {
            return false;
        };
        // SAFETY: item is linked into this object's list; after unlinking
        // its storage goes back to the allocator.
        unsafe {
            self.list.unlink(NonNull::from(&mut (*item.as_ptr()).link));
            self.alloc.destroy(item);
        }
        true
    }

    /// Drop every member.
    pub fn clear(&mut self) {
        while let Some(link) = self.list.pop_front() {
            // SAFETY: every linked element is an ObjectItem from self.alloc.
            unsafe { self.alloc.destroy(item_of::<'alloc>(link)) };
        }
    }

    pub fn iter(&self) -> ObjectIter<'_, 'alloc> {
        ObjectIter {
            links: self.list.iter(),
            _items: PhantomData,
        }
    }

    pub fn iter_mut(&mut self) -> ObjectIterMut<'_, 'alloc> {
        ObjectIterMut {
            links: self.list.iter(),
            _items: PhantomData,
        }
    }
}

impl Drop for Object<'_> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for Object<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl PartialEq for Object<'_> {
    /// Order-insensitive member comparison.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(name, value)| other.get(name) == Some(value))
    }
}

/// Borrowing iterator over `(name, value)` members.
pub struct ObjectIter<'s, 'alloc> {
    links: LinkIter,
    _items: PhantomData<&'s Value<'alloc>>,
}

impl<'s, 'alloc> Iterator for ObjectIter<'s, 'alloc> {
    type Item = (&'s str, &'s Value<'alloc>);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the links belong to ObjectItems borrowed for 's.
        self.links.next().map(|l| unsafe {
            let pair = &(*item_of(l).as_ptr()).pair;
            (pair.name.as_str(), &pair.value)
        })
    }
}

impl DoubleEndedIterator for ObjectIter<'_, '_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: as in next().
        self.links.next_back().map(|l| unsafe {
            let pair = &(*item_of(l).as_ptr()).pair;
            (pair.name.as_str(), &pair.value)
        })
    }
}

/// Mutably borrowing iterator over `(name, value)` members.
pub struct ObjectIterMut<'s, 'alloc> {
    links: LinkIter,
    _items: PhantomData<&'s mut Value<'alloc>>,
}

impl<'s, 'alloc> Iterator for ObjectIterMut<'s, 'alloc> {
    type Item = (&'s str, &'s mut Value<'alloc>);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the iterator yields each distinct item at most once while
        // the object is mutably borrowed for 's.
        self.links.next().map(|l| unsafe {
            let pair = &mut (*item_of(l).as_ptr()).pair;
            (pair.name.as_str(), &mut pair.value)
        })
    }
}
