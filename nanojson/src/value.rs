// SPDX-License-Identifier: Apache-2.0

//! Tagged JSON value and the pinned document root.

use core::fmt;
use core::ptr::{self, NonNull};

use crate::allocator::{default_allocator, Allocator, AllocatorExt};
use crate::array::Array;
use crate::json_number::Number;
use crate::json_string::JsonString;
use crate::object::Object;

/// The payload of a [`Value`]: exactly one variant is ever active, enforced
/// by the type instead of by convention.
#[derive(Debug, PartialEq)]
pub enum ValueData<'alloc> {
    Null,
    Bool(bool),
    Number(Number),
    String(JsonString<'alloc>),
    Array(Array<'alloc>),
    Object(Object<'alloc>),
}

/// A JSON value plus a non-owning link to the value containing it.
///
/// The parent link is only used for upward queries ([`Value::parent`],
/// [`Value::root`], [`Value::is_array_item`]); it never owns anything and is
/// never followed on drop. It is maintained whenever values are attached
/// through the `Value`-level mutators ([`Value::push`], [`Value::insert`])
/// and is reliable for any value reached through a [`Document`] or through a
/// root that has not been moved since its children were attached. A value
/// detached with `pop_*` has its own link cleared but its children keep
/// stale links until it is attached again.
pub struct Value<'alloc> {
    parent: *mut Value<'alloc>,
    data: ValueData<'alloc>,
}

impl<'alloc> Value<'alloc> {
    pub const fn null() -> Self {
        Self {
            parent: ptr::null_mut(),
            data: ValueData::Null,
        }
    }

    pub const fn from_data(data: ValueData<'alloc>) -> Self {
        Self {
            parent: ptr::null_mut(),
            data,
        }
    }

    /// An empty array drawing from `alloc`.
    pub fn array_in(alloc: &'alloc dyn Allocator) -> Self {
        Self::from_data(ValueData::Array(Array::new_in(alloc)))
    }

    /// An empty object drawing from `alloc`.
    pub fn object_in(alloc: &'alloc dyn Allocator) -> Self {
        Self::from_data(ValueData::Object(Object::new_in(alloc)))
    }

    /// A string value copied from `s`, or `None` when `alloc` cannot hold
    /// it.
    pub fn string_in(s: &str, alloc: &'alloc dyn Allocator) -> Option<Self> {
        JsonString::from_str_in(s, alloc).map(|s| Self::from_data(ValueData::String(s)))
    }

    pub fn data(&self) -> &ValueData<'alloc> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ValueData<'alloc> {
        &mut self.data
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, ValueData::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.data, ValueData::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self.data, ValueData::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.data, ValueData::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.data, ValueData::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.data, ValueData::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.data {
            ValueData::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match &self.data {
            ValueData::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(|n| n.as_i64())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(|n| n.as_f64())
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            ValueData::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array<'alloc>> {
        match &self.data {
            ValueData::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array<'alloc>> {
        match &mut self.data {
            ValueData::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object<'alloc>> {
        match &self.data {
            ValueData::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object<'alloc>> {
        match &mut self.data {
            ValueData::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Append to an array value, maintaining the child's parent link.
    /// `None` (dropping `value`) when this is not an array or the allocator
    /// is exhausted.
    pub fn push(&mut self, value: Value<'alloc>) -> Option<&mut Value<'alloc>> {
        let owner: *mut Value<'alloc> = self;
        match &mut self.data {
            ValueData::Array(arr) => {
                let slot = arr.push(value)?;
                slot.parent = owner;
                Some(slot)
            }
            _ => None,
        }
    }

    /// Insert into an object value, maintaining the child's parent link.
    /// `None` (dropping `value`) when this is not an object or the allocator
    /// is exhausted.
    pub fn insert(&mut self, name: &str, value: Value<'alloc>) -> Option<&mut Value<'alloc>> {
        let owner: *mut Value<'alloc> = self;
        match &mut self.data {
            ValueData::Object(obj) => {
                let slot = obj.insert(name, value)?;
                slot.parent = owner;
                Some(slot)
            }
            _ => None,
        }
    }

    /// The value containing this one, when attached.
    pub fn parent(&self) -> Option<&Value<'alloc>> {
        // SAFETY: per the type-level contract, a non-null parent points at
        // the live containing value of an attached tree.
        unsafe { self.parent.as_ref() }
    }

    /// Walk the parent chain to the top of the tree.
    pub fn root(&self) -> &Value<'alloc> {
        let mut cur = self;
        while let Some(up) = cur.parent() {
            cur = up;
        }
        cur
    }

    /// Whether this value is an element of an array.
    pub fn is_array_item(&self) -> bool {
        self.parent().is_some_and(Value::is_array)
    }

    /// Whether this value is a member of an object.
    pub fn is_object_item(&self) -> bool {
        self.parent().is_some_and(Value::is_object)
    }

    pub(crate) fn parent_ptr(&self) -> *mut Value<'alloc> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: *mut Value<'alloc>) {
        self.parent = parent;
    }

    pub(crate) fn clear_parent(&mut self) {
        self.parent = ptr::null_mut();
    }

    /// Repoint the direct children at this value's current address. Called
    /// after every move of a container value; grandchildren live in
    /// allocator-pinned items and never move with it.
    pub(crate) fn reparent_children(&mut self) {
        let me: *mut Value<'alloc> = self;
        match &mut self.data {
            ValueData::Array(arr) => {
                for child in arr.iter_mut() {
                    child.parent = me;
                }
            }
            ValueData::Object(obj) => {
                for (_, child) in obj.iter_mut() {
                    child.parent = me;
                }
            }
            _ => {}
        }
    }
}

impl Value<'static> {
    /// An empty array backed by the process-wide default allocator.
    pub fn array() -> Self {
        Self::array_in(default_allocator())
    }

    /// An empty object backed by the process-wide default allocator.
    pub fn object() -> Self {
        Self::object_in(default_allocator())
    }

    /// A string value backed by the process-wide default allocator.
    pub fn string(s: &str) -> Option<Self> {
        Self::string_in(s, default_allocator())
    }
}

impl Default for Value<'_> {
    fn default() -> Self {
        Self::null()
    }
}

impl From<bool> for Value<'_> {
    fn from(v: bool) -> Self {
        Self::from_data(ValueData::Bool(v))
    }
}

impl From<i64> for Value<'_> {
    fn from(v: i64) -> Self {
        Self::from_data(ValueData::Number(Number::Integer(v)))
    }
}

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Self::from_data(ValueData::Number(Number::Float(v)))
    }
}

impl From<Number> for Value<'_> {
    fn from(v: Number) -> Self {
        Self::from_data(ValueData::Number(v))
    }
}

impl<'alloc> From<JsonString<'alloc>> for Value<'alloc> {
    fn from(v: JsonString<'alloc>) -> Self {
        Self::from_data(ValueData::String(v))
    }
}

impl PartialEq for Value<'_> {
    /// Structural comparison of the payload; parent links are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.data, f)
    }
}

/// A parsed or hand-built value tree pinned in allocator memory.
///
/// The root value lives in a slot obtained from the tree's allocator, so
/// every parent link in the tree stays valid for the document's lifetime.
pub struct Document<'alloc> {
    slot: NonNull<Value<'alloc>>,
    alloc: &'alloc dyn Allocator,
}

impl<'alloc> Document<'alloc> {
    /// Pin `value` as the root of a document, or `None` when the allocator
    /// cannot hold the root slot.
    pub fn new(value: Value<'alloc>, alloc: &'alloc dyn Allocator) -> Option<Self> {
        let slot = alloc.allocate_one::<Value<'alloc>>()?;
        // SAFETY: fresh storage; the root is pinned there until drop.
        unsafe {
            ptr::write(slot.as_ptr(), value);
            (*slot.as_ptr()).clear_parent();
            (*slot.as_ptr()).reparent_children();
        }
        Some(Self { slot, alloc })
    }

    /// Take over a root slot already placed in `alloc`.
    ///
    /// # Safety
    ///
    /// `slot` must hold an initialized root value in storage from `alloc`
    /// and ownership of both moves into the document.
    pub(crate) unsafe fn from_raw(slot: NonNull<Value<'alloc>>, alloc: &'alloc dyn Allocator) -> Self {
        Self { slot, alloc }
    }

    pub fn root(&self) -> &Value<'alloc> {
        // SAFETY: slot holds the live root for the document's lifetime.
        unsafe { self.slot.as_ref() }
    }

    pub fn root_mut(&mut self) -> &mut Value<'alloc> {
        // SAFETY: slot holds the live root for the document's lifetime.
        unsafe { self.slot.as_mut() }
    }
}

impl Drop for Document<'_> {
    fn drop(&mut self) {
        // SAFETY: the document owns the root slot.
        unsafe { self.alloc.destroy(self.slot) };
    }
}

impl<'alloc> core::ops::Deref for Document<'alloc> {
    type Target = Value<'alloc>;

    fn deref(&self) -> &Self::Target {
        self.root()
    }
}

impl core::ops::DerefMut for Document<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.root_mut()
    }
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.root(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{FailAllocator, PoolAllocator};

    #[test]
    fn variant_predicates() {
        let mut mem = [0u8; 256];
        let pool = PoolAllocator::new(&mut mem);
        assert!(Value::null().is_null());
        assert!(Value::from(true).is_bool());
        assert!(Value::from(1i64).is_number());
        assert!(Value::array_in(&pool).is_array());
        assert!(Value::object_in(&pool).is_object());
        let s = Value::string_in("hi", &pool).unwrap();
        assert!(s.is_string());
        assert_eq!(s.as_str(), Some("hi"));
    }

    #[test]
    fn parent_links_through_document() {
        let mut mem = [0u8; 4096];
        let pool = PoolAllocator::new(&mut mem);

        let mut root = Value::object_in(&pool);
        let inner = root.insert("items", Value::array_in(&pool)).unwrap();
        inner.push(Value::from(1i64)).unwrap();
        inner.push(Value::from(2i64)).unwrap();

        let doc = Document::new(root, &pool).unwrap();
        let items = doc.root().as_object().unwrap().get("items").unwrap();
        assert!(items.is_object_item());
        let first = items.as_array().unwrap().first().unwrap();
        assert!(first.is_array_item());
        assert!(!first.is_object_item());
        assert!(core::ptr::eq(first.root(), doc.root()));
    }

    #[test]
    fn push_on_non_array_is_rejected() {
        let mut root = Value::null();
        assert!(root.push(Value::from(1i64)).is_none());
        assert!(root.insert("k", Value::from(1i64)).is_none());
    }

    #[test]
    fn document_drop_returns_everything() {
        let mut mem = [0u8; 4096];
        let pool = PoolAllocator::new(&mut mem);
        {
            let mut root = Value::array_in(&pool);
            root.push(Value::string_in("payload", &pool).unwrap());
            let _doc = Document::new(root, &pool).unwrap();
            assert!(!pool.empty());
        }
        assert!(pool.empty());
    }

    #[test]
    fn fail_allocator_cannot_pin_a_document() {
        assert!(Document::new(Value::null(), &FailAllocator).is_none());
    }

    #[test]
    fn structural_equality_ignores_parents() {
        let mut mem = [0u8; 4096];
        let pool = PoolAllocator::new(&mut mem);
        let mut a = Value::array_in(&pool);
        a.push(Value::from(1i64));
        let mut b = Value::array_in(&pool);
        b.push(Value::from(1i64));
        assert_eq!(a, b);
        b.push(Value::from(2i64));
        assert_ne!(a, b);
    }
}
