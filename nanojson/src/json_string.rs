// SPDX-License-Identifier: Apache-2.0

//! Allocator-backed UTF-8 string used for object keys and string values.

use core::fmt;
use core::ptr::NonNull;

use crate::allocator::Allocator;

/// Growable UTF-8 string drawing its buffer from an [`Allocator`].
///
/// Growth that fails to allocate leaves the string unchanged and reports
/// `false`; nothing in this type panics on exhaustion.
pub struct JsonString<'alloc> {
    data: Option<NonNull<u8>>,
    len: usize,
    alloc: &'alloc dyn Allocator,
}

impl<'alloc> JsonString<'alloc> {
    /// An empty string; no buffer is reserved until the first append.
    pub fn new_in(alloc: &'alloc dyn Allocator) -> Self {
        Self {
            data: None,
            len: 0,
            alloc,
        }
    }

    /// Copy `s` into a fresh allocator-backed string, or `None` when the
    /// allocator cannot hold it.
    pub fn from_str_in(s: &str, alloc: &'alloc dyn Allocator) -> Option<Self> {
        let mut out = Self::new_in(alloc);
        if out.push_str(s) {
            Some(out)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes currently reserved for content.
    pub fn capacity(&self) -> usize {
        // SAFETY: data, when present, came from self.alloc.
        unsafe { self.alloc.size_of(self.data) }
    }

    pub fn as_str(&self) -> &str {
        match self.data {
            // SAFETY: len bytes are initialized and only ever written from
            // &str fragments or encoded chars, so they are valid UTF-8.
            Some(ptr) => unsafe {
                core::str::from_utf8_unchecked(core::slice::from_raw_parts(ptr.as_ptr(), self.len))
            },
            None => "",
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    /// Drop the content but keep the buffer for reuse.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Ensure room for `additional` more bytes. Returns false (leaving the
    /// string untouched) when the allocator refuses.
    fn reserve(&mut self, additional: usize) -> bool {
        let Some(needed) = self.len.checked_add(additional) else {
            return false;
        };
        if needed <= self.capacity() {
            return true;
        }
        let grown = needed.max(self.capacity().saturating_mul(2)).max(16);
        // SAFETY: data, when present, came from self.alloc; on failure the
        // old buffer is left intact by the reallocate contract.
        match unsafe { self.alloc.reallocate(self.data, grown) } {
            Some(fresh) => {
                self.data = Some(fresh);
                true
            }
            None => false,
        }
    }

    /// Append a string fragment. Returns false and leaves the content
    /// unchanged when the buffer cannot grow.
    pub fn push_str(&mut self, s: &str) -> bool {
        if s.is_empty() {
            return true;
        }
        if !self.reserve(s.len()) {
            return false;
        }
        let Some(data) = self.data else { return false };
        // SAFETY: reserve() guaranteed room past self.len.
        unsafe {
            core::ptr::copy_nonoverlapping(s.as_ptr(), data.as_ptr().add(self.len), s.len());
        }
        self.len += s.len();
        true
    }

    /// Append one character. Returns false when the buffer cannot grow.
    pub fn push(&mut self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.push_str(c.encode_utf8(&mut buf))
    }
}

impl Drop for JsonString<'_> {
    fn drop(&mut self) {
        // SAFETY: data, when present, came from self.alloc.
        unsafe { self.alloc.deallocate(self.data) };
    }
}

impl fmt::Debug for JsonString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for JsonString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::ops::Deref for JsonString<'_> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for JsonString<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialEq<str> for JsonString<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for JsonString<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{FailAllocator, PoolAllocator};

    #[test]
    fn starts_empty_without_buffer() {
        let mut mem = [0u8; 128];
        let pool = PoolAllocator::new(&mut mem);
        let s = JsonString::new_in(&pool);
        assert!(s.is_empty());
        assert_eq!(s.as_str(), "");
        assert_eq!(s.capacity(), 0);
        drop(s);
        assert!(pool.empty());
    }

    #[test]
    fn append_and_grow() {
        let mut mem = [0u8; 256];
        let pool = PoolAllocator::new(&mut mem);
        let mut s = JsonString::new_in(&pool);
        assert!(s.push_str("hello"));
        assert!(s.push(' '));
        assert!(s.push_str("world, this outgrows the first reservation"));
        assert_eq!(&s[..11], "hello world");
        assert!(s.len() > 16);
    }

    #[test]
    fn failed_growth_leaves_content() {
        let mut mem = [0u8; 64];
        let pool = PoolAllocator::new(&mut mem);
        let mut s = JsonString::new_in(&pool);
        assert!(s.push_str("short"));
        let big = core::str::from_utf8(&[b'x'; 128]).unwrap();
        assert!(!s.push_str(big));
        assert_eq!(s.as_str(), "short");
    }

    #[test]
    fn fail_allocator_yields_no_string() {
        assert!(JsonString::from_str_in("anything", &FailAllocator).is_none());
        let mut s = JsonString::new_in(&FailAllocator);
        assert!(!s.push('x'));
        assert_eq!(s.as_str(), "");
    }

    #[test]
    fn unicode_round_trip() {
        let mut mem = [0u8; 128];
        let pool = PoolAllocator::new(&mut mem);
        let mut s = JsonString::new_in(&pool);
        assert!(s.push('😀'));
        assert!(s.push_str("αβ"));
        assert_eq!(s.as_str(), "😀αβ");
    }
}
