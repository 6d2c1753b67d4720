// SPDX-License-Identifier: Apache-2.0

//! Embedded-friendly JSON value trees with pluggable memory allocation.
//!
//! Every node of a document comes from an explicit [`Allocator`], so the
//! whole crate runs out of a fixed buffer ([`PoolAllocator`]), demand-grown
//! heap blocks ([`BlockAllocator`]) or nothing at all ([`FailAllocator`]).
//! Input bytes stream through a Unicode [`Decoder`](unicode::Decoder) into
//! the incremental [`Parser`], which yields a [`Document`] pinned in
//! allocator memory. Allocation failure is reported through return values
//! and degrades to no-ops; nothing in this crate panics on exhaustion.

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc as alloc_crate;

// Compile-time configuration validation
mod config_check;

mod allocator;
#[cfg(feature = "alloc")]
pub use allocator::block::BlockAllocator;
pub use allocator::locked::Locked;
pub use allocator::pool::PoolAllocator;
pub use allocator::standard::FailAllocator;
#[cfg(feature = "alloc")]
pub use allocator::standard::StandardAllocator;
#[cfg(feature = "alloc")]
pub use allocator::ConcurrentBlockAllocator;
pub use allocator::{default_allocator, Allocator, AllocatorExt, MAX_ALIGN};

mod list;

mod json_number;
pub use json_number::Number;

mod json_string;
pub use json_string::JsonString;

mod array;
pub use array::Array;

mod object;
pub use object::{Object, Pair};

mod value;
pub use value::{Document, Value, ValueData};

pub mod unicode;
pub use unicode::{Decoder, Encoder, Encoding, UnicodeError};

mod parse_error;
pub use parse_error::ParseError;

mod parser;
pub use parser::Parser;

/// Parse a JSON document held in `bytes` (UTF-8) into a value tree backed by
/// the process-wide default allocator.
pub fn parse(bytes: &[u8]) -> Result<Document<'static>, ParseError> {
    parse_in(bytes, default_allocator())
}

/// Parse a JSON document held in `bytes` (UTF-8) into a value tree backed by
/// an explicit allocator.
pub fn parse_in<'alloc>(
    bytes: &[u8],
    alloc: &'alloc dyn Allocator,
) -> Result<Document<'alloc>, ParseError> {
    let mut parser = Parser::new_in(alloc);
    parser.feed(bytes)?;
    parser.finish()
}
