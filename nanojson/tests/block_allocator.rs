// SPDX-License-Identifier: Apache-2.0

//! Block allocator growth and release, observed through `block_count`.

use nanojson::{Allocator, BlockAllocator};
use test_log::test;

#[test]
fn grows_one_block_at_a_time() {
    let alloc = BlockAllocator::with_block_size(256);
    assert_eq!(alloc.block_count(), 0);

    let first = alloc.allocate(64).expect("allocation failed");
    assert_eq!(alloc.block_count(), 1);

    // Keep allocating until a second block appears.
    let mut held = vec![first];
    while alloc.block_count() == 1 {
        held.push(alloc.allocate(64).expect("allocation failed"));
    }
    assert_eq!(alloc.block_count(), 2);
    for ptr in held {
        unsafe { alloc.deallocate(Some(ptr)) };
    }
    assert_eq!(alloc.block_count(), 0);
}

#[test]
fn oversized_requests_get_their_own_block() {
    let alloc = BlockAllocator::with_block_size(256);
    let big = alloc.allocate(4096).expect("allocation failed");
    let small = alloc.allocate(16).expect("allocation failed");
    assert_eq!(alloc.block_count(), 2);
    unsafe {
        assert!(alloc.size_of(Some(big)) >= 4096);
        assert!(alloc.size_of(Some(small)) >= 16);
        alloc.deallocate(Some(big));
    }
    // The small allocation keeps its block alive.
    assert_eq!(alloc.block_count(), 1);
    unsafe { alloc.deallocate(Some(small)) };
    assert_eq!(alloc.block_count(), 0);
    assert!(!alloc.bad_allocation());
}

#[test]
fn reallocate_preserves_contents_across_blocks() {
    let alloc = BlockAllocator::with_block_size(256);
    let ptr = alloc.allocate(32).expect("allocation failed");
    unsafe {
        for i in 0..32 {
            *ptr.as_ptr().add(i) = i as u8;
        }
        let grown = alloc
            .reallocate(Some(ptr), 2048)
            .expect("reallocation failed");
        for i in 0..32 {
            assert_eq!(*grown.as_ptr().add(i), i as u8);
        }
        alloc.deallocate(Some(grown));
    }
    assert_eq!(alloc.block_count(), 0);
}
