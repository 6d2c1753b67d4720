// SPDX-License-Identifier: Apache-2.0

//! Compile-time configuration validation
//!
//! This module contains compile-time checks to ensure that mutually exclusive
//! features are not enabled simultaneously.

// Compile-time checks for the mutually exclusive global allocator features

// If none were selected that's an error
#[cfg(not(any(
    feature = "global-concurrent",
    feature = "global-pool",
    feature = "global-standard",
    feature = "global-none"
)))]
compile_error!("No global allocator feature selected: choose one of 'global-concurrent', 'global-pool', 'global-standard', or 'global-none'");

#[cfg(all(feature = "global-concurrent", feature = "global-pool"))]
compile_error!("Cannot enable both 'global-concurrent' and 'global-pool' features simultaneously: choose one global allocator");

#[cfg(all(feature = "global-concurrent", feature = "global-standard"))]
compile_error!("Cannot enable both 'global-concurrent' and 'global-standard' features simultaneously: choose one global allocator");

#[cfg(all(feature = "global-concurrent", feature = "global-none"))]
compile_error!("Cannot enable both 'global-concurrent' and 'global-none' features simultaneously: choose one global allocator");

#[cfg(all(feature = "global-pool", feature = "global-standard"))]
compile_error!("Cannot enable both 'global-pool' and 'global-standard' features simultaneously: choose one global allocator");

#[cfg(all(feature = "global-pool", feature = "global-none"))]
compile_error!("Cannot enable both 'global-pool' and 'global-none' features simultaneously: choose one global allocator");

#[cfg(all(feature = "global-standard", feature = "global-none"))]
compile_error!("Cannot enable both 'global-standard' and 'global-none' features simultaneously: choose one global allocator");

// Checks that the selected global allocator can actually be built

#[cfg(all(feature = "global-concurrent", not(feature = "alloc")))]
compile_error!("'global-concurrent' needs the 'alloc' feature: the block allocator grows through the platform allocator");

#[cfg(all(feature = "global-standard", not(feature = "alloc")))]
compile_error!("'global-standard' needs the 'alloc' feature: it forwards to the platform allocator");
