//! Shared-memory byte regions for the tickbus ring.
//!
//! A region is a named, process-shared span of bytes: the producer creates
//! it read-write, observers open it read-only. The region is opaque to the
//! ring protocol; the only guarantees it provides are a byte-stable base
//! address for the lifetime of the handle and cross-process visibility of
//! acquire/release operations on atomics placed inside it.
//!
//! The name is a filesystem path for the mapped file. Put it on a tmpfs
//! mount (e.g. `/dev/shm`) to get POSIX-shared-memory behaviour.

mod cleanup;
mod region;

pub use cleanup::{ScopeGuard, defer};
pub use region::{ShmRegion, ShmRegionMut};
