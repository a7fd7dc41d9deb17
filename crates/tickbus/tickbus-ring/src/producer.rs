//! Write side of the ring.
//!
//! The producer owns the only writable mapping of the region. It never
//! blocks and never coordinates with observers: each push writes the slot
//! at `last & (capacity - 1)` and then publishes a new `(first, last)`
//! window with a single release store. When the window would reach
//! `capacity`, `first` is pulled forward so that exactly one slot stays
//! free: the slot being written next is then never one an observer
//! cursor may legally point at, which is what makes the observers'
//! copy-and-revalidate protocol sound.

use std::marker::PhantomData;
use std::path::Path;
use std::ptr;
use std::sync::atomic::Ordering;

use tickbus_shm::ShmRegionMut;

use crate::error::RingError;
use crate::layout::{self, CACHE_LINE, RingHeader, Slot, pack, unpack};

/// Creation parameters for a ring.
///
/// `capacity` must be a power of two no greater than `u32::MAX`; the
/// power-of-two requirement turns every `pos % capacity` into
/// `pos & (capacity - 1)`.
#[derive(Debug, Copy, Clone)]
pub struct RingConfig {
    pub capacity: usize,
    pub remove_on_close: bool,
}

impl RingConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            remove_on_close: false,
        }
    }

    /// Remove the region name when the producer drops.
    pub fn remove_on_close(mut self, remove: bool) -> Self {
        self.remove_on_close = remove;
        self
    }

    fn validated_mask(&self) -> Result<u32, RingError> {
        if self.capacity == 0 || self.capacity > u32::MAX as usize {
            return Err(RingError::InvalidArgument(
                "ring capacity must be in [1, u32::MAX]",
            ));
        }
        if !self.capacity.is_power_of_two() {
            return Err(RingError::InvalidArgument(
                "ring capacity must be a power of two",
            ));
        }
        Ok((self.capacity - 1) as u32)
    }
}

/// The unique write handle for a ring.
///
/// `Send` but not `Sync`, and not `Clone`: exactly one thread publishes.
pub struct RingProducer<T: Copy> {
    /// Owns the mapping and the name lifetime; not accessed after init.
    _region: ShmRegionMut,
    /// Header location (region base).
    base: *mut u8,
    /// First slot; slot `i` lives at `data + i`.
    data: *mut Slot<T>,
    /// `capacity - 1`, doubling as the index mask and the window limit.
    mask: u32,
    capacity: usize,
    _pd: PhantomData<T>,
}

// SAFETY: the handle owns the writable mapping; the raw pointers are
// interior to it and valid wherever the handle moves.
unsafe impl<T: Copy + Send> Send for RingProducer<T> {}

impl<T: Copy> RingProducer<T> {
    /// Create the region at `path`, place the header, and return the
    /// write handle.
    ///
    /// # Errors
    ///
    /// - [`RingError::InvalidArgument`] for a zero, oversized, or
    ///   non-power-of-two capacity.
    /// - [`RingError::Config`] if the OS reports an L1 cache line larger
    ///   than the compiled-in [`CACHE_LINE`] (slot strides would disagree
    ///   across processes), or if one slot exceeds the system page size.
    /// - [`RingError::Mapping`] if the name is already taken or the OS
    ///   rejects the mapping.
    pub fn create<P: AsRef<Path>>(path: P, cfg: RingConfig) -> Result<Self, RingError> {
        let mask = cfg.validated_mask()?;

        if os_cache_line_size() > CACHE_LINE {
            return Err(RingError::Config(
                "host cache line is larger than the compiled-in slot alignment",
            ));
        }
        if layout::slot_stride::<T>() > os_page_size() {
            return Err(RingError::Config(
                "record slot is larger than the system page size",
            ));
        }

        let bytes = layout::bytes_for_ring::<T>(cfg.capacity);
        let mut region = ShmRegionMut::create_rw(path, bytes as u64, cfg.remove_on_close)?;
        let base = region.as_mut_ptr();

        // SAFETY: the region was sized for the header plus `capacity`
        // slots, and no other process can have mapped it yet.
        unsafe {
            ptr::write(
                base as *mut RingHeader,
                RingHeader::for_record::<T>(cfg.capacity),
            );
        }
        let data = unsafe { base.add(layout::data_offset::<T>()) } as *mut Slot<T>;

        Ok(Self {
            _region: region,
            base,
            data,
            mask,
            capacity: cfg.capacity,
            _pd: PhantomData,
        })
    }

    #[inline(always)]
    fn header(&self) -> &RingHeader {
        // SAFETY: the header was written in place by `create` and is never
        // moved or dropped for the lifetime of the mapping.
        unsafe { &*(self.base as *const RingHeader) }
    }

    /// Append one record, overwriting the oldest when the ring is full.
    #[inline(always)]
    pub fn push(&mut self, val: T) {
        self.push_with(|| val)
    }

    /// Append the record produced by `init`, written straight into the
    /// slot. The in-place form of [`push`](Self::push).
    #[inline(always)]
    pub fn push_with<F: FnOnce() -> T>(&mut self, init: F) {
        // Sole writer of `positions`, so a relaxed load sees our own
        // previous store.
        let (first, last) = unpack(self.header().positions.load(Ordering::Relaxed));

        // SAFETY: the index is masked into the slot array. An observer
        // copying this slot concurrently has already been moved past by
        // `first` (the window keeps one slot free), so its positions
        // re-load will tell it to discard the torn copy.
        unsafe { (*self.data.add((last & self.mask) as usize)).write(init()) };

        let new_last = last.wrapping_add(1);
        // Window may hold at most capacity - 1 items; sacrificing one slot
        // keeps the next write target out of every observer's legal range.
        let new_first = if new_last.wrapping_sub(first) > self.mask {
            new_last.wrapping_sub(self.mask)
        } else {
            first
        };

        // Publish: pairs with the observers' acquire loads, ordering the
        // slot write before the new window becomes visible.
        self.header()
            .positions
            .store(pack(new_first, new_last), Ordering::Release);
    }

    /// Number of slots in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live records, at most `capacity - 1`.
    ///
    /// Correct across counter wrap: the window never exceeds
    /// `capacity - 1 < 2^31`, so the modular difference is exact.
    #[inline]
    pub fn len(&self) -> usize {
        let (first, last) = unpack(self.header().positions.load(Ordering::Relaxed));
        last.wrapping_sub(first) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn os_page_size() -> usize {
    let n = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if n > 0 { n as usize } else { 4096 }
}

#[cfg(target_os = "linux")]
fn os_cache_line_size() -> usize {
    let n = unsafe { libc::sysconf(libc::_SC_LEVEL1_DCACHE_LINESIZE) };
    if n > 0 { n as usize } else { CACHE_LINE }
}

#[cfg(target_os = "macos")]
fn os_cache_line_size() -> usize {
    let mut line: u64 = 0;
    let mut len = std::mem::size_of::<u64>() as libc::size_t;
    let rc = unsafe {
        libc::sysctlbyname(
            c"hw.cachelinesize".as_ptr(),
            &mut line as *mut u64 as *mut libc::c_void,
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc == 0 && line > 0 { line as usize } else { CACHE_LINE }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn os_cache_line_size() -> usize {
    CACHE_LINE
}
