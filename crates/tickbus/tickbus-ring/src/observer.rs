//! Read side of the ring.
//!
//! An observer holds a read-only mapping plus a process-local cursor; it
//! never writes to the region, so any number of observers coexist without
//! seeing each other. Reading is a copy-and-revalidate protocol:
//!
//! 1. acquire-load `positions`, repair the cursor if the window moved
//!    past it (underflow fixup), and spin until `read_pos < last`;
//! 2. copy the record out of `slot[read_pos & mask]`; the copy is
//!    unsynchronised, so the bytes may be torn by a concurrent overwrite;
//! 3. acquire-load `positions` again and re-run the fixup. If the cursor
//!    did not move, no overwrite can have touched the slot (the producer
//!    pulls `first` past a slot before rewriting it) and the copy is
//!    returned; otherwise it is discarded and the loop retries.
//!
//! The second load is load-bearing: a stalled observer that skipped it
//! could return a half-old, half-new record.
//!
//! # Falling behind
//!
//! When the producer laps an observer, `first` moves past `read_pos` and
//! the bytes at the cursor have been overwritten. The repair jumps the
//! cursor to `first + underflow_fixup`, past the oldest live record, so
//! that a producer still writing at full rate does not immediately lap
//! the observer again. The skipped records are gone; consumers account
//! for them through their own sequence numbers. The fixup runs on every
//! positions load, so a lagging observer heals no matter which operation
//! it is in.

use std::cell::Cell;
use std::hint;
use std::marker::PhantomData;
use std::mem::size_of;
use std::path::Path;
use std::sync::atomic::Ordering;

use tickbus_shm::ShmRegion;

use crate::error::RingError;
use crate::iter::RingIter;
use crate::layout::{RingHeader, Slot, unpack};

/// Cursor jump distance applied when the producer laps an observer.
pub const DEFAULT_UNDERFLOW_FIXUP: u32 = 128;

/// A non-consuming reader attached to an existing ring.
///
/// All read operations take `&self`; the cursor lives in a [`Cell`], so
/// the handle is `Send` but not `Sync`.
pub struct RingObserver<T: Copy> {
    /// Keeps the read-only mapping alive; not accessed after init.
    _region: ShmRegion,
    /// Header location (region base).
    base: *const u8,
    /// First slot, resolved through the stored `data_offset`.
    data: *const Slot<T>,
    /// Position of the next record to read.
    read_pos: Cell<u32>,
    /// Cached `capacity - 1`; avoids touching header memory on the hot path.
    mask: u32,
    underflow_fixup: u32,
    _pd: PhantomData<T>,
}

// SAFETY: the handle owns the mapping its pointers refer to, and the
// Cell cursor keeps it single-threaded at a time.
unsafe impl<T: Copy + Send> Send for RingObserver<T> {}

impl<T: Copy> std::fmt::Debug for RingObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingObserver")
            .field("base", &self.base)
            .field("data", &self.data)
            .field("read_pos", &self.read_pos.get())
            .field("mask", &self.mask)
            .field("underflow_fixup", &self.underflow_fixup)
            .finish()
    }
}

/// `true` when `pos` lies before `target` in modular order. Exact while
/// the two stay within `2^31` of each other, which the window invariant
/// guarantees.
#[inline(always)]
fn lags(pos: u32, target: u32) -> bool {
    (target.wrapping_sub(pos) as i32) > 0
}

impl<T: Copy> RingObserver<T> {
    /// Attach to the ring at `path` with the default underflow fixup.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RingError> {
        Self::open_with_fixup(path, DEFAULT_UNDERFLOW_FIXUP)
    }

    /// Attach to the ring at `path`, jumping `underflow_fixup` records
    /// past the oldest live one whenever the producer laps this observer.
    ///
    /// Larger values buy a lagging observer more headroom before the next
    /// lap at the cost of skipping more records per repair.
    ///
    /// # Errors
    ///
    /// - [`RingError::InvalidArgument`] if `underflow_fixup` is zero.
    /// - [`RingError::Mapping`] if no ring exists under `path`.
    /// - [`RingError::VersionMismatch`] / [`RingError::TypeMismatch`] if
    ///   the stored header disagrees with this build or with `T`.
    pub fn open_with_fixup<P: AsRef<Path>>(
        path: P,
        underflow_fixup: u32,
    ) -> Result<Self, RingError> {
        if underflow_fixup == 0 {
            return Err(RingError::InvalidArgument(
                "underflow fixup must be at least 1",
            ));
        }

        let region = ShmRegion::open_ro(path)?;
        if region.len() < size_of::<RingHeader>() {
            return Err(RingError::Config("region is smaller than a ring header"));
        }
        let base = region.as_ptr();

        // SAFETY: the region spans at least a header, checked above;
        // `validate` rejects anything a compatible producer did not write.
        let header = unsafe { &*(base as *const RingHeader) };
        header.validate::<T>()?;

        let data = unsafe { base.add(header.data_offset) } as *const Slot<T>;
        let mask = (header.capacity - 1) as u32;
        let (first, _) = unpack(header.positions.load(Ordering::Acquire));

        Ok(Self {
            _region: region,
            base,
            data,
            read_pos: Cell::new(first),
            mask,
            underflow_fixup,
            _pd: PhantomData,
        })
    }

    #[inline(always)]
    fn header(&self) -> &RingHeader {
        // SAFETY: validated at attach; the mapping outlives `self`.
        unsafe { &*(self.base as *const RingHeader) }
    }

    /// Acquire-load the window and repair the cursor if it was lapped.
    /// Every read of `positions` funnels through here, so the observer
    /// self-heals in whichever operation notices the lap.
    #[inline(always)]
    fn load_positions(&self) -> (u32, u32) {
        let (first, last) = unpack(self.header().positions.load(Ordering::Acquire));
        if lags(self.read_pos.get(), first) {
            self.read_pos.set(first.wrapping_add(self.underflow_fixup));
        }
        (first, last)
    }

    /// Number of records available to this observer.
    ///
    /// Zero when the cursor has overrun `last` (see
    /// [`advance_by`](Self::advance_by)) or when the ring is drained.
    pub fn len(&self) -> usize {
        let (_, last) = self.load_positions();
        let avail = last.wrapping_sub(self.read_pos.get()) as i32;
        if avail > 0 { avail as usize } else { 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the record at the cursor, spinning until one is available.
    ///
    /// The spin is unbounded by design; callers needing a bounded wait
    /// poll [`try_get`](Self::try_get) at their own pace.
    pub fn get(&self) -> T {
        loop {
            let (_, mut last) = self.load_positions();
            while !lags(self.read_pos.get(), last) {
                hint::spin_loop();
                (_, last) = self.load_positions();
            }

            let saved = self.read_pos.get();
            // SAFETY: index is masked into the slot array; a torn copy is
            // detected and discarded below.
            let item = unsafe { (*self.data.add((saved & self.mask) as usize)).read() };

            self.load_positions();
            if self.read_pos.get() == saved {
                return item;
            }
            // The producer overtook us mid-copy; the fixup has already
            // relocated the cursor, go again from there.
        }
    }

    /// Like [`get`](Self::get), but returns `None` instead of waiting
    /// when no record is available at the observed window.
    pub fn try_get(&self) -> Option<T> {
        loop {
            let (_, last) = self.load_positions();
            let saved = self.read_pos.get();
            if !lags(saved, last) {
                return None;
            }

            // SAFETY: as in `get`.
            let item = unsafe { (*self.data.add((saved & self.mask) as usize)).read() };

            self.load_positions();
            if self.read_pos.get() == saved {
                return Some(item);
            }
        }
    }

    /// Move the cursor forward one record.
    #[inline]
    pub fn advance(&self) {
        self.advance_by(1);
    }

    /// Move the cursor forward `n` records without bounds checking.
    ///
    /// Overshooting `last` is permitted: [`len`](Self::len) reports zero
    /// until the producer catches up to the cursor.
    #[inline]
    pub fn advance_by(&self, n: usize) {
        self.read_pos
            .set(self.read_pos.get().wrapping_add(n as u32));
    }

    /// Single-pass iterator over the records currently available.
    ///
    /// The iterator shares this observer's cursor, ends as soon as the
    /// observer is empty at the point of advancement, and is therefore
    /// not restartable: a second `iter()` resumes where the first left
    /// off.
    pub fn iter(&self) -> RingIter<'_, T> {
        RingIter::new(self)
    }
}

impl<'a, T: Copy> IntoIterator for &'a RingObserver<T> {
    type Item = T;
    type IntoIter = RingIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
