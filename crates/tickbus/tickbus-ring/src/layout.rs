//! Shared-memory layout of a tickbus ring.
//!
//! The layout is bit-exact so that independently compiled processes agree
//! on every offset:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ version │ data_size │ data_offset │ capacity │ positions     │
//! │ i32 @0  │ usize @8  │ usize @16   │ usize @24│ AtomicU64 @32 │
//! ├──────────────────────────────────────────────────────────────┤  data_offset
//! │ Slot[0]   (cache-line aligned, one record per slot)          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ ...                                                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Slot[capacity - 1]                                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `positions` packs the `(first, last)` window counters into one 64-bit
//! word so a single atomic load transports a consistent pair; this is
//! what lets observers snapshot the window without a mutex. Both counters
//! are free-running `u32`s: the live window `[first, last)` never exceeds
//! `capacity - 1`, so modular subtraction stays correct across wrap.

use std::mem::{MaybeUninit, offset_of, size_of};
use std::sync::atomic::AtomicU64;

use crate::error::RingError;

// The packed positions word must be a single native atomic; on a target
// where 64-bit atomics are emulated the protocol cannot work.
#[cfg(not(target_has_atomic = "64"))]
compile_error!("tickbus requires native 64-bit atomic loads and stores");

/// Layout revision stored in every ring header.
pub const RING_VERSION: i32 = 1;

/// Compiled-in cache line size; slot alignment and the minimum slot
/// stride both derive from it. Creation fails on hosts reporting a
/// larger L1 line, since independently compiled processes must agree on
/// the stride.
pub const CACHE_LINE: usize = 64;

/// Header placed at offset 0 of the region.
///
/// `version` and `data_size` are written once by the creator and never
/// change; observers validate both at attach. `positions` is the only
/// mutable word in the header.
#[repr(C)]
pub struct RingHeader {
    pub version: i32,
    pub data_size: usize,
    pub data_offset: usize,
    pub capacity: usize,
    pub positions: AtomicU64,
}

// Attached processes address these fields by offset; pin the layout.
const _: () = {
    assert!(offset_of!(RingHeader, version) == 0);
    assert!(offset_of!(RingHeader, data_size) == 8);
    assert!(offset_of!(RingHeader, data_offset) == 16);
    assert!(offset_of!(RingHeader, capacity) == 24);
    assert!(offset_of!(RingHeader, positions) == 32);
    assert!(size_of::<RingHeader>() == 40);
};

impl RingHeader {
    /// Header for a freshly created ring of `capacity` slots of `T`.
    pub fn for_record<T: Copy>(capacity: usize) -> Self {
        Self {
            version: RING_VERSION,
            data_size: size_of::<T>(),
            data_offset: data_offset::<T>(),
            capacity,
            positions: AtomicU64::new(0),
        }
    }

    /// Attach-time validation against the expected record type.
    pub fn validate<T: Copy>(&self) -> Result<(), RingError> {
        if self.version != RING_VERSION {
            return Err(RingError::VersionMismatch {
                expected: RING_VERSION,
                found: self.version,
            });
        }
        if self.data_size != size_of::<T>() {
            return Err(RingError::TypeMismatch {
                expected: size_of::<T>(),
                stored: self.data_size,
            });
        }
        if !self.capacity.is_power_of_two() {
            return Err(RingError::Config(
                "stored ring capacity is not a power of two",
            ));
        }
        Ok(())
    }
}

/// Pack `(first, last)` into one positions word: `first` in the lower
/// half, `last` in the upper half.
#[inline(always)]
pub fn pack(first: u32, last: u32) -> u64 {
    ((last as u64) << 32) | first as u64
}

/// Split a positions word back into `(first, last)`.
#[inline(always)]
pub fn unpack(positions: u64) -> (u32, u32) {
    (positions as u32, (positions >> 32) as u32)
}

/// One storage cell of the ring.
///
/// Cache-line aligned so a record copy never straddles a line boundary
/// shared with a neighbouring slot, and so the stride is identical in
/// every process mapping the region. The cell starts uninitialised and is
/// reused forever; records are required to be `Copy`, so overwriting
/// never needs to drop the previous occupant.
#[repr(C, align(64))]
pub struct Slot<T: Copy> {
    item: MaybeUninit<T>,
}

impl<T: Copy> Slot<T> {
    /// Store a record, overwriting whatever the cell held.
    #[inline(always)]
    pub fn write(&mut self, value: T) {
        self.item.write(value);
    }

    /// Copy the record out of the cell.
    ///
    /// # Safety
    ///
    /// The cell may be overwritten concurrently by the producer, so the
    /// returned bytes may be torn. The caller must re-load the positions
    /// word afterwards and discard the copy if its cursor was moved.
    #[inline(always)]
    pub unsafe fn read(&self) -> T {
        unsafe { self.item.assume_init_read() }
    }
}

/// Byte stride between consecutive slots: at least one cache line, and a
/// whole multiple of it for larger records.
#[inline]
pub fn slot_stride<T: Copy>() -> usize {
    size_of::<Slot<T>>()
}

/// Offset of slot 0: past the header, rounded up to the slot stride so
/// every slot keeps its alignment.
#[inline]
pub fn data_offset<T: Copy>() -> usize {
    let stride = slot_stride::<T>();
    let base = size_of::<RingHeader>().max(stride);
    base.div_ceil(stride) * stride
}

/// Total region size for a ring of `capacity` slots of `T`.
#[inline]
pub fn bytes_for_ring<T: Copy>(capacity: usize) -> usize {
    data_offset::<T>() + capacity * slot_stride::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_round_trip() {
        for &(first, last) in &[
            (0u32, 0u32),
            (0, 1),
            (17, 4096),
            (u32::MAX, 0),          // first wrapped, last about to
            (u32::MAX - 3, u32::MAX),
        ] {
            assert_eq!(unpack(pack(first, last)), (first, last));
        }
    }

    #[test]
    fn pack_puts_first_in_the_low_half() {
        assert_eq!(pack(1, 0), 1);
        assert_eq!(pack(0, 1), 1 << 32);
    }

    #[test]
    fn slots_are_cache_line_multiples() {
        assert_eq!(slot_stride::<u8>(), 64);
        assert_eq!(slot_stride::<i32>(), 64);
        assert_eq!(slot_stride::<[u8; 64]>(), 64);
        assert_eq!(slot_stride::<[u8; 65]>(), 128);
        assert_eq!(slot_stride::<[u8; 200]>(), 256);
    }

    #[test]
    fn data_offset_clears_the_header_and_keeps_alignment() {
        assert_eq!(data_offset::<i32>(), 64);
        assert_eq!(data_offset::<[u8; 65]>(), 128);
        let off = data_offset::<[u8; 200]>();
        assert!(off >= size_of::<RingHeader>());
        assert_eq!(off % slot_stride::<[u8; 200]>(), 0);
    }

    #[test]
    fn region_size_covers_header_and_slots() {
        assert_eq!(bytes_for_ring::<i32>(4096), 64 + 4096 * 64);
    }

    #[test]
    fn validate_accepts_a_matching_header() {
        let header = RingHeader::for_record::<i32>(256);
        assert!(header.validate::<i32>().is_ok());
    }

    #[test]
    fn validate_rejects_version_and_size_mismatches() {
        let mut header = RingHeader::for_record::<i32>(256);
        header.version = RING_VERSION + 1;
        assert!(matches!(
            header.validate::<i32>(),
            Err(RingError::VersionMismatch { found, .. }) if found == RING_VERSION + 1
        ));

        let header = RingHeader::for_record::<i32>(256);
        assert!(matches!(
            header.validate::<u64>(),
            Err(RingError::TypeMismatch {
                expected: 8,
                stored: 4
            })
        ));
    }
}
