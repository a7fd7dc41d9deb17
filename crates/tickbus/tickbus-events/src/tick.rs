/// Instrument identifier, stable across all processes on the bus.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SymbolId(pub u16);

/// One top-of-book tick as carried over the ring.
///
/// Plain old data: fixed size, `Copy`, no pointers, so it can be copied
/// bitwise between processes. `seq_no` is assigned by the publisher and
/// increases by one per tick; a consumer that observes a jump knows the
/// ring lapped it and how many ticks it lost.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tick {
    pub ts_recv_ns: u64,
    pub seq_no: u64,
    pub bid_px_ticks: i64,
    pub bid_qty_lots: i64,
    pub ask_px_ticks: i64,
    pub ask_qty_lots: i64,
    pub symbol: SymbolId,
}

impl Tick {
    #[inline]
    pub fn mid_ticks(&self) -> i64 {
        (self.bid_px_ticks + self.ask_px_ticks) / 2
    }

    #[inline]
    pub fn spread_ticks(&self) -> i64 {
        self.ask_px_ticks - self.bid_px_ticks
    }
}
