//! Measurement support for the tickbus concurrency harness.
//!
//! The ring core deliberately reports nothing about loss or latency, so
//! the harness does its own accounting: [`SeqAudit`] folds the `seq_no`
//! stream an observer delivers into delivered/gapped counters, and
//! [`LatencyLadder`] collects producer-stamp-to-copy latencies whenever
//! an observer is caught up. The scratch-ring helpers are shared by the
//! report binary and the criterion benches.

pub mod audit;
pub mod config;
pub mod latency;

pub use audit::SeqAudit;
pub use latency::{
    LatencyLadder, LatencySummary, MonoClock, print_latency_header, print_latency_row,
};

use std::path::PathBuf;

use tickbus_events::{SymbolId, Tick};

/// Region path for a throwaway ring, unique per process so suites can
/// run in parallel.
pub fn scratch_ring(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tickbus_perf_{}_{}", label, std::process::id()))
}

/// A plausible top-of-book tick, deterministic in `seq_no` so benches
/// do not feed the branch predictor a constant.
pub fn sample_tick(seq_no: u64) -> Tick {
    let wobble = (seq_no % 40) as i64;
    Tick {
        ts_recv_ns: 0,
        seq_no,
        symbol: SymbolId(7),
        bid_px_ticks: 99_980 + wobble,
        bid_qty_lots: 2 + (seq_no % 3) as i64,
        ask_px_ticks: 100_020 + wobble,
        ask_qty_lots: 1 + (seq_no % 5) as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_rings_are_distinct_per_label() {
        assert_ne!(scratch_ring("a"), scratch_ring("b"));
    }

    #[test]
    fn sample_ticks_keep_a_positive_spread() {
        for seq in 0..100 {
            let tick = sample_tick(seq);
            assert_eq!(tick.seq_no, seq);
            assert!(tick.spread_ticks() > 0);
        }
    }
}
