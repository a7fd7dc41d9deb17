//! Caught-up latency capture for the concurrency report.
//!
//! A latency sample is the distance from the producer's timestamp in a
//! tick to the moment an observer's copy of it lands. Samples are only
//! meaningful when the observer is caught up; a backlogged read measures
//! the backlog, so the harness records nothing for those.

use std::time::Instant;

/// Monotonic nanosecond clock anchored at harness start.
///
/// Producer and observer threads share copies of the same clock, so a
/// stamp taken on the write side can be subtracted from a reading taken
/// on the read side.
#[derive(Debug, Clone, Copy)]
pub struct MonoClock {
    epoch: Instant,
}

impl MonoClock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

/// Accumulates latency samples and reduces them to a quantile ladder.
#[derive(Debug)]
pub struct LatencyLadder {
    samples: Vec<u64>,
}

impl LatencyLadder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, ns: u64) {
        self.samples.push(ns);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sort and reduce to the ladder; `None` when nothing was recorded.
    pub fn summarize(mut self) -> Option<LatencySummary> {
        if self.samples.is_empty() {
            return None;
        }
        self.samples.sort_unstable();

        let rung = |q: f64| {
            let idx = ((self.samples.len() - 1) as f64 * q).round() as usize;
            self.samples[idx]
        };

        Some(LatencySummary {
            samples: self.samples.len(),
            floor_ns: self.samples[0],
            p50_ns: rung(0.50),
            p90_ns: rung(0.90),
            p99_ns: rung(0.99),
            p999_ns: rung(0.999),
            ceiling_ns: self.samples[self.samples.len() - 1],
        })
    }
}

/// Quantile ladder of one observer's caught-up latencies, in nanoseconds.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LatencySummary {
    pub samples: usize,
    pub floor_ns: u64,
    pub p50_ns: u64,
    pub p90_ns: u64,
    pub p99_ns: u64,
    pub p999_ns: u64,
    pub ceiling_ns: u64,
}

pub fn print_latency_header() {
    println!(
        "  {:<12} {:>8} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "", "samples", "floor", "p50", "p90", "p99", "p99.9", "ceiling",
    );
}

pub fn print_latency_row(label: &str, summary: &LatencySummary) {
    println!(
        "  {:<12} {:>8} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
        label,
        summary.samples,
        summary.floor_ns,
        summary.p50_ns,
        summary.p90_ns,
        summary.p99_ns,
        summary.p999_ns,
        summary.ceiling_ns,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_reduces_to_known_rungs() {
        let mut ladder = LatencyLadder::with_capacity(1000);
        for ns in 1..=1000u64 {
            ladder.record(ns);
        }
        let summary = ladder.summarize().unwrap();
        assert_eq!(summary.samples, 1000);
        assert_eq!(summary.floor_ns, 1);
        assert_eq!(summary.ceiling_ns, 1000);
        // Nearest-rank over 1..=1000: round(999 * q) indexes the sorted run.
        assert_eq!(summary.p50_ns, 501);
        assert_eq!(summary.p90_ns, 900);
        assert_eq!(summary.p99_ns, 990);
        assert_eq!(summary.p999_ns, 999);
    }

    #[test]
    fn one_sample_fills_every_rung() {
        let mut ladder = LatencyLadder::with_capacity(1);
        ladder.record(42);
        let summary = ladder.summarize().unwrap();
        assert_eq!(summary.floor_ns, 42);
        assert_eq!(summary.p999_ns, 42);
        assert_eq!(summary.ceiling_ns, 42);
    }

    #[test]
    fn empty_ladder_has_no_summary() {
        assert!(LatencyLadder::with_capacity(0).summarize().is_none());
    }

    #[test]
    fn clock_never_runs_backwards() {
        let clock = MonoClock::start();
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }
}
