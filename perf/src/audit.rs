//! Delivery accounting for a broadcast observer.
//!
//! The ring stays silent when a producer laps an observer; the only
//! trace of the loss is the sequence numbers stamped into the ticks
//! themselves. `SeqAudit` folds the stream an observer actually
//! delivered into counters the report can print.

/// Folds an observed `seq_no` stream into loss counters.
///
/// A number past the expected next one means the ring was lapped and the
/// skipped ticks are counted as gapped. A number at or below the
/// previous one is a regression, which the ring protocol never produces;
/// any non-zero count there is a harness failure.
#[derive(Debug, Default)]
pub struct SeqAudit {
    next_expected: Option<u64>,
    pub delivered: u64,
    pub gapped: u64,
    pub regressions: u64,
}

impl SeqAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one delivered tick.
    pub fn record(&mut self, seq_no: u64) {
        self.delivered += 1;
        if let Some(expected) = self.next_expected {
            if seq_no < expected {
                self.regressions += 1;
            } else {
                self.gapped += seq_no - expected;
            }
        }
        self.next_expected = Some(seq_no.wrapping_add(1));
    }

    /// Fraction of the ticks in this observer's window that were
    /// overwritten before it could copy them.
    pub fn loss(&self) -> f64 {
        let in_window = self.delivered + self.gapped;
        if in_window == 0 {
            0.0
        } else {
            self.gapped as f64 / in_window as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_stream_counts_clean() {
        let mut audit = SeqAudit::new();
        for seq in 0..4 {
            audit.record(seq);
        }
        assert_eq!(audit.delivered, 4);
        assert_eq!(audit.gapped, 0);
        assert_eq!(audit.regressions, 0);
        assert_eq!(audit.loss(), 0.0);
    }

    #[test]
    fn jumps_count_the_skipped_ticks() {
        let mut audit = SeqAudit::new();
        for seq in [0u64, 1, 5, 6, 10] {
            audit.record(seq);
        }
        // 2..=4 and 7..=9 never arrived.
        assert_eq!(audit.delivered, 5);
        assert_eq!(audit.gapped, 6);
        assert_eq!(audit.regressions, 0);
        assert!((audit.loss() - 6.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn replays_count_as_regressions() {
        let mut audit = SeqAudit::new();
        for seq in [0u64, 1, 1, 2] {
            audit.record(seq);
        }
        assert_eq!(audit.delivered, 4);
        assert_eq!(audit.regressions, 1);
        assert_eq!(audit.gapped, 0);
    }

    #[test]
    fn first_tick_sets_the_baseline() {
        // An observer that attaches late starts mid-stream; nothing
        // before its first tick counts as lost.
        let mut audit = SeqAudit::new();
        audit.record(500);
        assert_eq!(audit.delivered, 1);
        assert_eq!(audit.gapped, 0);
    }
}
