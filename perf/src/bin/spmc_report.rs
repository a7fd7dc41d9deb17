//! Concurrency report for the broadcast ring: one producer thread against
//! N observer threads on a live ring, reporting producer throughput,
//! per-observer delivery loss, and caught-up latency quantiles.
//!
//! Usage: `spmc_report [config.toml]`. Every field of the config has a
//! default, so it runs without one.

use std::sync::Barrier;
use std::time::Instant;

use tickbus_events::{SymbolId, Tick};
use tickbus_perf::config::ReportConfig;
use tickbus_perf::{
    LatencyLadder, LatencySummary, MonoClock, SeqAudit, print_latency_header, print_latency_row,
};
use tickbus_ring::{RingConfig, RingObserver, RingProducer};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sequence number of the tick that tells observers to stop.
const STOP_SEQ: u64 = u64::MAX;

#[derive(Debug, serde::Serialize)]
struct ObserverOutcome {
    observer: usize,
    delivered: u64,
    gapped: u64,
    regressions: u64,
    loss: f64,
    latency: Option<LatencySummary>,
}

#[derive(Debug, serde::Serialize)]
struct Report {
    capacity: usize,
    observers: usize,
    ticks: u64,
    producer_ticks_per_sec: f64,
    outcomes: Vec<ObserverOutcome>,
}

fn run_observer(
    index: usize,
    ring_path: &str,
    underflow_fixup: u32,
    clock: MonoClock,
    start_gate: &Barrier,
) -> ObserverOutcome {
    let observer = RingObserver::<Tick>::open_with_fixup(ring_path, underflow_fixup)
        .expect("observer failed to attach");
    start_gate.wait();

    let mut audit = SeqAudit::new();
    let mut ladder = LatencyLadder::with_capacity(4096);

    loop {
        let tick = observer.get();
        observer.advance();
        if tick.seq_no == STOP_SEQ {
            break;
        }

        audit.record(tick.seq_no);

        // Only a caught-up observer yields a bus latency; a backlogged
        // read would measure the backlog instead.
        if observer.is_empty() {
            ladder.record(clock.now_ns().saturating_sub(tick.ts_recv_ns));
        }
    }

    ObserverOutcome {
        observer: index,
        delivered: audit.delivered,
        gapped: audit.gapped,
        regressions: audit.regressions,
        loss: audit.loss(),
        latency: ladder.summarize(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(?config, "spmc report starting");

    let mut producer = RingProducer::<Tick>::create(
        &config.ring_path,
        RingConfig::new(config.capacity).remove_on_close(true),
    )?;

    let clock = MonoClock::start();
    let start_gate = Barrier::new(config.observers + 1);
    let ticks = config.ticks;

    let (outcomes, elapsed) = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..config.observers)
            .map(|index| {
                let ring_path = config.ring_path.as_str();
                let start_gate = &start_gate;
                let underflow_fixup = config.underflow_fixup;
                scope.spawn(move || {
                    run_observer(index, ring_path, underflow_fixup, clock, start_gate)
                })
            })
            .collect();

        start_gate.wait();
        let start = Instant::now();
        for i in 0..ticks {
            producer.push_with(|| Tick {
                ts_recv_ns: clock.now_ns(),
                seq_no: i,
                symbol: SymbolId(1),
                bid_px_ticks: 10_000 + (i % 100) as i64,
                bid_qty_lots: 1 + (i % 7) as i64,
                ask_px_ticks: 10_001 + (i % 100) as i64,
                ask_qty_lots: 1 + (i % 5) as i64,
            });
        }
        producer.push(Tick {
            seq_no: STOP_SEQ,
            ..Tick::default()
        });
        let elapsed = start.elapsed();

        let outcomes: Vec<ObserverOutcome> = handles
            .into_iter()
            .map(|handle| handle.join().expect("observer thread panicked"))
            .collect();
        (outcomes, elapsed)
    });

    let producer_rate = ticks as f64 / elapsed.as_secs_f64();
    info!("producer: {ticks} ticks in {elapsed:?} ({producer_rate:.0}/s)");

    println!();
    println!("delivery per observer ({ticks} ticks published)");
    for outcome in &outcomes {
        println!(
            "  observer {:<2} delivered {:>10}  gapped {:>10}  loss {:>6.2}%  regressions {}",
            outcome.observer,
            outcome.delivered,
            outcome.gapped,
            outcome.loss * 100.0,
            outcome.regressions,
        );
    }

    println!();
    println!("caught-up latency, ns (producer stamp to observed copy)");
    print_latency_header();
    for outcome in &outcomes {
        if let Some(summary) = &outcome.latency {
            print_latency_row(&format!("observer {}", outcome.observer), summary);
        }
    }

    if let Some(json_path) = &config.json_output {
        let report = Report {
            capacity: config.capacity,
            observers: config.observers,
            ticks,
            producer_ticks_per_sec: producer_rate,
            outcomes,
        };
        let file = std::fs::File::create(json_path)?;
        serde_json::to_writer_pretty(file, &report)?;
        info!("report written to {json_path}");
    }

    Ok(())
}
