//! Attach to a ring read-only and print every record an observer can see.
//!
//! Usage: `tickdump <ring-path>`. The dump walks the live window once; a
//! producer still publishing will race it, in which case lapped records
//! show up as sequence gaps in the output.

use tickbus_events::Tick;
use tickbus_ring::RingObserver;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: tickdump <ring-path>");
        std::process::exit(2);
    };

    let observer = RingObserver::<Tick>::open(&path)?;
    info!(%path, resident = observer.len(), "attached to ring");

    let mut records = 0usize;
    for tick in &observer {
        println!(
            "{records}\tseq={}\tsym={}\tbid={}x{}\task={}x{}\tts={}",
            tick.seq_no,
            tick.symbol.0,
            tick.bid_px_ticks,
            tick.bid_qty_lots,
            tick.ask_px_ticks,
            tick.ask_qty_lots,
            tick.ts_recv_ns,
        );
        records += 1;
    }

    info!(records, "dump complete");
    Ok(())
}
