//! `tickbus-ring`: lock-free single-producer / multi-observer broadcast
//! ring buffer in shared memory.
//!
//! One process creates a ring and publishes fixed-size, trivially
//! copyable records; any number of processes attach read-only and walk
//! the live window independently. Observers do not consume, they only
//! observe, and the producer never blocks: when the ring fills it
//! overwrites the oldest records, and a lapped observer detects the loss
//! and skips forward.
//!
//! # Core Components
//!
//! - [`RingProducer`]: creates the ring and appends records
//! - [`RingObserver`]: attaches to an existing ring and reads
//! - [`RingConfig`]: creation parameters (capacity, name removal)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐      shared memory region      ┌──────────────┐
//! │ RingProducer │ ────────────────────────────── │ RingObserver │
//! │ (Process A)  │  header: packed (first, last)  │ (Process B)  │
//! └──────────────┘  slots:  cache-line aligned    └──────────────┘
//!                                                 ┌──────────────┐
//!                                                 │ RingObserver │
//!                                                 │ (Process C)  │
//!                                                 └──────────────┘
//! ```
//!
//! The only synchronisation in the system is one 64-bit atomic packing
//! the `(first, last)` window counters: the producer publishes with a
//! release store, observers snapshot with acquire loads and re-validate
//! their copies against it. There are no locks, no condition variables,
//! and no reader registration.
//!
//! # Example
//!
//! ```no_run
//! use tickbus_ring::{RingConfig, RingObserver, RingProducer};
//!
//! // Producer (typically one process)
//! let mut producer =
//!     RingProducer::<u64>::create("/dev/shm/ticks", RingConfig::new(4096))?;
//! producer.push(42);
//!
//! // Observer (same or different process)
//! let observer = RingObserver::<u64>::open("/dev/shm/ticks")?;
//! if let Some(value) = observer.try_get() {
//!     observer.advance();
//!     println!("got {value}");
//! }
//! # Ok::<(), tickbus_ring::RingError>(())
//! ```
//!
//! # Delivery semantics
//!
//! Records still resident from the moment an observer snapshots the
//! window to the moment it copies them arrive in FIFO order. Nothing
//! stronger holds: a slow observer loses records (a *gap*), and the ring
//! neither reports the loss nor waits; applications that care stamp
//! their records with sequence numbers and count.

mod error;
mod iter;
pub mod layout;
mod observer;
mod producer;

pub use error::RingError;
pub use iter::RingIter;
pub use observer::{DEFAULT_UNDERFLOW_FIXUP, RingObserver};
pub use producer::{RingConfig, RingProducer};
