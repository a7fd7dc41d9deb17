use std::io;
use thiserror::Error;

/// Failures surfaced while creating a ring or attaching an observer.
///
/// Steady-state operations never fail: the producer always overwrites the
/// oldest slot, and an observer that gets lapped recovers by skipping
/// forward. Data loss therefore shows up as sequence gaps at the
/// application level, not as an error here.
#[derive(Debug, Error)]
pub enum RingError {
    /// A caller-supplied parameter is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The host or the stored header violates a compiled-in assumption.
    #[error("unsupported configuration: {0}")]
    Config(&'static str),

    /// The backing region could not be created or opened.
    #[error("shared-memory region unavailable")]
    Mapping(#[from] io::Error),

    /// The ring was written by an incompatible layout revision.
    #[error("ring version {found} is incompatible with supported version {expected}")]
    VersionMismatch { expected: i32, found: i32 },

    /// The stored record size does not match the attaching record type.
    #[error("stored record size {stored} does not match expected size {expected}")]
    TypeMismatch { expected: usize, stored: usize },
}
