#![forbid(unsafe_code)]

pub mod tick;
pub use tick::{SymbolId, Tick};
