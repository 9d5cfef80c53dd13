//! Event System
//!
//! The per-tick event queue and the JSONL log of tick reports.

pub mod logger;

pub use logger::*;
