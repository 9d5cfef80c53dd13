//! Canvas Setup
//!
//! Roster generation and cursor spawning.

pub mod roster;

pub use roster::*;
