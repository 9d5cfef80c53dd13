//! Output Generation
//!
//! Per-tick frames for presenters.

pub mod frame;

pub use frame::*;
