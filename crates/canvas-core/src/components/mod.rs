//! ECS Components
//!
//! Cursor components and canvas-wide resources.

pub mod canvas;
pub mod cursor;

pub use canvas::*;
pub use cursor::*;
