//! Setup and I/O errors. Ticks themselves never fail.

use thiserror::Error;

use crate::config::ConfigError;
use crate::runner::RunnerError;
use crate::setup::RosterError;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("roster error: {0}")]
    Roster(#[from] RosterError),
    #[error("runner error: {0}")]
    Runner(#[from] RunnerError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
