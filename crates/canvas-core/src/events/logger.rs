//! Event Logger
//!
//! Pending event queue filled by systems, plus the per-tick JSONL log.

use bevy_ecs::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use canvas_events::{CanvasEvent, CanvasEventKind};

use crate::components::canvas::SimClock;
use crate::simulation::TickReport;

/// Running totals for an event log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSummary {
    /// Ticks that produced at least one event
    pub ticks: u64,
    pub events: u64,
    /// Chat sessions opened or closed
    pub chat_changes: u64,
}

/// Writes each tick's events as JSONL, one event per line.
///
/// Quiet ticks leave no trace. A tick that opens or closes a chat session is
/// flushed before the next tick is recorded.
pub struct EventLog<W: Write> {
    sink: Option<W>,
    summary: LogSummary,
}

impl EventLog<BufWriter<File>> {
    /// Truncate or create `path` and log to it
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::to_writer(BufWriter::new(file)))
    }
}

impl<W: Write> EventLog<W> {
    pub fn to_writer(sink: W) -> Self {
        Self {
            sink: Some(sink),
            summary: LogSummary::default(),
        }
    }

    /// Count events without writing them anywhere
    pub fn discard() -> Self {
        Self {
            sink: None,
            summary: LogSummary::default(),
        }
    }

    pub fn summary(&self) -> LogSummary {
        self.summary
    }

    /// Append the events of one tick
    pub fn record(&mut self, report: &TickReport) -> io::Result<()> {
        if report.is_quiet() {
            return Ok(());
        }
        self.summary.ticks += 1;

        let mut chat_changed = false;
        for event in &report.events {
            self.summary.events += 1;
            if event.is_chat_lifecycle() {
                self.summary.chat_changes += 1;
                chat_changed = true;
            }
            if let Some(sink) = self.sink.as_mut() {
                writeln!(sink, "{}", event.to_jsonl()?)?;
            }
        }

        if chat_changed {
            tracing::trace!("Flushing event log at tick {}", report.tick);
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }

    /// Flush whatever is buffered and return the totals
    pub fn finish(mut self) -> io::Result<LogSummary> {
        self.flush()?;
        tracing::debug!(
            "Event log closed: {} events over {} ticks",
            self.summary.events,
            self.summary.ticks
        );
        Ok(self.summary)
    }
}

/// Events recorded since the last drain
#[derive(Resource, Debug, Default)]
pub struct PendingEvents {
    events: Vec<CanvasEvent>,
}

impl PendingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: CanvasEvent) {
        self.events.push(event);
    }

    /// Stamp `kind` with the clock's tick and time and queue it
    pub fn record(&mut self, clock: &SimClock, kind: CanvasEventKind) {
        self.push(CanvasEvent::new(clock.tick, clock.now, kind));
    }

    pub fn drain(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }
}
