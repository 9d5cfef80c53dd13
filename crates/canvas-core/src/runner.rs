//! Real-time Runner
//!
//! Drives a `Simulation` from a tokio interval on a single task, so ticks are
//! serialised. The pointer is published through a watch channel (last sample
//! wins); chat commands go through an mpsc queue; each tick's frame is
//! published on a watch channel and every eventful tick's report on an mpsc.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use canvas_events::{CanvasFrame, CursorId};

use crate::simulation::{Simulation, TickReport};

/// Commands applied between ticks
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(String),
    CloseChat,
    Resize { width: f32, height: f32 },
    Place { id: CursorId, x: f32, y: f32 },
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("runner task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("runner has stopped")]
    Stopped,
}

/// Handle to a running simulation task
pub struct RunnerHandle {
    pointer: watch::Sender<Option<(f32, f32)>>,
    commands: mpsc::UnboundedSender<Command>,
    frames: watch::Receiver<CanvasFrame>,
    reports: mpsc::UnboundedReceiver<TickReport>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Simulation>,
}

impl RunnerHandle {
    /// Publish a pointer sample; it is picked up at the top of the next tick
    pub fn set_pointer(&self, x: f32, y: f32) {
        self.pointer.send_replace(Some((x, y)));
    }

    pub fn send(&self, command: Command) -> Result<(), RunnerError> {
        self.commands.send(command).map_err(|_| RunnerError::Stopped)
    }

    pub fn send_message(&self, text: impl Into<String>) -> Result<(), RunnerError> {
        self.send(Command::Send(text.into()))
    }

    pub fn close_chat(&self) -> Result<(), RunnerError> {
        self.send(Command::CloseChat)
    }

    /// Subscribe to frames
    pub fn frames(&self) -> watch::Receiver<CanvasFrame> {
        self.frames.clone()
    }

    /// Most recently published frame
    pub fn latest_frame(&self) -> CanvasFrame {
        self.frames.borrow().clone()
    }

    /// Reports of eventful ticks since the last call, oldest first
    pub fn drain_reports(&mut self) -> Vec<TickReport> {
        let mut drained = Vec::new();
        while let Ok(report) = self.reports.try_recv() {
            drained.push(report);
        }
        drained
    }

    /// Stop the interval, tear the simulation down and hand it back.
    ///
    /// Events recorded by the teardown are left in the simulation's queue.
    pub async fn shutdown(mut self) -> Result<Simulation, RunnerError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        Ok(self.task.await?)
    }
}

/// Start ticking `simulation` every `tick_interval` on the current runtime
pub fn spawn(mut simulation: Simulation, tick_interval: Duration) -> RunnerHandle {
    let (pointer_tx, pointer_rx) = watch::channel(None);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (frame_tx, frame_rx) = watch::channel(simulation.frame());
    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(run_loop(
        simulation,
        tick_interval,
        pointer_rx,
        command_rx,
        frame_tx,
        report_tx,
        shutdown_rx,
    ));

    RunnerHandle {
        pointer: pointer_tx,
        commands: command_tx,
        frames: frame_rx,
        reports: report_rx,
        shutdown: Some(shutdown_tx),
        task,
    }
}

fn apply_command(simulation: &mut Simulation, command: Command) {
    match command {
        Command::Send(text) => {
            simulation.send_message(&text);
        }
        Command::CloseChat => {
            simulation.close_chat();
        }
        Command::Resize { width, height } => {
            simulation.resize(width, height);
        }
        Command::Place { id, x, y } => {
            simulation.place(id, x, y);
        }
    }
}

async fn run_loop(
    mut simulation: Simulation,
    tick_interval: Duration,
    mut pointer: watch::Receiver<Option<(f32, f32)>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    frames: watch::Sender<CanvasFrame>,
    reports: mpsc::UnboundedSender<TickReport>,
    mut shutdown: oneshot::Receiver<()>,
) -> Simulation {
    let started = Instant::now();
    let base = simulation.now();
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!("Runner started with a {:?} interval", tick_interval);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            Some(command) = commands.recv() => {
                apply_command(&mut simulation, command);
            }
            _ = interval.tick() => {
                let sample = *pointer.borrow_and_update();
                if let Some((x, y)) = sample {
                    simulation.set_pointer(x, y);
                }
                let elapsed = started.elapsed().as_millis() as u64;
                let report = simulation.tick(base.plus_millis(elapsed));
                if !report.is_quiet() {
                    // Nobody listening is fine
                    let _ = reports.send(report);
                }
                frames.send_replace(simulation.frame());
            }
        }
    }

    // Teardown events stay queued for whoever takes the simulation back
    simulation.teardown();
    simulation
}
