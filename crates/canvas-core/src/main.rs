//! Cursor Canvas
//!
//! Headless driver for the cursor simulation. Ticks on a synthetic clock by
//! default, or in real time on the tokio runner with `--realtime`.

use clap::Parser;
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use canvas_core::events::EventLog;
use canvas_core::{runner, CanvasError, ClassicRoster, Simulation, Tuning};
use canvas_events::{group_messages, CanvasFrame, SimTime};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "cursor_canvas")]
#[command(about = "Simulated cursors with proximity interactions and a scripted chat")]
struct Args {
    /// Tuning file (defaults to ./tuning.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility (overrides the tuning file)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 500)]
    ticks: u64,

    /// Pointer position as X,Y
    #[arg(long, value_parser = parse_point)]
    pointer: Option<(f32, f32)>,

    /// Line to send once a chat is open and the previous reply has arrived
    #[arg(long)]
    say: Vec<String>,

    /// Write events as JSONL to this file
    #[arg(long)]
    events_out: Option<PathBuf>,

    /// Tick on the tokio runner in real time
    #[arg(long)]
    realtime: bool,
}

fn parse_point(value: &str) -> Result<(f32, f32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", value))?;
    let x = x.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|e| e.to_string())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("coordinates must be finite, got '{}'", value));
    }
    Ok((x, y))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CanvasError> {
    let mut tuning = match &args.config {
        Some(path) => Tuning::load(path)?,
        None => Tuning::load_or_default(),
    };
    if let Some(seed) = args.seed {
        tuning.simulation.seed = seed;
    }

    println!("Cursor Canvas");
    println!("=============");
    println!("Seed: {}", tuning.simulation.seed);
    println!("Ticks: {}", args.ticks);
    println!(
        "Canvas: {}x{}, tick every {}ms",
        tuning.canvas.width, tuning.canvas.height, tuning.simulation.tick_interval_ms
    );
    println!();

    let mut log = match &args.events_out {
        Some(path) => EventLog::create(path)?,
        None => EventLog::discard(),
    };

    let simulation = Simulation::new(tuning, &mut ClassicRoster::default())?;
    let mut script: VecDeque<String> = args.say.iter().cloned().collect();

    let mut simulation = if args.realtime {
        run_realtime(simulation, &args, &mut script, &mut log)?
    } else {
        run_headless(simulation, &args, &mut script, &mut log)?
    };

    simulation.teardown();
    log.record(&simulation.pending_report())?;
    let logged = log.finish()?;

    let frame = simulation.frame();
    println!();
    println!(
        "Simulation complete. Ran {} ticks ({}).",
        frame.tick,
        frame.time.clock_label()
    );
    println!(
        "Logged {} events over {} ticks, {} chat changes.",
        logged.events, logged.ticks, logged.chat_changes
    );
    print_transcript(&frame);
    Ok(())
}

/// Send the next scripted line if a session is open and no reply is pending
fn ready_to_say(simulation: &Simulation) -> bool {
    simulation.chat().is_open() && simulation.chat().pending_reply().is_none()
}

fn run_headless(
    mut simulation: Simulation,
    args: &Args,
    script: &mut VecDeque<String>,
    log: &mut EventLog<BufWriter<File>>,
) -> Result<Simulation, CanvasError> {
    let interval = simulation.tuning().simulation.tick_interval_ms;

    for tick in 0..args.ticks {
        if let Some((x, y)) = args.pointer {
            simulation.set_pointer(x, y);
        }
        let report = simulation.tick(SimTime::from_millis(tick * interval));
        log.record(&report)?;

        if ready_to_say(&simulation) {
            if let Some(line) = script.pop_front() {
                simulation.send_message(&line);
            }
        }

        if tick > 0 && tick % 100 == 0 {
            println!(
                "[Tick {:>4}] {} - {} interactions, chat {:?}, {} events logged",
                tick,
                report.time.clock_label(),
                simulation.interactions().len(),
                simulation.chat().status(),
                log.summary().events
            );
        }
    }
    Ok(simulation)
}

fn run_realtime(
    simulation: Simulation,
    args: &Args,
    script: &mut VecDeque<String>,
    log: &mut EventLog<BufWriter<File>>,
) -> Result<Simulation, CanvasError> {
    let interval = Duration::from_millis(simulation.tuning().simulation.tick_interval_ms);
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let mut handle = runner::spawn(simulation, interval);
        if let Some((x, y)) = args.pointer {
            handle.set_pointer(x, y);
        }

        let mut frames = handle.frames();
        let mut last_tick = 0;
        while last_tick < args.ticks {
            if frames.changed().await.is_err() {
                break;
            }
            let (tick, ready) = {
                let frame = frames.borrow_and_update();
                (frame.tick, awaiting_user(&frame))
            };
            last_tick = tick;

            for report in handle.drain_reports() {
                log.record(&report)?;
            }
            if ready {
                if let Some(line) = script.pop_front() {
                    handle.send_message(line)?;
                }
            }
        }

        for report in handle.drain_reports() {
            log.record(&report)?;
        }
        let simulation = handle.shutdown().await?;
        Ok::<Simulation, CanvasError>(simulation)
    })
}

/// A session is open and the partner spoke last
fn awaiting_user(frame: &CanvasFrame) -> bool {
    frame
        .chat
        .as_ref()
        .and_then(|chat| chat.messages.last().map(|last| last.sender != chat.user_id))
        .unwrap_or(false)
}

fn print_transcript(frame: &CanvasFrame) {
    let Some(chat) = &frame.chat else {
        println!("No chat session open.");
        return;
    };

    println!();
    println!(
        "Chat with {} ({:?}, started {})",
        chat.partner_name,
        chat.status,
        chat.started_at.clock_label()
    );
    for group in group_messages(&chat.messages, chat.user_id) {
        let who = if group.from_user {
            &chat.user_name
        } else {
            &chat.partner_name
        };
        let at = group
            .last_timestamp()
            .map(|t| t.clock_label())
            .unwrap_or_default();
        println!("  {} [{}]", who, at);
        for message in group.messages {
            println!("    {}", message.content);
        }
    }
}
