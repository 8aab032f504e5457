//! replay - count push-ups in a recorded landmark file
//!
//! Reads a JSON-lines landmark recording, runs it through a workout session
//! and prints the session summary as JSON on stdout.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;

use pushup_kernel::{
    guarded_next, CounterConfig, FileLandmarkSource, FrameThrottle, LandmarkSource, Phase,
    RepEvent, SideStrategy, WorkoutSession,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Landmark recording (JSON lines).
    input: PathBuf,
    /// Config file (.toml or .json); defaults to $PUSHUP_CONFIG.
    #[arg(long, env = "PUSHUP_CONFIG")]
    config: Option<PathBuf>,
    /// Hysteresis margin in coordinate units (overrides config).
    #[arg(long)]
    hysteresis: Option<f32>,
    /// Joint side: left|right|dominant|average (overrides config).
    #[arg(long)]
    side: Option<SideStrategy>,
    /// Minimum ms between analysed frames; 0 analyses every frame (overrides config).
    #[arg(long)]
    frame_interval_ms: Option<u64>,
    /// Treat malformed lines as missed detections instead of failing.
    #[arg(long)]
    lenient: bool,
    /// Print every phase transition as a JSON line before the summary.
    #[arg(long)]
    events: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: ui::UiMode,
}

#[derive(Serialize)]
struct EventLine {
    t_ms: u64,
    event: &'static str,
    phase: Phase,
    count: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let ui = ui::Ui::new(
        args.ui,
        std::io::stderr().is_terminal(),
        !std::io::stdout().is_terminal(),
    );

    let mut cfg = {
        let _stage = ui.stage("Load config");
        CounterConfig::load_with(args.config.as_deref())?
    };
    if let Some(hysteresis) = args.hysteresis {
        cfg.hysteresis = hysteresis;
    }
    if let Some(side) = args.side {
        cfg.side = side;
    }
    if let Some(interval) = args.frame_interval_ms {
        cfg.ingest.frame_interval_ms = interval;
    }
    let threshold = cfg.threshold().context("invalid counter thresholds")?;

    let mut source = {
        let _stage = ui.stage("Open landmark file");
        let mut source = FileLandmarkSource::open(&args.input)?;
        source.connect()?;
        source
    };

    let mut session = WorkoutSession::new(threshold, cfg.plan);
    let mut throttle = FrameThrottle::new(cfg.ingest.frame_interval_ms);
    let mut last_ts = 0u64;
    {
        let mut stage = ui.stage("Replay frames");
        loop {
            let next = if args.lenient {
                guarded_next(&mut source, last_ts)
            } else {
                source.next_frame()?
            };
            if !source.is_healthy() {
                bail!("landmark file {} became unreadable", args.input.display());
            }
            let Some(frame) = next else {
                break;
            };
            if !throttle.admit(frame.timestamp_ms()) {
                continue;
            }
            last_ts = last_ts.max(frame.timestamp_ms());

            let event = session.observe_source(&frame);
            if args.events {
                print_event(frame.timestamp_ms(), event, &session)?;
            }
            if matches!(event, RepEvent::RepCompleted(_)) {
                stage.progress(format!("{} reps", session.counter().count()));
            }
        }
        let stats = source.stats();
        stage.progress(format!(
            "{} frames, {} throttled, {} reps",
            stats.frames_produced,
            throttle.dropped(),
            session.counter().count()
        ));
    }

    let summary = session.finish(last_ts);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_event(t_ms: u64, event: RepEvent, session: &WorkoutSession) -> Result<()> {
    let name = match event {
        RepEvent::EnteredDown => "entered_down",
        RepEvent::RepCompleted(_) => "rep_completed",
        RepEvent::Skipped | RepEvent::PhaseUnchanged => return Ok(()),
    };
    let line = EventLine {
        t_ms,
        event: name,
        phase: session.counter().phase(),
        count: session.counter().count(),
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}
