//! pushupd - live push-up counter
//!
//! This daemon:
//! 1. Loads configuration from $PUSHUP_CONFIG and PUSHUP_* overrides
//! 2. Pulls landmark frames from the configured source
//! 3. Throttles analysis to the configured frame interval
//! 4. Feeds frames to a workout session and logs every rep
//! 5. Publishes the live count to a reporter thread
//! 6. Prints the session summary (JSON) on end of stream, Ctrl-C or source
//!    failure

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pushup_kernel::{
    guarded_next, open_source, CounterConfig, FrameThrottle, LiveCount, RepEvent, WorkoutSession,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = CounterConfig::load()?;
    let threshold = cfg.threshold()?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .map_err(|e| anyhow!("failed to install Ctrl-C handler: {}", e))?;
    }

    let mut source = open_source(&cfg.ingest.source, cfg.ingest.fps)?;
    source.connect()?;
    let paced = source.name() == "synthetic";
    let frame_period = Duration::from_millis(1_000 / cfg.ingest.fps.max(1) as u64);

    // The session clock is the source's capture clock; it starts at the first frame.
    let mut session = WorkoutSession::new(threshold, cfg.plan);
    let reporter = spawn_reporter(session.live(), running.clone());
    let mut throttle = FrameThrottle::new(cfg.ingest.frame_interval_ms);

    log::info!(
        "pushupd running: source={} side={} hysteresis={} interval={}ms",
        cfg.ingest.source,
        cfg.side,
        cfg.hysteresis,
        cfg.ingest.frame_interval_ms
    );
    if let Some(plan) = &cfg.plan {
        log::info!(
            "plan: {} sets x {} reps ({} total, {}s rest)",
            plan.sets,
            plan.reps_per_set,
            plan.total_reps(),
            plan.rest_secs_total()
        );
    }

    let mut last_ts = 0u64;
    let mut last_health_log = Instant::now();
    let mut failure = None;

    while running.load(Ordering::SeqCst) {
        let Some(frame) = guarded_next(source.as_mut(), last_ts) else {
            log::info!("landmark stream ended");
            break;
        };
        if !source.is_healthy() {
            failure = Some(anyhow!(
                "landmark source {} is unhealthy",
                source.stats().location
            ));
            break;
        }

        if throttle.admit(frame.timestamp_ms()) {
            last_ts = last_ts.max(frame.timestamp_ms());
            if let RepEvent::RepCompleted(count) = session.observe_source(&frame) {
                if let Some(plan) = session.plan() {
                    if count == plan.total_reps() {
                        log::info!("plan complete ({} reps)", count);
                    }
                }
            }
        }

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            let stats = source.stats();
            log::info!(
                "source health={} frames={} no_detection={} errors={} throttled={} location={}",
                source.is_healthy(),
                stats.frames_produced,
                stats.no_detection,
                stats.errors,
                throttle.dropped(),
                stats.location
            );
            last_health_log = Instant::now();
        }

        if paced {
            thread::sleep(frame_period);
        }
    }

    running.store(false, Ordering::SeqCst);
    reporter.join().ok();

    // Reps counted before a source failure still reach the summary consumer.
    let summary = session.finish(last_ts);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Logs the live count from a separate thread whenever it changes.
fn spawn_reporter(live: LiveCount, running: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last = live.snapshot();
        while running.load(Ordering::SeqCst) {
            let current = live.snapshot();
            if current.count != last.count {
                log::info!("live count: {} ({:?})", current.count, current.phase);
            }
            last = current;
            thread::sleep(Duration::from_millis(250));
        }
    })
}
