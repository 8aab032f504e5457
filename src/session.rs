//! Workout sessions.
//!
//! A session owns one `RepCounter` for its whole lifetime, groups completed
//! reps into sets, and produces the tally the persistence layer stores once
//! the workout ends. Storage itself lives outside this crate.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::counter::{LiveCount, RepCounter, RepEvent, ThresholdConfig};
use crate::ingest::SourceFrame;
use crate::landmark::LandmarkFrame;

/// Planned workout: `sets` sets of `reps_per_set`, with rest in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub reps_per_set: u32,
    pub sets: u32,
    #[serde(default)]
    pub rest_secs: u32,
}

impl SessionPlan {
    pub fn new(reps_per_set: u32, sets: u32, rest_secs: u32) -> Result<Self> {
        if reps_per_set == 0 {
            return Err(anyhow!("session plan needs at least one rep per set"));
        }
        if sets == 0 {
            return Err(anyhow!("session plan needs at least one set"));
        }
        Ok(Self {
            reps_per_set,
            sets,
            rest_secs,
        })
    }

    pub fn total_reps(&self) -> u32 {
        self.reps_per_set.saturating_mul(self.sets)
    }

    /// Rest time across the whole plan (no rest after the last set).
    pub fn rest_secs_total(&self) -> u32 {
        self.rest_secs.saturating_mul(self.sets.saturating_sub(1))
    }
}

/// Final tally handed to storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub reps: u32,
    pub sets: u32,
    pub duration_secs: u64,
    pub frames_seen: u64,
    pub frames_skipped: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_reps: Option<u32>,
}

/// One workout, from start to summary.
pub struct WorkoutSession {
    counter: RepCounter,
    live: LiveCount,
    plan: Option<SessionPlan>,
    started_at_ms: Option<u64>,
    last_frame_ms: Option<u64>,
    reps_in_set: u32,
    sets_completed: u32,
    frames_seen: u64,
    frames_skipped: u64,
}

impl WorkoutSession {
    pub fn new(config: ThresholdConfig, plan: Option<SessionPlan>) -> Self {
        Self {
            counter: RepCounter::new(config),
            live: LiveCount::new(),
            plan,
            started_at_ms: None,
            last_frame_ms: None,
            reps_in_set: 0,
            sets_completed: 0,
            frames_seen: 0,
            frames_skipped: 0,
        }
    }

    /// Begin (or restart) the session at `now_ms`. Clears all progress.
    pub fn start(&mut self, now_ms: u64) {
        self.counter.reset();
        self.live.clear();
        self.started_at_ms = Some(now_ms);
        self.last_frame_ms = None;
        self.reps_in_set = 0;
        self.sets_completed = 0;
        self.frames_seen = 0;
        self.frames_skipped = 0;
        log::info!("workout session started at t={}ms", now_ms);
    }

    /// Handle for other threads to watch the count.
    pub fn live(&self) -> LiveCount {
        self.live.clone()
    }

    pub fn counter(&self) -> &RepCounter {
        &self.counter
    }

    pub fn plan(&self) -> Option<&SessionPlan> {
        self.plan.as_ref()
    }

    pub fn sets_completed(&self) -> u32 {
        self.sets_completed
    }

    pub fn reps_in_current_set(&self) -> u32 {
        self.reps_in_set
    }

    /// Feed one detected frame.
    ///
    /// A session that was never started starts at the first frame. Frames
    /// older than the previous one are dropped as `Skipped`.
    pub fn observe(&mut self, frame: &LandmarkFrame) -> RepEvent {
        let timestamp_ms = frame.timestamp_ms();
        if !self.accept_timestamp(timestamp_ms) {
            return RepEvent::Skipped;
        }

        let event = self.counter.update(frame);
        self.live.publish(self.counter.state());
        match event {
            RepEvent::Skipped => self.frames_skipped += 1,
            RepEvent::RepCompleted(_) => self.record_rep(),
            RepEvent::PhaseUnchanged | RepEvent::EnteredDown => {}
        }
        event
    }

    /// Record a frame in which the detector found no body.
    pub fn observe_missing(&mut self, timestamp_ms: u64) -> RepEvent {
        if self.accept_timestamp(timestamp_ms) {
            self.frames_skipped += 1;
        }
        RepEvent::Skipped
    }

    /// Dispatch a source frame to `observe` or `observe_missing`.
    pub fn observe_source(&mut self, frame: &SourceFrame) -> RepEvent {
        match frame {
            SourceFrame::Detected(frame) => self.observe(frame),
            SourceFrame::NoDetection { timestamp_ms } => self.observe_missing(*timestamp_ms),
        }
    }

    /// Close the current set early. No-op when the set is empty.
    pub fn finish_set(&mut self) {
        if self.reps_in_set > 0 {
            self.sets_completed += 1;
            log::info!(
                "set {} closed with {} reps",
                self.sets_completed,
                self.reps_in_set
            );
            self.reps_in_set = 0;
        }
    }

    /// End the session and produce its tally.
    pub fn finish(mut self, now_ms: u64) -> SessionSummary {
        self.finish_set();
        let duration_secs = self
            .started_at_ms
            .map(|start| now_ms.saturating_sub(start) / 1_000)
            .unwrap_or(0);
        let summary = SessionSummary {
            reps: self.counter.count(),
            sets: self.sets_completed,
            duration_secs,
            frames_seen: self.frames_seen,
            frames_skipped: self.frames_skipped,
            target_reps: self.plan.map(|plan| plan.total_reps()),
        };
        log::info!(
            "workout session finished: {} reps in {} sets over {}s",
            summary.reps,
            summary.sets,
            summary.duration_secs
        );
        summary
    }

    fn accept_timestamp(&mut self, timestamp_ms: u64) -> bool {
        if let Some(last) = self.last_frame_ms {
            if timestamp_ms < last {
                log::debug!(
                    "dropping out-of-order frame t={}ms (last t={}ms)",
                    timestamp_ms,
                    last
                );
                self.frames_seen += 1;
                self.frames_skipped += 1;
                return false;
            }
        }
        if self.started_at_ms.is_none() {
            self.started_at_ms = Some(timestamp_ms);
        }
        self.last_frame_ms = Some(timestamp_ms);
        self.frames_seen += 1;
        true
    }

    fn record_rep(&mut self) {
        self.reps_in_set += 1;
        if let Some(plan) = self.plan {
            if self.reps_in_set >= plan.reps_per_set {
                self.finish_set();
            }
        }
    }
}
