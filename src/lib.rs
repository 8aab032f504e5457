//! Push-up rep counter kernel.
//!
//! Turns a stream of body-pose landmarks into a push-up rep count.
//!
//! # Architecture
//!
//! ```text
//! camera -> pose detector -> LandmarkSource -> FrameThrottle -> WorkoutSession -> RepCounter
//!                                                                     |
//!                                                                     +-> LiveCount (other threads)
//!                                                                     +-> SessionSummary (storage)
//! ```
//!
//! The pose detector is external. The counter is a small state machine that
//! never fails: frames it cannot evaluate are reported as skipped and leave
//! its state untouched.
//!
//! # Module Structure
//!
//! - `landmark`: joint identifiers and per-frame snapshots
//! - `counter`: rep state machine, thresholds, live count publication
//! - `ingest`: landmark sources (replay file, synthetic) and frame throttling
//! - `session`: workout sessions, sets and the final tally
//! - `config`: file + environment configuration

pub mod config;
pub mod counter;
pub mod ingest;
pub mod landmark;
pub mod session;

pub use config::{CounterConfig, IngestSettings};
pub use counter::{
    ArmSample, ArmSide, LiveCount, LiveSnapshot, Phase, RepCounter, RepCounterState, RepEvent,
    SideStrategy, ThresholdConfig, DEFAULT_HYSTERESIS, DOMINANT_SWITCH_MARGIN,
};
pub use ingest::{
    guarded_next, open_source, FileLandmarkSource, FrameThrottle, LandmarkSource, SourceFrame,
    SourceStats, SyntheticConfig, SyntheticLandmarkSource, DEFAULT_FRAME_INTERVAL_MS,
};
pub use landmark::{Joint, LandmarkFrame, Position};
pub use session::{SessionPlan, SessionSummary, WorkoutSession};
