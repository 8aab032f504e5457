use serde::Serialize;

use crate::landmark::LandmarkFrame;

use super::threshold::{ArmSample, ArmSide, ThresholdConfig};

/// Half-cycle of a push-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Arms extended, top of the movement.
    #[default]
    Up,
    /// Lowered position.
    Down,
}

/// Outcome of feeding one frame to the counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepEvent {
    /// Required joints missing; nothing changed.
    Skipped,
    /// Frame evaluated, no transition.
    PhaseUnchanged,
    /// Up -> Down.
    EnteredDown,
    /// Down -> Up; carries the new cumulative count.
    RepCompleted(u32),
}

/// State carried across frames.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RepCounterState {
    pub phase: Phase,
    pub count: u32,
    /// Sample used by the most recent evaluated frame.
    pub last_sample: Option<ArmSample>,
    /// Arm that sample came from; `None` for `Average`.
    pub side: Option<ArmSide>,
}

/// Push-up rep state machine.
///
/// ```text
/// Up   --(shoulder_y > elbow_y)----------> Down
/// Down --(shoulder_y < elbow_y - margin)--> Up   (count += 1)
/// ```
///
/// Every other observation is a self-loop. The margin only gates the way
/// back up, so a sloppy descent is accepted but the ascent has to clear the
/// buffer zone before a rep is counted.
///
/// A rep is read from one arm end to end: while `Down`, `Dominant` stays on
/// the arm that entered `Down` and skips frames where that arm is missing.
#[derive(Clone, Debug, Default)]
pub struct RepCounter {
    config: ThresholdConfig,
    state: RepCounterState,
}

impl RepCounter {
    pub fn new(config: ThresholdConfig) -> Self {
        Self {
            config,
            state: RepCounterState::default(),
        }
    }

    /// Back to `Up` with a zero count.
    pub fn reset(&mut self) {
        self.state = RepCounterState::default();
    }

    /// Apply one frame. Never fails; unusable frames come back as `Skipped`.
    pub fn update(&mut self, frame: &LandmarkFrame) -> RepEvent {
        let hold = self.state.phase == Phase::Down;
        let Some((side, sample)) = self
            .config
            .side()
            .sample_tracked(frame, self.state.side, hold)
        else {
            log::trace!(
                "frame t={}ms skipped: {} arm not available",
                frame.timestamp_ms(),
                self.config.side()
            );
            return RepEvent::Skipped;
        };
        if self.state.side.is_some() && side != self.state.side {
            log::debug!("following {:?} arm from t={}ms", side, frame.timestamp_ms());
        }
        self.state.side = side;
        self.state.last_sample = Some(sample);

        match self.state.phase {
            Phase::Up if sample.shoulder_y > sample.elbow_y => {
                self.state.phase = Phase::Down;
                log::debug!(
                    "entered down at t={}ms (shoulder_y={:.1} elbow_y={:.1})",
                    frame.timestamp_ms(),
                    sample.shoulder_y,
                    sample.elbow_y
                );
                RepEvent::EnteredDown
            }
            Phase::Down if sample.shoulder_y < sample.elbow_y - self.config.hysteresis() => {
                self.state.phase = Phase::Up;
                self.state.count = self.state.count.saturating_add(1);
                log::info!("rep #{} at t={}ms", self.state.count, frame.timestamp_ms());
                RepEvent::RepCompleted(self.state.count)
            }
            _ => RepEvent::PhaseUnchanged,
        }
    }

    pub fn count(&self) -> u32 {
        self.state.count
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &RepCounterState {
        &self.state
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }
}
