//! Synthetic landmark source for `stub://` URLs.
//!
//! Generates a subject doing push-ups at a fixed cadence: both shoulders
//! oscillate around elbow height with seeded jitter, and every
//! `dropout_every`-th frame the detector "loses" the body.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

use super::source::{LandmarkSource, SourceFrame, SourceStats};
use crate::landmark::{Joint, LandmarkFrame, Position};

const ELBOW_Y: f32 = 300.0;
const HIP_Y: f32 = 320.0;

/// Configuration for the synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub url: String,
    /// Frames per second.
    pub fps: u32,
    /// Duration of one rep.
    pub period_ms: u64,
    /// Peak shoulder travel above/below the elbow, in pixels.
    pub amplitude: f32,
    /// Uniform noise added to every y coordinate, in pixels.
    pub jitter: f32,
    /// Drop the detection on every N-th frame.
    pub dropout_every: Option<u64>,
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            url: "stub://pushups".to_string(),
            fps: 30,
            period_ms: 2_000,
            amplitude: 40.0,
            jitter: 3.0,
            dropout_every: Some(17),
            max_frames: None,
            seed: 7,
        }
    }
}

pub struct SyntheticLandmarkSource {
    config: SyntheticConfig,
    rng: StdRng,
    frame_count: u64,
    no_detection: u64,
}

impl SyntheticLandmarkSource {
    /// A non-finite `jitter` is treated as no jitter.
    pub fn new(mut config: SyntheticConfig) -> Self {
        if !config.jitter.is_finite() {
            log::warn!(
                "SyntheticLandmarkSource: ignoring non-finite jitter {}",
                config.jitter
            );
            config.jitter = 0.0;
        }
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            frame_count: 0,
            no_detection: 0,
        }
    }

    fn timestamp_ms(&self, index: u64) -> u64 {
        index * 1_000 / self.config.fps.max(1) as u64
    }

    fn noise(&mut self) -> f32 {
        let jitter = self.config.jitter.abs();
        if jitter == 0.0 {
            0.0
        } else {
            self.rng.gen_range(-jitter..=jitter)
        }
    }

    fn generate(&mut self, timestamp_ms: u64) -> LandmarkFrame {
        let period = self.config.period_ms.max(1);
        let angle = TAU * (timestamp_ms % period) as f32 / period as f32;
        // cos = 1 at the top (shoulder above elbow), -1 at the bottom.
        let shoulder_y = ELBOW_Y - self.config.amplitude * angle.cos();

        let mut frame = LandmarkFrame::new(timestamp_ms);
        for (shoulder, elbow, hip, x, visibility) in [
            (Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftHip, 260.0, 0.95),
            (Joint::RightShoulder, Joint::RightElbow, Joint::RightHip, 380.0, 0.85),
        ] {
            let shoulder_noise = self.noise();
            let elbow_noise = self.noise();
            let hip_noise = self.noise();
            frame = frame
                .with_joint(
                    shoulder,
                    Position::new(x, shoulder_y + shoulder_noise).with_visibility(visibility),
                )
                .with_joint(
                    elbow,
                    Position::new(x, ELBOW_Y + elbow_noise).with_visibility(visibility),
                )
                .with_joint(
                    hip,
                    Position::new(x, HIP_Y + hip_noise).with_visibility(visibility),
                );
        }
        frame
    }
}

impl LandmarkSource for SyntheticLandmarkSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn connect(&mut self) -> Result<()> {
        log::info!(
            "SyntheticLandmarkSource: connected to {} ({} fps, {} ms/rep)",
            self.config.url,
            self.config.fps,
            self.config.period_ms
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        if let Some(max) = self.config.max_frames {
            if self.frame_count >= max {
                return Ok(None);
            }
        }
        let index = self.frame_count;
        self.frame_count += 1;
        let timestamp_ms = self.timestamp_ms(index);

        let dropped = self
            .config
            .dropout_every
            .is_some_and(|every| every > 0 && (index + 1) % every == 0);
        if dropped {
            self.no_detection += 1;
            return Ok(Some(SourceFrame::NoDetection { timestamp_ms }));
        }
        Ok(Some(SourceFrame::Detected(self.generate(timestamp_ms))))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_produced: self.frame_count,
            no_detection: self.no_detection,
            errors: 0,
            location: self.config.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::{RepCounter, RepEvent};

    #[test]
    fn produces_one_rep_per_period() {
        let mut source = SyntheticLandmarkSource::new(SyntheticConfig {
            max_frames: Some(300),
            ..SyntheticConfig::default()
        });
        let mut counter = RepCounter::default();
        let mut completed = 0;

        while let Some(frame) = source.next_frame().unwrap() {
            if let SourceFrame::Detected(frame) = frame {
                if let RepEvent::RepCompleted(_) = counter.update(&frame) {
                    completed += 1;
                }
            }
        }

        // 300 frames at 30 fps = 10 s = 5 reps of 2 s
        assert_eq!(completed, 5);
        assert_eq!(counter.count(), 5);
        assert_eq!(source.stats().frames_produced, 300);
        assert_eq!(source.stats().no_detection, 300 / 17);
    }

    #[test]
    fn same_seed_same_frames() {
        let config = SyntheticConfig {
            max_frames: Some(20),
            ..SyntheticConfig::default()
        };
        let mut a = SyntheticLandmarkSource::new(config.clone());
        let mut b = SyntheticLandmarkSource::new(config);
        for _ in 0..20 {
            assert_eq!(a.next_frame().unwrap(), b.next_frame().unwrap());
        }
        assert!(a.next_frame().unwrap().is_none());
    }

    #[test]
    fn timestamps_follow_fps() {
        let mut source = SyntheticLandmarkSource::new(SyntheticConfig {
            fps: 10,
            dropout_every: None,
            max_frames: Some(3),
            ..SyntheticConfig::default()
        });
        let stamps: Vec<u64> = std::iter::from_fn(|| source.next_frame().unwrap())
            .map(|f| f.timestamp_ms())
            .collect();
        assert_eq!(stamps, vec![0, 100, 200]);
    }

    #[test]
    fn non_finite_jitter_means_no_noise() {
        let quiet = SyntheticConfig {
            jitter: 0.0,
            max_frames: Some(10),
            ..SyntheticConfig::default()
        };
        for jitter in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let mut noisy = SyntheticLandmarkSource::new(SyntheticConfig {
                jitter,
                ..quiet.clone()
            });
            let mut reference = SyntheticLandmarkSource::new(quiet.clone());
            for _ in 0..10 {
                assert_eq!(noisy.next_frame().unwrap(), reference.next_frame().unwrap());
            }
        }
    }
}
