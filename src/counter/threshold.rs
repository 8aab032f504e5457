use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::landmark::{Joint, LandmarkFrame, Position};

/// Default hysteresis margin, in image pixels.
pub const DEFAULT_HYSTERESIS: f32 = 10.0;

/// Visibility lead the other arm needs before `Dominant` switches to it.
pub const DOMINANT_SWITCH_MARGIN: f32 = 0.15;

/// Which arm the counter reads from each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideStrategy {
    /// Left shoulder and left elbow.
    #[default]
    Left,
    /// Right shoulder and right elbow.
    Right,
    /// The side whose shoulder/elbow pair is more visible. Once chosen it
    /// is held for the whole rep; switching happens only in `Up`.
    Dominant,
    /// Mean of both sides. Needs all four joints.
    Average,
}

impl FromStr for SideStrategy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "dominant" => Ok(Self::Dominant),
            "average" => Ok(Self::Average),
            other => Err(anyhow!(
                "unknown side strategy '{}' (expected left|right|dominant|average)",
                other
            )),
        }
    }
}

impl fmt::Display for SideStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Dominant => "dominant",
            Self::Average => "average",
        };
        f.write_str(name)
    }
}

/// Vertical positions the state machine compares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmSample {
    pub shoulder_y: f32,
    pub elbow_y: f32,
}

/// Arm a sample was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmSide {
    Left,
    Right,
}

impl ArmSide {
    fn joints(self) -> (Joint, Joint) {
        match self {
            ArmSide::Left => (Joint::LeftShoulder, Joint::LeftElbow),
            ArmSide::Right => (Joint::RightShoulder, Joint::RightElbow),
        }
    }

    fn other(self) -> Self {
        match self {
            ArmSide::Left => ArmSide::Right,
            ArmSide::Right => ArmSide::Left,
        }
    }

    fn pair(self, frame: &LandmarkFrame) -> Option<(&Position, &Position)> {
        let (shoulder, elbow) = self.joints();
        let shoulder = frame.get(shoulder).filter(|p| p.is_finite())?;
        let elbow = frame.get(elbow).filter(|p| p.is_finite())?;
        Some((shoulder, elbow))
    }

    fn sample(self, frame: &LandmarkFrame) -> Option<ArmSample> {
        self.pair(frame).map(|(shoulder, elbow)| ArmSample {
            shoulder_y: shoulder.y,
            elbow_y: elbow.y,
        })
    }

    fn visibility(self, frame: &LandmarkFrame) -> Option<f32> {
        self.pair(frame).map(|(shoulder, elbow)| {
            (shoulder.visibility.unwrap_or(0.0) + elbow.visibility.unwrap_or(0.0)) / 2.0
        })
    }
}

/// More visible complete side of a single frame. Ties go left.
fn dominant_side(frame: &LandmarkFrame) -> Option<ArmSide> {
    match (
        ArmSide::Left.visibility(frame),
        ArmSide::Right.visibility(frame),
    ) {
        (Some(left), Some(right)) if right > left => Some(ArmSide::Right),
        (Some(_), _) => Some(ArmSide::Left),
        (None, Some(_)) => Some(ArmSide::Right),
        (None, None) => None,
    }
}

impl SideStrategy {
    /// Extract the shoulder/elbow sample for this strategy from one frame.
    ///
    /// Returns `None` when a required joint is missing or not finite.
    pub fn sample(self, frame: &LandmarkFrame) -> Option<ArmSample> {
        self.sample_tracked(frame, None, false).map(|(_, sample)| sample)
    }

    /// Extract a sample while following the arm used by earlier frames.
    ///
    /// `followed` is the arm the previous evaluated frame was read from. For
    /// `Dominant`, `hold` pins the sample to that arm (a missing arm gives
    /// `None`); without `hold` the strategy moves to the other arm only when
    /// the followed one is missing or the other leads in visibility by more
    /// than `DOMINANT_SWITCH_MARGIN`. `Average` reads both arms and reports
    /// no side.
    pub fn sample_tracked(
        self,
        frame: &LandmarkFrame,
        followed: Option<ArmSide>,
        hold: bool,
    ) -> Option<(Option<ArmSide>, ArmSample)> {
        let side = match self {
            Self::Left => ArmSide::Left,
            Self::Right => ArmSide::Right,
            Self::Dominant => match followed {
                Some(current) if hold => current,
                Some(current) => {
                    let other = current.other();
                    match (current.visibility(frame), other.visibility(frame)) {
                        (Some(mine), Some(theirs)) if theirs > mine + DOMINANT_SWITCH_MARGIN => {
                            other
                        }
                        (Some(_), _) => current,
                        (None, Some(_)) => other,
                        (None, None) => return None,
                    }
                }
                None => dominant_side(frame)?,
            },
            Self::Average => {
                let left = ArmSide::Left.sample(frame)?;
                let right = ArmSide::Right.sample(frame)?;
                let sample = ArmSample {
                    shoulder_y: (left.shoulder_y + right.shoulder_y) / 2.0,
                    elbow_y: (left.elbow_y + right.elbow_y) / 2.0,
                };
                return Some((None, sample));
            }
        };
        side.sample(frame).map(|sample| (Some(side), sample))
    }
}

/// Validated tuning for the rep counter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdConfig {
    hysteresis: f32,
    side: SideStrategy,
}

impl ThresholdConfig {
    /// Margin must be finite and non-negative.
    pub fn new(hysteresis: f32, side: SideStrategy) -> Result<Self> {
        if !hysteresis.is_finite() {
            return Err(anyhow!("hysteresis margin must be a finite number"));
        }
        if hysteresis < 0.0 {
            return Err(anyhow!(
                "hysteresis margin must be >= 0 (got {})",
                hysteresis
            ));
        }
        Ok(Self { hysteresis, side })
    }

    pub fn hysteresis(&self) -> f32 {
        self.hysteresis
    }

    pub fn side(&self) -> SideStrategy {
        self.side
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            hysteresis: DEFAULT_HYSTERESIS,
            side: SideStrategy::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm(
        frame: LandmarkFrame,
        side: ArmSide,
        shoulder_y: f32,
        elbow_y: f32,
        vis: f32,
    ) -> LandmarkFrame {
        let (shoulder, elbow) = side.joints();
        frame
            .with_joint(shoulder, Position::new(0.0, shoulder_y).with_visibility(vis))
            .with_joint(elbow, Position::new(0.0, elbow_y).with_visibility(vis))
    }

    #[test]
    fn rejects_negative_and_non_finite_margin() {
        assert!(ThresholdConfig::new(-0.5, SideStrategy::Left).is_err());
        assert!(ThresholdConfig::new(f32::NAN, SideStrategy::Left).is_err());
        assert!(ThresholdConfig::new(f32::INFINITY, SideStrategy::Left).is_err());
        assert_eq!(
            ThresholdConfig::new(0.0, SideStrategy::Right).unwrap().hysteresis(),
            0.0
        );
    }

    #[test]
    fn parses_side_names() {
        assert_eq!("LEFT".parse::<SideStrategy>().unwrap(), SideStrategy::Left);
        assert_eq!(" dominant ".parse::<SideStrategy>().unwrap(), SideStrategy::Dominant);
        assert!("both".parse::<SideStrategy>().is_err());
        assert_eq!(SideStrategy::Average.to_string(), "average");
    }

    #[test]
    fn left_ignores_right_arm() {
        let frame = arm(LandmarkFrame::new(0), ArmSide::Right, 100.0, 50.0, 1.0);
        assert!(SideStrategy::Left.sample(&frame).is_none());
        assert!(SideStrategy::Right.sample(&frame).is_some());
    }

    #[test]
    fn dominant_picks_more_visible_side() {
        let frame = arm(LandmarkFrame::new(0), ArmSide::Left, 10.0, 20.0, 0.4);
        let frame = arm(frame, ArmSide::Right, 30.0, 40.0, 0.9);

        let sample = SideStrategy::Dominant.sample(&frame).unwrap();
        assert_eq!(sample.shoulder_y, 30.0);
        assert_eq!(sample.elbow_y, 40.0);
    }

    #[test]
    fn dominant_prefers_left_on_tie_and_falls_back_to_complete_side() {
        let frame = arm(LandmarkFrame::new(0), ArmSide::Left, 10.0, 20.0, 0.5);
        let frame = arm(frame, ArmSide::Right, 30.0, 40.0, 0.5);
        assert_eq!(SideStrategy::Dominant.sample(&frame).unwrap().shoulder_y, 10.0);

        let right_only = arm(LandmarkFrame::new(0), ArmSide::Right, 30.0, 40.0, 0.1);
        assert_eq!(SideStrategy::Dominant.sample(&right_only).unwrap().shoulder_y, 30.0);

        assert!(SideStrategy::Dominant.sample(&LandmarkFrame::new(0)).is_none());
    }

    #[test]
    fn dominant_holds_followed_arm() {
        let frame = arm(LandmarkFrame::new(0), ArmSide::Left, 10.0, 20.0, 0.5);
        let frame = arm(frame, ArmSide::Right, 30.0, 40.0, 0.6);
        let dominant = SideStrategy::Dominant;

        // Lead of 0.1 is inside the switch margin.
        let (side, sample) = dominant
            .sample_tracked(&frame, Some(ArmSide::Left), false)
            .unwrap();
        assert_eq!(side, Some(ArmSide::Left));
        assert_eq!(sample.shoulder_y, 10.0);

        let clear_lead = arm(frame.clone(), ArmSide::Right, 30.0, 40.0, 0.9);
        let (side, _) = dominant
            .sample_tracked(&clear_lead, Some(ArmSide::Left), false)
            .unwrap();
        assert_eq!(side, Some(ArmSide::Right));
        let (side, _) = dominant
            .sample_tracked(&clear_lead, Some(ArmSide::Left), true)
            .unwrap();
        assert_eq!(side, Some(ArmSide::Left));

        let right_only = arm(LandmarkFrame::new(1), ArmSide::Right, 30.0, 40.0, 0.9);
        assert!(dominant
            .sample_tracked(&right_only, Some(ArmSide::Left), true)
            .is_none());
        let (side, _) = dominant
            .sample_tracked(&right_only, Some(ArmSide::Left), false)
            .unwrap();
        assert_eq!(side, Some(ArmSide::Right));
    }

    #[test]
    fn average_needs_both_sides() {
        let left_only = arm(LandmarkFrame::new(0), ArmSide::Left, 10.0, 20.0, 1.0);
        assert!(SideStrategy::Average.sample(&left_only).is_none());

        let both = arm(left_only, ArmSide::Right, 30.0, 40.0, 1.0);
        let sample = SideStrategy::Average.sample(&both).unwrap();
        assert_eq!(sample.shoulder_y, 20.0);
        assert_eq!(sample.elbow_y, 30.0);
    }

    #[test]
    fn non_finite_joint_is_unusable() {
        let frame = LandmarkFrame::new(0)
            .with_joint(Joint::LeftShoulder, Position::new(0.0, f32::NAN))
            .with_joint(Joint::LeftElbow, Position::new(0.0, 5.0));
        assert!(SideStrategy::Left.sample(&frame).is_none());
    }
}
