//! Landmark snapshots.
//!
//! A `LandmarkFrame` is what the pose detector hands over for one processed
//! camera frame: a set of named joints in image coordinates plus the capture
//! timestamp. Joints the detector could not place are simply absent.
//!
//! Image coordinates grow downward, so a larger `y` means lower in the frame.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of landmarks in a MediaPipe pose result.
pub const MEDIAPIPE_LANDMARK_COUNT: usize = 33;

// ----------------------------------------------------------------------------
// Joint identifiers
// ----------------------------------------------------------------------------

/// Body joints the kernel understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
}

impl Joint {
    pub const ALL: [Joint; 9] = [
        Joint::Nose,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
    ];

    /// Index of this joint in a MediaPipe pose landmark list.
    pub const fn mediapipe_index(self) -> usize {
        match self {
            Joint::Nose => 0,
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftElbow => 13,
            Joint::RightElbow => 14,
            Joint::LeftWrist => 15,
            Joint::RightWrist => 16,
            Joint::LeftHip => 23,
            Joint::RightHip => 24,
        }
    }
}

// ----------------------------------------------------------------------------
// Position
// ----------------------------------------------------------------------------

/// A joint position in image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    /// Relative depth, when the detector provides one.
    #[serde(default)]
    pub z: f32,
    /// Detector confidence that the joint is visible (0..=1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// True when both image coordinates are usable numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ----------------------------------------------------------------------------
// LandmarkFrame
// ----------------------------------------------------------------------------

/// Immutable snapshot of the joints detected in one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkFrame {
    timestamp_ms: u64,
    joints: BTreeMap<Joint, Position>,
}

impl LandmarkFrame {
    /// Empty frame captured at `timestamp_ms`.
    pub fn new(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            joints: BTreeMap::new(),
        }
    }

    pub fn from_joints(timestamp_ms: u64, joints: BTreeMap<Joint, Position>) -> Self {
        Self {
            timestamp_ms,
            joints,
        }
    }

    /// Builder: add (or replace) one joint.
    pub fn with_joint(mut self, joint: Joint, position: Position) -> Self {
        self.joints.insert(joint, position);
        self
    }

    /// Build a frame from a flat MediaPipe buffer (33 landmarks × x, y, z).
    ///
    /// Only the joints in `Joint::ALL` are kept.
    pub fn from_mediapipe(timestamp_ms: u64, data: &[f32]) -> Result<Self> {
        if data.len() != MEDIAPIPE_LANDMARK_COUNT * 3 {
            return Err(anyhow!(
                "invalid landmark data length: {} (expected {})",
                data.len(),
                MEDIAPIPE_LANDMARK_COUNT * 3
            ));
        }
        let joints = Joint::ALL
            .iter()
            .map(|&joint| {
                let i = joint.mediapipe_index() * 3;
                let position = Position {
                    x: data[i],
                    y: data[i + 1],
                    z: data[i + 2],
                    visibility: None,
                };
                (joint, position)
            })
            .collect();
        Ok(Self::from_joints(timestamp_ms, joints))
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn get(&self, joint: Joint) -> Option<&Position> {
        self.joints.get(&joint)
    }

    pub fn contains(&self, joint: Joint) -> bool {
        self.joints.contains_key(&joint)
    }

    pub fn joints(&self) -> impl Iterator<Item = (Joint, &Position)> {
        self.joints.iter().map(|(joint, position)| (*joint, position))
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
