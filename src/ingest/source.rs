use anyhow::Result;

use crate::landmark::LandmarkFrame;

/// One item produced by a landmark source.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceFrame {
    /// The detector found a body.
    Detected(LandmarkFrame),
    /// The detector ran but found no body (or failed).
    NoDetection { timestamp_ms: u64 },
}

impl SourceFrame {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            SourceFrame::Detected(frame) => frame.timestamp_ms(),
            SourceFrame::NoDetection { timestamp_ms } => *timestamp_ms,
        }
    }
}

/// Statistics for a landmark source.
#[derive(Clone, Debug, Default)]
pub struct SourceStats {
    pub frames_produced: u64,
    pub no_detection: u64,
    pub errors: u64,
    pub location: String,
}

/// Producer of landmark frames.
///
/// Implementations wrap a pose detector (or a recording of one). Frames must
/// come out in capture order.
pub trait LandmarkSource: Send {
    /// Source identifier.
    fn name(&self) -> &'static str;

    /// Optional connect hook.
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Next frame, or `Ok(None)` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<SourceFrame>>;

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}
