//! Landmark ingestion.
//!
//! Pose detection itself is external. This module provides the sources that
//! hand its per-frame results to the counter:
//! - Local JSON-lines recordings (replay)
//! - Synthetic `stub://` source (testing, demos)
//!
//! The ingestion layer is responsible for:
//! - Delivering frames in capture order
//! - Rate limiting / frame decimation (`FrameThrottle`)
//! - Turning detector failures into "no detection" frames
//!
//! Only local ingestion is supported; network URLs are rejected.

pub mod file;
mod source;
pub mod synthetic;
mod throttle;

use anyhow::{anyhow, Result};
use std::path::Path;

pub use file::FileLandmarkSource;
pub use source::{LandmarkSource, SourceFrame, SourceStats};
pub use synthetic::{SyntheticConfig, SyntheticLandmarkSource};
pub use throttle::{FrameThrottle, DEFAULT_FRAME_INTERVAL_MS};

/// Open a source by URL: `stub://…` is synthetic, anything else a local file.
pub fn open_source(url: &str, fps: u32) -> Result<Box<dyn LandmarkSource>> {
    let url = url.trim();
    if url.is_empty() {
        return Err(anyhow!("landmark source must not be empty"));
    }
    if url.starts_with("stub://") {
        if fps == 0 {
            return Err(anyhow!("synthetic source fps must be >= 1"));
        }
        return Ok(Box::new(SyntheticLandmarkSource::new(SyntheticConfig {
            url: url.to_string(),
            fps,
            ..SyntheticConfig::default()
        })));
    }
    if url.contains("://") {
        return Err(anyhow!(
            "landmark ingestion only supports local paths and stub:// (got {})",
            url
        ));
    }
    Ok(Box::new(FileLandmarkSource::open(Path::new(url))?))
}

/// Pull the next frame, absorbing source failures.
///
/// A failing detector must not stall the counting session, so an error is
/// logged and reported as a no-detection frame stamped `fallback_ts_ms`.
/// End of stream is passed through as `None`.
pub fn guarded_next(source: &mut dyn LandmarkSource, fallback_ts_ms: u64) -> Option<SourceFrame> {
    match source.next_frame() {
        Ok(frame) => frame,
        Err(e) => {
            log::warn!("{} source failed, treating as no detection: {:#}", source.name(), e);
            Some(SourceFrame::NoDetection {
                timestamp_ms: fallback_ts_ms,
            })
        }
    }
}
