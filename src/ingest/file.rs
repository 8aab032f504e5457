//! Landmark replay from a local JSON-lines file.
//!
//! Each non-empty line holds one detector result:
//!
//! ```text
//! {"t_ms": 1200, "landmarks": {"left_shoulder": {"x": 310.0, "y": 402.5}, "left_elbow": {"x": 330.0, "y": 380.0}}}
//! {"t_ms": 1350, "landmarks": null}
//! ```
//!
//! `"landmarks": null` (or a missing key) is a frame where no body was found.
//! Blank lines and lines starting with `#` are ignored.
//!
//! The file source MUST NOT:
//! - Fetch remote URLs
//! - Reorder frames

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::source::{LandmarkSource, SourceFrame, SourceStats};
use crate::landmark::{Joint, LandmarkFrame, Position};

#[derive(Debug, Deserialize)]
struct FrameRecord {
    t_ms: u64,
    #[serde(default)]
    landmarks: Option<BTreeMap<Joint, Position>>,
}

/// Replays recorded landmark frames.
pub struct FileLandmarkSource {
    reader: Box<dyn BufRead + Send>,
    location: String,
    line_no: u64,
    frames_produced: u64,
    no_detection: u64,
    errors: u64,
    io_failed: bool,
}

impl FileLandmarkSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open landmark file {}", path.display()))?;
        Ok(Self::from_reader(
            path.display().to_string(),
            BufReader::new(file),
        ))
    }

    pub fn from_reader<R>(location: impl Into<String>, reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self {
            reader: Box::new(reader),
            location: location.into(),
            line_no: 0,
            frames_produced: 0,
            no_detection: 0,
            errors: 0,
            io_failed: false,
        }
    }

    fn malformed(&mut self, reason: impl std::fmt::Display) -> anyhow::Error {
        self.errors += 1;
        anyhow!(
            "invalid landmark record at {}:{}: {}",
            self.location,
            self.line_no,
            reason
        )
    }

    fn parse_line(&self, line: &str) -> Result<SourceFrame, serde_json::Error> {
        let record: FrameRecord = serde_json::from_str(line)?;
        Ok(match record.landmarks {
            Some(joints) => SourceFrame::Detected(LandmarkFrame::from_joints(record.t_ms, joints)),
            None => SourceFrame::NoDetection {
                timestamp_ms: record.t_ms,
            },
        })
    }
}

impl LandmarkSource for FileLandmarkSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("FileLandmarkSource: replaying {}", self.location);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = match self.reader.read_until(b'\n', &mut line) {
                Ok(read) => read,
                Err(e) => {
                    self.io_failed = true;
                    self.errors += 1;
                    return Err(anyhow!("failed to read {}: {}", self.location, e));
                }
            };
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            // A bad byte sequence spoils this line only; the reader is
            // already past it.
            let text = match std::str::from_utf8(&line) {
                Ok(text) => text.trim(),
                Err(e) => return Err(self.malformed(e)),
            };
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let frame = match self.parse_line(text) {
                Ok(frame) => frame,
                Err(e) => return Err(self.malformed(e)),
            };
            self.frames_produced += 1;
            if matches!(frame, SourceFrame::NoDetection { .. }) {
                self.no_detection += 1;
            }
            return Ok(Some(frame));
        }
    }

    fn is_healthy(&self) -> bool {
        !self.io_failed
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_produced: self.frames_produced,
            no_detection: self.no_detection,
            errors: self.errors,
            location: self.location.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source(text: &str) -> FileLandmarkSource {
        FileLandmarkSource::from_reader("memory", Cursor::new(text.to_string()))
    }

    #[test]
    fn reads_detections_and_gaps() {
        let mut src = source(
            r#"# recorded session
{"t_ms": 0, "landmarks": {"left_shoulder": {"x": 1.0, "y": 100.0, "visibility": 0.9}, "left_elbow": {"x": 2.0, "y": 50.0}}}

{"t_ms": 150, "landmarks": null}
{"t_ms": 300}
"#,
        );

        let first = src.next_frame().unwrap().unwrap();
        let SourceFrame::Detected(frame) = first else {
            panic!("expected detection");
        };
        assert_eq!(frame.timestamp_ms(), 0);
        assert_eq!(frame.get(Joint::LeftShoulder).unwrap().y, 100.0);
        assert_eq!(frame.get(Joint::LeftShoulder).unwrap().visibility, Some(0.9));
        assert_eq!(frame.get(Joint::LeftElbow).unwrap().visibility, None);

        assert_eq!(
            src.next_frame().unwrap(),
            Some(SourceFrame::NoDetection { timestamp_ms: 150 })
        );
        assert_eq!(
            src.next_frame().unwrap(),
            Some(SourceFrame::NoDetection { timestamp_ms: 300 })
        );
        assert!(src.next_frame().unwrap().is_none());

        let stats = src.stats();
        assert_eq!(stats.frames_produced, 3);
        assert_eq!(stats.no_detection, 2);
        assert_eq!(stats.errors, 0);
        assert!(src.is_healthy());
    }

    #[test]
    fn malformed_line_names_its_position_and_stream_continues() {
        let mut src = source(
            "{\"t_ms\": 0, \"landmarks\": null}\nnot json\n{\"t_ms\": 20, \"landmarks\": null}\n",
        );

        assert!(src.next_frame().unwrap().is_some());
        let err = src.next_frame().unwrap_err().to_string();
        assert!(err.contains("memory:2"), "{err}");
        assert_eq!(
            src.next_frame().unwrap(),
            Some(SourceFrame::NoDetection { timestamp_ms: 20 })
        );
        assert_eq!(src.stats().errors, 1);
        assert!(src.is_healthy());
    }

    #[test]
    fn invalid_utf8_line_is_malformed_not_fatal() {
        let mut bytes = b"{\"t_ms\": 0, \"landmarks\": null}\n".to_vec();
        bytes.extend_from_slice(b"\xff\xfe garbage\n");
        bytes.extend_from_slice(b"{\"t_ms\": 20, \"landmarks\": null}\nnot json\n");
        let mut src = FileLandmarkSource::from_reader("memory", Cursor::new(bytes));

        assert!(src.next_frame().unwrap().is_some());
        let err = src.next_frame().unwrap_err().to_string();
        assert!(err.contains("memory:2"), "{err}");
        assert!(src.is_healthy());

        assert_eq!(
            src.next_frame().unwrap(),
            Some(SourceFrame::NoDetection { timestamp_ms: 20 })
        );
        let err = src.next_frame().unwrap_err().to_string();
        assert!(err.contains("memory:4"), "{err}");
        assert!(src.next_frame().unwrap().is_none());

        assert_eq!(src.stats().errors, 2);
        assert!(src.is_healthy());
    }

    #[test]
    fn unknown_joint_name_is_rejected() {
        let mut src = source(r#"{"t_ms": 0, "landmarks": {"left_knee": {"x": 0.0, "y": 0.0}}}"#);
        assert!(src.next_frame().is_err());
    }
}
