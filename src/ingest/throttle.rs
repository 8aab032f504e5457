/// Default minimum spacing between analysed frames.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 150;

/// Drops frames that arrive sooner than `interval_ms` after the last
/// accepted one.
///
/// Works on capture timestamps, so a stale frame (older than the last
/// accepted one) is dropped as well. An interval of zero accepts everything.
#[derive(Clone, Debug)]
pub struct FrameThrottle {
    interval_ms: u64,
    last_accepted_ms: Option<u64>,
    dropped: u64,
}

impl FrameThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_accepted_ms: None,
            dropped: 0,
        }
    }

    /// Returns true when the frame should be analysed.
    pub fn admit(&mut self, timestamp_ms: u64) -> bool {
        if self.interval_ms == 0 {
            return true;
        }
        if let Some(last) = self.last_accepted_ms {
            if timestamp_ms.saturating_sub(last) < self.interval_ms {
                self.dropped += 1;
                return false;
            }
        }
        self.last_accepted_ms = Some(timestamp_ms);
        true
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn reset(&mut self) {
        self.last_accepted_ms = None;
        self.dropped = 0;
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL_MS)
    }
}
