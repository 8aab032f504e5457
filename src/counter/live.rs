use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::machine::{Phase, RepCounterState};

const DOWN_BIT: u64 = 1 << 32;

/// Count and phase as seen by an observer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiveSnapshot {
    pub count: u32,
    pub phase: Phase,
}

/// Cross-thread view of a counter owned by another thread.
///
/// The owner publishes after every update; readers never touch the counter.
/// Count and phase are packed into one word so a reader never sees a count
/// from one update paired with the phase of another.
#[derive(Clone, Debug, Default)]
pub struct LiveCount {
    packed: Arc<AtomicU64>,
}

impl LiveCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, state: &RepCounterState) {
        let mut word = state.count as u64;
        if state.phase == Phase::Down {
            word |= DOWN_BIT;
        }
        self.packed.store(word, Ordering::Release);
    }

    pub fn clear(&self) {
        self.packed.store(0, Ordering::Release);
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        let word = self.packed.load(Ordering::Acquire);
        LiveSnapshot {
            count: word as u32,
            phase: if word & DOWN_BIT != 0 {
                Phase::Down
            } else {
                Phase::Up
            },
        }
    }

    pub fn count(&self) -> u32 {
        self.snapshot().count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn publishes_count_and_phase_together() {
        let live = LiveCount::new();
        assert_eq!(live.snapshot(), LiveSnapshot::default());

        live.publish(&RepCounterState {
            phase: Phase::Down,
            count: 7,
            last_sample: None,
            side: None,
        });
        assert_eq!(
            live.snapshot(),
            LiveSnapshot {
                count: 7,
                phase: Phase::Down
            }
        );

        live.clear();
        assert_eq!(live.count(), 0);
        assert_eq!(live.snapshot().phase, Phase::Up);
    }

    #[test]
    fn reader_thread_sees_writer_progress() {
        let live = LiveCount::new();
        let writer = live.clone();

        let handle = thread::spawn(move || {
            for count in 1..=1_000u32 {
                writer.publish(&RepCounterState {
                    phase: Phase::Up,
                    count,
                    last_sample: None,
                    side: None,
                });
            }
        });

        let mut last = 0;
        while last < 1_000 {
            let seen = live.count();
            assert!(seen >= last);
            last = seen;
            thread::yield_now();
        }
        handle.join().unwrap();
        assert_eq!(live.count(), 1_000);
    }
}
