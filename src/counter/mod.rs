//! Rep detection.
//!
//! `RepCounter` turns a stream of landmark frames into a monotonically
//! increasing rep count. It does no I/O and holds no locks; one thread owns
//! it and publishes progress to others through `LiveCount`.

mod live;
mod machine;
mod threshold;

pub use live::{LiveCount, LiveSnapshot};
pub use machine::{Phase, RepCounter, RepCounterState, RepEvent};
pub use threshold::{
    ArmSample, ArmSide, SideStrategy, ThresholdConfig, DEFAULT_HYSTERESIS, DOMINANT_SWITCH_MARGIN,
};
