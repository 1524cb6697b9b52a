pub mod cadence;
pub mod doctor;
pub mod drive;
pub mod inference;
pub mod session;

pub use inference::{FrameSource, Predictor};
pub use session::{Sample, Session, SessionStats, State, TickOutcome, TickReport};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Full inference on ticks 0, N, 2N, ...
    pub process_every_n_frames: u32,
    /// Smoothing window; 0 disables smoothing.
    pub history_capacity: usize,
    /// Consecutive inference failures tolerated before the cached detection is dropped.
    pub failure_grace_ticks: u32,
    /// Display refresh period driving the tick loop.
    pub refresh_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { process_every_n_frames: 3, history_capacity: 5, failure_grace_ticks: 1, refresh_ms: 16 }
    }
}
