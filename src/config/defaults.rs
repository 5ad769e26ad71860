//! Default tuning values shared by the CLI and programmatic callers.

use super::EstimatorKind;

pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_WINDOW_SAMPLES: usize = 512;
pub const DEFAULT_START_THRESHOLD: f32 = 0.5;
pub const DEFAULT_CONTINUE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_END_SILENCE_WINDOWS: u32 = 16;
pub const DEFAULT_MIN_PHRASE_MS: u64 = 500;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;
pub const DEFAULT_OUTPUT_DIR: &str = "recordings";

pub(super) const MIN_SAMPLE_RATE: u32 = 8_000;
pub(super) const MAX_SAMPLE_RATE: u32 = 96_000;
pub(super) const MIN_WINDOW_SAMPLES: usize = 64;
pub(super) const MAX_WINDOW_SAMPLES: usize = 8_192;
pub(super) const MAX_END_SILENCE_WINDOWS: u32 = 256;
pub(super) const MAX_MIN_PHRASE_MS: u64 = 60_000;
pub(super) const MIN_CHANNEL_CAPACITY: usize = 8;
pub(super) const MAX_CHANNEL_CAPACITY: usize = 1_024;
pub(super) const MAX_QUEUE_CAPACITY: usize = 64;

/// Prefer the neural detector when it was compiled in.
pub fn default_estimator() -> EstimatorKind {
    #[cfg(feature = "vad_earshot")]
    {
        EstimatorKind::Earshot
    }
    #[cfg(not(feature = "vad_earshot"))]
    {
        EstimatorKind::Amplitude
    }
}
