//! Audio capture and speech segmentation pipeline.
//!
//! Microphone input is captured via CPAL, downmixed and resampled to the
//! 16 kHz mono pipeline format, reassembled into fixed-size windows, scored
//! by a speech estimator, and cut into discrete utterances by a hysteresis
//! state machine. The same chain runs offline over in-memory PCM for tests
//! and benchmarks.

/// Sample rate every stage downstream of capture operates at.
pub const PIPELINE_RATE: u32 = 16_000;

/// Channel count of the pipeline format.
pub const PIPELINE_CHANNELS: u16 = 1;

/// Bits per sample of the pipeline's PCM encoding.
pub const PIPELINE_BITS: u16 = 16;

mod assembler;
mod dispatch;
mod estimator;
mod meter;
mod recorder;
mod resample;
mod segmenter;
#[cfg(test)]
mod tests;
pub mod wav;

pub use assembler::{normalize, to_pcm_bytes, SampleAssembler, Window};
pub use estimator::{
    AmplitudeEstimator, InertialEstimator, SpeechEstimator, DEFAULT_AMPLITUDE_THRESHOLD,
    DEFAULT_ATTACK, DEFAULT_GAIN, DEFAULT_RELEASE, DEFAULT_SPEECH_THRESHOLD,
};
pub use meter::SpeechLevel;
pub use recorder::{CaptureConfig, CaptureOutcome, Recorder};
pub use segmenter::{
    segment_pcm_bytes, PhraseState, PipelineMetrics, SegmentRun, SegmenterConfig, StopReason,
    Utterance, UtteranceSegmenter,
};
