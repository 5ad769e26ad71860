//! Command-line parsing and validation helpers.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::audio::{
    AmplitudeEstimator, CaptureConfig, InertialEstimator, SegmenterConfig, SpeechEstimator,
    DEFAULT_AMPLITUDE_THRESHOLD, DEFAULT_ATTACK, DEFAULT_GAIN, DEFAULT_RELEASE,
};

pub use defaults::{
    default_estimator, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CONTINUE_THRESHOLD,
    DEFAULT_END_SILENCE_WINDOWS, DEFAULT_MIN_PHRASE_MS, DEFAULT_OUTPUT_DIR,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SAMPLE_RATE, DEFAULT_START_THRESHOLD, DEFAULT_WINDOW_SAMPLES,
};

/// CLI options for the Voxide pipeline. Validated values keep the capture
/// and segmentation workers within safe operating ranges.
#[derive(Debug, Parser, Clone)]
#[command(about = "Voxide speech segmentation and command pipeline", author, version)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long = "input-device")]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Segment a WAV file into utterance artifacts and exit
    #[arg(long = "segment-wav", value_name = "PATH")]
    pub segment_wav: Option<PathBuf>,

    /// Execute a JSON intent batch against the in-memory editor and exit
    #[arg(long = "run-intents", value_name = "PATH")]
    pub run_intents: Option<PathBuf>,

    /// Print the command schema export as JSON and exit
    #[arg(long = "print-schema", default_value_t = false)]
    pub print_schema: bool,

    /// Directory for utterance and debug recordings
    #[arg(long = "output-dir", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Skip writing per-utterance WAV artifacts
    #[arg(long = "no-artifacts")]
    pub no_artifacts: bool,

    /// Keep the whole session's audio and write it out on stop
    #[arg(long = "debug-capture")]
    pub debug_capture: bool,

    /// Pipeline sample rate (Hz)
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Samples per detector window
    #[arg(long = "window-samples", default_value_t = DEFAULT_WINDOW_SAMPLES)]
    pub window_samples: usize,

    /// Speech probability required to open a phrase
    #[arg(long = "start-threshold", default_value_t = DEFAULT_START_THRESHOLD)]
    pub start_threshold: f32,

    /// Speech probability required to keep a phrase open
    #[arg(long = "continue-threshold", default_value_t = DEFAULT_CONTINUE_THRESHOLD)]
    pub continue_threshold: f32,

    /// Consecutive silent windows that close a phrase
    #[arg(long = "end-silence-windows", default_value_t = DEFAULT_END_SILENCE_WINDOWS)]
    pub end_silence_windows: u32,

    /// Shortest phrase worth emitting (milliseconds of speech)
    #[arg(long = "min-phrase-ms", default_value_t = DEFAULT_MIN_PHRASE_MS)]
    pub min_phrase_ms: u64,

    /// Capture-to-worker chunk channel capacity
    #[arg(long = "channel-capacity", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Utterance handoff queue capacity
    #[arg(long = "queue-capacity", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Speech estimator implementation to use
    #[arg(long = "estimator", value_enum, default_value_t = default_estimator())]
    pub estimator: EstimatorKind,

    /// Disable inertial smoothing around the estimator
    #[arg(long = "no-smoothing")]
    pub no_smoothing: bool,

    /// RMS threshold for the amplitude estimator
    #[arg(long = "amplitude-threshold", default_value_t = DEFAULT_AMPLITUDE_THRESHOLD)]
    pub amplitude_threshold: f32,

    /// Smoothing coefficient while the score rises
    #[arg(long = "attack", default_value_t = DEFAULT_ATTACK)]
    pub attack: f32,

    /// Smoothing coefficient while the score falls
    #[arg(long = "release", default_value_t = DEFAULT_RELEASE)]
    pub release: f32,

    /// Gain applied to the raw score before smoothing
    #[arg(long = "gain", default_value_t = DEFAULT_GAIN)]
    pub gain: f32,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "VOXIDE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "VOXIDE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}

/// Snapshot of the CLI-controlled segmentation settings for downstream
/// consumers.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sample_rate: u32,
    pub window_samples: usize,
    pub start_threshold: f32,
    pub continue_threshold: f32,
    pub end_silence_windows: u32,
    pub min_phrase_ms: u64,
    pub channel_capacity: usize,
    pub queue_capacity: usize,
    pub estimator: EstimatorKind,
    pub smoothing: bool,
    pub amplitude_threshold: f32,
    pub attack: f32,
    pub release: f32,
    pub gain: f32,
}

impl PipelineConfig {
    pub fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            sample_rate: self.sample_rate,
            window_samples: self.window_samples,
            start_threshold: self.start_threshold,
            continue_threshold: self.continue_threshold,
            end_silence_windows: self.end_silence_windows,
            min_phrase_ms: self.min_phrase_ms,
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            segmenter: self.segmenter_config(),
            channel_capacity: self.channel_capacity,
            keep_session_pcm: false,
        }
    }

    /// Builds the configured estimator, optionally wrapped in inertial
    /// smoothing.
    pub fn build_estimator(&self) -> Box<dyn SpeechEstimator> {
        let base: Box<dyn SpeechEstimator> = match self.estimator {
            EstimatorKind::Amplitude => {
                Box::new(AmplitudeEstimator::new(self.amplitude_threshold))
            }
            EstimatorKind::Earshot => {
                #[cfg(feature = "vad_earshot")]
                {
                    Box::new(crate::vad_earshot::EarshotEstimator::from_config(
                        &self.segmenter_config(),
                    ))
                }
                #[cfg(not(feature = "vad_earshot"))]
                {
                    tracing::warn!("earshot estimator not compiled in, using amplitude");
                    Box::new(AmplitudeEstimator::new(self.amplitude_threshold))
                }
            }
        };
        if self.smoothing {
            Box::new(InertialEstimator::with_coefficients(
                base,
                self.attack,
                self.release,
                self.gain,
                0.0,
            ))
        } else {
            base
        }
    }
}

/// Available runtime-selectable speech estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EstimatorKind {
    Earshot,
    Amplitude,
}

impl EstimatorKind {
    pub fn label(self) -> &'static str {
        match self {
            EstimatorKind::Earshot => "earshot",
            EstimatorKind::Amplitude => "amplitude",
        }
    }
}
