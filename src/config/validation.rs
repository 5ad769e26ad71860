use super::defaults::{
    MAX_CHANNEL_CAPACITY, MAX_END_SILENCE_WINDOWS, MAX_MIN_PHRASE_MS, MAX_QUEUE_CAPACITY,
    MAX_SAMPLE_RATE, MAX_WINDOW_SAMPLES, MIN_CHANNEL_CAPACITY, MIN_SAMPLE_RATE, MIN_WINDOW_SAMPLES,
};
use super::{AppConfig, PipelineConfig};
use crate::session::SessionConfig;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize input paths.
    pub fn validate(&mut self) -> Result<()> {
        const MIN_GAIN: f32 = 0.1;
        const MAX_GAIN: f32 = 10.0;

        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between {MIN_SAMPLE_RATE} and {MAX_SAMPLE_RATE} Hz, got {}",
                self.sample_rate
            );
        }
        if !(MIN_WINDOW_SAMPLES..=MAX_WINDOW_SAMPLES).contains(&self.window_samples) {
            bail!(
                "--window-samples must be between {MIN_WINDOW_SAMPLES} and {MAX_WINDOW_SAMPLES}, got {}",
                self.window_samples
            );
        }
        if !(0.0..=1.0).contains(&self.start_threshold) {
            bail!(
                "--start-threshold must be between 0.0 and 1.0, got {}",
                self.start_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.continue_threshold) {
            bail!(
                "--continue-threshold must be between 0.0 and 1.0, got {}",
                self.continue_threshold
            );
        }
        if self.continue_threshold > self.start_threshold {
            bail!(
                "--continue-threshold ({}) cannot exceed --start-threshold ({})",
                self.continue_threshold,
                self.start_threshold
            );
        }
        if self.end_silence_windows == 0 || self.end_silence_windows > MAX_END_SILENCE_WINDOWS {
            bail!(
                "--end-silence-windows must be between 1 and {MAX_END_SILENCE_WINDOWS}, got {}",
                self.end_silence_windows
            );
        }
        if self.min_phrase_ms > MAX_MIN_PHRASE_MS {
            bail!(
                "--min-phrase-ms must be at most {MAX_MIN_PHRASE_MS} ms, got {}",
                self.min_phrase_ms
            );
        }
        if !(MIN_CHANNEL_CAPACITY..=MAX_CHANNEL_CAPACITY).contains(&self.channel_capacity) {
            bail!(
                "--channel-capacity must be between {MIN_CHANNEL_CAPACITY} and {MAX_CHANNEL_CAPACITY}, got {}",
                self.channel_capacity
            );
        }
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            bail!(
                "--queue-capacity must be between 1 and {MAX_QUEUE_CAPACITY}, got {}",
                self.queue_capacity
            );
        }
        if !(0.0..=1.0).contains(&self.amplitude_threshold) {
            bail!(
                "--amplitude-threshold must be between 0.0 and 1.0, got {}",
                self.amplitude_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.attack) {
            bail!("--attack must be between 0.0 and 1.0, got {}", self.attack);
        }
        if !(0.0..=1.0).contains(&self.release) {
            bail!(
                "--release must be between 0.0 and 1.0, got {}",
                self.release
            );
        }
        if !(MIN_GAIN..=MAX_GAIN).contains(&self.gain) {
            bail!(
                "--gain must be between {MIN_GAIN} and {MAX_GAIN}, got {}",
                self.gain
            );
        }

        #[cfg(not(feature = "vad_earshot"))]
        if matches!(self.estimator, super::EstimatorKind::Earshot) {
            bail!("--estimator earshot requires building with the 'vad_earshot' feature");
        }

        if let Some(path) = &mut self.segment_wav {
            *path = canonicalize_input(path, "--segment-wav")?;
        }
        if let Some(path) = &mut self.run_intents {
            *path = canonicalize_input(path, "--run-intents")?;
        }

        Ok(())
    }

    /// Snapshot the current CLI-controlled segmentation settings for downstream consumers.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            sample_rate: self.sample_rate,
            window_samples: self.window_samples,
            start_threshold: self.start_threshold,
            continue_threshold: self.continue_threshold,
            end_silence_windows: self.end_silence_windows,
            min_phrase_ms: self.min_phrase_ms,
            channel_capacity: self.channel_capacity,
            queue_capacity: self.queue_capacity,
            estimator: self.estimator,
            smoothing: !self.no_smoothing,
            amplitude_threshold: self.amplitude_threshold,
            attack: self.attack,
            release: self.release,
            gain: self.gain,
        }
    }

    /// Session settings derived from the CLI, ready to hand to `RecordingSession`.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            capture: self.pipeline_config().capture_config(),
            preferred_device: self.input_device.clone(),
            output_dir: self.output_dir.clone(),
            write_artifacts: !self.no_artifacts,
            debug_capture: self.debug_capture,
            queue_capacity: self.queue_capacity,
        }
    }
}

/// Make sure an input file exists and store a canonical absolute path.
pub(super) fn canonicalize_input(path: &Path, flag: &str) -> Result<PathBuf> {
    if !path.exists() {
        bail!("{flag} '{}' does not exist", path.display());
    }
    path.canonicalize()
        .with_context(|| format!("failed to canonicalize {flag} '{}'", path.display()))
}
