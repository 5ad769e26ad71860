//! System microphone capture via CPAL.
//!
//! Handles device enumeration and format conversion, then drives the live
//! segmentation loop: device chunks arrive on the callback thread, cross a
//! bounded channel, and are resampled, quantized, and fed to the segmenter on
//! the caller's thread. The callback never blocks; a saturated channel drops
//! chunks and counts them.

#[cfg(not(test))]
use super::assembler::{to_pcm_bytes, SampleAssembler};
#[cfg(not(test))]
use super::dispatch::ChunkDispatcher;
use super::estimator::SpeechEstimator;
use super::meter::SpeechLevel;
#[cfg(not(test))]
use super::resample::resample_to_rate;
#[cfg(not(test))]
use super::segmenter::{StopReason, UtteranceSegmenter};
use super::segmenter::{PipelineMetrics, SegmenterConfig, Utterance};
use anyhow::{anyhow, Context, Result};
#[cfg(not(test))]
use cpal::traits::StreamTrait;
use cpal::traits::{DeviceTrait, HostTrait};
#[cfg(not(test))]
use cpal::{SampleFormat, StreamConfig};
use std::sync::atomic::AtomicBool;
#[cfg(not(test))]
use std::sync::atomic::Ordering;
#[cfg(not(test))]
use std::sync::Mutex;
use std::sync::Arc;
#[cfg(not(test))]
use std::time::Duration;
#[cfg(not(test))]
use tracing::debug;

/// Device-capture knobs distinct from endpointing parameters.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub segmenter: SegmenterConfig,
    /// Capacity of the callback-to-worker chunk channel.
    pub channel_capacity: usize,
    /// Retain the whole session's PCM for a debug recording.
    pub keep_session_pcm: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            channel_capacity: 64,
            keep_session_pcm: false,
        }
    }
}

/// What a live capture run produced besides its emitted utterances.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub metrics: PipelineMetrics,
    /// Full-session pipeline-rate PCM, present when `keep_session_pcm` is set.
    pub session_pcm: Option<Vec<u8>>,
}

/// Audio input device wrapper.
pub struct Recorder {
    device: cpal::Device,
}

impl Recorder {
    /// List microphone names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a recorder, optionally forcing a specific device so users can
    /// pick the right microphone when a machine exposes several inputs.
    pub fn new(preferred_device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self { device })
    }

    /// Get the name of the active recording device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Capture from the microphone until the stop flag is set, emitting every
    /// finalized utterance through `on_utterance`.
    #[cfg(not(test))]
    pub fn record_segmented(
        &self,
        cfg: &CaptureConfig,
        estimator: &mut dyn SpeechEstimator,
        stop_flag: Arc<AtomicBool>,
        level: Option<SpeechLevel>,
        on_utterance: &mut dyn FnMut(Utterance),
    ) -> Result<CaptureOutcome> {
        record_segmented_impl(self, cfg, estimator, stop_flag, level, on_utterance)
    }

    #[cfg(test)]
    pub fn record_segmented(
        &self,
        _cfg: &CaptureConfig,
        _estimator: &mut dyn SpeechEstimator,
        _stop_flag: Arc<AtomicBool>,
        _level: Option<SpeechLevel>,
        _on_utterance: &mut dyn FnMut(Utterance),
    ) -> Result<CaptureOutcome> {
        Ok(CaptureOutcome {
            metrics: PipelineMetrics::default(),
            session_pcm: None,
        })
    }

    #[cfg(test)]
    pub(super) fn new_for_tests() -> Option<Self> {
        let host = cpal::default_host();
        host.default_input_device().map(|device| Self { device })
    }
}

#[cfg(not(test))]
fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}

#[cfg(not(test))]
fn record_segmented_impl(
    recorder: &Recorder,
    cfg: &CaptureConfig,
    estimator: &mut dyn SpeechEstimator,
    stop_flag: Arc<AtomicBool>,
    level: Option<SpeechLevel>,
    on_utterance: &mut dyn FnMut(Utterance),
) -> Result<CaptureOutcome> {
    use crossbeam_channel::{bounded, RecvTimeoutError};
    use std::sync::atomic::AtomicUsize;

    let seg_cfg = &cfg.segmenter;
    let default_config = recorder.device.default_input_config()?;
    let format = default_config.sample_format();
    let device_config: StreamConfig = default_config.clone().into();
    let device_sample_rate = device_config.sample_rate.0;
    let channels = usize::from(device_config.channels.max(1));

    debug!(
        ?format,
        device_sample_rate, channels, "capture stream configuration"
    );

    // Device chunks match one window's duration so the worker usually
    // produces exactly one window per chunk after resampling.
    let window_ms = seg_cfg.window_ms().max(1);
    let device_chunk_samples = ((u64::from(device_sample_rate) * window_ms) / 1000).max(1) as usize;
    let (sender, receiver) = bounded::<Vec<f32>>(cfg.channel_capacity.max(1));
    let dropped = Arc::new(AtomicUsize::new(0));
    let dispatcher = Arc::new(Mutex::new(ChunkDispatcher::new(
        device_chunk_samples,
        sender,
        dropped.clone(),
    )));

    let err_fn = |err| tracing::warn!(error = %err, "audio stream error");
    let stream = match format {
        SampleFormat::F32 => {
            let dispatcher = dispatcher.clone();
            let dropped = dropped.clone();
            recorder.device.build_input_stream(
                &device_config,
                move |data: &[f32], _| {
                    if let Ok(mut pump) = dispatcher.try_lock() {
                        pump.push(data, channels, |sample| sample);
                    } else {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                },
                err_fn,
                None,
            )?
        }
        SampleFormat::I16 => {
            let dispatcher = dispatcher.clone();
            let dropped = dropped.clone();
            recorder.device.build_input_stream(
                &device_config,
                move |data: &[i16], _| {
                    if let Ok(mut pump) = dispatcher.try_lock() {
                        pump.push(data, channels, |sample| sample as f32 / 32_768.0);
                    } else {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                },
                err_fn,
                None,
            )?
        }
        SampleFormat::U16 => {
            let dispatcher = dispatcher.clone();
            let dropped = dropped.clone();
            recorder.device.build_input_stream(
                &device_config,
                move |data: &[u16], _| {
                    if let Ok(mut pump) = dispatcher.try_lock() {
                        pump.push(data, channels, |sample| {
                            (sample as f32 - 32_768.0) / 32_768.0
                        });
                    } else {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                },
                err_fn,
                None,
            )?
        }
        other => return Err(anyhow!("unsupported sample format: {other:?}")),
    };

    stream.play()?;

    let mut assembler = SampleAssembler::new(seg_cfg.window_samples);
    let mut segmenter = UtteranceSegmenter::new(seg_cfg.clone());
    let mut metrics = PipelineMetrics::default();
    let mut session_pcm = cfg.keep_session_pcm.then(Vec::new);
    let wait_time = Duration::from_millis(window_ms);
    let mut stop_reason = StopReason::ManualStop;

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            break;
        }
        match receiver.recv_timeout(wait_time) {
            Ok(chunk) => {
                let pipeline_samples =
                    resample_to_rate(&chunk, device_sample_rate, seg_cfg.sample_rate);
                let bytes = to_pcm_bytes(&pipeline_samples);
                if let Some(ref mut pcm) = session_pcm {
                    pcm.extend_from_slice(&bytes);
                }
                metrics.chunks_processed += 1;

                for window in assembler.feed_slice(&bytes) {
                    let probability = estimator.probability(&window.samples);
                    if let Some(ref level) = level {
                        level.set(probability);
                    }
                    if let Some(utterance) = segmenter.push(&window, probability) {
                        on_utterance(utterance);
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                stop_reason = StopReason::Disconnected;
                break;
            }
        }
    }

    if let Err(err) = stream.pause() {
        debug!(error = %err, "failed to pause audio stream");
    }
    drop(stream);
    if let Some(ref level) = level {
        level.set(0.0);
    }

    // Whatever phrase was mid-flight when capture stopped is not recoverable.
    assembler.reset();
    segmenter.reset();

    metrics.windows_processed = segmenter.windows_processed();
    metrics.utterances_emitted = segmenter.utterances_emitted();
    metrics.utterances_discarded = segmenter.utterances_discarded();
    metrics.chunks_dropped = dropped.load(Ordering::Relaxed);
    metrics.stop_reason = stop_reason;

    if metrics.chunks_processed == 0 && !matches!(metrics.stop_reason, StopReason::ManualStop) {
        return Err(anyhow!(
            "no samples captured from '{}'; check microphone permissions and availability. {}",
            recorder.device_name(),
            mic_permission_hint()
        ));
    }

    Ok(CaptureOutcome {
        metrics,
        session_pcm,
    })
}
