//! Earshot-powered speech detector implementing `SpeechEstimator`.

use crate::audio::{SegmenterConfig, SpeechEstimator};
use earshot::{VoiceActivityDetector, VoiceActivityProfile};

/// Thin wrapper that adapts `earshot` to the crate's `SpeechEstimator` trait.
/// Earshot is a binary classifier, so probabilities saturate to 0.0 or 1.0.
pub struct EarshotEstimator {
    detector: VoiceActivityDetector,
    frame_samples: usize,
    scratch: Vec<i16>,
}

impl EarshotEstimator {
    pub fn from_config(cfg: &SegmenterConfig) -> Self {
        // A high start threshold signals the caller wants fewer false phrase
        // openings, which maps to the more aggressive earshot profiles.
        let profile = match cfg.start_threshold {
            t if t >= 0.8 => VoiceActivityProfile::VERY_AGGRESSIVE,
            t if t >= 0.6 => VoiceActivityProfile::AGGRESSIVE,
            t if t >= 0.4 => VoiceActivityProfile::LBR,
            _ => VoiceActivityProfile::QUALITY,
        };
        // Earshot only accepts 10/20/30 ms frames at 16 kHz.
        let frame_ms = cfg.window_ms().clamp(10, 30) as usize;
        let frame_samples = ((cfg.sample_rate as usize) * frame_ms) / 1000;
        Self {
            detector: VoiceActivityDetector::new(profile),
            frame_samples: frame_samples.max(160),
            scratch: Vec::new(),
        }
    }
}

impl SpeechEstimator for EarshotEstimator {
    fn probability(&mut self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        self.scratch.clear();
        self.scratch.extend(
            samples
                .iter()
                .map(|sample| (sample.clamp(-1.0, 1.0) * 32_768.0) as i16),
        );
        // Pad short windows and truncate long ones to the detector's frame.
        self.scratch.resize(self.frame_samples, 0);
        match self.detector.predict_16khz(&self.scratch) {
            Ok(true) => 1.0,
            Ok(false) => 0.0,
            Err(_) => 0.0,
        }
    }

    fn reset(&mut self) {
        self.detector.reset();
    }

    fn name(&self) -> &'static str {
        "earshot_estimator"
    }
}
