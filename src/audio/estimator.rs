//! Speech probability estimation for fixed-size sample windows.
//!
//! Scores each window with a confidence in [0, 1] that the user is speaking.
//! The segmenter consumes these scores; swapping estimators never touches it.

/// Decision threshold used when an estimator does not supply its own.
pub const DEFAULT_SPEECH_THRESHOLD: f32 = 0.5;

/// RMS level treated as certain speech by the amplitude estimator.
pub const DEFAULT_AMPLITUDE_THRESHOLD: f32 = 0.035;

/// Smoothing coefficient applied while the raw score is rising.
pub const DEFAULT_ATTACK: f32 = 0.85;

/// Smoothing coefficient applied while the raw score is falling.
pub const DEFAULT_RELEASE: f32 = 0.1;

/// Gain applied to the delegate's raw score before smoothing.
pub const DEFAULT_GAIN: f32 = 1.5;

/// Scores one window of normalized samples.
///
/// # Frame Size Contract
/// Implementations may require a specific window length (neural detectors
/// usually do). Callers must feed windows of the length the estimator was
/// configured for; estimators score a mismatched window as 0.0 rather than
/// panicking.
///
/// `Send` because the capture worker owns its estimator for the lifetime of
/// a session.
pub trait SpeechEstimator: Send {
    /// Speech confidence for one window, in [0.0, 1.0].
    fn probability(&mut self, samples: &[f32]) -> f32;

    /// Threshold the default `is_speech` compares against.
    fn threshold(&self) -> f32 {
        DEFAULT_SPEECH_THRESHOLD
    }

    fn is_speech(&mut self, samples: &[f32]) -> bool {
        self.probability(samples) >= self.threshold()
    }

    /// Clear any internal smoothing or model state.
    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "unknown_estimator"
    }
}

/// Stateless estimator that reads the window's RMS energy as probability.
/// Fallback for builds without a neural detector, and the reference for tests
/// because its output is exactly computable.
#[derive(Debug, Clone)]
pub struct AmplitudeEstimator {
    threshold: f32,
}

impl AmplitudeEstimator {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Default for AmplitudeEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_AMPLITUDE_THRESHOLD)
    }
}

impl SpeechEstimator for AmplitudeEstimator {
    fn probability(&mut self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
        energy.sqrt().clamp(0.0, 1.0)
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    fn name(&self) -> &'static str {
        "amplitude_estimator"
    }
}

/// Wraps a delegate estimator with asymmetric exponential smoothing.
///
/// Rising raw scores are tracked quickly (attack) while falling scores decay
/// slowly (release), so one glitchy window cannot flip the phrase state but a
/// real pause still registers within a few windows.
pub struct InertialEstimator {
    delegate: Box<dyn SpeechEstimator>,
    attack: f32,
    release: f32,
    gain: f32,
    initial: f32,
    smoothed: f32,
}

impl InertialEstimator {
    pub fn new(delegate: Box<dyn SpeechEstimator>) -> Self {
        Self::with_coefficients(delegate, DEFAULT_ATTACK, DEFAULT_RELEASE, DEFAULT_GAIN, 0.0)
    }

    pub fn with_coefficients(
        delegate: Box<dyn SpeechEstimator>,
        attack: f32,
        release: f32,
        gain: f32,
        initial: f32,
    ) -> Self {
        Self {
            delegate,
            attack: attack.clamp(0.0, 1.0),
            release: release.clamp(0.0, 1.0),
            gain,
            initial,
            smoothed: initial,
        }
    }
}

impl SpeechEstimator for InertialEstimator {
    fn probability(&mut self, samples: &[f32]) -> f32 {
        let raw = (self.delegate.probability(samples) * self.gain).clamp(0.0, 1.0);
        let alpha = if raw > self.smoothed {
            self.attack
        } else {
            self.release
        };
        self.smoothed += alpha * (raw - self.smoothed);
        self.smoothed
    }

    fn threshold(&self) -> f32 {
        self.delegate.threshold()
    }

    fn reset(&mut self) {
        self.smoothed = self.initial;
        self.delegate.reset();
    }

    fn name(&self) -> &'static str {
        "inertial_estimator"
    }
}
