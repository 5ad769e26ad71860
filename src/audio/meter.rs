use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Most recent speech probability, shared lock-free with a UI meter.
///
/// The feed worker publishes after every window; readers poll at whatever
/// cadence they like.
#[derive(Clone, Debug)]
pub struct SpeechLevel {
    probability_bits: Arc<AtomicU32>,
}

impl SpeechLevel {
    pub fn new() -> Self {
        Self {
            probability_bits: Arc::new(AtomicU32::new(0.0f32.to_bits())),
        }
    }

    pub fn set(&self, probability: f32) {
        self.probability_bits
            .store(probability.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.probability_bits.load(Ordering::Relaxed))
    }
}

impl Default for SpeechLevel {
    fn default() -> Self {
        Self::new()
    }
}
