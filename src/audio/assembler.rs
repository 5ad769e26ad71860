//! Reassembles the raw capture byte stream into fixed-size sample windows.
//!
//! The capture side hands over little-endian PCM16 bytes in whatever chunk
//! sizes the device driver produces. Pairing a low byte with its high byte
//! must survive arbitrary chunk boundaries; losing a single byte here shifts
//! every later sample by eight bits and silently corrupts the stream.

/// One completed window: normalized samples plus the exact bytes they came
/// from, so an utterance can be exported without re-encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub samples: Vec<f32>,
    pub bytes: Vec<u8>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Pairs bytes into i16 samples and groups them into windows of a fixed size.
#[derive(Debug)]
pub struct SampleAssembler {
    window_samples: usize,
    pending_low: Option<u8>,
    samples: Vec<f32>,
    bytes: Vec<u8>,
}

impl SampleAssembler {
    pub fn new(window_samples: usize) -> Self {
        let window_samples = window_samples.max(1);
        Self {
            window_samples,
            pending_low: None,
            samples: Vec::with_capacity(window_samples),
            bytes: Vec::with_capacity(window_samples * 2),
        }
    }

    /// Feed one byte. Returns a window once `window_samples` samples have
    /// accumulated, otherwise nothing.
    pub fn feed(&mut self, byte: u8) -> Option<Window> {
        let low = match self.pending_low.take() {
            Some(low) => low,
            None => {
                self.pending_low = Some(byte);
                return None;
            }
        };
        let sample = i16::from_le_bytes([low, byte]);
        self.samples.push(normalize(sample));
        self.bytes.push(low);
        self.bytes.push(byte);

        if self.samples.len() == self.window_samples {
            let samples = std::mem::replace(&mut self.samples, Vec::with_capacity(self.window_samples));
            let bytes = std::mem::replace(&mut self.bytes, Vec::with_capacity(self.window_samples * 2));
            Some(Window { samples, bytes })
        } else {
            None
        }
    }

    /// Feed a chunk of bytes, collecting every window it completes.
    pub fn feed_slice(&mut self, data: &[u8]) -> Vec<Window> {
        let mut windows = Vec::new();
        for byte in data {
            if let Some(window) = self.feed(*byte) {
                windows.push(window);
            }
        }
        windows
    }

    /// Drop any half-built window and any unpaired low byte. Used when capture
    /// stops or the device errors; partial phrases are not recoverable.
    pub fn reset(&mut self) {
        self.pending_low = None;
        self.samples.clear();
        self.bytes.clear();
    }

    /// Samples accumulated toward the next window.
    pub fn pending_samples(&self) -> usize {
        self.samples.len()
    }

    /// True when a low byte is waiting for its high byte.
    pub fn has_pending_byte(&self) -> bool {
        self.pending_low.is_some()
    }

    pub fn window_samples(&self) -> usize {
        self.window_samples
    }
}

/// Normalize an i16 sample into [-1.0, 1.0].
///
/// The positive and negative ranges of i16 are asymmetric (32767 vs 32768),
/// so each side uses its own divisor to keep the result bounded.
pub fn normalize(sample: i16) -> f32 {
    if sample >= 0 {
        f32::from(sample) / 32_767.0
    } else {
        f32::from(sample) / 32_768.0
    }
}

/// Quantize normalized samples into the little-endian PCM16 byte stream the
/// assembler consumes.
pub fn to_pcm_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let quantized = (sample.clamp(-1.0, 1.0) * 32_767.0) as i16;
        bytes.extend_from_slice(&quantized.to_le_bytes());
    }
    bytes
}
