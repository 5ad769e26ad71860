//! Phrase endpointing state machine.
//!
//! Consumes windows plus speech probabilities in arrival order and cuts the
//! stream into discrete utterances. Two thresholds give hysteresis: a phrase
//! opens when probability clears `start_threshold` and only closes after
//! `end_silence_windows` consecutive windows fall below `continue_threshold`.
//! A momentary dip mid-sentence therefore never truncates speech, while a
//! sustained pause reliably ends it.

use super::assembler::{SampleAssembler, Window};
use super::estimator::SpeechEstimator;
use tracing::debug;

/// Tunable endpointing parameters. All of these trade latency against the
/// risk of cutting a phrase too early, so they stay configuration rather
/// than constants.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    pub sample_rate: u32,
    pub window_samples: usize,
    pub start_threshold: f32,
    pub continue_threshold: f32,
    pub end_silence_windows: u32,
    pub min_phrase_ms: u64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            sample_rate: super::PIPELINE_RATE,
            window_samples: 512,
            start_threshold: 0.5,
            continue_threshold: 0.5,
            end_silence_windows: 16,
            min_phrase_ms: 500,
        }
    }
}

impl SegmenterConfig {
    /// Duration of one window in milliseconds.
    pub fn window_ms(&self) -> u64 {
        (self.window_samples as u64 * 1000) / u64::from(self.sample_rate.max(1))
    }
}

/// Where the segmenter currently is between phrases.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PhraseState {
    Idle,
    InSpeech,
}

/// One finalized phrase: the raw PCM bytes of every window from phrase open
/// through the trailing silence padding, plus duration accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub pcm: Vec<u8>,
    /// Duration of windows classified as speech.
    pub speech_ms: u64,
    /// Full span including trailing padding.
    pub total_ms: u64,
}

/// Explains why a segmentation run ended so metrics can classify sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    StreamEnded,
    ManualStop,
    Disconnected,
    Error(String),
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::StreamEnded => "stream_ended",
            StopReason::ManualStop => "manual_stop",
            StopReason::Disconnected => "disconnected",
            StopReason::Error(_) => "error",
        }
    }
}

/// Counters collected across one segmentation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineMetrics {
    pub chunks_processed: usize,
    pub windows_processed: usize,
    pub utterances_emitted: usize,
    pub utterances_discarded: usize,
    /// Utterances evicted from the handoff queue by newer ones.
    pub utterances_dropped: usize,
    /// Capture-side chunks lost to a saturated feed channel.
    pub chunks_dropped: usize,
    pub stop_reason: StopReason,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            chunks_processed: 0,
            windows_processed: 0,
            utterances_emitted: 0,
            utterances_discarded: 0,
            utterances_dropped: 0,
            chunks_dropped: 0,
            stop_reason: StopReason::StreamEnded,
        }
    }
}

/// The phrase state machine. Strictly causal: each window is classified once,
/// in arrival order, and transitions commit immediately.
pub struct UtteranceSegmenter {
    cfg: SegmenterConfig,
    state: PhraseState,
    buffer: Vec<u8>,
    silence_windows: u32,
    speech_windows: u32,
    windows_processed: usize,
    emitted: usize,
    discarded: usize,
}

impl UtteranceSegmenter {
    pub fn new(cfg: SegmenterConfig) -> Self {
        Self {
            cfg,
            state: PhraseState::Idle,
            buffer: Vec::new(),
            silence_windows: 0,
            speech_windows: 0,
            windows_processed: 0,
            emitted: 0,
            discarded: 0,
        }
    }

    pub fn state(&self) -> PhraseState {
        self.state
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.cfg
    }

    /// Process one window with its speech probability.
    ///
    /// Returns a finalized utterance when this window closes a phrase that
    /// clears the minimum-duration floor.
    pub fn push(&mut self, window: &Window, probability: f32) -> Option<Utterance> {
        self.windows_processed += 1;
        match self.state {
            PhraseState::Idle => {
                if probability >= self.cfg.start_threshold {
                    debug!(probability, "phrase opened");
                    self.state = PhraseState::InSpeech;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(&window.bytes);
                    self.silence_windows = 0;
                    self.speech_windows = 1;
                }
                None
            }
            PhraseState::InSpeech => {
                self.buffer.extend_from_slice(&window.bytes);
                if probability >= self.cfg.continue_threshold {
                    self.silence_windows = 0;
                    self.speech_windows += 1;
                    None
                } else {
                    self.silence_windows += 1;
                    if self.silence_windows >= self.cfg.end_silence_windows {
                        self.state = PhraseState::Idle;
                        self.finalize()
                    } else {
                        None
                    }
                }
            }
        }
    }

    /// Discard any open phrase and return to `Idle`. Called when capture
    /// stops or the device errors; an unfinished phrase is never emitted.
    pub fn reset(&mut self) {
        if self.state == PhraseState::InSpeech {
            debug!(
                buffered_bytes = self.buffer.len(),
                "open phrase discarded on reset"
            );
        }
        self.state = PhraseState::Idle;
        self.buffer.clear();
        self.silence_windows = 0;
        self.speech_windows = 0;
    }

    pub fn windows_processed(&self) -> usize {
        self.windows_processed
    }

    pub fn utterances_emitted(&self) -> usize {
        self.emitted
    }

    pub fn utterances_discarded(&self) -> usize {
        self.discarded
    }

    /// Close the open phrase. The duration floor counts speech windows only;
    /// the mandatory silence padding would otherwise dominate short phrases
    /// and make the floor unreachable.
    fn finalize(&mut self) -> Option<Utterance> {
        let pcm = std::mem::take(&mut self.buffer);
        let speech_windows = std::mem::replace(&mut self.speech_windows, 0);
        self.silence_windows = 0;

        let speech_ms = u64::from(speech_windows) * self.cfg.window_ms();
        let total_ms =
            (pcm.len() as u64 / 2).saturating_mul(1000) / u64::from(self.cfg.sample_rate.max(1));

        if speech_ms < self.cfg.min_phrase_ms {
            debug!(
                speech_ms,
                min_phrase_ms = self.cfg.min_phrase_ms,
                "phrase below minimum duration, discarded"
            );
            self.discarded += 1;
            return None;
        }

        debug!(speech_ms, total_ms, bytes = pcm.len(), "utterance finalized");
        self.emitted += 1;
        Some(Utterance {
            pcm,
            speech_ms,
            total_ms,
        })
    }
}

/// Result of an offline segmentation run.
#[derive(Debug)]
pub struct SegmentRun {
    pub utterances: Vec<Utterance>,
    pub metrics: PipelineMetrics,
}

/// Run the full assembler -> estimator -> segmenter chain over an in-memory
/// byte stream. No threads involved, so tests and the CLI can segment
/// synthetic clips deterministically.
pub fn segment_pcm_bytes(
    bytes: &[u8],
    cfg: &SegmenterConfig,
    estimator: &mut dyn SpeechEstimator,
) -> SegmentRun {
    let mut assembler = SampleAssembler::new(cfg.window_samples);
    let mut segmenter = UtteranceSegmenter::new(cfg.clone());
    let mut utterances = Vec::new();

    for window in assembler.feed_slice(bytes) {
        let probability = estimator.probability(&window.samples);
        if let Some(utterance) = segmenter.push(&window, probability) {
            utterances.push(utterance);
        }
    }
    // A phrase still open at end of stream is unfinished and stays unemitted.
    segmenter.reset();

    let metrics = PipelineMetrics {
        chunks_processed: 1,
        windows_processed: segmenter.windows_processed(),
        utterances_emitted: segmenter.utterances_emitted(),
        utterances_discarded: segmenter.utterances_discarded(),
        stop_reason: StopReason::StreamEnded,
        ..PipelineMetrics::default()
    };

    SegmentRun {
        utterances,
        metrics,
    }
}
