use super::dispatch::{append_downmixed_samples, ChunkDispatcher};
use super::resample::{
    basic_resample, design_low_pass, downsampling_tap_count, low_pass_fir, resample_linear,
    resample_to_rate, MAX_DEVICE_RATE, MAX_RESAMPLE_RATIO, MIN_DEVICE_RATE, MIN_RESAMPLE_RATIO,
};
use super::{
    segment_pcm_bytes, to_pcm_bytes, wav, AmplitudeEstimator, CaptureConfig, InertialEstimator,
    PhraseState, Recorder, SampleAssembler, SegmenterConfig, SpeechEstimator, StopReason,
    UtteranceSegmenter, Window, PIPELINE_RATE,
};
use crossbeam_channel::bounded;
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[cfg(feature = "high-quality-audio")]
use super::resample::resample_with_rubato;

const WINDOW_SAMPLES: usize = 512;
const WINDOW_BYTES: usize = WINDOW_SAMPLES * 2;

/// Estimator that replays a fixed script of probabilities, one per window.
struct ScriptedEstimator {
    scores: VecDeque<f32>,
}

impl ScriptedEstimator {
    fn new(scores: &[f32]) -> Self {
        Self {
            scores: scores.iter().copied().collect(),
        }
    }
}

impl SpeechEstimator for ScriptedEstimator {
    fn probability(&mut self, _samples: &[f32]) -> f32 {
        self.scores.pop_front().unwrap_or(0.0)
    }

    fn reset(&mut self) {}
}

fn test_config(min_phrase_ms: u64) -> SegmenterConfig {
    SegmenterConfig {
        sample_rate: PIPELINE_RATE,
        window_samples: WINDOW_SAMPLES,
        start_threshold: 0.5,
        continue_threshold: 0.5,
        end_silence_windows: 16,
        min_phrase_ms,
    }
}

/// A window whose bytes all carry `tag`, so emitted PCM can be checked for
/// ordering and completeness without decoding audio.
fn tagged_window(tag: u8) -> Window {
    Window {
        samples: vec![0.0; WINDOW_SAMPLES],
        bytes: vec![tag; WINDOW_BYTES],
    }
}

/// Sine at `freq` Hz for `windows` whole windows. 1 kHz fits 32 full cycles
/// in one 512-sample window at 16 kHz, so every window has identical RMS.
fn sine_samples(freq: f32, amplitude: f32, windows: usize) -> Vec<f32> {
    (0..windows * WINDOW_SAMPLES)
        .map(|n| amplitude * (2.0 * PI * freq * n as f32 / PIPELINE_RATE as f32).sin())
        .collect()
}

fn silence_samples(windows: usize) -> Vec<f32> {
    vec![0.0; windows * WINDOW_SAMPLES]
}

#[test]
fn downmixes_multi_channel_audio() {
    let mut buf = Vec::new();
    let samples = [1.0f32, -1.0, 0.5, 0.5];
    append_downmixed_samples(&mut buf, &samples, 2, |sample| sample);
    assert_eq!(buf, vec![0.0, 0.5]);
}

#[test]
fn downmix_averages_partial_trailing_frame() {
    let mut buf = Vec::new();
    let samples = [2.0f32, 4.0, 6.0, 8.0, 10.0];
    append_downmixed_samples(&mut buf, &samples, 3, |sample| sample);
    assert_eq!(buf, vec![4.0, 9.0]);
}

#[test]
fn preserves_single_channel_audio() {
    let mut buf = Vec::new();
    let samples = [0.1f32, 0.2, 0.3];
    append_downmixed_samples(&mut buf, &samples, 1, |sample| sample);
    assert_eq!(buf, samples);
}

#[test]
fn chunk_dispatcher_emits_chunks_and_tracks_drops() {
    let (tx, rx) = bounded::<Vec<f32>>(1);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = ChunkDispatcher::new(2, tx, dropped.clone());

    dispatcher.push(&[1.0f32, 2.0, 3.0, 4.0], 1, |sample| sample);

    let chunk = rx.try_recv().expect("missing chunk");
    assert_eq!(chunk, vec![1.0, 2.0]);
    assert_eq!(dropped.load(Ordering::Relaxed), 1);
}

#[test]
fn chunk_dispatcher_accumulates_partial_chunks() {
    let (tx, rx) = bounded::<Vec<f32>>(1);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = ChunkDispatcher::new(3, tx, dropped);

    dispatcher.push(&[1.0f32, 2.0], 1, |sample| sample);
    assert!(rx.try_recv().is_err());

    dispatcher.push(&[3.0f32, 4.0], 1, |sample| sample);
    let chunk = rx.try_recv().expect("missing chunk");
    assert_eq!(chunk, vec![1.0, 2.0, 3.0]);
}

#[test]
fn chunk_dispatcher_flush_sends_partial_tail() {
    let (tx, rx) = bounded::<Vec<f32>>(2);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = ChunkDispatcher::new(4, tx, dropped);

    dispatcher.push(&[1.0f32, 2.0, 3.0], 1, |sample| sample);
    assert!(rx.try_recv().is_err());

    dispatcher.flush();
    let tail = rx.try_recv().expect("missing flushed tail");
    assert_eq!(tail, vec![1.0, 2.0, 3.0]);

    dispatcher.flush();
    assert!(rx.try_recv().is_err());
}

#[test]
fn byte_stream_split_points_do_not_change_windows() {
    let samples = sine_samples(1_000.0, 0.4, 3);
    let bytes = to_pcm_bytes(&samples);

    let mut whole = SampleAssembler::new(WINDOW_SAMPLES);
    let expected = whole.feed_slice(&bytes);

    let mut chunked = SampleAssembler::new(WINDOW_SAMPLES);
    let mut actual = Vec::new();
    for chunk in bytes.chunks(7) {
        actual.extend(chunked.feed_slice(chunk));
    }

    assert_eq!(expected.len(), 3);
    assert_eq!(actual, expected);
}

#[test]
fn segmenter_emits_phrase_with_trailing_padding() {
    let mut segmenter = UtteranceSegmenter::new(test_config(64));
    let mut emitted = None;

    for tag in 1..=3u8 {
        assert!(segmenter.push(&tagged_window(tag), 0.9).is_none());
    }
    for tag in 4..=19u8 {
        let result = segmenter.push(&tagged_window(tag), 0.1);
        if tag < 19 {
            assert!(result.is_none(), "phrase closed early at window {tag}");
        } else {
            emitted = result;
        }
    }

    let utterance = emitted.expect("phrase should close after 16 silence windows");
    assert_eq!(utterance.pcm.len(), 19 * WINDOW_BYTES);
    assert_eq!(utterance.speech_ms, 3 * 32);
    assert_eq!(utterance.total_ms, 608);
    assert_eq!(&utterance.pcm[..WINDOW_BYTES], &vec![1u8; WINDOW_BYTES][..]);
    assert_eq!(
        &utterance.pcm[18 * WINDOW_BYTES..],
        &vec![19u8; WINDOW_BYTES][..]
    );
    assert_eq!(segmenter.state(), PhraseState::Idle);
}

#[test]
fn segmenter_discards_short_phrase_by_default() {
    let mut segmenter = UtteranceSegmenter::new(SegmenterConfig::default());

    for _ in 0..3 {
        assert!(segmenter.push(&tagged_window(0), 0.9).is_none());
    }
    for _ in 0..16 {
        assert!(segmenter.push(&tagged_window(0), 0.1).is_none());
    }

    assert_eq!(segmenter.utterances_emitted(), 0);
    assert_eq!(segmenter.utterances_discarded(), 1);
    assert_eq!(segmenter.state(), PhraseState::Idle);
}

#[test]
fn segmenter_counts_speech_windows_toward_duration() {
    let mut segmenter = UtteranceSegmenter::new(SegmenterConfig::default());
    let mut emitted = None;

    for _ in 0..16 {
        assert!(segmenter.push(&tagged_window(0), 0.9).is_none());
    }
    for _ in 0..16 {
        if let Some(utterance) = segmenter.push(&tagged_window(0), 0.1) {
            emitted = Some(utterance);
        }
    }

    // 16 speech windows are 512 ms, which clears the 500 ms floor even though
    // the trailing padding never counts.
    let utterance = emitted.expect("16 speech windows should clear the floor");
    assert_eq!(utterance.speech_ms, 512);
    assert_eq!(utterance.pcm.len(), 32 * WINDOW_BYTES);
}

#[test]
fn mid_phrase_dip_does_not_truncate() {
    let mut segmenter = UtteranceSegmenter::new(test_config(64));
    let mut utterances = Vec::new();

    let mut feed = |segmenter: &mut UtteranceSegmenter, p: f32| {
        if let Some(utterance) = segmenter.push(&tagged_window(0), p) {
            utterances.push(utterance);
        }
    };

    feed(&mut segmenter, 0.9);
    for _ in 0..15 {
        feed(&mut segmenter, 0.1);
    }
    // One window short of closing; speech resumes and resets the counter.
    feed(&mut segmenter, 0.9);
    for _ in 0..16 {
        feed(&mut segmenter, 0.1);
    }

    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].pcm.len(), 33 * WINDOW_BYTES);
    assert_eq!(utterances[0].speech_ms, 2 * 32);
}

#[test]
fn segmenter_reset_discards_open_phrase() {
    let mut segmenter = UtteranceSegmenter::new(test_config(0));

    assert!(segmenter.push(&tagged_window(1), 0.9).is_none());
    assert!(segmenter.push(&tagged_window(2), 0.9).is_none());
    assert_eq!(segmenter.state(), PhraseState::InSpeech);

    segmenter.reset();
    assert_eq!(segmenter.state(), PhraseState::Idle);

    for _ in 0..16 {
        assert!(segmenter.push(&tagged_window(3), 0.1).is_none());
    }
    assert_eq!(segmenter.utterances_emitted(), 0);
    assert_eq!(segmenter.windows_processed(), 18);
}

#[test]
fn probabilities_below_start_never_open_a_phrase() {
    let mut segmenter = UtteranceSegmenter::new(test_config(0));
    for _ in 0..10 {
        assert!(segmenter.push(&tagged_window(0), 0.49).is_none());
    }
    assert_eq!(segmenter.state(), PhraseState::Idle);
    assert_eq!(segmenter.utterances_emitted(), 0);
    assert_eq!(segmenter.utterances_discarded(), 0);
}

#[test]
fn stop_reason_labels_are_stable() {
    assert_eq!(StopReason::StreamEnded.label(), "stream_ended");
    assert_eq!(StopReason::ManualStop.label(), "manual_stop");
    assert_eq!(StopReason::Disconnected.label(), "disconnected");
    assert_eq!(StopReason::Error("x".into()).label(), "error");
}

#[test]
fn offline_segmentation_emits_expected_utterance() {
    let mut samples = sine_samples(1_000.0, 0.5, 8);
    samples.extend(silence_samples(20));
    let bytes = to_pcm_bytes(&samples);

    let cfg = SegmenterConfig {
        start_threshold: 0.3,
        continue_threshold: 0.3,
        min_phrase_ms: 64,
        ..SegmenterConfig::default()
    };
    let mut estimator = AmplitudeEstimator::default();
    let run = segment_pcm_bytes(&bytes, &cfg, &mut estimator);

    assert_eq!(run.utterances.len(), 1);
    assert_eq!(run.utterances[0].pcm.len(), 24 * WINDOW_BYTES);
    assert_eq!(run.metrics.windows_processed, 28);
    assert_eq!(run.metrics.utterances_emitted, 1);
    assert_eq!(run.metrics.utterances_discarded, 0);
    assert_eq!(run.metrics.chunks_processed, 1);
    assert_eq!(run.metrics.stop_reason, StopReason::StreamEnded);
}

#[test]
fn offline_segmentation_without_speech_emits_nothing() {
    let bytes = to_pcm_bytes(&silence_samples(20));
    let cfg = SegmenterConfig::default();
    let mut estimator = AmplitudeEstimator::default();
    let run = segment_pcm_bytes(&bytes, &cfg, &mut estimator);

    assert!(run.utterances.is_empty());
    assert_eq!(run.metrics.windows_processed, 20);
    assert_eq!(run.metrics.utterances_emitted, 0);
    assert_eq!(run.metrics.utterances_discarded, 0);
}

#[test]
fn inertial_smoothing_survives_one_glitchy_window() {
    let mut samples = sine_samples(1_000.0, 0.5, 4);
    samples.extend(silence_samples(1));
    samples.extend(sine_samples(1_000.0, 0.5, 4));
    samples.extend(silence_samples(20));
    let bytes = to_pcm_bytes(&samples);

    let cfg = test_config(64);
    // Full attack makes the rise deterministic; the slow release keeps the
    // dropout window from closing the phrase on its own.
    let mut estimator = InertialEstimator::with_coefficients(
        Box::new(AmplitudeEstimator::default()),
        1.0,
        0.1,
        1.5,
        0.0,
    );
    let run = segment_pcm_bytes(&bytes, &cfg, &mut estimator);

    assert_eq!(run.utterances.len(), 1, "dropout must not split the phrase");
    assert_eq!(run.utterances[0].pcm.len(), 25 * WINDOW_BYTES);
    assert_eq!(run.metrics.utterances_discarded, 0);
}

#[test]
fn scripted_segmentation_is_deterministic() {
    let mut scores = vec![0.9f32; 3];
    scores.extend(vec![0.1f32; 16]);
    let bytes = to_pcm_bytes(&silence_samples(19));

    let cfg = test_config(64);
    let mut estimator = ScriptedEstimator::new(&scores);
    let run = segment_pcm_bytes(&bytes, &cfg, &mut estimator);

    assert_eq!(run.utterances.len(), 1);
    assert_eq!(run.utterances[0].pcm.len(), 19 * WINDOW_BYTES);
    assert_eq!(run.utterances[0].speech_ms, 96);
}

#[test]
fn utterance_wav_on_disk_decodes_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pcm: Vec<u8> = (0..=255u8).cycle().take(4 * WINDOW_BYTES).collect();
    let format = wav::WavFormat::pipeline();

    let path = wav::write_utterance(dir.path(), &pcm, format).expect("write utterance");
    let name = path.file_name().and_then(|n| n.to_str()).expect("file name");
    assert!(name.starts_with("utterance_"), "unexpected name {name}");
    assert!(name.ends_with(".wav"));

    let bytes = std::fs::read(&path).expect("read wav");
    assert_eq!(bytes.len(), wav::HEADER_LEN + pcm.len());
    let (decoded_format, decoded_pcm) = wav::decode(&bytes).expect("decode wav");
    assert_eq!(decoded_format, format);
    assert_eq!(decoded_pcm, pcm);
}

#[test]
fn record_segmented_stub_returns_empty_outcome() {
    let Some(recorder) = Recorder::new_for_tests() else {
        eprintln!("skipping record_segmented_stub_returns_empty_outcome: no input device");
        return;
    };

    let cfg = CaptureConfig::default();
    let mut estimator = AmplitudeEstimator::default();
    let stop = Arc::new(AtomicBool::new(false));
    let mut seen = 0usize;
    let outcome = recorder
        .record_segmented(&cfg, &mut estimator, stop, None, &mut |_| seen += 1)
        .expect("stub should produce an outcome");
    assert_eq!(seen, 0);
    assert_eq!(outcome.metrics.windows_processed, 0);
    assert!(outcome.session_pcm.is_none());
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn resample_bounds_match_constants() {
    assert_eq!(MIN_DEVICE_RATE, 2_000);
    assert_eq!(MAX_DEVICE_RATE, 1_600_000);
    assert!(MIN_DEVICE_RATE < MAX_DEVICE_RATE);
    assert!((MIN_RESAMPLE_RATIO - 0.01).abs() < 1e-6);
    assert!((MAX_RESAMPLE_RATIO - 8.0).abs() < 1e-6);
}

#[test]
fn resample_to_rate_returns_input_when_rates_match() {
    let input = vec![0.1f32, 0.2, 0.3];
    let output = resample_to_rate(&input, PIPELINE_RATE, PIPELINE_RATE);
    assert_eq!(output, input);
}

#[test]
fn resample_to_rate_returns_empty_for_empty_input() {
    let input: Vec<f32> = Vec::new();
    let output = resample_to_rate(&input, 48_000, PIPELINE_RATE);
    assert!(output.is_empty());
}

#[cfg(not(feature = "high-quality-audio"))]
#[test]
fn resample_to_rate_adjusts_length() {
    let input = vec![0.0, 1.0, 0.5, -0.5, -1.0, 0.0];
    let result = resample_to_rate(&input, 48_000, PIPELINE_RATE);
    assert!(result.len() < input.len());
}

#[cfg(feature = "high-quality-audio")]
#[test]
fn rubato_output_length_matches_ratio() {
    let input: Vec<f32> = (0..960).map(|i| (i as f32 * 0.01).sin()).collect();
    let result = resample_to_rate(&input, 48_000, PIPELINE_RATE);
    let expected = (input.len() as f64 * f64::from(PIPELINE_RATE) / 48_000f64).round() as usize + 8;
    assert_eq!(result.len(), expected);
}

#[cfg(feature = "high-quality-audio")]
#[test]
fn rubato_handles_upsample() {
    let input: Vec<f32> = (0..160).map(|i| (i as f32 * 0.05).cos()).collect();
    let result = resample_to_rate(&input, 8_000, PIPELINE_RATE);
    let expected = (input.len() as f64 * f64::from(PIPELINE_RATE) / 8_000f64).round() as usize + 8;
    assert_eq!(result.len(), expected);
}

#[cfg(feature = "high-quality-audio")]
#[test]
fn rubato_rejects_out_of_bounds_rates() {
    let input = vec![0.1f32; 64];

    let err = resample_with_rubato(&input, MIN_DEVICE_RATE - 1, PIPELINE_RATE)
        .expect_err("expected error for low device rate");
    assert!(err.to_string().contains("unsupported device sample rate"));

    let err = resample_with_rubato(&input, MAX_DEVICE_RATE + 1, PIPELINE_RATE)
        .expect_err("expected error for high device rate");
    assert!(err.to_string().contains("unsupported device sample rate"));

    let err = resample_with_rubato(&input, 100_000, 100)
        .expect_err("expected error for tiny target rate");
    assert!(err.to_string().contains("invalid resample ratio"));
}

#[cfg(feature = "high-quality-audio")]
#[test]
fn rubato_suppresses_aliasing_energy() {
    let signal = multi_tone_signal(&[(6_000.0, 1.0), (12_000.0, 1.0)], 48_000, 0.1);
    let resampled = resample_to_rate(&signal, 48_000, PIPELINE_RATE);
    let wanted = goertzel_power(&resampled, PIPELINE_RATE, 6_000.0);
    let alias = goertzel_power(&resampled, PIPELINE_RATE, 4_000.0);
    assert!(wanted > 0.1, "wanted tone vanished (power={wanted})");
    assert!(
        alias < 0.02 * wanted,
        "alias not suppressed enough (wanted={wanted}, alias={alias})"
    );
}

#[cfg(not(feature = "high-quality-audio"))]
#[test]
fn fir_resampler_reduces_alias_vs_naive() {
    let signal = multi_tone_signal(&[(6_000.0, 1.0), (12_000.0, 1.0)], 48_000, 0.1);
    let filtered = resample_to_rate(&signal, 48_000, PIPELINE_RATE);
    let ratio = PIPELINE_RATE as f32 / 48_000f32;
    let naive = resample_linear(&signal, ratio);
    let alias_filtered = goertzel_power(&filtered, PIPELINE_RATE, 4_000.0);
    let alias_naive = goertzel_power(&naive, PIPELINE_RATE, 4_000.0);
    assert!(
        alias_filtered < alias_naive * 0.6,
        "FIR path failed to reduce aliasing (filtered={alias_filtered}, naive={alias_naive})"
    );
}

#[test]
fn resample_linear_interpolates_expected_values() {
    let input = vec![0.0f32, 1.0];
    let output = resample_linear(&input, 2.0);
    assert_eq!(output, vec![0.0, 0.5, 1.0, 1.0]);
}

#[test]
fn basic_resample_is_identity_at_equal_rates() {
    let input = vec![0.2f32, -0.2, 0.4];
    let output = basic_resample(&input, PIPELINE_RATE, PIPELINE_RATE);
    assert_eq!(output, input);
}

#[test]
fn basic_resample_rejects_out_of_bounds_rates() {
    let input = vec![0.2f32; 32];
    let low = basic_resample(&input, MIN_DEVICE_RATE - 1, PIPELINE_RATE);
    assert_eq!(low, input);
    let high = basic_resample(&input, MAX_DEVICE_RATE + 1, PIPELINE_RATE);
    assert_eq!(high, input);
}

#[test]
fn basic_resample_accepts_boundary_rates() {
    let input = vec![0.2f32; 100];
    let low = basic_resample(&input, MIN_DEVICE_RATE, PIPELINE_RATE);
    let expected_low =
        (input.len() as f32 * (PIPELINE_RATE as f32 / MIN_DEVICE_RATE as f32)).round() as usize;
    assert_eq!(low.len(), expected_low);

    let high = basic_resample(&input, MAX_DEVICE_RATE, PIPELINE_RATE);
    let expected_high =
        (input.len() as f32 * (PIPELINE_RATE as f32 / MAX_DEVICE_RATE as f32)).round() as usize;
    assert_eq!(high.len(), expected_high);
}

#[test]
fn basic_resample_upsample_matches_linear() {
    let input = vec![0.0f32, 1.0, 0.0, -1.0, 0.5, -0.5, 0.25, -0.25];
    let ratio = PIPELINE_RATE as f32 / 8_000f32;
    let expected = resample_linear(&input, ratio);
    let output = basic_resample(&input, 8_000, PIPELINE_RATE);
    assert_eq!(output, expected);
}

#[test]
fn basic_resample_downsample_filters_high_freq() {
    let input: Vec<f32> = (0usize..64)
        .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
        .collect();
    let ratio = PIPELINE_RATE as f32 / 48_000f32;
    let naive = resample_linear(&input, ratio);
    let output = basic_resample(&input, 48_000, PIPELINE_RATE);
    assert_eq!(output.len(), naive.len());
    let max_diff = output
        .iter()
        .zip(naive.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f32::max);
    assert!(max_diff > 0.01);
}

#[test]
fn downsampling_tap_count_is_odd_and_scaled() {
    assert_eq!(downsampling_tap_count(16_000, PIPELINE_RATE), 11);
    assert_eq!(downsampling_tap_count(48_000, PIPELINE_RATE), 13);
    assert_eq!(downsampling_tap_count(96_000, PIPELINE_RATE), 25);
}

#[test]
fn design_low_pass_coeffs_are_normalized() {
    let coeffs = design_low_pass(0.1, 11);
    let sum: f32 = coeffs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-3);
    assert!((coeffs[0] - coeffs[10]).abs() < 1e-6);
}

#[test]
fn design_low_pass_single_tap_normalized() {
    let coeffs = design_low_pass(0.25, 1);
    assert_eq!(coeffs.len(), 1);
    assert!((coeffs[0] - 1.0).abs() < 1e-6);
}

#[test]
fn design_low_pass_matches_reference() {
    let actual = design_low_pass(0.2, 7);
    let reference = reference_low_pass(0.2, 7);
    for (a, b) in actual.iter().zip(reference.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn low_pass_fir_preserves_dc_component() {
    let input = vec![1.0f32; 64];
    let output = low_pass_fir(&input, 48_000, PIPELINE_RATE, 11);
    let avg: f32 = output.iter().sum::<f32>() / output.len() as f32;
    assert!(avg > 0.8 && avg < 1.2);
}

#[test]
fn low_pass_fir_returns_input_for_short_taps() {
    let input = vec![0.2f32, -0.1];
    let output = low_pass_fir(&input, 48_000, PIPELINE_RATE, 1);
    assert_eq!(output, input);
}

fn multi_tone_signal(tones: &[(f32, f32)], sample_rate: u32, seconds: f32) -> Vec<f32> {
    let total_samples = (sample_rate as f32 * seconds) as usize;
    (0..total_samples)
        .map(|n| {
            tones.iter().fold(0.0, |acc, (freq, amp)| {
                acc + amp * (2.0 * PI * freq * n as f32 / sample_rate as f32).sin()
            })
        })
        .collect()
}

fn goertzel_power(samples: &[f32], sample_rate: u32, target_hz: f32) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let len = samples.len() as f32;
    let normalized_freq = target_hz / sample_rate as f32;
    let omega = 2.0 * PI * normalized_freq;
    let coeff = 2.0 * omega.cos();
    let mut q1 = 0.0;
    let mut q2 = 0.0;
    for &sample in samples {
        let q0 = coeff * q1 - q2 + sample;
        q2 = q1;
        q1 = q0;
    }
    let power = q1 * q1 + q2 * q2 - coeff * q1 * q2;
    (power / len).max(0.0)
}

fn reference_low_pass(normalized_cutoff: f32, taps: usize) -> Vec<f32> {
    let mut coeffs = Vec::with_capacity(taps);
    let m = (taps - 1) as f64;
    let cutoff = normalized_cutoff as f64;

    for n in 0..taps {
        let centered = n as f64 - m / 2.0;
        let x = 2.0 * std::f64::consts::PI * cutoff * centered;
        let sinc = if centered == 0.0 {
            2.0 * cutoff
        } else {
            (2.0 * cutoff * x.sin()) / x
        };
        let window = if taps <= 1 {
            1.0
        } else {
            0.54 - 0.46 * ((2.0 * std::f64::consts::PI * n as f64) / m).cos()
        };
        coeffs.push((sinc * window) as f32);
    }

    let sum: f64 = coeffs.iter().map(|c| *c as f64).sum();
    if sum != 0.0 {
        for coeff in coeffs.iter_mut() {
            *coeff = (*coeff as f64 / sum) as f32;
        }
    }

    coeffs
}
