use std::f32::consts::PI;

#[cfg(not(feature = "vad_earshot"))]
use anyhow::bail;
use anyhow::Result;
use clap::Parser;
use voxide::audio::{
    segment_pcm_bytes, to_pcm_bytes, DEFAULT_AMPLITUDE_THRESHOLD, DEFAULT_ATTACK, DEFAULT_GAIN,
    DEFAULT_RELEASE,
};
use voxide::config::{
    default_estimator, EstimatorKind, PipelineConfig, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_CONTINUE_THRESHOLD, DEFAULT_END_SILENCE_WINDOWS, DEFAULT_MIN_PHRASE_MS,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SAMPLE_RATE, DEFAULT_START_THRESHOLD, DEFAULT_WINDOW_SAMPLES,
};

/// Synthetic benchmark harness for the endpointing chain.
#[derive(Debug, Parser)]
#[command(about = "Benchmark the utterance segmenter with synthetic clips")]
struct Args {
    /// Human-friendly label recorded in the output metrics
    #[arg(long, default_value = "clip")]
    label: String,

    /// Duration of the synthetic speech segment (milliseconds)
    #[arg(long, default_value_t = 1_000)]
    speech_ms: u64,

    /// Duration of trailing silence appended after speech (milliseconds)
    #[arg(long, default_value_t = 1_000)]
    silence_ms: u64,

    /// Peak amplitude of the synthetic tone
    #[arg(long, default_value_t = 0.8)]
    amplitude: f32,

    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    #[arg(long = "window-samples", default_value_t = DEFAULT_WINDOW_SAMPLES)]
    window_samples: usize,

    #[arg(long = "start-threshold", default_value_t = DEFAULT_START_THRESHOLD)]
    start_threshold: f32,

    #[arg(long = "continue-threshold", default_value_t = DEFAULT_CONTINUE_THRESHOLD)]
    continue_threshold: f32,

    #[arg(long = "end-silence-windows", default_value_t = DEFAULT_END_SILENCE_WINDOWS)]
    end_silence_windows: u32,

    #[arg(long = "min-phrase-ms", default_value_t = DEFAULT_MIN_PHRASE_MS)]
    min_phrase_ms: u64,

    /// Speech estimator implementation to use
    #[arg(long = "estimator", value_enum, default_value_t = default_estimator())]
    estimator: EstimatorKind,

    /// Disable inertial smoothing around the estimator
    #[arg(long = "no-smoothing")]
    no_smoothing: bool,

    /// RMS threshold for the amplitude estimator
    #[arg(long = "amplitude-threshold", default_value_t = DEFAULT_AMPLITUDE_THRESHOLD)]
    amplitude_threshold: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure_estimator_supported(&args)?;
    let clip = synthesize_clip(args.speech_ms, args.silence_ms, args.amplitude, args.sample_rate);
    let pipeline_cfg = build_pipeline_config(&args);
    let seg_cfg = pipeline_cfg.segmenter_config();
    let mut estimator = pipeline_cfg.build_estimator();
    let run = segment_pcm_bytes(&to_pcm_bytes(&clip), &seg_cfg, estimator.as_mut());

    println!(
        "segment_metrics|label={}|windows={}|utterances={}|discarded={}|speech_ms={}|stop={}",
        args.label,
        run.metrics.windows_processed,
        run.metrics.utterances_emitted,
        run.metrics.utterances_discarded,
        run.utterances.iter().map(|u| u.speech_ms).sum::<u64>(),
        run.metrics.stop_reason.label()
    );

    Ok(())
}

fn build_pipeline_config(args: &Args) -> PipelineConfig {
    PipelineConfig {
        sample_rate: args.sample_rate,
        window_samples: args.window_samples,
        start_threshold: args.start_threshold,
        continue_threshold: args.continue_threshold,
        end_silence_windows: args.end_silence_windows,
        min_phrase_ms: args.min_phrase_ms,
        channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        queue_capacity: DEFAULT_QUEUE_CAPACITY,
        estimator: args.estimator,
        smoothing: !args.no_smoothing,
        amplitude_threshold: args.amplitude_threshold,
        attack: DEFAULT_ATTACK,
        release: DEFAULT_RELEASE,
        gain: DEFAULT_GAIN,
    }
}

fn synthesize_clip(speech_ms: u64, silence_ms: u64, amplitude: f32, sample_rate: u32) -> Vec<f32> {
    let mut samples = Vec::new();
    let speech_samples = (speech_ms * sample_rate as u64 / 1000) as usize;
    let silence_samples = (silence_ms * sample_rate as u64 / 1000) as usize;
    for n in 0..speech_samples {
        let t = n as f32 / sample_rate as f32;
        samples.push((2.0 * PI * 440.0 * t).sin() * amplitude);
    }
    samples.extend(std::iter::repeat_n(0.0, silence_samples));
    samples
}

/// Keep the benchmark binary in lockstep with the CLI validation.
#[cfg(not(feature = "vad_earshot"))]
fn ensure_estimator_supported(args: &Args) -> Result<()> {
    if matches!(args.estimator, EstimatorKind::Earshot) {
        bail!("--estimator earshot requires building with the 'vad_earshot' feature");
    }

    Ok(())
}

#[cfg(feature = "vad_earshot")]
fn ensure_estimator_supported(_args: &Args) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn synthetic_clip_length_matches_durations() {
        let clip = synthesize_clip(100, 50, 0.8, 16_000);
        assert_eq!(clip.len(), 1_600 + 800);
    }

    #[test]
    fn default_clip_yields_one_utterance_with_amplitude_estimator() {
        let args =
            Args::try_parse_from(["segment_benchmark", "--estimator", "amplitude"]).unwrap();
        let clip = synthesize_clip(args.speech_ms, args.silence_ms, args.amplitude, args.sample_rate);
        let cfg = build_pipeline_config(&args);
        let mut estimator = cfg.build_estimator();
        let run = segment_pcm_bytes(&to_pcm_bytes(&clip), &cfg.segmenter_config(), estimator.as_mut());

        assert_eq!(run.metrics.utterances_emitted, 1);
        assert_eq!(run.metrics.utterances_discarded, 0);
        assert!(run.utterances[0].speech_ms >= 900);
    }

    #[cfg(not(feature = "vad_earshot"))]
    #[test]
    fn earshot_flag_errors_without_feature() {
        let args = Args::try_parse_from(["segment_benchmark", "--estimator", "earshot"]).unwrap();
        let err = ensure_estimator_supported(&args).unwrap_err();
        assert!(err
            .to_string()
            .contains("requires building with the 'vad_earshot' feature"));
    }

    #[cfg(feature = "vad_earshot")]
    #[test]
    fn earshot_flag_passes_when_feature_enabled() {
        let args = Args::try_parse_from(["segment_benchmark", "--estimator", "earshot"]).unwrap();
        ensure_estimator_supported(&args).expect("earshot feature enabled");
    }
}
