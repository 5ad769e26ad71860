use super::{default_estimator, AppConfig, EstimatorKind};
use clap::Parser;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[test]
fn accepts_valid_defaults() {
    let mut cfg = AppConfig::parse_from(["test-app"]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_sample_rate_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--sample-rate", "4000"]);
    assert!(cfg.validate().is_err());
    let mut cfg = AppConfig::parse_from(["test-app", "--sample-rate", "96001"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn accepts_sample_rate_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--sample-rate", "8000"]);
    assert!(cfg.validate().is_ok());
    let mut cfg = AppConfig::parse_from(["test-app", "--sample-rate", "96000"]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_window_samples_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--window-samples", "63"]);
    assert!(cfg.validate().is_err());
    let mut cfg = AppConfig::parse_from(["test-app", "--window-samples", "8193"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_start_threshold_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--start-threshold=-0.1"]);
    assert!(cfg.validate().is_err());
    let mut cfg = AppConfig::parse_from(["test-app", "--start-threshold", "1.1"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_continue_threshold_above_start() {
    let mut cfg = AppConfig::parse_from([
        "test-app",
        "--start-threshold",
        "0.4",
        "--continue-threshold",
        "0.6",
    ]);
    assert!(cfg.validate().is_err());
}

#[test]
fn accepts_continue_threshold_equal_to_start() {
    let mut cfg = AppConfig::parse_from([
        "test-app",
        "--start-threshold",
        "0.6",
        "--continue-threshold",
        "0.6",
    ]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_end_silence_windows_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--end-silence-windows", "0"]);
    assert!(cfg.validate().is_err());
    let mut cfg = AppConfig::parse_from(["test-app", "--end-silence-windows", "257"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_min_phrase_above_max() {
    let mut cfg = AppConfig::parse_from(["test-app", "--min-phrase-ms", "60001"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_channel_capacity_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--channel-capacity", "4"]);
    assert!(cfg.validate().is_err());
    let mut cfg = AppConfig::parse_from(["test-app", "--channel-capacity", "1025"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn accepts_channel_capacity_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--channel-capacity", "8"]);
    assert!(cfg.validate().is_ok());
    let mut cfg = AppConfig::parse_from(["test-app", "--channel-capacity", "1024"]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_queue_capacity_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--queue-capacity", "0"]);
    assert!(cfg.validate().is_err());
    let mut cfg = AppConfig::parse_from(["test-app", "--queue-capacity", "65"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_amplitude_threshold_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--amplitude-threshold", "1.5"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_smoothing_coefficients_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--attack=-0.1"]);
    assert!(cfg.validate().is_err());
    let mut cfg = AppConfig::parse_from(["test-app", "--release", "1.1"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_gain_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--gain", "0.0"]);
    assert!(cfg.validate().is_err());
    let mut cfg = AppConfig::parse_from(["test-app", "--gain", "11.0"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn estimator_labels_are_stable() {
    assert_eq!(EstimatorKind::Earshot.label(), "earshot");
    assert_eq!(EstimatorKind::Amplitude.label(), "amplitude");
}

#[test]
fn estimator_default_matches_feature() {
    let mut cfg = AppConfig::parse_from(["test-app"]);
    cfg.validate().expect("defaults should be valid");
    assert_eq!(cfg.estimator, default_estimator());
}

#[cfg(feature = "vad_earshot")]
#[test]
fn default_estimator_prefers_earshot_when_feature_enabled() {
    let mut cfg = AppConfig::parse_from(["test-app"]);
    cfg.validate().expect("defaults should be valid");
    assert!(matches!(
        cfg.pipeline_config().estimator,
        EstimatorKind::Earshot
    ));
}

#[cfg(not(feature = "vad_earshot"))]
#[test]
fn default_estimator_prefers_amplitude_when_feature_disabled() {
    let mut cfg = AppConfig::parse_from(["test-app"]);
    cfg.validate().expect("defaults should be valid");
    assert!(matches!(
        cfg.pipeline_config().estimator,
        EstimatorKind::Amplitude
    ));
}

#[cfg(not(feature = "vad_earshot"))]
#[test]
fn rejects_earshot_estimator_without_feature() {
    let mut cfg = AppConfig::parse_from(["test-app", "--estimator", "earshot"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn pipeline_config_snapshots_cli_values() {
    let mut cfg = AppConfig::parse_from([
        "test-app",
        "--sample-rate",
        "32000",
        "--window-samples",
        "1024",
        "--start-threshold",
        "0.7",
        "--continue-threshold",
        "0.6",
        "--end-silence-windows",
        "24",
        "--min-phrase-ms",
        "300",
        "--no-smoothing",
    ]);
    cfg.validate().expect("tuned pipeline should be valid");

    let pipeline = cfg.pipeline_config();
    assert_eq!(pipeline.sample_rate, 32_000);
    assert_eq!(pipeline.window_samples, 1_024);
    assert_eq!(pipeline.start_threshold, 0.7);
    assert_eq!(pipeline.continue_threshold, 0.6);
    assert!(!pipeline.smoothing);

    let segmenter = pipeline.segmenter_config();
    assert_eq!(segmenter.end_silence_windows, 24);
    assert_eq!(segmenter.min_phrase_ms, 300);
}

#[test]
fn session_config_reflects_artifact_flags() {
    let mut cfg = AppConfig::parse_from([
        "test-app",
        "--no-artifacts",
        "--debug-capture",
        "--output-dir",
        "clips",
        "--queue-capacity",
        "4",
        "--input-device",
        "USB Mic",
    ]);
    cfg.validate().expect("session flags should be valid");

    let session = cfg.session_config();
    assert!(!session.write_artifacts);
    assert!(session.debug_capture);
    assert_eq!(session.output_dir, PathBuf::from("clips"));
    assert_eq!(session.queue_capacity, 4);
    assert_eq!(session.preferred_device.as_deref(), Some("USB Mic"));
}

#[test]
fn validate_rejects_missing_segment_wav() {
    let missing = env::temp_dir().join("missing_capture.wav");
    let mut cfg = AppConfig::parse_from(["test-app", "--segment-wav", missing.to_str().unwrap()]);
    assert!(cfg.validate().is_err());
}

#[test]
fn validate_canonicalizes_existing_intent_batch() {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let batch_path = env::temp_dir().join(format!("intents_{unique}.json"));
    fs::write(&batch_path, "[]").unwrap();
    let mut cfg =
        AppConfig::parse_from(["test-app", "--run-intents", batch_path.to_str().unwrap()]);
    assert!(cfg.validate().is_ok());
    let canonical = batch_path.canonicalize().unwrap();
    assert_eq!(cfg.run_intents.as_deref(), Some(canonical.as_path()));
    let _ = fs::remove_file(&batch_path);
}
