//! Voxide command-line entrypoint.
//!
//! Dispatches between the offline drivers (WAV segmentation, intent batch
//! execution, schema export) and live microphone capture. Live capture prints
//! session events as NDJSON on stdout until the user presses Enter.

mod cli_utils;

use std::fs;
use std::io;
use std::path::Path;
use std::thread;

use anyhow::{bail, Context, Result};
use clap::Parser;

use voxide::audio::wav::{self, WavFormat};
use voxide::audio::{segment_pcm_bytes, PIPELINE_BITS, PIPELINE_CHANNELS};
use voxide::commands::{CommandExecutor, CommandRegistry, EditorHost, InMemoryEditor, Intent};
use voxide::config::AppConfig;
use voxide::{init_tracing, RecordingSession};

use cli_utils::list_input_devices;

fn main() -> Result<()> {
    let mut config = AppConfig::parse();

    if config.list_input_devices {
        list_input_devices()?;
        return Ok(());
    }
    if config.print_schema {
        let registry = CommandRegistry::with_default_commands();
        println!("{}", serde_json::to_string_pretty(&registry.schema())?);
        return Ok(());
    }

    config.validate()?;
    init_tracing(&config);

    if let Some(path) = config.segment_wav.clone() {
        return segment_wav_file(&config, &path);
    }
    if let Some(path) = config.run_intents.clone() {
        return run_intent_batch(&path);
    }

    run_live(&config)
}

/// Run the offline segmentation chain over a WAV file and write each emitted
/// utterance as its own artifact.
fn segment_wav_file(config: &AppConfig, path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let (format, pcm) = wav::decode(&bytes)?;
    if format.channels != PIPELINE_CHANNELS || format.bits_per_sample != PIPELINE_BITS {
        bail!(
            "--segment-wav expects {PIPELINE_BITS}-bit mono PCM, got {} channel(s) at {} bits",
            format.channels,
            format.bits_per_sample
        );
    }

    let pipeline = config.pipeline_config();
    let mut seg_cfg = pipeline.segmenter_config();
    if format.sample_rate != seg_cfg.sample_rate {
        eprintln!(
            "note: segmenting at the file's {} Hz instead of the configured {} Hz",
            format.sample_rate, seg_cfg.sample_rate
        );
        seg_cfg.sample_rate = format.sample_rate;
    }

    let mut estimator = pipeline.build_estimator();
    let run = segment_pcm_bytes(&pcm, &seg_cfg, estimator.as_mut());

    if !config.no_artifacts {
        fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("failed to create output dir {}", config.output_dir.display())
        })?;
    }
    let artifact_format = WavFormat {
        sample_rate: seg_cfg.sample_rate,
        ..WavFormat::pipeline()
    };
    for (index, utterance) in run.utterances.iter().enumerate() {
        let artifact = if config.no_artifacts {
            "-".to_string()
        } else {
            wav::write_utterance(&config.output_dir, &utterance.pcm, artifact_format)?
                .display()
                .to_string()
        };
        println!(
            "utterance|index={index}|speech_ms={}|total_ms={}|artifact={artifact}",
            utterance.speech_ms, utterance.total_ms
        );
    }

    let metrics = &run.metrics;
    println!(
        "segment_metrics|windows={}|utterances={}|discarded={}|stop={}",
        metrics.windows_processed,
        metrics.utterances_emitted,
        metrics.utterances_discarded,
        metrics.stop_reason.label(),
    );
    Ok(())
}

/// Execute a JSON intent batch against the in-memory editor and print what it
/// did to the host. A halted batch exits nonzero after the state dump.
fn run_intent_batch(path: &Path) -> Result<()> {
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let intents: Vec<Intent> = serde_json::from_str(&json)
        .with_context(|| format!("invalid intent batch in {}", path.display()))?;

    let registry = CommandRegistry::with_default_commands();
    let mut executor = CommandExecutor::new();
    let mut host = InMemoryEditor::new();
    let report = executor.execute(&mut host, &registry, &intents);

    for summary in &report.executed {
        println!("executed|{summary}");
    }
    if report.fallbacks > 0 {
        println!("fallbacks|{}", report.fallbacks);
    }
    print_host_state(&host);

    match report.failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

fn print_host_state(host: &InMemoryEditor) {
    let focused = host.focused_file();
    println!("files:");
    if host.known_files().is_empty() {
        println!("  (none)");
    }
    for path in host.known_files() {
        let marker = if focused.as_deref() == Some(path.as_str()) {
            '*'
        } else {
            '-'
        };
        println!("  {marker} {path}: {:?}", host.contents(&path).unwrap_or(""));
    }
    if focused.is_some() {
        let (start, end) = host.selection();
        println!("caret: {} selection: {start}..{end}", host.caret());
    }
    print_list("actions", host.actions_run());
    print_list("scripts", host.scripts_run());
    print_list("notifications", host.notifications());
    if let Some(prompt) = host.pending_generation() {
        println!("pending generation: {prompt:?}");
    }
    print_list("accepted generations", host.accepted_generations());
}

fn print_list(label: &str, entries: &[String]) {
    if entries.is_empty() {
        return;
    }
    println!("{label}:");
    for entry in entries {
        println!("  - {entry}");
    }
}

/// Capture from the microphone until Enter, printing session events as
/// NDJSON on stdout.
fn run_live(config: &AppConfig) -> Result<()> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output dir {}", config.output_dir.display())
    })?;

    let pipeline = config.pipeline_config();
    let mut session = RecordingSession::new(config.session_config());

    let events = session.events();
    let printer = thread::spawn(move || {
        for event in events {
            if let Ok(json) = serde_json::to_string(&event) {
                println!("{json}");
            }
        }
    });
    // The CLI has no recognizer attached; keep the handoff queue drained so
    // its eviction counter stays meaningful.
    let utterances = session.utterances();
    let drainer = thread::spawn(move || for _artifact in utterances {});

    session.start(pipeline.build_estimator())?;
    eprintln!(
        "listening with the {} estimator; artifacts in {}; press Enter to stop",
        pipeline.estimator.label(),
        config.output_dir.display()
    );

    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
    session.stop()?;

    drop(session);
    let _ = printer.join();
    let _ = drainer.join();
    Ok(())
}
