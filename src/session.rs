//! Recording session service.
//!
//! One [`RecordingSession`] is the per-session context object tying the two
//! halves of the pipeline together: a capture worker feeding the segmenter,
//! and the command executor applying recognized intents. Emitted utterances
//! are handed to the consumer through a bounded queue that drops the oldest
//! entry on overflow, so a slow recognizer can never stall capture.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, error, info, warn};

use crate::audio::wav::{self, WavFormat};
use crate::audio::{
    CaptureConfig, PipelineMetrics, Recorder, SpeechEstimator, SpeechLevel, Utterance,
};
use crate::commands::{
    CommandExecutor, CommandHistory, CommandRegistry, EditorHost, ExecutionReport, Intent,
};
use crate::events::{SessionEvent, Stage};

const EVENT_CAPACITY: usize = 256;

/// Callbacks fired on session lifecycle edges. All methods default to
/// no-ops; `on_stop` and `on_error` run on the capture worker thread.
pub trait SessionListener: Send {
    fn on_start(&self) {}
    fn on_stop(&self) {}
    fn on_error(&self, _message: &str) {}
}

/// Session-level knobs on top of the audio capture configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub capture: CaptureConfig,
    pub preferred_device: Option<String>,
    /// Where utterance and debug WAV artifacts land.
    pub output_dir: PathBuf,
    pub write_artifacts: bool,
    /// Keep the whole session's PCM and write it out on stop.
    pub debug_capture: bool,
    /// Capacity of the utterance handoff queue.
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            preferred_device: None,
            output_dir: std::env::temp_dir(),
            write_artifacts: true,
            debug_capture: false,
            queue_capacity: 8,
        }
    }
}

/// One emitted utterance as handed to the recognition consumer: the raw
/// segment, its encoded WAV container, and the on-disk artifact when
/// artifact writing is enabled.
#[derive(Debug, Clone)]
pub struct UtteranceArtifact {
    pub utterance: Utterance,
    pub wav: Vec<u8>,
    pub path: Option<PathBuf>,
}

/// Live capture plus command execution for one logical session.
///
/// `start` and `stop` are compare-and-set guarded: starting while running
/// and stopping while stopped are no-ops. The previous-command undo slot,
/// the registry and the history all live here rather than in any global.
pub struct RecordingSession {
    cfg: SessionConfig,
    running: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
    level: SpeechLevel,
    stage: Arc<Mutex<Stage>>,
    listeners: Arc<Mutex<Vec<Box<dyn SessionListener>>>>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    utterances_tx: Sender<UtteranceArtifact>,
    utterances_rx: Receiver<UtteranceArtifact>,
    queue_dropped: Arc<AtomicUsize>,
    worker: Option<JoinHandle<Option<PipelineMetrics>>>,
    registry: CommandRegistry,
    executor: CommandExecutor,
    history: CommandHistory,
}

impl RecordingSession {
    pub fn new(cfg: SessionConfig) -> Self {
        let (events_tx, events_rx) = bounded(EVENT_CAPACITY);
        let (utterances_tx, utterances_rx) = bounded(cfg.queue_capacity.max(1));
        Self {
            cfg,
            running: Arc::new(AtomicBool::new(false)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            level: SpeechLevel::new(),
            stage: Arc::new(Mutex::new(Stage::Ready)),
            listeners: Arc::new(Mutex::new(Vec::new())),
            events_tx,
            events_rx,
            utterances_tx,
            utterances_rx,
            queue_dropped: Arc::new(AtomicUsize::new(0)),
            worker: None,
            registry: CommandRegistry::with_default_commands(),
            executor: CommandExecutor::new(),
            history: CommandHistory::default(),
        }
    }

    /// Receiver for session events; clones share one queue.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events_rx.clone()
    }

    /// Receiver for emitted utterances.
    pub fn utterances(&self) -> Receiver<UtteranceArtifact> {
        self.utterances_rx.clone()
    }

    /// Shared speech-probability level for a UI meter.
    pub fn level(&self) -> SpeechLevel {
        self.level.clone()
    }

    pub fn stage(&self) -> Stage {
        self.stage.lock().map(|stage| *stage).unwrap_or(Stage::Ready)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn add_listener(&self, listener: Box<dyn SessionListener>) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(listener);
        }
    }

    /// Begins capturing with the given estimator. Returns `Ok(false)` when a
    /// capture is already in flight.
    pub fn start(&mut self, estimator: Box<dyn SpeechEstimator>) -> Result<bool> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("recording session already running");
            return Ok(false);
        }
        // A worker that ended on its own (device disconnect) leaves a
        // finished handle behind; reap it before spawning a new one.
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.stop_flag.store(false, Ordering::SeqCst);
        self.level.set(0.0);

        let recorder = match Recorder::new(self.cfg.preferred_device.as_deref()) {
            Ok(recorder) => recorder,
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };
        info!(device = %recorder.device_name(), "recording session starting");

        self.set_stage(Stage::Listening);
        notify_listeners(&self.listeners, |listener| listener.on_start());

        let mut capture = self.cfg.capture.clone();
        capture.keep_session_pcm = self.cfg.debug_capture;

        let worker = CaptureWorker {
            recorder,
            capture,
            estimator,
            stop_flag: Arc::clone(&self.stop_flag),
            running: Arc::clone(&self.running),
            level: self.level.clone(),
            stage: Arc::clone(&self.stage),
            listeners: Arc::clone(&self.listeners),
            events: self.events_tx.clone(),
            utterances_tx: self.utterances_tx.clone(),
            utterances_rx: self.utterances_rx.clone(),
            queue_dropped: Arc::clone(&self.queue_dropped),
            output_dir: self.cfg.output_dir.clone(),
            write_artifacts: self.cfg.write_artifacts,
            debug_capture: self.cfg.debug_capture,
        };
        self.worker = Some(thread::spawn(move || worker.run()));
        Ok(true)
    }

    /// Signals the capture worker and waits for it to wind down. Returns the
    /// run's metrics, or `None` when nothing was running.
    pub fn stop(&mut self) -> Result<Option<PipelineMetrics>> {
        self.stop_flag.store(true, Ordering::SeqCst);
        let Some(handle) = self.worker.take() else {
            debug!("stop with no capture in flight");
            return Ok(None);
        };
        let metrics = handle
            .join()
            .map_err(|_| anyhow!("capture worker panicked"))?;
        self.running.store(false, Ordering::SeqCst);
        Ok(metrics)
    }

    /// Runs one recognized intent batch against the host, recording history
    /// and publishing the stage transitions around it.
    pub fn execute_intents(
        &mut self,
        host: &mut dyn EditorHost,
        intents: &[Intent],
    ) -> ExecutionReport {
        self.set_stage(Stage::Thinking);
        let report = self.executor.execute(host, &self.registry, intents);
        for summary in &report.executed {
            self.history.record(summary.clone());
        }
        publish(
            &self.events_tx,
            SessionEvent::Batch {
                executed: report.executed.clone(),
                fallbacks: report.fallbacks,
                error: report.failure.as_ref().map(|failure| failure.to_string()),
            },
        );
        self.set_stage(Stage::Ready);
        report
    }

    fn set_stage(&self, next: Stage) {
        set_stage(&self.stage, &self.events_tx, next);
    }
}

struct CaptureWorker {
    recorder: Recorder,
    capture: CaptureConfig,
    estimator: Box<dyn SpeechEstimator>,
    stop_flag: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    level: SpeechLevel,
    stage: Arc<Mutex<Stage>>,
    listeners: Arc<Mutex<Vec<Box<dyn SessionListener>>>>,
    events: Sender<SessionEvent>,
    utterances_tx: Sender<UtteranceArtifact>,
    utterances_rx: Receiver<UtteranceArtifact>,
    queue_dropped: Arc<AtomicUsize>,
    output_dir: PathBuf,
    write_artifacts: bool,
    debug_capture: bool,
}

impl CaptureWorker {
    fn run(self) -> Option<PipelineMetrics> {
        let CaptureWorker {
            recorder,
            capture,
            mut estimator,
            stop_flag,
            running,
            level,
            stage,
            listeners,
            events,
            utterances_tx,
            utterances_rx,
            queue_dropped,
            output_dir,
            write_artifacts,
            debug_capture,
        } = self;

        let format = WavFormat::pipeline();
        let mut on_utterance = |utterance: Utterance| {
            set_stage(&stage, &events, Stage::Parsing);
            let encoded = wav::encode(&utterance.pcm, format);
            let path = if write_artifacts {
                match wav::write_utterance(&output_dir, &utterance.pcm, format) {
                    Ok(path) => Some(path),
                    Err(err) => {
                        warn!(error = %err, "failed to write utterance artifact");
                        None
                    }
                }
            } else {
                None
            };
            publish(
                &events,
                SessionEvent::Utterance {
                    speech_ms: utterance.speech_ms,
                    total_ms: utterance.total_ms,
                    artifact: path.as_ref().map(|path| path.display().to_string()),
                },
            );
            enqueue_drop_oldest(
                &utterances_tx,
                &utterances_rx,
                &queue_dropped,
                UtteranceArtifact {
                    utterance,
                    wav: encoded,
                    path,
                },
            );
        };

        let outcome = recorder.record_segmented(
            &capture,
            estimator.as_mut(),
            Arc::clone(&stop_flag),
            Some(level.clone()),
            &mut on_utterance,
        );

        let metrics = match outcome {
            Ok(mut outcome) => {
                outcome.metrics.utterances_dropped = queue_dropped.load(Ordering::Relaxed);
                if debug_capture {
                    if let Some(pcm) = &outcome.session_pcm {
                        match wav::write_debug_recording(&output_dir, pcm, format) {
                            Ok(path) => {
                                info!(path = %path.display(), "session debug recording written");
                            }
                            Err(err) => warn!(error = %err, "failed to write debug recording"),
                        }
                    }
                }
                log_pipeline_metrics(&outcome.metrics);
                publish(&events, SessionEvent::stopped(&outcome.metrics));
                Some(outcome.metrics)
            }
            Err(err) => {
                let message = format!("{err:#}");
                error!(error = %message, "capture worker failed");
                publish(&events, SessionEvent::CaptureError { message: message.clone() });
                notify_listeners(&listeners, |listener| listener.on_error(&message));
                None
            }
        };

        set_stage(&stage, &events, Stage::Ready);
        notify_listeners(&listeners, |listener| listener.on_stop());
        running.store(false, Ordering::SeqCst);
        metrics
    }
}

/// Session events are advisory; a full or hung-up receiver never blocks the
/// pipeline.
fn publish(events: &Sender<SessionEvent>, event: SessionEvent) {
    let _ = events.try_send(event);
}

fn set_stage(stage: &Mutex<Stage>, events: &Sender<SessionEvent>, next: Stage) {
    if let Ok(mut current) = stage.lock() {
        *current = next;
    }
    publish(events, SessionEvent::stage(next));
}

fn notify_listeners(
    listeners: &Mutex<Vec<Box<dyn SessionListener>>>,
    call: impl Fn(&dyn SessionListener),
) {
    if let Ok(listeners) = listeners.lock() {
        for listener in listeners.iter() {
            call(listener.as_ref());
        }
    }
}

/// Hands an utterance to the consumer queue, evicting the oldest queued
/// entry when full. Capture must keep pace regardless of the consumer.
fn enqueue_drop_oldest(
    tx: &Sender<UtteranceArtifact>,
    rx: &Receiver<UtteranceArtifact>,
    dropped: &AtomicUsize,
    artifact: UtteranceArtifact,
) {
    match tx.try_send(artifact) {
        Ok(()) => {}
        Err(TrySendError::Full(artifact)) => {
            if rx.try_recv().is_ok() {
                dropped.fetch_add(1, Ordering::Relaxed);
            }
            if tx.try_send(artifact).is_err() {
                dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        Err(TrySendError::Disconnected(_)) => {
            dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Format: `pipeline_metrics|chunks=...|windows=...|utterances=...|discarded=...|queue_dropped=...|capture_dropped=...|stop=...`
fn log_pipeline_metrics(metrics: &PipelineMetrics) {
    info!(
        "pipeline_metrics|chunks={}|windows={}|utterances={}|discarded={}|queue_dropped={}|capture_dropped={}|stop={}",
        metrics.chunks_processed,
        metrics.windows_processed,
        metrics.utterances_emitted,
        metrics.utterances_discarded,
        metrics.utterances_dropped,
        metrics.chunks_dropped,
        metrics.stop_reason.label(),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::audio::AmplitudeEstimator;
    use crate::commands::InMemoryEditor;

    struct CountingListener {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl SessionListener for CountingListener {
        fn on_start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn quiet_config() -> SessionConfig {
        SessionConfig {
            write_artifacts: false,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn start_and_stop_round_trip() {
        let mut session = RecordingSession::new(quiet_config());
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        session.add_listener(Box::new(CountingListener {
            starts: Arc::clone(&starts),
            stops: Arc::clone(&stops),
        }));

        let started = match session.start(Box::new(AmplitudeEstimator::default())) {
            Ok(started) => started,
            Err(_) => return, // no capture device in this environment
        };
        assert!(started);
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        let metrics = session.stop().unwrap().expect("worker should report metrics");
        assert_eq!(metrics.stop_reason.label(), "stream_ended");
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(!session.is_running());
        assert_eq!(session.stage(), Stage::Ready);

        let labels: Vec<String> = session
            .events()
            .try_iter()
            .map(|event| serde_json::to_string(&event).unwrap())
            .collect();
        assert!(labels.iter().any(|json| json.contains(r#""event":"stopped""#)));
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let mut session = RecordingSession::new(quiet_config());
        session.running.store(true, Ordering::SeqCst);

        let started = session
            .start(Box::new(AmplitudeEstimator::default()))
            .unwrap();
        assert!(!started);
    }

    #[test]
    fn stop_without_start_returns_nothing() {
        let mut session = RecordingSession::new(quiet_config());
        assert!(session.stop().unwrap().is_none());
    }

    #[test]
    fn execute_intents_tracks_stage_and_history() {
        let mut session = RecordingSession::new(quiet_config());
        let mut host = InMemoryEditor::new().with_focused_file("notes.txt", "");
        let events = session.events();

        let report = session.execute_intents(
            &mut host,
            &[Intent::new("insert").with_param("text", "hello")],
        );

        assert_eq!(report.executed, ["insert(text='hello')"]);
        assert_eq!(host.contents("notes.txt"), Some("hello"));
        assert_eq!(session.history().last_n(1)[0].summary, "insert(text='hello')");
        assert_eq!(session.stage(), Stage::Ready);

        let jsons: Vec<String> = events
            .try_iter()
            .map(|event| serde_json::to_string(&event).unwrap())
            .collect();
        assert!(jsons[0].contains(r#""stage":"thinking""#));
        assert!(jsons.iter().any(|json| json.contains(r#""event":"batch""#)));
        assert!(jsons.last().unwrap().contains(r#""stage":"ready""#));
    }

    #[test]
    fn utterance_queue_evicts_oldest_when_full() {
        let (tx, rx) = bounded(1);
        let dropped = AtomicUsize::new(0);
        let artifact = |tag: u8| UtteranceArtifact {
            utterance: Utterance {
                pcm: vec![tag],
                speech_ms: 0,
                total_ms: 0,
            },
            wav: Vec::new(),
            path: None,
        };

        enqueue_drop_oldest(&tx, &rx, &dropped, artifact(1));
        enqueue_drop_oldest(&tx, &rx, &dropped, artifact(2));

        assert_eq!(dropped.load(Ordering::Relaxed), 1);
        assert_eq!(rx.try_recv().unwrap().utterance.pcm, [2]);
        assert!(rx.try_recv().is_err());
    }
}
