//! Session events and stage tracking.
//!
//! Everything a front end needs to render the pipeline flows through
//! [`SessionEvent`], serialized as JSON with an `"event"` tag field for type
//! discrimination. The core only publishes; it never renders.

use serde::Serialize;

use crate::audio::PipelineMetrics;

/// User-visible phase of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Disabled,
    Ready,
    Listening,
    Parsing,
    Thinking,
}

impl Stage {
    /// Display label for a status widget. Disabled renders as nothing.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Disabled => "",
            Stage::Ready => "Ready",
            Stage::Listening => "Listening...",
            Stage::Parsing => "Parsing...",
            Stage::Thinking => "Thinking...",
        }
    }
}

/// Events emitted by a recording session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// Pipeline moved to a new user-visible phase
    #[serde(rename = "stage")]
    Stage { stage: Stage, label: &'static str },

    /// The segmenter closed a phrase and emitted it
    #[serde(rename = "utterance")]
    Utterance {
        speech_ms: u64,
        total_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        artifact: Option<String>,
    },

    /// A command batch finished executing
    #[serde(rename = "batch")]
    Batch {
        executed: Vec<String>,
        fallbacks: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// The capture worker reported a fault
    #[serde(rename = "capture_error")]
    CaptureError { message: String },

    /// Session ended; final counters for the whole run
    #[serde(rename = "stopped")]
    Stopped {
        chunks: usize,
        windows: usize,
        utterances: usize,
        discarded: usize,
        queue_dropped: usize,
        capture_dropped: usize,
        stop_reason: &'static str,
    },
}

impl SessionEvent {
    pub fn stage(stage: Stage) -> Self {
        SessionEvent::Stage {
            stage,
            label: stage.label(),
        }
    }

    pub fn stopped(metrics: &PipelineMetrics) -> Self {
        SessionEvent::Stopped {
            chunks: metrics.chunks_processed,
            windows: metrics.windows_processed,
            utterances: metrics.utterances_emitted,
            discarded: metrics.utterances_discarded,
            queue_dropped: metrics.utterances_dropped,
            capture_dropped: metrics.chunks_dropped,
            stop_reason: metrics.stop_reason.label(),
        }
    }
}
