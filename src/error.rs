//! Error kinds surfaced by the segmentation pipeline and the command layer.

use thiserror::Error;

/// Errors that cross module boundaries inside the pipeline.
///
/// Rollback on a command without a captured snapshot is deliberately absent
/// here: it is defined as a silent no-op, not a failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Byte-pairing desync in the sample assembler. Unreachable when the
    /// assembler is correct; surfacing it means a programming error upstream.
    #[error("malformed audio frame: {0}")]
    MalformedAudioFrame(String),

    /// Recognizer produced an intent name the registry does not know.
    /// Callers resolve this to the fallback notification command.
    #[error("unknown intent '{0}'")]
    UnknownIntent(String),

    /// A command's side effect faulted during `process()`.
    #[error("command '{name}' failed: {message}")]
    CommandProcessFailure { name: &'static str, message: String },

    /// The capture device failed to open or deliver samples.
    #[error("audio device error: {0}")]
    Device(String),
}
