pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
mod telemetry;
#[cfg(feature = "vad_earshot")]
pub mod vad_earshot;

pub use error::PipelineError;
pub use events::{SessionEvent, Stage};
pub use session::{RecordingSession, SessionConfig, SessionListener, UtteranceArtifact};
pub use telemetry::{init_tracing, tracing_log_path};
