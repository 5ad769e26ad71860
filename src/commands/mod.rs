//! Reversible command execution.
//!
//! Recognized intents become commands: named, parameterized units of work
//! that capture a rollback snapshot before mutating editor state. The
//! executor applies one batch in submission order and keeps a single
//! previous-command slot so the next batch's cancel can undo the last thing
//! that happened. One slot, not a stack; older commands are unrecoverable
//! once superseded.

mod action;
mod codegen;
mod control;
mod executor;
mod history;
mod host;
mod insert;
mod navigate;
mod notify;
mod registry;

pub use action::{ActionCommand, VimCommand};
pub use codegen::CodegenCommand;
pub use control::{ApproveCommand, CancelCommand, StopCommand};
pub use executor::{CommandExecutor, ExecutionReport};
pub use history::{CommandHistory, HistoryEntry};
pub use host::{EditorHost, EditorSnapshot, InMemoryEditor};
pub use insert::InsertCommand;
pub use navigate::{CreateFileCommand, NavigateCommand};
pub use notify::NotifyCommand;
pub use registry::{CommandRegistry, CommandSpec, ParameterSpec};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One recognized intent: a tool name plus its raw parameter map, exactly as
/// the external recognizer produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Intent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: serde_json::Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

/// A named, reversible unit of work.
///
/// `process` runs the side effect, capturing whatever state a later undo
/// needs before mutating anything. `rollback` restores from that capture and
/// is always safe to call, including on a command that never processed or
/// that captured nothing.
pub trait Command {
    fn name(&self) -> &'static str;

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()>;

    fn rollback(&mut self, host: &mut dyn EditorHost);

    /// Human-readable form for logs and history entries.
    fn describe(&self) -> String {
        self.name().to_string()
    }
}

/// Missing or mistyped parameters degrade to an empty string rather than
/// failing the build; the recognizer is not a trusted caller.
pub(crate) fn str_param(intent: &Intent, key: &str) -> String {
    intent
        .params
        .get(key)
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn bool_param(intent: &Intent, key: &str) -> bool {
    intent
        .params
        .get(key)
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}
