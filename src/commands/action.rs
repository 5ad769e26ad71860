use anyhow::Result;

use super::host::{EditorHost, EditorSnapshot};
use super::Command;

/// Triggers a named host action. What the action does is opaque, so the
/// whole focused editor is snapshotted up front and restored on rollback.
pub struct ActionCommand {
    action_id: String,
    snapshot: Option<EditorSnapshot>,
}

impl ActionCommand {
    pub fn new(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            snapshot: None,
        }
    }
}

impl Command for ActionCommand {
    fn name(&self) -> &'static str {
        "action"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        self.snapshot = EditorSnapshot::capture(host);
        host.run_action(&self.action_id)
    }

    fn rollback(&mut self, host: &mut dyn EditorHost) {
        if let Some(snapshot) = &self.snapshot {
            snapshot.restore(host);
        }
    }

    fn describe(&self) -> String {
        format!("action(actionId='{}')", self.action_id)
    }
}

/// Runs a vim command through the host's script engine. Bare normal-mode
/// keystrokes are wrapped as `:normal {keys}<cr>`; anything already starting
/// with `:` is passed through as a script line.
pub struct VimCommand {
    command: String,
    snapshot: Option<EditorSnapshot>,
}

impl VimCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            snapshot: None,
        }
    }

    fn script(&self) -> String {
        if self.command.starts_with(':') {
            self.command.clone()
        } else {
            format!(":normal {}<cr>", self.command)
        }
    }
}

impl Command for VimCommand {
    fn name(&self) -> &'static str {
        "vimCommand"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        self.snapshot = EditorSnapshot::capture(host);
        host.run_script(&self.script())
    }

    fn rollback(&mut self, host: &mut dyn EditorHost) {
        if let Some(snapshot) = &self.snapshot {
            snapshot.restore(host);
        }
    }

    fn describe(&self) -> String {
        format!("vimCommand(command='{}')", self.command)
    }
}
