use anyhow::Result;
use tracing::debug;

use super::host::{EditorHost, EditorSnapshot};
use super::Command;

/// Accepts the pending generated suggestion. Accepting splices opaque text
/// into the document, so the pre-accept editor state is snapshotted and
/// restored wholesale on rollback.
pub struct ApproveCommand {
    snapshot: Option<EditorSnapshot>,
}

impl ApproveCommand {
    pub fn new() -> Self {
        Self { snapshot: None }
    }
}

impl Default for ApproveCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for ApproveCommand {
    fn name(&self) -> &'static str {
        "approve"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        self.snapshot = EditorSnapshot::capture(host);
        host.accept_generation();
        Ok(())
    }

    fn rollback(&mut self, host: &mut dyn EditorHost) {
        if let Some(snapshot) = &self.snapshot {
            snapshot.restore(host);
        }
    }
}

/// Interrupts an in-flight generation. There is nothing to restore; an
/// interrupted stream cannot be resumed.
pub struct StopCommand;

impl Command for StopCommand {
    fn name(&self) -> &'static str {
        "stop"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        host.stop_generation();
        Ok(())
    }

    fn rollback(&mut self, _host: &mut dyn EditorHost) {}
}

/// Undoes the previously executed command by taking ownership of it and
/// running its rollback. With nothing to undo it degrades to a no-op.
pub struct CancelCommand {
    previous: Option<Box<dyn Command>>,
}

impl CancelCommand {
    pub fn new(previous: Option<Box<dyn Command>>) -> Self {
        Self { previous }
    }
}

impl Command for CancelCommand {
    fn name(&self) -> &'static str {
        "cancel"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        match self.previous.as_mut() {
            Some(previous) => previous.rollback(host),
            None => debug!("cancel with no previous command"),
        }
        Ok(())
    }

    fn rollback(&mut self, _host: &mut dyn EditorHost) {}

    fn describe(&self) -> String {
        match &self.previous {
            Some(previous) => format!("cancel({})", previous.describe()),
            None => "cancel".to_string(),
        }
    }
}
