use anyhow::Result;
use tracing::debug;

use super::host::EditorHost;
use super::Command;

/// Tells the user their utterance was not understood. Also the fallback the
/// registry builds for intents it has no entry for. `research` marks phrases
/// the recognizer flagged as worth a deeper lookup rather than a plain miss.
pub struct NotifyCommand {
    reason: String,
    research: bool,
}

impl NotifyCommand {
    pub fn new(reason: impl Into<String>, research: bool) -> Self {
        Self {
            reason: reason.into(),
            research,
        }
    }
}

impl Command for NotifyCommand {
    fn name(&self) -> &'static str {
        "idontknow"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        if self.research {
            debug!(reason = %self.reason, "phrase flagged for research");
        }
        host.notify(&format!("Not recognized: {}", self.reason));
        Ok(())
    }

    fn rollback(&mut self, _host: &mut dyn EditorHost) {}

    fn describe(&self) -> String {
        format!("idontknow(reason='{}', research={})", self.reason, self.research)
    }
}
