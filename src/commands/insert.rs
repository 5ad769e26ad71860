use anyhow::Result;
use tracing::debug;

use super::host::EditorHost;
use super::Command;

/// Inserts text at the caret of the focused editor.
///
/// Rollback is surgical rather than a full-text restore: it deletes the
/// inserted range only if the document still contains exactly the inserted
/// text there, so edits made after the insert are never clobbered.
pub struct InsertCommand {
    text: String,
    applied: Option<Applied>,
}

struct Applied {
    file: String,
    offset: usize,
}

impl InsertCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            applied: None,
        }
    }
}

impl Command for InsertCommand {
    fn name(&self) -> &'static str {
        "insert"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        let Some(file) = host.focused_file() else {
            debug!("insert skipped, no focused editor");
            return Ok(());
        };
        let offset = host.caret();
        host.insert_text(offset, &self.text);
        host.move_caret(offset + self.text.len());
        self.applied = Some(Applied { file, offset });
        Ok(())
    }

    fn rollback(&mut self, host: &mut dyn EditorHost) {
        let Some(applied) = &self.applied else {
            return;
        };
        if host.focused_file().as_deref() != Some(applied.file.as_str())
            && host.open_file(&applied.file).is_err()
        {
            debug!(file = %applied.file, "insert rollback skipped, file gone");
            return;
        }
        let Some(text) = host.document_text() else {
            return;
        };
        let end = applied.offset + self.text.len();
        if text.get(applied.offset..end) == Some(self.text.as_str()) {
            host.delete_range(applied.offset, end);
            host.move_caret(applied.offset);
        }
    }

    fn describe(&self) -> String {
        format!("insert(text='{}')", self.text)
    }
}
