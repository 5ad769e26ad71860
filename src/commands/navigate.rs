use anyhow::Result;
use tracing::{debug, warn};

use super::host::EditorHost;
use super::Command;

/// Opens the first known file whose name matches, ignoring case. The match
/// is on the final path segment, so "main.rs" finds "src/main.rs".
pub struct NavigateCommand {
    file_name: String,
    previous: Option<Focus>,
}

struct Focus {
    file: Option<String>,
    caret: usize,
}

impl NavigateCommand {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            previous: None,
        }
    }

    fn resolve(&self, host: &dyn EditorHost) -> Option<String> {
        host.known_files().into_iter().find(|path| {
            let name = path.rsplit('/').next().unwrap_or(path);
            name.eq_ignore_ascii_case(&self.file_name)
        })
    }
}

impl Command for NavigateCommand {
    fn name(&self) -> &'static str {
        "editorNavigate"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        let Some(target) = self.resolve(host) else {
            debug!(file = %self.file_name, "no file with that name, navigation skipped");
            return Ok(());
        };
        self.previous = Some(Focus {
            file: host.focused_file(),
            caret: host.caret(),
        });
        host.open_file(&target)
    }

    fn rollback(&mut self, host: &mut dyn EditorHost) {
        let Some(Focus {
            file: Some(file),
            caret,
        }) = &self.previous
        else {
            return;
        };
        if host.open_file(file).is_ok() {
            host.move_caret(*caret);
        }
    }

    fn describe(&self) -> String {
        format!("editorNavigate(fileName='{}')", self.file_name)
    }
}

/// Creates a file at the given path and focuses it. Separators are
/// normalized and blank segments dropped before the host sees the path.
pub struct CreateFileCommand {
    path: String,
    created: Option<String>,
}

impl CreateFileCommand {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            created: None,
        }
    }

    fn normalized(&self) -> Option<String> {
        let cleaned = self.path.replace('\\', "/");
        let segments: Vec<&str> = cleaned
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();
        if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        }
    }
}

impl Command for CreateFileCommand {
    fn name(&self) -> &'static str {
        "createFile"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        let Some(path) = self.normalized() else {
            warn!(path = %self.path, "empty path after normalization, nothing created");
            return Ok(());
        };
        host.create_file(&path)?;
        self.created = Some(path);
        Ok(())
    }

    fn rollback(&mut self, host: &mut dyn EditorHost) {
        if let Some(path) = self.created.take() {
            host.remove_file(&path);
        }
    }

    fn describe(&self) -> String {
        format!("createFile(path='{}')", self.path)
    }
}
