//! Editor host boundary.
//!
//! Commands never touch a real editor directly; they go through
//! [`EditorHost`], which models the side-effect surface an embedding
//! application must provide. [`InMemoryEditor`] is the built-in host used by
//! offline intent runs and tests.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

/// Side-effect surface commands operate against.
///
/// Read methods describe the current focus: `document_text`, `caret` and
/// `selection` refer to the focused file and are meaningless when
/// `focused_file` is `None`. Mutating methods clamp rather than panic on
/// out-of-range offsets.
pub trait EditorHost {
    fn focused_file(&self) -> Option<String>;
    fn known_files(&self) -> Vec<String>;
    fn document_text(&self) -> Option<String>;
    fn caret(&self) -> usize;
    fn selection(&self) -> (usize, usize);

    fn open_file(&mut self, path: &str) -> Result<()>;
    fn create_file(&mut self, path: &str) -> Result<()>;
    fn remove_file(&mut self, path: &str);
    fn set_document_text(&mut self, text: &str);
    fn insert_text(&mut self, offset: usize, text: &str);
    fn delete_range(&mut self, start: usize, end: usize);
    fn move_caret(&mut self, offset: usize);
    fn set_selection(&mut self, start: usize, end: usize);

    fn run_action(&mut self, action_id: &str) -> Result<()>;
    fn run_script(&mut self, script: &str) -> Result<()>;

    fn generate(&mut self, prompt: &str) -> Result<()>;
    fn accept_generation(&mut self);
    fn discard_generation(&mut self);
    fn stop_generation(&mut self);

    fn notify(&mut self, message: &str);
}

/// Full capture of the focused editor: file, text, caret and selection.
///
/// Commands whose side effects are too opaque to invert surgically (named
/// actions, script runs, accepted generations) take one of these before
/// processing and restore it wholesale on rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSnapshot {
    pub file: String,
    pub text: String,
    pub caret: usize,
    pub selection: (usize, usize),
}

impl EditorSnapshot {
    /// Captures the focused editor, or `None` when nothing is open.
    pub fn capture(host: &dyn EditorHost) -> Option<Self> {
        let file = host.focused_file()?;
        let text = host.document_text()?;
        Some(Self {
            file,
            text,
            caret: host.caret(),
            selection: host.selection(),
        })
    }

    /// Refocuses the captured file and puts its text, caret and selection
    /// back. A collapsed selection is not re-applied.
    pub fn restore(&self, host: &mut dyn EditorHost) {
        if host.open_file(&self.file).is_err() {
            tracing::warn!(file = %self.file, "snapshot file no longer exists, skipping restore");
            return;
        }
        if host.document_text().as_deref() != Some(self.text.as_str()) {
            host.set_document_text(&self.text);
        }
        host.move_caret(self.caret);
        let (start, end) = self.selection;
        if start != end {
            host.set_selection(start, end);
        }
    }
}

/// In-memory editor host: a map of named documents plus focus, caret and
/// selection state. Actions, scripts, generations and notifications are
/// recorded rather than performed so callers can inspect what a batch did.
#[derive(Debug, Default)]
pub struct InMemoryEditor {
    files: BTreeMap<String, String>,
    focused: Option<String>,
    caret: usize,
    selection: (usize, usize),
    pending_generation: Option<String>,
    accepted_generations: Vec<String>,
    actions_run: Vec<String>,
    scripts_run: Vec<String>,
    notifications: Vec<String>,
    generation_stops: usize,
}

impl InMemoryEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document without focusing it.
    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    /// Seeds a document and focuses it with the caret at the end.
    pub fn with_focused_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self.focused = Some(path.to_string());
        self.caret = contents.len();
        self.selection = (0, 0);
        self
    }

    pub fn contents(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    pub fn actions_run(&self) -> &[String] {
        &self.actions_run
    }

    pub fn scripts_run(&self) -> &[String] {
        &self.scripts_run
    }

    pub fn pending_generation(&self) -> Option<&str> {
        self.pending_generation.as_deref()
    }

    pub fn accepted_generations(&self) -> &[String] {
        &self.accepted_generations
    }

    pub fn generation_stops(&self) -> usize {
        self.generation_stops
    }

    fn focused_contents_mut(&mut self) -> Option<&mut String> {
        let path = self.focused.clone()?;
        self.files.get_mut(&path)
    }

    /// Largest char boundary at or below `offset`.
    fn floor_boundary(text: &str, offset: usize) -> usize {
        let mut at = offset.min(text.len());
        while at > 0 && !text.is_char_boundary(at) {
            at -= 1;
        }
        at
    }
}

impl EditorHost for InMemoryEditor {
    fn focused_file(&self) -> Option<String> {
        self.focused.clone()
    }

    fn known_files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn document_text(&self) -> Option<String> {
        let path = self.focused.as_ref()?;
        self.files.get(path).cloned()
    }

    fn caret(&self) -> usize {
        self.caret
    }

    fn selection(&self) -> (usize, usize) {
        self.selection
    }

    fn open_file(&mut self, path: &str) -> Result<()> {
        if !self.files.contains_key(path) {
            bail!("no such file: {path}");
        }
        self.focused = Some(path.to_string());
        self.caret = 0;
        self.selection = (0, 0);
        Ok(())
    }

    fn create_file(&mut self, path: &str) -> Result<()> {
        if self.files.contains_key(path) {
            bail!("file already exists: {path}");
        }
        self.files.insert(path.to_string(), String::new());
        self.focused = Some(path.to_string());
        self.caret = 0;
        self.selection = (0, 0);
        Ok(())
    }

    fn remove_file(&mut self, path: &str) {
        self.files.remove(path);
        if self.focused.as_deref() == Some(path) {
            self.focused = None;
            self.caret = 0;
            self.selection = (0, 0);
        }
    }

    fn set_document_text(&mut self, text: &str) {
        let caret = self.caret;
        if let Some(contents) = self.focused_contents_mut() {
            *contents = text.to_string();
        }
        self.caret = Self::floor_boundary(text, caret);
        self.selection = (0, 0);
    }

    fn insert_text(&mut self, offset: usize, text: &str) {
        if let Some(contents) = self.focused_contents_mut() {
            let at = Self::floor_boundary(contents, offset);
            contents.insert_str(at, text);
        }
    }

    fn delete_range(&mut self, start: usize, end: usize) {
        if let Some(contents) = self.focused_contents_mut() {
            let from = Self::floor_boundary(contents, start);
            let to = Self::floor_boundary(contents, end).max(from);
            contents.replace_range(from..to, "");
        }
    }

    fn move_caret(&mut self, offset: usize) {
        let bounded = match self.document_text() {
            Some(text) => Self::floor_boundary(&text, offset),
            None => 0,
        };
        self.caret = bounded;
    }

    fn set_selection(&mut self, start: usize, end: usize) {
        let (from, to) = match self.document_text() {
            Some(text) => (
                Self::floor_boundary(&text, start),
                Self::floor_boundary(&text, end),
            ),
            None => (0, 0),
        };
        self.selection = (from, to.max(from));
    }

    fn run_action(&mut self, action_id: &str) -> Result<()> {
        self.actions_run.push(action_id.to_string());
        Ok(())
    }

    fn run_script(&mut self, script: &str) -> Result<()> {
        self.scripts_run.push(script.to_string());
        Ok(())
    }

    fn generate(&mut self, prompt: &str) -> Result<()> {
        self.pending_generation = Some(prompt.to_string());
        Ok(())
    }

    fn accept_generation(&mut self) {
        if let Some(prompt) = self.pending_generation.take() {
            self.accepted_generations.push(prompt);
        }
    }

    fn discard_generation(&mut self) {
        self.pending_generation = None;
    }

    fn stop_generation(&mut self) {
        self.pending_generation = None;
        self.generation_stops += 1;
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }
}
