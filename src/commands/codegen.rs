use anyhow::Result;

use super::host::EditorHost;
use super::Command;

/// Kicks off host-side code generation from a natural-language prompt. The
/// suggestion stays pending until an approve command accepts it, so rollback
/// is a plain discard.
pub struct CodegenCommand {
    prompt: String,
}

impl CodegenCommand {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Command for CodegenCommand {
    fn name(&self) -> &'static str {
        "generate"
    }

    fn process(&mut self, host: &mut dyn EditorHost) -> Result<()> {
        host.generate(&self.prompt)
    }

    fn rollback(&mut self, host: &mut dyn EditorHost) {
        host.discard_generation();
    }

    fn describe(&self) -> String {
        format!("generate(prompt='{}')", self.prompt)
    }
}
