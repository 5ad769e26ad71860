use serde_json::json;
use tracing::warn;

use super::action::{ActionCommand, VimCommand};
use super::codegen::CodegenCommand;
use super::control::{ApproveCommand, CancelCommand, StopCommand};
use super::insert::InsertCommand;
use super::navigate::{CreateFileCommand, NavigateCommand};
use super::notify::NotifyCommand;
use super::{bool_param, str_param, Command, Intent};
use crate::error::PipelineError;

type BuildFn = fn(&Intent, &mut Option<Box<dyn Command>>) -> Box<dyn Command>;

/// Declared parameter of a registered command, as exported in the schema.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: &'static str,
    pub description: &'static str,
}

impl ParameterSpec {
    pub const fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: "string",
            description,
        }
    }

    pub const fn boolean(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: "boolean",
            description,
        }
    }
}

/// A registered command: schema metadata plus the constructor that turns an
/// intent into a runnable command. The constructor also receives the
/// previous-command slot so undo-style commands can take ownership of it.
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSpec>,
    build: BuildFn,
}

impl CommandSpec {
    pub fn new(
        name: &'static str,
        description: &'static str,
        parameters: Vec<ParameterSpec>,
        build: BuildFn,
    ) -> Self {
        Self {
            name,
            description,
            parameters,
            build,
        }
    }
}

/// Lookup table from intent names to command constructors.
///
/// Names are matched case-insensitively; recognizers are inconsistent about
/// casing. Schema export preserves registration order.
#[derive(Default)]
pub struct CommandRegistry {
    specs: Vec<CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in command set.
    pub fn with_default_commands() -> Self {
        let mut registry = Self::new();
        registry.register(CommandSpec::new(
            "insert",
            "Insert text at the cursor",
            vec![ParameterSpec::string("text", "Text to insert")],
            |intent, _| Box::new(InsertCommand::new(str_param(intent, "text"))),
        ));
        registry.register(CommandSpec::new(
            "generate",
            "Generate code from a prompt",
            vec![ParameterSpec::string("prompt", "What the generated code should do")],
            |intent, _| Box::new(CodegenCommand::new(str_param(intent, "prompt"))),
        ));
        registry.register(CommandSpec::new(
            "editorNavigate",
            "Open file in editor",
            vec![ParameterSpec::string("fileName", "Name of the file to open")],
            |intent, _| Box::new(NavigateCommand::new(str_param(intent, "fileName"))),
        ));
        registry.register(CommandSpec::new(
            "createFile",
            "Create a new file",
            vec![ParameterSpec::string("path", "Project-relative path of the new file")],
            |intent, _| Box::new(CreateFileCommand::new(str_param(intent, "path"))),
        ));
        registry.register(CommandSpec::new(
            "action",
            "Run a named editor action",
            vec![ParameterSpec::string("actionId", "Identifier of the action to run")],
            |intent, _| Box::new(ActionCommand::new(str_param(intent, "actionId"))),
        ));
        registry.register(CommandSpec::new(
            "vimCommand",
            "Run an editor script command",
            vec![ParameterSpec::string("command", "Script line or normal-mode keystrokes")],
            |intent, _| Box::new(VimCommand::new(str_param(intent, "command"))),
        ));
        registry.register(CommandSpec::new(
            "approve",
            "Accept pending generated changes",
            Vec::new(),
            |_, _| Box::new(ApproveCommand::new()),
        ));
        registry.register(CommandSpec::new(
            "stop",
            "Stop listening",
            Vec::new(),
            |_, _| Box::new(StopCommand),
        ));
        registry.register(CommandSpec::new(
            "cancel",
            "Cancel previous command",
            Vec::new(),
            |_, previous| Box::new(CancelCommand::new(previous.take())),
        ));
        registry.register(CommandSpec::new(
            "idontknow",
            "Report an unrecognized request",
            vec![
                ParameterSpec::string("reason", "The phrase that was not understood"),
                ParameterSpec::boolean("research", "Whether the phrase needs a deeper lookup"),
            ],
            |intent, _| {
                Box::new(NotifyCommand::new(
                    str_param(intent, "reason"),
                    bool_param(intent, "research"),
                ))
            },
        ));
        registry
    }

    pub fn register(&mut self, spec: CommandSpec) {
        self.specs.push(spec);
    }

    /// Builds the command for an intent. `previous` is the executor's
    /// previous-command slot; most constructors ignore it, `cancel` takes it.
    pub fn try_build(
        &self,
        intent: &Intent,
        previous: &mut Option<Box<dyn Command>>,
    ) -> Result<Box<dyn Command>, PipelineError> {
        let spec = self
            .specs
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(&intent.name))
            .ok_or_else(|| PipelineError::UnknownIntent(intent.name.clone()))?;
        Ok((spec.build)(intent, previous))
    }

    /// Notification command standing in for an intent nothing is registered
    /// for. The unrecognized name itself is the reason shown to the user.
    pub fn build_fallback(&self, intent: &Intent) -> Box<dyn Command> {
        warn!(intent = %intent.name, "no command registered for intent, using fallback");
        Box::new(NotifyCommand::new(intent.name.clone(), false))
    }

    /// Machine-readable export of every registered command, for wiring an
    /// external recognizer's tool definitions.
    pub fn schema(&self) -> serde_json::Value {
        let entries: Vec<serde_json::Value> = self
            .specs
            .iter()
            .map(|spec| {
                let parameters: Vec<serde_json::Value> = spec
                    .parameters
                    .iter()
                    .map(|parameter| {
                        json!({
                            "name": parameter.name,
                            "type": parameter.kind,
                            "description": parameter.description,
                        })
                    })
                    .collect();
                json!({
                    "name": spec.name,
                    "description": spec.description,
                    "parameters": parameters,
                })
            })
            .collect();
        serde_json::Value::Array(entries)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
