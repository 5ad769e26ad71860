use tracing::{debug, error};

use super::host::EditorHost;
use super::registry::CommandRegistry;
use super::{Command, Intent};
use crate::error::PipelineError;

/// Applies command batches in order and keeps the single previous-command
/// slot that linear undo needs.
///
/// The slot is threaded into every build, so a `cancel` anywhere in a batch
/// takes ownership of whatever ran immediately before it, whether that was
/// earlier in the same batch or the tail of the previous one. After each
/// command processes it becomes the new slot occupant; on a failure the
/// batch halts but the failed command still takes the slot, since its
/// rollback is the only way to undo whatever partial effect it had.
#[derive(Default)]
pub struct CommandExecutor {
    previous: Option<Box<dyn Command>>,
}

/// What one batch did: descriptions of processed commands, how many intents
/// fell back to the unrecognized notification, and the failure that halted
/// the batch, if any.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub executed: Vec<String>,
    pub fallbacks: usize,
    pub failure: Option<PipelineError>,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Runs pre-built commands in order, halting at the first failure.
    pub fn run(
        &mut self,
        host: &mut dyn EditorHost,
        commands: Vec<Box<dyn Command>>,
    ) -> Result<(), PipelineError> {
        for command in commands {
            self.process_one(host, command)?;
        }
        Ok(())
    }

    /// Builds and runs one batch of recognized intents. Unknown intent names
    /// degrade to the fallback notification instead of halting the batch.
    pub fn execute(
        &mut self,
        host: &mut dyn EditorHost,
        registry: &CommandRegistry,
        intents: &[Intent],
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for intent in intents {
            let command = match registry.try_build(intent, &mut self.previous) {
                Ok(command) => command,
                Err(_) => {
                    report.fallbacks += 1;
                    registry.build_fallback(intent)
                }
            };
            match self.process_one(host, command) {
                Ok(described) => report.executed.push(described),
                Err(failure) => {
                    report.failure = Some(failure);
                    break;
                }
            }
        }
        report
    }

    fn process_one(
        &mut self,
        host: &mut dyn EditorHost,
        mut command: Box<dyn Command>,
    ) -> Result<String, PipelineError> {
        let described = command.describe();
        let name = command.name();
        let result = command.process(host);
        self.previous = Some(command);
        match result {
            Ok(()) => {
                debug!(command = %described, "command processed");
                Ok(described)
            }
            Err(err) => {
                let failure = PipelineError::CommandProcessFailure {
                    name,
                    message: format!("{err:#}"),
                };
                error!(command = %described, error = %failure, "command failed, batch halted");
                host.notify(&failure.to_string());
                Err(failure)
            }
        }
    }
}
