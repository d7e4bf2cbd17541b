use std::fmt;
use tracing::{debug, warn};

use super::{Command, CommandKind, CommandMetadata, CommandResult};
use crate::context::EditorContext;

/// Several commands undone and redone as one step
pub struct MacroCommand {
    commands: Vec<Box<dyn Command>>,
    metadata: CommandMetadata,
}

impl fmt::Debug for MacroCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroCommand")
            .field("commands", &self.commands)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl MacroCommand {
    pub fn new(commands: Vec<Box<dyn Command>>, description: Option<String>) -> Self {
        let description =
            description.unwrap_or_else(|| format!("Batch edit ({})", commands.len()));
        Self {
            commands,
            metadata: CommandMetadata::new(CommandKind::Macro, description),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for MacroCommand {
    /// Runs sub-commands in order, skipping any whose target is gone.
    /// A failure rolls back what already ran.
    fn execute(&self, ctx: &EditorContext) -> CommandResult {
        let mut executed: Vec<usize> = Vec::with_capacity(self.commands.len());
        for (i, cmd) in self.commands.iter().enumerate() {
            if !cmd.can_execute(ctx) {
                debug!(index = i, description = cmd.description(), "skipping sub-command");
                continue;
            }
            if let Err(e) = cmd.execute(ctx) {
                for done in executed.into_iter().rev() {
                    if let Err(rollback) = self.commands[done].undo(ctx) {
                        warn!(index = done, error = %rollback, "rollback of sub-command failed");
                    }
                }
                return Err(e);
            }
            executed.push(i);
        }
        Ok(())
    }

    /// Undoes every sub-command in reverse, reporting the first failure
    fn undo(&self, ctx: &EditorContext) -> CommandResult {
        let mut first_error = None;
        for (i, cmd) in self.commands.iter().enumerate().rev() {
            if let Err(e) = cmd.undo(ctx) {
                warn!(index = i, error = %e, "undo of sub-command failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn can_execute(&self, ctx: &EditorContext) -> bool {
        self.commands.iter().all(|cmd| cmd.can_execute(ctx))
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }
}
