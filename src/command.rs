//! Reversible editor commands.
//!
//! A command never owns document state. It holds the two values it moves
//! between and is handed the shared [`EditorContext`] on every call.

pub mod batch;
pub mod code;
pub mod property;

use std::fmt;
use std::time::Instant;

use crate::context::{EditorContext, TemplateError};
use crate::pending::ElementId;
use crate::preview::PreviewError;

pub use batch::MacroCommand;
pub use code::CodeUpdateCommand;
pub use property::{apply_property_value, PropertyUpdateCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Property,
    Code,
    Macro,
}

#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub description: String,
    pub timestamp: Instant,
    pub kind: CommandKind,
}

impl CommandMetadata {
    pub fn new(kind: CommandKind, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            timestamp: Instant::now(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    ElementNotFound(ElementId),
    Preview(PreviewError),
    Template(TemplateError),
    Other(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::ElementNotFound(id) => write!(f, "element '{}' not found", id),
            CommandError::Preview(e) => write!(f, "{}", e),
            CommandError::Template(e) => write!(f, "{}", e),
            CommandError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<PreviewError> for CommandError {
    fn from(e: PreviewError) -> Self {
        CommandError::Preview(e)
    }
}

impl From<TemplateError> for CommandError {
    fn from(e: TemplateError) -> Self {
        CommandError::Template(e)
    }
}

pub type CommandResult = Result<(), CommandError>;

/// A reversible transition between two known states
pub trait Command {
    fn execute(&self, ctx: &EditorContext) -> CommandResult;

    fn undo(&self, ctx: &EditorContext) -> CommandResult;

    /// Whether the command's target still exists
    fn can_execute(&self, ctx: &EditorContext) -> bool;

    fn metadata(&self) -> &CommandMetadata;

    fn description(&self) -> &str {
        &self.metadata().description
    }

    fn kind(&self) -> CommandKind {
        self.metadata().kind
    }

    fn timestamp(&self) -> Instant {
        self.metadata().timestamp
    }
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("kind", &self.kind())
            .field("description", &self.description())
            .finish()
    }
}

#[cfg(test)]
mod test;
