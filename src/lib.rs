//! Command-based undo/redo for a visual document editor.
//!
//! Live property and code edits are applied to the preview immediately,
//! accumulated as pending changes per element, and committed to a bounded
//! linear history once each burst of edits settles.

pub mod command;
pub mod config;
pub mod context;
pub mod editor;
pub mod history;
pub mod pending;
pub mod preview;
pub mod property;
pub mod recorder;
pub mod script;

#[cfg(test)]
mod testing;

pub use command::{Command, CommandError, CommandKind, CommandMetadata};
pub use config::EngineConfig;
pub use context::{EditorContext, TemplateActions, TemplateSource};
pub use editor::Editor;
pub use history::{HistoryActions, HistoryManager, HistoryOutcome, HistoryState};
pub use pending::{ElementId, ElementUpdates, PendingChangeStore, PendingElementChanges};
pub use preview::{HeadlessSurface, PreviewSurface};
pub use recorder::{DebouncedChangeRecorder, RecordedChange};
