//! Undo/redo stacks over [`Command`]s.
//!
//! History is linear: recording a new command after one or more undos
//! drops the redo stack. The manager is re-entrancy safe on a single
//! thread. While a command runs, every call that would touch the stacks
//! (including pushes triggered from inside the command) is a no-op.

use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, error, warn};

use crate::command::{
    CodeUpdateCommand, Command, CommandError, MacroCommand, PropertyUpdateCommand,
};
use crate::context::{EditorContext, TemplateSource};
use crate::pending::ElementId;
use crate::recorder::RecordedChange;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Read-only snapshot for menus and toolbars
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_count: usize,
    pub redo_count: usize,
}

/// What an undo or redo call ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    Applied(String),
    /// Target no longer exists, the entry was dropped
    Discarded(String),
    /// The command failed and went back onto the stack it came from
    Failed(CommandError),
    /// Nothing to do, or another command is mid-flight
    Skipped,
}

/// Surface the rest of the editor drives history through
pub trait HistoryActions {
    fn undo(&self) -> HistoryOutcome;
    fn redo(&self) -> HistoryOutcome;
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
    fn record_property_change(
        &self,
        element_id: ElementId,
        property: &str,
        old_value: &str,
        new_value: &str,
        element_snapshot: &str,
    );
    fn record_code_change(&self, old_source: TemplateSource, new_source: TemplateSource);
    fn record_macro_command(&self, commands: Vec<Box<dyn Command>>, description: Option<String>);
    fn clear_on_save(&self);
    fn state(&self) -> HistoryState;
}

/// Clears the executing flag however the command returns
struct ExecutionGuard<'a>(&'a Cell<bool>);

impl<'a> ExecutionGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct HistoryManager {
    undo_stack: RefCell<VecDeque<Box<dyn Command>>>,
    redo_stack: RefCell<VecDeque<Box<dyn Command>>>,
    context: RefCell<EditorContext>,
    executing: Cell<bool>,
    limit: usize,
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_depth", &self.undo_count())
            .field("redo_depth", &self.redo_count())
            .field("executing", &self.executing.get())
            .field("limit", &self.limit)
            .finish()
    }
}

impl HistoryManager {
    pub fn new(context: EditorContext) -> Self {
        Self::with_limit(context, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(context: EditorContext, limit: usize) -> Self {
        Self {
            undo_stack: RefCell::new(VecDeque::new()),
            redo_stack: RefCell::new(VecDeque::new()),
            context: RefCell::new(context),
            executing: Cell::new(false),
            limit: limit.max(1),
        }
    }

    /// Swap in fresh collaborator handles; recorded commands keep working
    pub fn update_context(&self, context: EditorContext) {
        *self.context.borrow_mut() = context;
    }

    pub fn context(&self) -> EditorContext {
        self.context.borrow().clone()
    }

    pub fn is_executing(&self) -> bool {
        self.executing.get()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record an already-applied command. Returns whether it was kept.
    pub fn push_command(&self, cmd: Box<dyn Command>) -> bool {
        if self.executing.get() {
            debug!(description = cmd.description(), "ignoring push while a command is running");
            return false;
        }
        if !cmd.can_execute(&self.context()) {
            warn!(description = cmd.description(), "refusing to record command whose target is gone");
            return false;
        }

        let mut undo = self.undo_stack.borrow_mut();
        undo.push_back(cmd);
        while undo.len() > self.limit {
            undo.pop_front();
        }
        drop(undo);

        self.redo_stack.borrow_mut().clear();
        true
    }

    /// Apply a command and, if that worked, record it
    pub fn execute_command(&self, cmd: Box<dyn Command>) -> HistoryOutcome {
        if self.executing.get() {
            return HistoryOutcome::Skipped;
        }
        let ctx = self.context();
        if !cmd.can_execute(&ctx) {
            warn!(description = cmd.description(), "command cannot run, not executing");
            return HistoryOutcome::Discarded(cmd.description().to_string());
        }

        let result = {
            let _guard = ExecutionGuard::enter(&self.executing);
            cmd.execute(&ctx)
        };
        match result {
            Ok(()) => {
                let description = cmd.description().to_string();
                self.push_command(cmd);
                HistoryOutcome::Applied(description)
            }
            Err(e) => {
                error!(description = cmd.description(), error = %e, "command failed");
                HistoryOutcome::Failed(e)
            }
        }
    }

    pub fn undo(&self) -> HistoryOutcome {
        self.step(Direction::Undo)
    }

    pub fn redo(&self) -> HistoryOutcome {
        self.step(Direction::Redo)
    }

    fn step(&self, direction: Direction) -> HistoryOutcome {
        if self.executing.get() {
            debug!(?direction, "already executing, ignoring");
            return HistoryOutcome::Skipped;
        }
        let _guard = ExecutionGuard::enter(&self.executing);

        let (from, to) = match direction {
            Direction::Undo => (&self.undo_stack, &self.redo_stack),
            Direction::Redo => (&self.redo_stack, &self.undo_stack),
        };
        let Some(cmd) = from.borrow_mut().pop_back() else {
            return HistoryOutcome::Skipped;
        };
        let description = cmd.description().to_string();
        let ctx = self.context();

        if !cmd.can_execute(&ctx) {
            warn!(?direction, description = %description, "target gone, dropping entry");
            return HistoryOutcome::Discarded(description);
        }

        let result = match direction {
            Direction::Undo => cmd.undo(&ctx),
            Direction::Redo => cmd.execute(&ctx),
        };
        match result {
            Ok(()) => {
                debug!(?direction, description = %description, "applied");
                to.borrow_mut().push_back(cmd);
                HistoryOutcome::Applied(description)
            }
            Err(e) => {
                error!(?direction, description = %description, error = %e, "failed, keeping entry for retry");
                from.borrow_mut().push_back(cmd);
                HistoryOutcome::Failed(e)
            }
        }
    }

    /// Turn a settled burst from the recorder into a history entry
    pub fn record(&self, change: RecordedChange) {
        match change {
            RecordedChange::Property { element_id, property, old_value, new_value, element_snapshot } => {
                HistoryActions::record_property_change(
                    self,
                    element_id,
                    &property,
                    &old_value,
                    &new_value,
                    &element_snapshot,
                );
            }
            RecordedChange::Code { old_source, new_source } => {
                HistoryActions::record_code_change(self, old_source, new_source);
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.borrow().is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.borrow().is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.borrow().len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.borrow().len()
    }

    /// Descriptions of undoable entries, most recent first
    pub fn undo_descriptions(&self, limit: usize) -> Vec<String> {
        descriptions(&self.undo_stack.borrow(), limit)
    }

    /// Descriptions of redoable entries, most recent first
    pub fn redo_descriptions(&self, limit: usize) -> Vec<String> {
        descriptions(&self.redo_stack.borrow(), limit)
    }

    pub fn clear(&self) {
        self.undo_stack.borrow_mut().clear();
        self.redo_stack.borrow_mut().clear();
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_count: self.undo_count(),
            redo_count: self.redo_count(),
        }
    }
}

fn descriptions(stack: &VecDeque<Box<dyn Command>>, limit: usize) -> Vec<String> {
    stack.iter().rev().take(limit).map(|c| c.description().to_string()).collect()
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

impl HistoryActions for HistoryManager {
    fn undo(&self) -> HistoryOutcome {
        HistoryManager::undo(self)
    }

    fn redo(&self) -> HistoryOutcome {
        HistoryManager::redo(self)
    }

    fn can_undo(&self) -> bool {
        HistoryManager::can_undo(self)
    }

    fn can_redo(&self) -> bool {
        HistoryManager::can_redo(self)
    }

    fn record_property_change(
        &self,
        element_id: ElementId,
        property: &str,
        old_value: &str,
        new_value: &str,
        element_snapshot: &str,
    ) {
        if old_value == new_value {
            return;
        }
        let cmd = PropertyUpdateCommand::new(element_id, property, old_value, new_value, element_snapshot);
        self.push_command(Box::new(cmd));
    }

    fn record_code_change(&self, old_source: TemplateSource, new_source: TemplateSource) {
        if old_source == new_source {
            return;
        }
        self.push_command(Box::new(CodeUpdateCommand::from_sources(old_source, new_source)));
    }

    fn record_macro_command(&self, commands: Vec<Box<dyn Command>>, description: Option<String>) {
        if commands.is_empty() {
            return;
        }
        self.push_command(Box::new(MacroCommand::new(commands, description)));
    }

    fn clear_on_save(&self) {
        debug!(undo = self.undo_count(), redo = self.redo_count(), "clearing history after save");
        self.clear();
    }

    fn state(&self) -> HistoryState {
        HistoryManager::state(self)
    }
}
