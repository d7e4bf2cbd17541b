//! Host-facing façade: live edits in, undoable history out.

use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info};

use crate::command::{apply_property_value, Command, CommandError, MacroCommand};
use crate::config::EngineConfig;
use crate::context::{EditorContext, TemplateSource};
use crate::history::{HistoryActions, HistoryManager, HistoryOutcome, HistoryState};
use crate::pending::{ElementId, PendingChangesMap};
use crate::property::PropertyPath;
use crate::recorder::DebouncedChangeRecorder;

pub struct Editor {
    context: EditorContext,
    history: Rc<HistoryManager>,
    recorder: DebouncedChangeRecorder,
}

impl Editor {
    pub fn new(context: EditorContext, config: &EngineConfig) -> Self {
        Self {
            history: Rc::new(HistoryManager::with_limit(context.clone(), config.history_limit)),
            recorder: DebouncedChangeRecorder::new(config.debounce()),
            context,
        }
    }

    pub fn context(&self) -> &EditorContext {
        &self.context
    }

    /// Shared handle for menus and shortcuts
    pub fn history(&self) -> Rc<HistoryManager> {
        self.history.clone()
    }

    pub fn update_context(&mut self, context: EditorContext) {
        self.history.update_context(context.clone());
        self.context = context;
    }

    /// Value a property shows right now: pending edit first, then the preview
    pub fn current_value(&self, element_id: &ElementId, path: &PropertyPath) -> String {
        let pending = self
            .context
            .editor_mode
            .borrow()
            .get_for_element(element_id)
            .and_then(|entry| entry.updates.get(path).map(str::to_string));
        pending.unwrap_or_else(|| {
            self.context
                .canvas
                .borrow()
                .snapshot(element_id)
                .map(|snap| snap.value_of(path).to_string())
                .unwrap_or_default()
        })
    }

    /// Apply a raw property edit to the preview now and queue it for history.
    /// Returns whether anything changed.
    pub fn edit_property(
        &mut self,
        element_id: &ElementId,
        property: &str,
        value: &str,
        now: Instant,
    ) -> Result<bool, CommandError> {
        let path = PropertyPath::parse(property);
        let old = self.current_value(element_id, &path);
        if old == value {
            return Ok(false);
        }

        let snapshot = self.session_snapshot(element_id);
        if !apply_property_value(&self.context, element_id, &path, value, &snapshot)? {
            return Ok(false);
        }
        self.recorder.note_property(element_id, property, &old, value, &snapshot, now);
        Ok(true)
    }

    /// Replace the document source now and queue it for history
    pub fn edit_code(&mut self, source: TemplateSource, now: Instant) -> Result<bool, CommandError> {
        let before = self.context.template.borrow().current();
        if before == source {
            return Ok(false);
        }
        self.context.template.borrow_mut().update_template(&source)?;
        self.recorder.note_code(&before, source, now);
        Ok(true)
    }

    /// Record every burst that has settled by `now`
    pub fn tick(&mut self, now: Instant) -> usize {
        let changes = self.recorder.poll(now);
        let count = changes.len();
        for change in changes {
            self.history.record(change);
        }
        count
    }

    /// Record every open burst immediately
    pub fn flush(&mut self) -> usize {
        let changes = self.recorder.flush();
        let count = changes.len();
        for change in changes {
            self.history.record(change);
        }
        count
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.recorder.next_deadline()
    }

    pub fn undo(&mut self) -> HistoryOutcome {
        self.flush();
        self.history.undo()
    }

    pub fn redo(&mut self) -> HistoryOutcome {
        self.flush();
        self.history.redo()
    }

    /// Run several commands now as a single undo step
    pub fn apply_macro(
        &mut self,
        commands: Vec<Box<dyn Command>>,
        description: Option<String>,
    ) -> HistoryOutcome {
        self.flush();
        if commands.is_empty() {
            return HistoryOutcome::Skipped;
        }
        self.history.execute_command(Box::new(MacroCommand::new(commands, description)))
    }

    /// Hand pending edits to the save collaborator. The deltas in history
    /// no longer describe the source after that, so history goes too.
    pub fn save(&mut self) -> PendingChangesMap {
        self.flush();
        let changes = self.context.editor_mode.borrow_mut().take_all();
        self.history.clear_on_save();
        info!(elements = changes.len(), "pending changes handed off for save");
        changes
    }

    /// Throw away pending edits, open bursts and history
    pub fn reset(&mut self) {
        self.recorder.cancel_all();
        self.context.editor_mode.borrow_mut().clear_all();
        self.history.clear();
        debug!("editor state reset");
    }

    pub fn state(&self) -> HistoryState {
        self.history.state()
    }

    /// Pre-session snapshot for an element: the pending entry's if one
    /// exists, otherwise the element as the preview shows it now
    fn session_snapshot(&self, element_id: &ElementId) -> String {
        let pending = self
            .context
            .editor_mode
            .borrow()
            .get_for_element(element_id)
            .map(|entry| entry.original_element.clone())
            .filter(|raw| !raw.is_empty());
        pending.unwrap_or_else(|| {
            self.context
                .canvas
                .borrow()
                .snapshot(element_id)
                .map(|snap| snap.to_json())
                .unwrap_or_default()
        })
    }
}
