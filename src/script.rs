//! Replayable edit sessions for the headless binary.
//!
//! A script describes a starting preview tree and document source, then a
//! list of steps run against an [`Editor`] on a simulated clock.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::context::{EditorContext, InMemoryTemplate, StyleMap, TemplateActions, TemplateSource};
use crate::editor::Editor;
use crate::history::{HistoryOutcome, HistoryState};
use crate::pending::{ElementId, PendingChangeStore, PendingElementChanges};
use crate::preview::{HeadlessNode, HeadlessSurface};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Step {
    Edit {
        element: ElementId,
        property: String,
        value: String,
    },
    Code {
        code: String,
        #[serde(default)]
        styles: StyleMap,
    },
    /// Let simulated time pass, committing any bursts that settle
    Advance { ms: u64 },
    Undo,
    Redo,
    Save,
    Reset,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub template: TemplateSource,
    #[serde(default)]
    pub elements: BTreeMap<ElementId, HeadlessNode>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub history: HistoryState,
    pub undo: Vec<String>,
    pub redo: Vec<String>,
    pub pending: Vec<PendingElementChanges>,
    pub saved: Vec<Vec<PendingElementChanges>>,
    pub template: TemplateSource,
    pub preview: BTreeMap<ElementId, HeadlessNode>,
}

fn sorted(changes: impl IntoIterator<Item = PendingElementChanges>) -> Vec<PendingElementChanges> {
    let mut changes: Vec<_> = changes.into_iter().collect();
    changes.sort_by(|a, b| a.element_id.cmp(&b.element_id));
    changes
}

impl Script {
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse script: {}", e))
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read script file: {}", e))?;
        Self::from_toml(&content)
    }

    /// Run every step, then commit whatever is still settling
    pub fn replay(&self, config: &EngineConfig) -> ReplayReport {
        let mut surface = HeadlessSurface::new();
        for (id, node) in &self.elements {
            surface.insert(id.clone(), node.clone());
        }
        let surface = Rc::new(RefCell::new(surface));
        let template = Rc::new(RefCell::new(InMemoryTemplate::new(self.template.clone())));
        let pending = Rc::new(RefCell::new(PendingChangeStore::new()));
        let context = EditorContext::new(template.clone(), surface.clone(), pending.clone());

        let mut editor = Editor::new(context, config);
        let start = Instant::now();
        let mut elapsed = Duration::ZERO;
        let mut saved = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            let now = start + elapsed;
            match step {
                Step::Edit { element, property, value } => {
                    match editor.edit_property(element, property, value, now) {
                        Ok(true) => {}
                        Ok(false) => info!(step = index, element = %element, property = %property, "edit had no effect"),
                        Err(e) => warn!(step = index, error = %e, "edit failed"),
                    }
                }
                Step::Code { code, styles } => {
                    let source = TemplateSource::new(code.clone(), styles.clone());
                    if let Err(e) = editor.edit_code(source, now) {
                        warn!(step = index, error = %e, "code edit failed");
                    }
                }
                Step::Advance { ms } => {
                    elapsed += Duration::from_millis(*ms);
                    let committed = editor.tick(start + elapsed);
                    if committed > 0 {
                        info!(step = index, committed, "bursts committed");
                    }
                }
                Step::Undo => log_outcome(index, "undo", editor.undo()),
                Step::Redo => log_outcome(index, "redo", editor.redo()),
                Step::Save => saved.push(sorted(editor.save().into_values())),
                Step::Reset => editor.reset(),
            }
        }
        editor.flush();

        let history = editor.history();
        let pending = sorted(pending.borrow().iter().cloned());
        let preview = surface
            .borrow()
            .nodes()
            .map(|(id, node)| (id.clone(), node.clone()))
            .collect();
        let template = template.borrow().current();

        ReplayReport {
            history: history.state(),
            undo: history.undo_descriptions(usize::MAX),
            redo: history.redo_descriptions(usize::MAX),
            pending,
            saved,
            template,
            preview,
        }
    }
}

fn log_outcome(index: usize, action: &str, outcome: HistoryOutcome) {
    match outcome {
        HistoryOutcome::Applied(description) => info!(step = index, action, description = %description, "applied"),
        HistoryOutcome::Discarded(description) => warn!(step = index, action, description = %description, "entry discarded"),
        HistoryOutcome::Failed(e) => warn!(step = index, action, error = %e, "failed"),
        HistoryOutcome::Skipped => info!(step = index, action, "nothing to do"),
    }
}
