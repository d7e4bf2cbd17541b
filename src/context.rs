use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::pending::PendingChangeStore;
use crate::preview::PreviewSurface;

pub type StyleMap = BTreeMap<String, String>;

/// Whole-document source: template code plus its style dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSource {
    pub code: String,
    #[serde(default)]
    pub styles: StyleMap,
}

impl TemplateSource {
    pub fn new(code: impl Into<String>, styles: StyleMap) -> Self {
        Self { code: code.into(), styles }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError(pub String);

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template update failed: {}", self.0)
    }
}

impl std::error::Error for TemplateError {}

/// Owner of the document source
pub trait TemplateActions {
    /// Atomically replace code and styles
    fn update_template(&mut self, source: &TemplateSource) -> Result<(), TemplateError>;

    fn current(&self) -> TemplateSource;
}

/// Keeps the source in memory along with every write it received
#[derive(Debug, Default)]
pub struct InMemoryTemplate {
    source: TemplateSource,
    writes: usize,
}

impl InMemoryTemplate {
    pub fn new(source: TemplateSource) -> Self {
        Self { source, writes: 0 }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl TemplateActions for InMemoryTemplate {
    fn update_template(&mut self, source: &TemplateSource) -> Result<(), TemplateError> {
        self.source = source.clone();
        self.writes += 1;
        Ok(())
    }

    fn current(&self) -> TemplateSource {
        self.source.clone()
    }
}

pub type Shared<T> = Rc<RefCell<T>>;

/// Handles into the three subsystems commands act upon.
///
/// Cloning copies the handles, not the subsystems.
#[derive(Clone)]
pub struct EditorContext {
    pub template: Shared<dyn TemplateActions>,
    pub canvas: Shared<dyn PreviewSurface>,
    pub editor_mode: Shared<PendingChangeStore>,
}

impl EditorContext {
    pub fn new(
        template: Shared<dyn TemplateActions>,
        canvas: Shared<dyn PreviewSurface>,
        editor_mode: Shared<PendingChangeStore>,
    ) -> Self {
        Self { template, canvas, editor_mode }
    }
}

impl fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorContext")
            .field("pending_elements", &self.editor_mode.try_borrow().map(|s| s.len()).ok())
            .finish_non_exhaustive()
    }
}
