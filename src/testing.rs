//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::context::{EditorContext, InMemoryTemplate, Shared, TemplateSource};
use crate::pending::{ElementId, PendingChangeStore};
use crate::preview::{HeadlessNode, HeadlessSurface, PreviewSurface};

pub struct Fixture {
    pub surface: Shared<HeadlessSurface>,
    pub template: Shared<InMemoryTemplate>,
    pub pending: Shared<PendingChangeStore>,
    pub ctx: EditorContext,
}

impl Fixture {
    pub fn new() -> Self {
        let mut surface = HeadlessSurface::new();
        surface.insert(
            "title",
            HeadlessNode::new("h1")
                .with_text("Welcome")
                .with_style("color", "red")
                .with_style("font-size", "12px"),
        );
        surface.insert(
            "card",
            HeadlessNode::new("div").with_text("Hi ").with_child("name"),
        );
        surface.insert("name", HeadlessNode::new("strong").with_text("Ada"));
        surface.insert("logo", HeadlessNode::new("img").with_attribute("src", "/old.png"));
        surface.insert("link", HeadlessNode::new("a").with_attribute("href", "/home"));

        let template = InMemoryTemplate::new(TemplateSource::new("A", BTreeMap::new()));
        Self::with_parts(surface, template)
    }

    pub fn with_parts(surface: HeadlessSurface, template: InMemoryTemplate) -> Self {
        let surface = Rc::new(RefCell::new(surface));
        let template = Rc::new(RefCell::new(template));
        let pending = Rc::new(RefCell::new(PendingChangeStore::new()));
        let ctx = EditorContext::new(template.clone(), surface.clone(), pending.clone());
        Self { surface, template, pending, ctx }
    }

    /// Serialized pre-edit snapshot of an element, as a recorder would capture it
    pub fn snapshot(&self, id: &str) -> String {
        self.surface
            .borrow()
            .snapshot(&ElementId::new(id))
            .map(|s| s.to_json())
            .unwrap_or_default()
    }

    pub fn style(&self, id: &str, name: &str) -> Option<String> {
        self.surface.borrow().style(&ElementId::new(id), name).map(str::to_string)
    }

    pub fn text(&self, id: &str) -> String {
        self.surface.borrow().text_content(&ElementId::new(id))
    }

    pub fn code(&self) -> String {
        use crate::context::TemplateActions;
        self.template.borrow().current().code
    }
}

pub fn id(s: &str) -> ElementId {
    ElementId::new(s)
}
