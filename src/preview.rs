use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::pending::ElementId;
use crate::property::{camel_to_kebab, PropertyPath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    /// Element disappeared between lookup and write
    Detached(ElementId),
    Rejected(String),
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewError::Detached(id) => write!(f, "element '{}' is no longer in the preview", id),
            PreviewError::Rejected(msg) => write!(f, "preview rejected write: {}", msg),
        }
    }
}

impl std::error::Error for PreviewError {}

/// What a lookup tells the command layer about an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedElement {
    pub tag_name: String,
    pub has_text_child: bool,
}

/// Serialized form of an element, stored as the pending entry's original
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag_name: String,
    #[serde(default)]
    pub text: String,
    /// Inline styles keyed by CSS (kebab-case) name
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// `None` on anything that isn't a serialized snapshot
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Value a property had in this snapshot; missing keys read as empty
    pub fn value_of(&self, path: &PropertyPath) -> &str {
        let found = match path {
            PropertyPath::Style(name) => self.styles.get(&camel_to_kebab(name)),
            PropertyPath::Content => Some(&self.text),
            PropertyPath::Attribute(name) => self.attributes.get(name),
        };
        found.map(String::as_str).unwrap_or("")
    }
}

/// The live, addressable rendering target commands write into
pub trait PreviewSurface {
    fn locate(&self, id: &ElementId) -> Option<LocatedElement>;

    /// `name` is a CSS (kebab-case) property name
    fn set_style_property(&mut self, id: &ElementId, name: &str, value: &str)
        -> Result<(), PreviewError>;

    /// Replace the first direct text child, or all content if there is none
    fn set_text(&mut self, id: &ElementId, text: &str) -> Result<(), PreviewError>;

    fn set_attribute(&mut self, id: &ElementId, name: &str, value: &str)
        -> Result<(), PreviewError>;

    fn snapshot(&self, id: &ElementId) -> Option<ElementSnapshot>;

    fn contains(&self, id: &ElementId) -> bool {
        self.locate(id).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeChild {
    Text(String),
    Element { element: ElementId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlessNode {
    pub tag: String,
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<NodeChild>,
}

impl HeadlessNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), ..Default::default() }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(NodeChild::Text(text.into()));
        self
    }

    pub fn with_child(mut self, id: impl Into<ElementId>) -> Self {
        self.children.push(NodeChild::Element { element: id.into() });
        self
    }

    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(name.into(), value.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    fn first_text(&self) -> Option<&str> {
        self.children.iter().find_map(|c| match c {
            NodeChild::Text(t) => Some(t.as_str()),
            NodeChild::Element { .. } => None,
        })
    }
}

/// In-memory preview tree, no rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlessSurface {
    nodes: HashMap<ElementId, HeadlessNode>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<ElementId>, node: HeadlessNode) {
        self.nodes.insert(id.into(), node);
    }

    pub fn remove(&mut self, id: &ElementId) -> Option<HeadlessNode> {
        self.nodes.remove(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&ElementId, &HeadlessNode)> {
        self.nodes.iter()
    }

    pub fn node(&self, id: &ElementId) -> Option<&HeadlessNode> {
        self.nodes.get(id)
    }

    pub fn style(&self, id: &ElementId, name: &str) -> Option<&str> {
        self.nodes.get(id)?.styles.get(name).map(String::as_str)
    }

    pub fn attribute(&self, id: &ElementId, name: &str) -> Option<&str> {
        self.nodes.get(id)?.attributes.get(name).map(String::as_str)
    }

    /// Concatenated text of the element and its descendants
    pub fn text_content(&self, id: &ElementId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out, 0);
        out
    }

    fn collect_text(&self, id: &ElementId, out: &mut String, depth: usize) {
        // guards against malformed cyclic trees
        if depth > 64 {
            return;
        }
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        for child in &node.children {
            match child {
                NodeChild::Text(t) => out.push_str(t),
                NodeChild::Element { element } => self.collect_text(element, out, depth + 1),
            }
        }
    }

    fn node_mut(&mut self, id: &ElementId) -> Result<&mut HeadlessNode, PreviewError> {
        self.nodes.get_mut(id).ok_or_else(|| PreviewError::Detached(id.clone()))
    }
}

impl PreviewSurface for HeadlessSurface {
    fn locate(&self, id: &ElementId) -> Option<LocatedElement> {
        self.nodes.get(id).map(|node| LocatedElement {
            tag_name: node.tag.clone(),
            has_text_child: node.first_text().is_some(),
        })
    }

    fn set_style_property(&mut self, id: &ElementId, name: &str, value: &str)
        -> Result<(), PreviewError> {
        let node = self.node_mut(id)?;
        if value.is_empty() {
            node.styles.remove(name);
        } else {
            node.styles.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn set_text(&mut self, id: &ElementId, text: &str) -> Result<(), PreviewError> {
        let node = self.node_mut(id)?;
        let first_text = node.children.iter_mut().find_map(|c| match c {
            NodeChild::Text(t) => Some(t),
            NodeChild::Element { .. } => None,
        });
        match first_text {
            Some(existing) => *existing = text.to_string(),
            None => node.children = vec![NodeChild::Text(text.to_string())],
        }
        Ok(())
    }

    fn set_attribute(&mut self, id: &ElementId, name: &str, value: &str)
        -> Result<(), PreviewError> {
        let node = self.node_mut(id)?;
        if value.is_empty() {
            node.attributes.remove(name);
        } else {
            node.attributes.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn snapshot(&self, id: &ElementId) -> Option<ElementSnapshot> {
        let node = self.nodes.get(id)?;
        let text = match node.first_text() {
            Some(t) => t.to_string(),
            None => self.text_content(id),
        };
        Some(ElementSnapshot {
            tag_name: node.tag.clone(),
            text,
            styles: node.styles.clone(),
            attributes: node.attributes.clone(),
        })
    }
}
