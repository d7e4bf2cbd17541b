use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::property::PropertyPath;

/// Stable identifier of one addressable node in the live preview
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Accumulated edits for one element.
///
/// `content` overwrites; `styles` and `attributes` merge key by key.
/// Empty maps are never kept, they collapse to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
}

impl ElementUpdates {
    pub fn content(value: impl Into<String>) -> Self {
        Self { content: Some(value.into()), ..Default::default() }
    }

    pub fn style(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            styles: Some(BTreeMap::from([(name.into(), value.into())])),
            ..Default::default()
        }
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attributes: Some(BTreeMap::from([(name.into(), value.into())])),
            ..Default::default()
        }
    }

    /// Single-key update for a parsed property path
    pub fn for_path(path: &PropertyPath, value: impl Into<String>) -> Self {
        match path {
            PropertyPath::Style(name) => Self::style(name.clone(), value),
            PropertyPath::Content => Self::content(value),
            PropertyPath::Attribute(name) => Self::attribute(name.clone(), value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.styles.is_none() && self.attributes.is_none()
    }

    /// Merge `other` into `self`, later writes win per key
    pub fn merge(&mut self, other: ElementUpdates) {
        if other.content.is_some() {
            self.content = other.content;
        }
        merge_map(&mut self.styles, other.styles);
        merge_map(&mut self.attributes, other.attributes);
    }

    /// Current value recorded for a path, if any
    pub fn get(&self, path: &PropertyPath) -> Option<&str> {
        match path {
            PropertyPath::Style(name) => self.styles.as_ref()?.get(name).map(String::as_str),
            PropertyPath::Content => self.content.as_deref(),
            PropertyPath::Attribute(name) => {
                self.attributes.as_ref()?.get(name).map(String::as_str)
            }
        }
    }

    /// Drop a single key, collapsing emptied maps
    pub fn remove(&mut self, path: &PropertyPath) {
        match path {
            PropertyPath::Style(name) => remove_from_map(&mut self.styles, name),
            PropertyPath::Content => self.content = None,
            PropertyPath::Attribute(name) => remove_from_map(&mut self.attributes, name),
        }
    }
}

fn merge_map(
    target: &mut Option<BTreeMap<String, String>>,
    incoming: Option<BTreeMap<String, String>>,
) {
    if let Some(incoming) = incoming {
        target.get_or_insert_with(BTreeMap::new).extend(incoming);
    }
    if target.as_ref().is_some_and(BTreeMap::is_empty) {
        *target = None;
    }
}

fn remove_from_map(target: &mut Option<BTreeMap<String, String>>, key: &str) {
    if let Some(map) = target {
        map.remove(key);
        if map.is_empty() {
            *target = None;
        }
    }
}

/// Not-yet-persisted edits for one element plus its pre-session snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingElementChanges {
    pub element_id: ElementId,
    pub updates: ElementUpdates,
    /// Serialized element as it was before the first edit this session
    pub original_element: String,
}

pub type PendingChangesMap = HashMap<ElementId, PendingElementChanges>;

/// Per-element accumulator of pending edits
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingChangeStore {
    entries: PendingChangesMap,
}

impl PendingChangeStore {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Merge updates into the element's entry, creating it if needed.
    /// The first snapshot seen for an element is the one kept.
    pub fn set_for_element(
        &mut self,
        element_id: &ElementId,
        updates: ElementUpdates,
        original_element: Option<&str>,
    ) {
        match self.entries.get_mut(element_id) {
            Some(entry) => {
                entry.updates.merge(updates);
                if entry.original_element.is_empty() {
                    if let Some(original) = original_element {
                        entry.original_element = original.to_string();
                    }
                }
            }
            None => {
                let mut merged = ElementUpdates::default();
                merged.merge(updates);
                self.entries.insert(
                    element_id.clone(),
                    PendingElementChanges {
                        element_id: element_id.clone(),
                        updates: merged,
                        original_element: original_element.unwrap_or_default().to_string(),
                    },
                );
            }
        }
    }

    pub fn get_for_element(&self, element_id: &ElementId) -> Option<&PendingElementChanges> {
        self.entries.get(element_id)
    }

    pub fn has_any(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn contains(&self, element_id: &ElementId) -> bool {
        self.entries.contains_key(element_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop one key from an element's entry; the entry goes away once it
    /// carries no edits at all
    pub fn remove_key(&mut self, element_id: &ElementId, path: &PropertyPath) {
        let Some(entry) = self.entries.get_mut(element_id) else {
            return;
        };
        entry.updates.remove(path);
        if entry.updates.is_empty() {
            self.entries.remove(element_id);
        }
    }

    pub fn clear_element(&mut self, element_id: &ElementId) {
        self.entries.remove(element_id);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Hand the whole map to a save collaborator, leaving the store empty
    pub fn take_all(&mut self) -> PendingChangesMap {
        std::mem::take(&mut self.entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingElementChanges> {
        self.entries.values()
    }
}
