use tracing::{debug, warn};

use super::{Command, CommandKind, CommandMetadata, CommandResult};
use crate::context::EditorContext;
use crate::pending::{ElementId, ElementUpdates};
use crate::preview::ElementSnapshot;
use crate::property::{camel_to_kebab, PropertyPath};

/// Change of one property on one element
#[derive(Debug, Clone)]
pub struct PropertyUpdateCommand {
    pub element_id: ElementId,
    pub property: String,
    pub old_value: String,
    pub new_value: String,
    /// Serialized element before this editing session, empty if unknown
    pub element_snapshot: String,
    path: PropertyPath,
    metadata: CommandMetadata,
}

impl PropertyUpdateCommand {
    pub fn new(
        element_id: ElementId,
        property: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        element_snapshot: &str,
    ) -> Self {
        let property = property.into();
        let path = PropertyPath::parse(&property);

        let element_snapshot = if element_snapshot.is_empty()
            || ElementSnapshot::parse(element_snapshot).is_some()
        {
            element_snapshot.to_string()
        } else {
            warn!(element_id = %element_id, "unreadable element snapshot, recording without one");
            String::new()
        };

        let description = format!("Change {} on {}", property, element_id);
        Self {
            element_id,
            property,
            old_value: old_value.into(),
            new_value: new_value.into(),
            element_snapshot,
            path,
            metadata: CommandMetadata::new(CommandKind::Property, description),
        }
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    /// Value this property had before the session started
    fn original_value(&self, ctx: &EditorContext) -> String {
        let pending = ctx.editor_mode.borrow();
        let raw = pending
            .get_for_element(&self.element_id)
            .map(|entry| entry.original_element.as_str())
            .filter(|raw| !raw.is_empty())
            .unwrap_or(self.element_snapshot.as_str());

        ElementSnapshot::parse(raw)
            .map(|snap| snap.value_of(&self.path).to_string())
            .unwrap_or_default()
    }
}

impl Command for PropertyUpdateCommand {
    fn execute(&self, ctx: &EditorContext) -> CommandResult {
        apply_property_value(
            ctx,
            &self.element_id,
            &self.path,
            &self.new_value,
            &self.element_snapshot,
        )?;
        Ok(())
    }

    fn undo(&self, ctx: &EditorContext) -> CommandResult {
        let original = self.original_value(ctx);
        let applied = apply_property_value(
            ctx,
            &self.element_id,
            &self.path,
            &self.old_value,
            &self.element_snapshot,
        )?;

        // back at the pre-session value, nothing left to persist for this key
        if applied && self.old_value == original {
            ctx.editor_mode.borrow_mut().remove_key(&self.element_id, &self.path);
        }
        Ok(())
    }

    fn can_execute(&self, ctx: &EditorContext) -> bool {
        ctx.editor_mode.borrow().contains(&self.element_id)
            || ctx.canvas.borrow().contains(&self.element_id)
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }
}

/// Write `value` to the preview element and record it as pending.
///
/// Returns `Ok(false)` without touching anything when the element is not
/// in the preview.
pub fn apply_property_value(
    ctx: &EditorContext,
    element_id: &ElementId,
    path: &PropertyPath,
    value: &str,
    element_snapshot: &str,
) -> Result<bool, super::CommandError> {
    {
        let mut canvas = ctx.canvas.borrow_mut();
        let Some(element) = canvas.locate(element_id) else {
            debug!(element_id = %element_id, property = %path, "element not in preview, skipping");
            return Ok(false);
        };

        match path {
            PropertyPath::Style(name) => {
                canvas.set_style_property(element_id, &camel_to_kebab(name), value)?;
            }
            PropertyPath::Content => {
                if !element.has_text_child {
                    debug!(
                        element_id = %element_id,
                        tag = %element.tag_name,
                        "no text node, content replaces every child"
                    );
                }
                canvas.set_text(element_id, value)?;
            }
            PropertyPath::Attribute(name) => {
                if PropertyPath::attribute_allowed(name, &element.tag_name) {
                    canvas.set_attribute(element_id, name, value)?;
                } else {
                    warn!(
                        element_id = %element_id,
                        tag = %element.tag_name,
                        attribute = %name,
                        "attribute not writable on this element, preview left unchanged"
                    );
                }
            }
        }
    }

    let snapshot = (!element_snapshot.is_empty()).then_some(element_snapshot);
    ctx.editor_mode
        .borrow_mut()
        .set_for_element(element_id, ElementUpdates::for_path(path, value), snapshot);
    Ok(true)
}
