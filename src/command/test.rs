use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::*;
use crate::context::TemplateActions;
use crate::pending::ElementUpdates;
use crate::preview::{HeadlessNode, NodeChild};
use crate::testing::{id, Fixture};

fn style_cmd(fx: &Fixture, el: &str, prop: &str, old: &str, new: &str) -> PropertyUpdateCommand {
    PropertyUpdateCommand::new(id(el), prop, old, new, &fx.snapshot(el))
}

// === PropertyUpdateCommand ===

#[test]
fn test_style_execute_writes_preview_and_pending() {
    let fx = Fixture::new();
    let cmd = style_cmd(&fx, "title", "style.fontSize", "12px", "14px");

    cmd.execute(&fx.ctx).unwrap();

    assert_eq!(fx.style("title", "font-size").as_deref(), Some("14px"));
    let pending = fx.pending.borrow();
    let entry = pending.get_for_element(&id("title")).unwrap();
    assert_eq!(entry.updates, ElementUpdates::style("fontSize", "14px"));
    assert!(!entry.original_element.is_empty());
}

#[test]
fn test_style_undo_to_original_clears_pending() {
    let fx = Fixture::new();
    let cmd = style_cmd(&fx, "title", "style.color", "red", "blue");

    cmd.execute(&fx.ctx).unwrap();
    assert_eq!(fx.style("title", "color").as_deref(), Some("blue"));

    cmd.undo(&fx.ctx).unwrap();
    assert_eq!(fx.style("title", "color").as_deref(), Some("red"));
    assert!(!fx.pending.borrow().has_any());
}

#[test]
fn test_undo_to_intermediate_value_stays_pending() {
    let fx = Fixture::new();
    let snap = fx.snapshot("title");
    let first = PropertyUpdateCommand::new(id("title"), "style.color", "red", "blue", &snap);
    let second = PropertyUpdateCommand::new(id("title"), "style.color", "blue", "green", &snap);

    first.execute(&fx.ctx).unwrap();
    second.execute(&fx.ctx).unwrap();
    second.undo(&fx.ctx).unwrap();

    assert_eq!(fx.style("title", "color").as_deref(), Some("blue"));
    let pending = fx.pending.borrow();
    assert_eq!(
        pending.get_for_element(&id("title")).unwrap().updates,
        ElementUpdates::style("color", "blue")
    );
}

#[test]
fn test_content_preserves_child_elements() {
    let fx = Fixture::new();
    let cmd = PropertyUpdateCommand::new(id("card"), "content", "Hi ", "Hello ", &fx.snapshot("card"));

    cmd.execute(&fx.ctx).unwrap();
    assert_eq!(fx.text("card"), "Hello Ada");

    cmd.undo(&fx.ctx).unwrap();
    assert_eq!(fx.text("card"), "Hi Ada");
    assert!(!fx.pending.borrow().has_any());
}

#[test]
fn test_whitelisted_attribute_written() {
    let fx = Fixture::new();
    let cmd = PropertyUpdateCommand::new(id("logo"), "src", "/old.png", "/new.png", &fx.snapshot("logo"));

    cmd.execute(&fx.ctx).unwrap();
    assert_eq!(fx.surface.borrow().attribute(&id("logo"), "src"), Some("/new.png"));
}

#[test]
fn test_non_whitelisted_attribute_only_pending() {
    let fx = Fixture::new();
    let cmd = PropertyUpdateCommand::new(id("link"), "src", "", "/x.png", &fx.snapshot("link"));

    cmd.execute(&fx.ctx).unwrap();

    assert_eq!(fx.surface.borrow().attribute(&id("link"), "src"), None);
    let pending = fx.pending.borrow();
    assert_eq!(
        pending.get_for_element(&id("link")).unwrap().updates,
        ElementUpdates::attribute("src", "/x.png")
    );
}

#[test]
fn test_missing_element_is_silent_noop() {
    let fx = Fixture::new();
    let cmd = PropertyUpdateCommand::new(id("ghost"), "style.color", "red", "blue", "");

    assert!(cmd.execute(&fx.ctx).is_ok());
    assert!(cmd.undo(&fx.ctx).is_ok());
    assert!(!fx.pending.borrow().has_any());
    assert!(!cmd.can_execute(&fx.ctx));
}

#[test]
fn test_can_execute_when_only_pending_tracks_element() {
    let fx = Fixture::new();
    fx.pending
        .borrow_mut()
        .set_for_element(&id("ghost"), ElementUpdates::content("x"), None);
    let cmd = PropertyUpdateCommand::new(id("ghost"), "content", "", "x", "");

    assert!(cmd.can_execute(&fx.ctx));
}

#[test]
fn test_malformed_snapshot_falls_back_to_empty() {
    let fx = Fixture::new();
    let cmd = PropertyUpdateCommand::new(id("title"), "style.fontWeight", "", "bold", "<h1>not json");
    assert_eq!(cmd.element_snapshot, "");

    cmd.execute(&fx.ctx).unwrap();
    assert_eq!(fx.pending.borrow().get_for_element(&id("title")).unwrap().original_element, "");

    // original reads as empty, so restoring "" clears the entry
    cmd.undo(&fx.ctx).unwrap();
    assert_eq!(fx.style("title", "font-weight"), None);
    assert!(!fx.pending.borrow().has_any());
}

#[test]
fn test_description_and_kind() {
    let fx = Fixture::new();
    let cmd = style_cmd(&fx, "title", "style.color", "red", "blue");
    assert_eq!(cmd.kind(), CommandKind::Property);
    assert_eq!(cmd.description(), "Change style.color on title");
}

#[test]
fn test_content_undo_without_text_node_flattens_children() {
    let fx = Fixture::new();
    fx.surface
        .borrow_mut()
        .insert("wrap", HeadlessNode::new("section").with_child("name"));
    let cmd = PropertyUpdateCommand::new(id("wrap"), "content", "Ada", "Bye", &fx.snapshot("wrap"));

    cmd.execute(&fx.ctx).unwrap();
    assert_eq!(
        fx.surface.borrow().node(&id("wrap")).unwrap().children,
        vec![NodeChild::Text("Bye".to_string())]
    );

    // the text comes back, the child element does not
    cmd.undo(&fx.ctx).unwrap();
    assert_eq!(fx.text("wrap"), "Ada");
    assert_eq!(
        fx.surface.borrow().node(&id("wrap")).unwrap().children,
        vec![NodeChild::Text("Ada".to_string())]
    );
    assert!(!fx.pending.borrow().has_any());
}

#[test]
fn test_content_undo_on_empty_element_leaves_empty_text() {
    let fx = Fixture::new();
    fx.surface.borrow_mut().insert("para", HeadlessNode::new("p"));
    let cmd = PropertyUpdateCommand::new(id("para"), "content", "", "x", &fx.snapshot("para"));

    cmd.execute(&fx.ctx).unwrap();
    cmd.undo(&fx.ctx).unwrap();

    assert_eq!(
        fx.surface.borrow().node(&id("para")).unwrap().children,
        vec![NodeChild::Text(String::new())]
    );
    assert!(!fx.pending.borrow().has_any());
}

// === CodeUpdateCommand ===

#[test]
fn test_code_execute_and_undo() {
    let fx = Fixture::new();
    let new_styles = BTreeMap::from([("body".to_string(), "margin: 0".to_string())]);
    let cmd = CodeUpdateCommand::new("A", "B", BTreeMap::new(), new_styles.clone());

    assert!(cmd.can_execute(&fx.ctx));
    cmd.execute(&fx.ctx).unwrap();
    assert_eq!(fx.code(), "B");
    assert_eq!(fx.template.borrow().current().styles, new_styles);

    cmd.undo(&fx.ctx).unwrap();
    assert_eq!(fx.code(), "A");
    assert!(fx.template.borrow().current().styles.is_empty());
    assert_eq!(fx.template.borrow().writes(), 2);
    assert_eq!(cmd.kind(), CommandKind::Code);
}

// === MacroCommand ===

/// Records every call into a shared log
struct Probe {
    name: &'static str,
    log: Rc<RefCell<Vec<String>>>,
    executable: bool,
    fail_execute: bool,
    fail_undo: bool,
    metadata: CommandMetadata,
}

impl Probe {
    fn boxed(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<dyn Command> {
        Box::new(Self::new(name, log))
    }

    fn new(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            name,
            log: log.clone(),
            executable: true,
            fail_execute: false,
            fail_undo: false,
            metadata: CommandMetadata::new(CommandKind::Property, name),
        }
    }
}

impl Command for Probe {
    fn execute(&self, _ctx: &EditorContext) -> CommandResult {
        if self.fail_execute {
            return Err(CommandError::Other(format!("{} failed", self.name)));
        }
        self.log.borrow_mut().push(format!("exec {}", self.name));
        Ok(())
    }

    fn undo(&self, _ctx: &EditorContext) -> CommandResult {
        if self.fail_undo {
            return Err(CommandError::Other(format!("{} undo failed", self.name)));
        }
        self.log.borrow_mut().push(format!("undo {}", self.name));
        Ok(())
    }

    fn can_execute(&self, _ctx: &EditorContext) -> bool {
        self.executable
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }
}

#[test]
fn test_macro_order() {
    let fx = Fixture::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let cmd = MacroCommand::new(
        vec![Probe::boxed("a", &log), Probe::boxed("b", &log), Probe::boxed("c", &log)],
        None,
    );

    cmd.execute(&fx.ctx).unwrap();
    cmd.undo(&fx.ctx).unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["exec a", "exec b", "exec c", "undo c", "undo b", "undo a"]
    );
    assert_eq!(cmd.description(), "Batch edit (3)");
    assert_eq!(cmd.kind(), CommandKind::Macro);
}

#[test]
fn test_macro_skips_unexecutable_but_undoes_all() {
    let fx = Fixture::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut gone = Probe::new("b", &log);
    gone.executable = false;
    let cmd = MacroCommand::new(
        vec![Probe::boxed("a", &log), Box::new(gone), Probe::boxed("c", &log)],
        Some("Restyle".to_string()),
    );

    assert!(!cmd.can_execute(&fx.ctx));
    cmd.execute(&fx.ctx).unwrap();
    cmd.undo(&fx.ctx).unwrap();

    assert_eq!(*log.borrow(), vec!["exec a", "exec c", "undo c", "undo b", "undo a"]);
    assert_eq!(cmd.description(), "Restyle");
}

#[test]
fn test_macro_failure_rolls_back() {
    let fx = Fixture::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut broken = Probe::new("c", &log);
    broken.fail_execute = true;
    let cmd = MacroCommand::new(
        vec![Probe::boxed("a", &log), Probe::boxed("b", &log), Box::new(broken)],
        None,
    );

    let err = cmd.execute(&fx.ctx).unwrap_err();
    assert_eq!(err, CommandError::Other("c failed".to_string()));
    assert_eq!(*log.borrow(), vec!["exec a", "exec b", "undo b", "undo a"]);
}

#[test]
fn test_macro_undo_continues_past_failure() {
    let fx = Fixture::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut stuck = Probe::new("b", &log);
    stuck.fail_undo = true;
    let cmd = MacroCommand::new(
        vec![Probe::boxed("a", &log), Box::new(stuck), Probe::boxed("c", &log)],
        None,
    );

    cmd.execute(&fx.ctx).unwrap();
    let err = cmd.undo(&fx.ctx).unwrap_err();
    assert_eq!(err, CommandError::Other("b undo failed".to_string()));
    assert_eq!(*log.borrow(), vec!["exec a", "exec b", "exec c", "undo c", "undo a"]);
}

#[test]
fn test_macro_of_property_edits_round_trip() {
    let fx = Fixture::new();
    let before = fx.surface.borrow().clone();
    let cmd = MacroCommand::new(
        vec![
            Box::new(style_cmd(&fx, "title", "style.color", "red", "blue")),
            Box::new(style_cmd(&fx, "title", "style.fontSize", "12px", "20px")),
            Box::new(style_cmd(&fx, "name", "content", "Ada", "Grace")),
        ],
        None,
    );

    cmd.execute(&fx.ctx).unwrap();
    assert_eq!(fx.style("title", "color").as_deref(), Some("blue"));
    assert_eq!(fx.text("card"), "Hi Grace");
    assert_eq!(fx.pending.borrow().len(), 2);

    cmd.undo(&fx.ctx).unwrap();
    assert_eq!(*fx.surface.borrow(), before);
    assert!(!fx.pending.borrow().has_any());
}
