use super::{Command, CommandKind, CommandMetadata, CommandResult};
use crate::context::{EditorContext, StyleMap, TemplateSource};

/// Replaces the whole document source
#[derive(Debug, Clone)]
pub struct CodeUpdateCommand {
    pub old_source: TemplateSource,
    pub new_source: TemplateSource,
    metadata: CommandMetadata,
}

impl CodeUpdateCommand {
    pub fn new(
        old_code: impl Into<String>,
        new_code: impl Into<String>,
        old_styles: StyleMap,
        new_styles: StyleMap,
    ) -> Self {
        Self::from_sources(
            TemplateSource::new(old_code, old_styles),
            TemplateSource::new(new_code, new_styles),
        )
    }

    pub fn from_sources(old_source: TemplateSource, new_source: TemplateSource) -> Self {
        Self {
            old_source,
            new_source,
            metadata: CommandMetadata::new(CommandKind::Code, "Edit code"),
        }
    }
}

impl Command for CodeUpdateCommand {
    fn execute(&self, ctx: &EditorContext) -> CommandResult {
        ctx.template.borrow_mut().update_template(&self.new_source)?;
        Ok(())
    }

    fn undo(&self, ctx: &EditorContext) -> CommandResult {
        ctx.template.borrow_mut().update_template(&self.old_source)?;
        Ok(())
    }

    fn can_execute(&self, _ctx: &EditorContext) -> bool {
        true
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }
}
