use super::SubmissionContext;
use crate::error::{HookError, PipelineError};
use crate::types::FlatEntrySet;
use std::fmt;

/// Name of the post-merge hook point on download
pub const ON_CONTENT_FIELD_PROCESS: &str = "on_content_field_process";

type FieldHook =
    Box<dyn Fn(&SubmissionContext, FlatEntrySet) -> Result<FlatEntrySet, HookError> + Send + Sync>;

/// Callbacks that may rewrite the merged entries before they are rebuilt
///
/// Hooks run in registration order, each receiving the previous one's output.
#[derive(Default)]
pub struct FieldProcessHooks {
    hooks: Vec<FieldHook>,
}

impl FieldProcessHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, hook: F)
    where
        F: Fn(&SubmissionContext, FlatEntrySet) -> Result<FlatEntrySet, HookError> + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn apply(&self, ctx: &SubmissionContext, entries: FlatEntrySet) -> Result<FlatEntrySet, PipelineError> {
        self.hooks.iter().try_fold(entries, |entries, hook| {
            hook(ctx, entries).map_err(PipelineError::hook(ON_CONTENT_FIELD_PROCESS))
        })
    }
}

impl fmt::Debug for FieldProcessHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldProcessHooks")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
