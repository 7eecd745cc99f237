//! The single error-reporting funnel.

use std::sync::Arc;

use crate::hooks::{HookError, HookPoint, HookRegistry, RequestContext};

pub struct ErrorStage {
    hooks: Arc<HookRegistry>,
}

impl ErrorStage {
    pub fn new(hooks: Arc<HookRegistry>) -> Self {
        Self { hooks }
    }

    /// Run the OnError hooks against the context's current error.
    pub fn run(&self, ctx: &mut RequestContext) -> Result<(), HookError> {
        self.hooks.execute(HookPoint::OnError, ctx)
    }
}
