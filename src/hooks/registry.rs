//! Hook registration and ordered execution.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::ScriptingConfig;
use crate::hooks::{Hook, HookError, HookPoint, RequestContext, ScriptHook};

/// Maps each extension point to its ordered list of hooks.
pub struct HookRegistry {
    hooks: RwLock<HashMap<HookPoint, Vec<Arc<dyn Hook>>>>,
    scripting: ScriptingConfig,
}

impl HookRegistry {
    /// Create an empty registry. Script hooks it builds use `scripting` limits.
    pub fn new(scripting: ScriptingConfig) -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
            scripting,
        }
    }

    /// Append a hook to `point`.
    pub fn register(&self, point: HookPoint, hook: impl Hook + 'static) {
        self.register_shared(point, Arc::new(hook));
    }

    /// Append an already shared hook to `point`.
    pub fn register_shared(&self, point: HookPoint, hook: Arc<dyn Hook>) {
        let mut hooks = self.hooks.write();
        let list = hooks.entry(point).or_default();
        list.push(hook);
        tracing::debug!(hook_point = %point, count = list.len(), "Hook registered");
    }

    /// Append a script hook built from source text.
    pub fn register_from_source(&self, point: HookPoint, source: &str) -> Result<(), HookError> {
        let hook = ScriptHook::new(source, &self.scripting)?;
        self.register(point, hook);
        Ok(())
    }

    /// Append a script hook loaded from a file.
    pub fn register_from_file(&self, point: HookPoint, path: &Path) -> Result<(), HookError> {
        let hook = ScriptHook::from_file(path, &self.scripting)?;
        tracing::info!(hook_point = %point, path = %path.display(), "Script hook loaded");
        self.register(point, hook);
        Ok(())
    }

    /// Replace every hook at `point` with a single script hook.
    ///
    /// The script is compiled before the swap, so a broken script leaves the
    /// existing hooks in place.
    pub fn replace_all(&self, point: HookPoint, source: &str) -> Result<(), HookError> {
        let hook: Arc<dyn Hook> = Arc::new(ScriptHook::new(source, &self.scripting)?);
        self.hooks.write().insert(point, vec![hook]);
        tracing::info!(hook_point = %point, "Hooks replaced");
        Ok(())
    }

    /// Remove every hook at `point`.
    pub fn clear(&self, point: HookPoint) {
        self.hooks.write().remove(&point);
        tracing::info!(hook_point = %point, "Hooks cleared");
    }

    pub fn hook_count(&self, point: HookPoint) -> usize {
        self.hooks.read().get(&point).map_or(0, Vec::len)
    }

    /// Hook counts for every point, in pipeline order.
    pub fn snapshot(&self) -> Vec<(HookPoint, usize)> {
        let hooks = self.hooks.read();
        HookPoint::ALL
            .into_iter()
            .map(|point| (point, hooks.get(&point).map_or(0, Vec::len)))
            .collect()
    }

    /// Run every hook at `point` in registration order, stopping at the
    /// first failure.
    ///
    /// The hook list is copied out of the lock first, so registry writes
    /// never wait on script execution.
    pub fn execute(&self, point: HookPoint, ctx: &mut RequestContext) -> Result<(), HookError> {
        let hooks = match self.hooks.read().get(&point) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => return Ok(()),
        };

        for (index, hook) in hooks.iter().enumerate() {
            if let Err(e) = hook.execute(ctx) {
                tracing::warn!(hook_point = %point, index, error = %e, "Hook failed");
                return Err(e);
            }
        }
        tracing::trace!(hook_point = %point, count = hooks.len(), "Hooks executed");
        Ok(())
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new(ScriptingConfig::default())
    }
}
