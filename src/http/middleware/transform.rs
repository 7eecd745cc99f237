//! Before/After hook pairs around the request and response rewrites.
//!
//! The template rewrite itself is run by the orchestrator, and only for
//! routes that declare one.

use std::sync::Arc;

use crate::hooks::{HookPoint, HookRegistry, RequestContext};
use crate::http::error::GatewayError;

pub struct TransformStage {
    hooks: Arc<HookRegistry>,
}

impl TransformStage {
    pub fn new(hooks: Arc<HookRegistry>) -> Self {
        Self { hooks }
    }

    pub fn request(&self, ctx: &mut RequestContext) -> Result<(), GatewayError> {
        self.run_pair(
            ctx,
            HookPoint::BeforeRequestTransform,
            HookPoint::AfterRequestTransform,
        )
    }

    pub fn response(&self, ctx: &mut RequestContext) -> Result<(), GatewayError> {
        self.run_pair(
            ctx,
            HookPoint::BeforeResponseTransform,
            HookPoint::AfterResponseTransform,
        )
    }

    fn run_pair(
        &self,
        ctx: &mut RequestContext,
        before: HookPoint,
        after: HookPoint,
    ) -> Result<(), GatewayError> {
        for point in [before, after] {
            self.hooks
                .execute(point, ctx)
                .map_err(|e| GatewayError::hook(point, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{from_fn, HookError};
    use serde_json::json;

    fn record(hooks: &HookRegistry, point: HookPoint) {
        hooks.register(point, from_fn(move |ctx: &mut RequestContext| {
            let seen = ctx.data.entry("seen").or_insert_with(|| json!([]));
            if let Some(list) = seen.as_array_mut() {
                list.push(json!(point.as_str()));
            }
            Ok(())
        }));
    }

    #[test]
    fn test_pairs_run_in_order() {
        let hooks = Arc::new(HookRegistry::default());
        for point in HookPoint::ALL {
            record(&hooks, point);
        }
        let stage = TransformStage::new(hooks);

        let mut ctx = RequestContext::new();
        stage.request(&mut ctx).unwrap();
        stage.response(&mut ctx).unwrap();
        assert_eq!(
            ctx.data["seen"],
            json!([
                "BeforeRequestTransform",
                "AfterRequestTransform",
                "BeforeResponseTransform",
                "AfterResponseTransform"
            ])
        );
    }

    #[test]
    fn test_before_failure_skips_after() {
        let hooks = Arc::new(HookRegistry::default());
        hooks.register(HookPoint::BeforeResponseTransform, from_fn(|_: &mut RequestContext| {
            Err(HookError::Native("nope".into()))
        }));
        record(&hooks, HookPoint::AfterResponseTransform);
        let stage = TransformStage::new(hooks);

        let mut ctx = RequestContext::new();
        let err = stage.response(&mut ctx).unwrap_err();
        assert!(matches!(err, GatewayError::Hook { point: HookPoint::BeforeResponseTransform, .. }));
        assert!(!ctx.data.contains_key("seen"));
    }
}
