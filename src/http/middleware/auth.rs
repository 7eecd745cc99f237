//! Bearer token check between the BeforeAuth and AfterAuth hooks.

use std::sync::Arc;

use crate::hooks::{HookPoint, HookRegistry, RequestContext};
use crate::http::error::GatewayError;

pub struct AuthStage {
    hooks: Arc<HookRegistry>,
    expected: String,
}

impl AuthStage {
    pub fn new(hooks: Arc<HookRegistry>, token: &str) -> Self {
        Self {
            hooks,
            expected: format!("Bearer {token}"),
        }
    }

    /// BeforeAuth hooks, then the token check, then AfterAuth hooks.
    ///
    /// `authorization` is the header as received from the client. Hooks may
    /// rewrite the context copy, but never the credential that is checked.
    pub fn run(&self, authorization: Option<&str>, ctx: &mut RequestContext) -> Result<(), GatewayError> {
        self.hooks
            .execute(HookPoint::BeforeAuth, ctx)
            .map_err(|e| GatewayError::hook(HookPoint::BeforeAuth, e))?;

        if authorization != Some(self.expected.as_str()) {
            tracing::warn!("Rejected request with missing or invalid bearer token");
            return Err(GatewayError::AuthenticationFailed);
        }

        self.hooks
            .execute(HookPoint::AfterAuth, ctx)
            .map_err(|e| GatewayError::hook(HookPoint::AfterAuth, e))
    }
}
