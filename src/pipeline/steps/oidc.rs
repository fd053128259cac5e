//! Step 7: OIDC flows of the target service.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::error::Result;
use crate::openapi::{OAuthFlow, SecurityKind};
use crate::pipeline::{Step, SyncContext};
use crate::remote::Attrs;

const OIDC_FLAGS: [OAuthFlow; 4] = [
    OAuthFlow::AuthorizationCode,
    OAuthFlow::Implicit,
    OAuthFlow::ClientCredentials,
    OAuthFlow::Password,
];

/// Enables exactly the OAuth2 flow the definition declares.
#[derive(Debug, Default)]
pub struct UpdateOidcStep;

/// OIDC configuration with only `flow` enabled.
#[must_use]
pub fn oidc_configuration(flow: Option<OAuthFlow>) -> Attrs {
    OIDC_FLAGS
        .iter()
        .map(|candidate| {
            (
                candidate.oidc_flag().to_string(),
                json!(Some(*candidate) == flow),
            )
        })
        .collect()
}

#[async_trait]
impl Step for UpdateOidcStep {
    fn name(&self) -> &'static str {
        "update oidc configuration"
    }

    async fn execute(&self, context: &mut SyncContext) -> Result<()> {
        let flow = match context.security().map(|security| &security.kind) {
            Some(SecurityKind::OAuth2 { flow }) => *flow,
            _ => {
                debug!("No OAuth2 security, skipping OIDC configuration");
                return Ok(());
            }
        };
        if context.options().oidc_issuer_endpoint.is_none() {
            debug!("No OIDC issuer endpoint, skipping OIDC configuration");
            return Ok(());
        }

        let proxy = context.target()?.proxy();
        proxy.update_oidc(&oidc_configuration(flow)).await?;
        info!(
            "Updated OIDC configuration of service {} (flow: {flow:?})",
            proxy.service_id()
        );
        Ok(())
    }
}
