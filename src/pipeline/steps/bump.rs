//! Final step: promote the configuration to staging.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::pipeline::{Step, SyncContext};

/// Deploys the proxy configuration, bumping its version.
#[derive(Debug, Default)]
pub struct BumpProxyVersionStep;

#[async_trait]
impl Step for BumpProxyVersionStep {
    fn name(&self) -> &'static str {
        "bump proxy version"
    }

    async fn execute(&self, context: &mut SyncContext) -> Result<()> {
        let mut proxy = context.target()?.proxy();
        let attrs = proxy.deploy().await?;
        let version = attrs.get("version").map_or_else(String::new, Value::to_string);
        info!(
            "Deployed proxy of service {} (version {version})",
            proxy.service_id()
        );
        Ok(())
    }
}
