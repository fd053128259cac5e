//! Step 1: find or create the target service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::entities::Service;
use crate::error::Result;
use crate::pipeline::{Step, SyncContext};
use crate::remote::Attrs;

/// Resolves the target service by system name, creating it when absent and
/// bringing its settings up to date otherwise.
#[derive(Debug, Default)]
pub struct CreateServiceStep;

/// Authentication mode of the service derived from the security scheme.
fn backend_version(context: &SyncContext) -> &'static str {
    match context.security() {
        Some(security) if security.is_oauth2() => "oidc",
        _ => "1",
    }
}

fn service_settings(context: &SyncContext, system_name: &str) -> Attrs {
    let spec = context.api_spec();
    let mut settings = Attrs::new();
    settings.insert("name".into(), json!(spec.title()));
    if let Some(description) = spec.description() {
        settings.insert("description".into(), json!(description));
    }
    settings.insert("system_name".into(), json!(system_name));
    settings.insert("backend_version".into(), json!(backend_version(context)));
    settings
}

#[async_trait]
impl Step for CreateServiceStep {
    fn name(&self) -> &'static str {
        "create service"
    }

    async fn execute(&self, context: &mut SyncContext) -> Result<()> {
        let system_name = context.target_system_name();
        let settings = service_settings(context, &system_name);
        let remote = Arc::clone(context.remote());

        let service = match Service::find_by_system_name(&remote, &system_name).await? {
            Some(mut service) => {
                if service.update(&settings).await? {
                    info!("Updated service {} ({system_name})", service.id());
                } else {
                    info!("Service {} ({system_name}) is up to date", service.id());
                }
                service
            }
            None => {
                let service = Service::create(&remote, &settings).await?;
                info!("Created service {} ({system_name})", service.id());
                service
            }
        };

        context.set_target(service);
        Ok(())
    }
}
