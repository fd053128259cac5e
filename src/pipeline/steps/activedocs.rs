//! Step 6: publish the definition as ActiveDocs.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::entities::ActiveDocs;
use crate::error::{ImportError, RemoteError, Result};
use crate::pipeline::{Step, SyncContext, join_paths};
use crate::remote::Attrs;

/// Creates the ActiveDocs of the target, updating them when they already exist.
#[derive(Debug, Default)]
pub struct CreateActiveDocsStep;

/// The raw document with its server pointing at the staging gateway.
async fn docs_body(context: &SyncContext) -> Result<Value> {
    let mut proxy = context.target()?.proxy();
    proxy.ensure_loaded().await?;

    let Some(sandbox_endpoint) = proxy.sandbox_endpoint() else {
        debug!("Proxy has no staging endpoint, publishing the definition as is");
        return Ok(context.resource().clone());
    };

    let server = join_paths(sandbox_endpoint, context.public_base_path());
    let url = Url::parse(&server).map_err(|e| RemoteError::InvalidResponse {
        message: format!("invalid staging endpoint '{server}': {e}"),
    })?;

    Ok(context
        .api_spec()
        .with_server_url(context.resource(), &url))
}

#[async_trait]
impl Step for CreateActiveDocsStep {
    fn name(&self) -> &'static str {
        "create activedocs"
    }

    async fn execute(&self, context: &mut SyncContext) -> Result<()> {
        let body = docs_body(context).await?;
        let body = serde_json::to_string_pretty(&body)
            .map_err(|e| ImportError::internal(format!("cannot serialize definition: {e}")))?;

        let service = context.target()?;
        let system_name = service
            .system_name()
            .map_or_else(|| context.target_system_name(), String::from);
        let spec = context.api_spec();
        let options = context.options();

        let mut attrs = Attrs::new();
        attrs.insert("name".into(), json!(spec.title()));
        attrs.insert("system_name".into(), json!(system_name));
        attrs.insert("service_id".into(), json!(service.id()));
        attrs.insert("body".into(), json!(body));
        if let Some(description) = spec.description() {
            attrs.insert("description".into(), json!(description));
        }
        attrs.insert("published".into(), json!(options.activedocs_published()));
        attrs.insert(
            "skip_swagger_validations".into(),
            json!(options.skip_openapi_validation),
        );

        let remote = context.remote();
        match ActiveDocs::create(remote, &attrs).await {
            Ok(docs) => info!("Created ActiveDocs {} ({system_name})", docs.id()),
            Err(e) if e.is_already_exists() => {
                warn!("ActiveDocs {system_name} already exists, updating");
                let Some(mut docs) = ActiveDocs::find_by_system_name(remote, &system_name).await?
                else {
                    return Err(e);
                };
                if docs.update(&attrs).await? {
                    info!("Updated ActiveDocs {} ({system_name})", docs.id());
                }
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }
}
