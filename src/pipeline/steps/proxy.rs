//! Step 2: gateway settings of the target service.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::openapi::{KeyLocation, SecurityKind};
use crate::pipeline::{Step, SyncContext};
use crate::remote::Attrs;

/// Applies backend URL, public endpoints and authentication settings.
#[derive(Debug, Default)]
pub struct UpdateProxyStep;

/// Proxy settings derived from the definition and the overrides.
///
/// # Errors
///
/// Returns a missing-option error for OAuth2 security without an issuer
/// endpoint.
pub fn proxy_settings(context: &SyncContext) -> Result<Attrs> {
    let options = context.options();
    let mut settings = Attrs::new();

    let api_backend = options
        .override_private_base_url
        .as_deref()
        .or_else(|| context.api_spec().private_base_url());
    if let Some(api_backend) = api_backend {
        settings.insert("api_backend".into(), json!(api_backend));
    }

    for (key, value) in [
        ("sandbox_endpoint", &options.staging_public_base_url),
        ("endpoint", &options.production_public_base_url),
        ("secret_token", &options.backend_api_secret_token),
        ("hostname_rewrite", &options.backend_api_host_header),
    ] {
        if let Some(value) = value {
            settings.insert(key.into(), json!(value));
        }
    }

    match context.security().map(|security| &security.kind) {
        Some(SecurityKind::ApiKey { name, location }) => {
            let credentials_location = match location {
                KeyLocation::Query => "query",
                KeyLocation::Header | KeyLocation::Cookie => "headers",
            };
            settings.insert("credentials_location".into(), json!(credentials_location));
            settings.insert("auth_user_key".into(), json!(name));
        }
        Some(SecurityKind::OAuth2 { .. }) => {
            let endpoint = options.oidc_issuer_endpoint.as_deref().ok_or_else(|| {
                ConfigError::MissingOption {
                    name: String::from("oidc-issuer-endpoint"),
                }
            })?;
            settings.insert("oidc_issuer_endpoint".into(), json!(endpoint));
            if let Some(issuer_type) = options.oidc_issuer_type {
                settings.insert("oidc_issuer_type".into(), json!(issuer_type.as_str()));
            }
            settings.insert("credentials_location".into(), json!("headers"));
        }
        None => {}
    }

    Ok(settings)
}

#[async_trait]
impl Step for UpdateProxyStep {
    fn name(&self) -> &'static str {
        "update proxy settings"
    }

    async fn execute(&self, context: &mut SyncContext) -> Result<()> {
        let settings = proxy_settings(context)?;
        if settings.is_empty() {
            debug!("No proxy settings to apply");
            return Ok(());
        }

        let mut proxy = context.target()?.proxy();
        if proxy.update(&settings).await? {
            info!("Updated proxy settings of service {}", proxy.service_id());
        }
        Ok(())
    }
}
