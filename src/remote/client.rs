//! 3scale Account Management API client implementation.
//!
//! This module provides the HTTP client for the REST admin API. Responses are
//! unwrapped from their `{"service": {...}}` style envelopes before being
//! handed to the entity layer.

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode, Url};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::{ImportError, RemoteError, Result};

use super::api::{Attrs, Remote, Scope};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// 3scale Account Management API client.
#[derive(Debug, Clone)]
pub struct ThreeScaleClient {
    /// HTTP client.
    client: Client,
    /// Admin portal base URL.
    endpoint: Url,
    /// Access token (or provider key).
    access_token: String,
}

impl ThreeScaleClient {
    /// Creates a new client for the given admin portal endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoint: Url, access_token: &str) -> Result<Self> {
        Self::with_timeout(endpoint, access_token, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(endpoint: Url, access_token: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RemoteError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            access_token: access_token.to_string(),
        })
    }

    /// Returns the admin portal endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Executes a request, retrying transient failures.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = last_error
                    .as_ref()
                    .and_then(ImportError::retry_delay_secs)
                    .map_or(RETRY_DELAY_MS * u64::from(attempt), |secs| secs * 1000);
                debug!("Retry attempt {attempt} of {MAX_RETRIES} in {delay}ms");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.request_once(method.clone(), path, query, body).await {
                Ok(value) => return Ok(value),
                Err(e) if may_retry(&method, &e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| RemoteError::network("Max retries exceeded").into()))
    }

    /// Executes a single request.
    async fn request_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self
            .endpoint
            .join(path)
            .map_err(|e| ImportError::internal(format!("Invalid API path '{path}': {e}")))?;
        trace!("{method} {url}");

        let mut request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .query(&[("access_token", self.access_token.as_str())])
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::network(format!("Request failed: {e}")))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);

            return Err(RemoteError::RateLimited {
                retry_after_secs: retry_after.max(1),
            }
            .into());
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::AuthenticationFailed {
                message: String::from("Invalid access token"),
            }
            .into());
        }

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::not_found("resource", path).into());
        }

        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::network(format!("Failed to read response: {e}")))?;

        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::BAD_REQUEST {
            // Structured validation errors are handed back to the entity layer
            if let Ok(value) = serde_json::from_str::<Value>(&text)
                && value.get("errors").is_some()
            {
                return Ok(value);
            }
            return Err(RemoteError::request_failed(status.as_u16(), text).into());
        }

        if !status.is_success() {
            return Err(RemoteError::request_failed(status.as_u16(), text).into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            RemoteError::InvalidResponse {
                message: format!("Failed to parse response: {e}"),
            }
            .into()
        })
    }

    async fn get_record(&self, path: &str, key: &str) -> Result<Value> {
        let value = self.request(Method::GET, path, &[], None).await?;
        Ok(unwrap_record(value, key))
    }

    async fn send_record(&self, method: Method, path: &str, key: &str, attrs: &Attrs) -> Result<Value> {
        let body = Value::Object(attrs.clone());
        let value = self.request(method, path, &[], Some(&body)).await?;
        Ok(unwrap_record(value, key))
    }

    async fn get_page(
        &self,
        path: &str,
        plural: &str,
        singular: &str,
        page: u32,
        per_page: usize,
    ) -> Result<Value> {
        let query = [("page", page.to_string()), ("per_page", per_page.to_string())];
        let value = self.request(Method::GET, path, &query, None).await?;
        Ok(unwrap_list(value, plural, singular))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::DELETE, path, &[], None).await?;
        Ok(())
    }
}

/// Strips a `{"key": {...}}` envelope. Error payloads are returned untouched.
fn unwrap_record(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Strips a `{"plural": [{"singular": {...}}]}` envelope into a plain array.
fn unwrap_list(value: Value, plural: &str, singular: &str) -> Value {
    if value.get("errors").is_some() {
        return value;
    }

    let items = match value {
        Value::Object(mut map) => match map.remove(plural) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    Value::Array(
        items
            .into_iter()
            .map(|item| unwrap_record(item, singular))
            .collect(),
    )
}

fn scope_path(scope: Scope) -> String {
    match scope {
        Scope::Service(id) => format!("admin/api/services/{id}"),
        Scope::Backend(id) => format!("admin/api/backend_apis/{id}"),
    }
}

fn mapping_rules_path(scope: Scope) -> String {
    match scope {
        Scope::Service(id) => format!("admin/api/services/{id}/proxy/mapping_rules"),
        Scope::Backend(id) => format!("admin/api/backend_apis/{id}/mapping_rules"),
    }
}

#[async_trait]
impl Remote for ThreeScaleClient {
    async fn list_services(&self, page: u32, per_page: usize) -> Result<Value> {
        self.get_page("admin/api/services.json", "services", "service", page, per_page)
            .await
    }

    async fn show_service(&self, id: u64) -> Result<Value> {
        self.get_record(&format!("admin/api/services/{id}.json"), "service")
            .await
    }

    async fn create_service(&self, attrs: &Attrs) -> Result<Value> {
        self.send_record(Method::POST, "admin/api/services.json", "service", attrs)
            .await
    }

    async fn update_service(&self, id: u64, attrs: &Attrs) -> Result<Value> {
        let path = format!("admin/api/services/{id}.json");
        self.send_record(Method::PUT, &path, "service", attrs).await
    }

    async fn delete_service(&self, id: u64) -> Result<()> {
        self.delete(&format!("admin/api/services/{id}.json")).await
    }

    async fn list_backends(&self, page: u32, per_page: usize) -> Result<Value> {
        self.get_page(
            "admin/api/backend_apis.json",
            "backend_apis",
            "backend_api",
            page,
            per_page,
        )
        .await
    }

    async fn show_backend(&self, id: u64) -> Result<Value> {
        self.get_record(&format!("admin/api/backend_apis/{id}.json"), "backend_api")
            .await
    }

    async fn create_backend(&self, attrs: &Attrs) -> Result<Value> {
        self.send_record(Method::POST, "admin/api/backend_apis.json", "backend_api", attrs)
            .await
    }

    async fn update_backend(&self, id: u64, attrs: &Attrs) -> Result<Value> {
        let path = format!("admin/api/backend_apis/{id}.json");
        self.send_record(Method::PUT, &path, "backend_api", attrs).await
    }

    async fn delete_backend(&self, id: u64) -> Result<()> {
        self.delete(&format!("admin/api/backend_apis/{id}.json")).await
    }

    async fn list_metrics(&self, scope: Scope, page: u32, per_page: usize) -> Result<Value> {
        let path = format!("{}/metrics.json", scope_path(scope));
        self.get_page(&path, "metrics", "metric", page, per_page).await
    }

    async fn create_metric(&self, scope: Scope, attrs: &Attrs) -> Result<Value> {
        let path = format!("{}/metrics.json", scope_path(scope));
        self.send_record(Method::POST, &path, "metric", attrs).await
    }

    async fn list_methods(
        &self,
        scope: Scope,
        metric_id: u64,
        page: u32,
        per_page: usize,
    ) -> Result<Value> {
        let path = format!("{}/metrics/{metric_id}/methods.json", scope_path(scope));
        self.get_page(&path, "methods", "method", page, per_page).await
    }

    async fn create_method(&self, scope: Scope, metric_id: u64, attrs: &Attrs) -> Result<Value> {
        let path = format!("{}/metrics/{metric_id}/methods.json", scope_path(scope));
        self.send_record(Method::POST, &path, "method", attrs).await
    }

    async fn delete_metric(&self, scope: Scope, id: u64) -> Result<()> {
        self.delete(&format!("{}/metrics/{id}.json", scope_path(scope)))
            .await
    }

    async fn list_mapping_rules(&self, scope: Scope, page: u32, per_page: usize) -> Result<Value> {
        let path = format!("{}.json", mapping_rules_path(scope));
        self.get_page(&path, "mapping_rules", "mapping_rule", page, per_page)
            .await
    }

    async fn create_mapping_rule(&self, scope: Scope, attrs: &Attrs) -> Result<Value> {
        let path = format!("{}.json", mapping_rules_path(scope));
        self.send_record(Method::POST, &path, "mapping_rule", attrs).await
    }

    async fn delete_mapping_rule(&self, scope: Scope, id: u64) -> Result<()> {
        self.delete(&format!("{}/{id}.json", mapping_rules_path(scope)))
            .await
    }

    async fn show_proxy(&self, service_id: u64) -> Result<Value> {
        self.get_record(&format!("admin/api/services/{service_id}/proxy.json"), "proxy")
            .await
    }

    async fn update_proxy(&self, service_id: u64, attrs: &Attrs) -> Result<Value> {
        let path = format!("admin/api/services/{service_id}/proxy.json");
        self.send_record(Method::PATCH, &path, "proxy", attrs).await
    }

    async fn deploy_proxy(&self, service_id: u64) -> Result<Value> {
        let path = format!("admin/api/services/{service_id}/proxy/deploy.json");
        let value = self.request(Method::POST, &path, &[], None).await?;
        Ok(unwrap_record(value, "proxy"))
    }

    async fn update_oidc(&self, service_id: u64, attrs: &Attrs) -> Result<Value> {
        let path = format!("admin/api/services/{service_id}/proxy/oidc_configuration.json");
        self.send_record(Method::PATCH, &path, "oidc_configuration", attrs)
            .await
    }

    async fn show_policies(&self, service_id: u64) -> Result<Value> {
        let path = format!("admin/api/services/{service_id}/proxy/policies.json");
        let value = self.request(Method::GET, &path, &[], None).await?;
        Ok(unwrap_policies(value))
    }

    async fn update_policies(&self, service_id: u64, chain: &[Value]) -> Result<Value> {
        let path = format!("admin/api/services/{service_id}/proxy/policies.json");
        let body = json!({ "policies_config": chain });
        let value = self.request(Method::PUT, &path, &[], Some(&body)).await?;
        Ok(unwrap_policies(value))
    }

    async fn list_activedocs(&self) -> Result<Value> {
        let value = self
            .request(Method::GET, "admin/api/active_docs.json", &[], None)
            .await?;
        Ok(unwrap_list(value, "api_docs", "api_doc"))
    }

    async fn create_activedocs(&self, attrs: &Attrs) -> Result<Value> {
        self.send_record(Method::POST, "admin/api/active_docs.json", "api_doc", attrs)
            .await
    }

    async fn update_activedocs(&self, id: u64, attrs: &Attrs) -> Result<Value> {
        let path = format!("admin/api/active_docs/{id}.json");
        self.send_record(Method::PUT, &path, "api_doc", attrs).await
    }
}

fn unwrap_policies(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("policies_config").is_some_and(Value::is_array) => {
            map.remove("policies_config").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Whether a failed request may be sent again.
///
/// A POST that timed out may already have created the record, so it is
/// only repeated when the server rejected it with 429.
fn may_retry(method: &Method, error: &ImportError) -> bool {
    if *method == Method::POST {
        matches!(error, ImportError::Remote(RemoteError::RateLimited { .. }))
    } else {
        error.is_retryable()
    }
}
