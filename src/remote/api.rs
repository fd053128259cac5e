//! Remote API contract.
//!
//! Every call returns the unwrapped JSON record (or list of records) on
//! success. When the API rejects a request with a structured error list, the
//! call still succeeds and returns an object carrying an `errors` key; the
//! entity layer decides what that means.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Attribute record of a remote entity.
pub type Attrs = serde_json::Map<String, Value>;

/// Parent scope owning metrics, methods and mapping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A service (product).
    Service(u64),
    /// A backend API.
    Backend(u64),
}

impl Scope {
    /// Returns the id of the owning entity.
    #[must_use]
    pub const fn id(self) -> u64 {
        match self {
            Self::Service(id) | Self::Backend(id) => id,
        }
    }
}

/// Calls exposed by the 3scale Account Management API.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Lists services.
    async fn list_services(&self, page: u32, per_page: usize) -> Result<Value>;

    /// Reads a service.
    async fn show_service(&self, id: u64) -> Result<Value>;

    /// Creates a service.
    async fn create_service(&self, attrs: &Attrs) -> Result<Value>;

    /// Updates a service.
    async fn update_service(&self, id: u64, attrs: &Attrs) -> Result<Value>;

    /// Deletes a service.
    async fn delete_service(&self, id: u64) -> Result<()>;

    /// Lists backend APIs.
    async fn list_backends(&self, page: u32, per_page: usize) -> Result<Value>;

    /// Reads a backend API.
    async fn show_backend(&self, id: u64) -> Result<Value>;

    /// Creates a backend API.
    async fn create_backend(&self, attrs: &Attrs) -> Result<Value>;

    /// Updates a backend API.
    async fn update_backend(&self, id: u64, attrs: &Attrs) -> Result<Value>;

    /// Deletes a backend API.
    async fn delete_backend(&self, id: u64) -> Result<()>;

    /// Lists metrics and methods of a scope.
    async fn list_metrics(&self, scope: Scope, page: u32, per_page: usize) -> Result<Value>;

    /// Creates a top level metric.
    async fn create_metric(&self, scope: Scope, attrs: &Attrs) -> Result<Value>;

    /// Lists the methods under a parent metric.
    async fn list_methods(
        &self,
        scope: Scope,
        metric_id: u64,
        page: u32,
        per_page: usize,
    ) -> Result<Value>;

    /// Creates a method under a parent metric.
    async fn create_method(&self, scope: Scope, metric_id: u64, attrs: &Attrs) -> Result<Value>;

    /// Deletes a metric or method.
    async fn delete_metric(&self, scope: Scope, id: u64) -> Result<()>;

    /// Lists mapping rules.
    async fn list_mapping_rules(&self, scope: Scope, page: u32, per_page: usize) -> Result<Value>;

    /// Creates a mapping rule.
    async fn create_mapping_rule(&self, scope: Scope, attrs: &Attrs) -> Result<Value>;

    /// Deletes a mapping rule.
    async fn delete_mapping_rule(&self, scope: Scope, id: u64) -> Result<()>;

    /// Reads the proxy settings of a service.
    async fn show_proxy(&self, service_id: u64) -> Result<Value>;

    /// Updates the proxy settings of a service.
    async fn update_proxy(&self, service_id: u64, attrs: &Attrs) -> Result<Value>;

    /// Deploys the proxy configuration to staging, bumping its version.
    async fn deploy_proxy(&self, service_id: u64) -> Result<Value>;

    /// Updates the OIDC configuration of a service.
    async fn update_oidc(&self, service_id: u64, attrs: &Attrs) -> Result<Value>;

    /// Reads the policy chain of a service.
    async fn show_policies(&self, service_id: u64) -> Result<Value>;

    /// Replaces the policy chain of a service.
    async fn update_policies(&self, service_id: u64, chain: &[Value]) -> Result<Value>;

    /// Lists ActiveDocs specs.
    async fn list_activedocs(&self) -> Result<Value>;

    /// Creates an ActiveDocs spec.
    async fn create_activedocs(&self, attrs: &Attrs) -> Result<Value>;

    /// Updates an ActiveDocs spec.
    async fn update_activedocs(&self, id: u64, attrs: &Attrs) -> Result<Value>;
}
