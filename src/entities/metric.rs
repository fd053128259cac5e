//! Metrics and methods.
//!
//! The API models a method as a metric whose `parent_id` points at the
//! `hits` metric, so both share one handle type.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ImportError, Result};
use crate::planner::{MAX_PER_PAGE, SystemNamed, collect_pages};
use crate::remote::{Attrs, Remote, Scope};

use super::{attr_id, attr_str, deleted_or_gone, filter_params, into_attrs, into_list};

const VALID_METRIC_PARAMS: &[&str] = &["friendly_name", "system_name", "unit", "description"];
const VALID_METHOD_PARAMS: &[&str] = &["friendly_name", "system_name", "description"];

/// A metric or method owned by a service or backend.
#[derive(Clone)]
pub struct Metric {
    id: u64,
    scope: Scope,
    remote: Arc<dyn Remote>,
    attrs: Attrs,
}

impl Metric {
    const ENTITY: &'static str = "metric";

    fn from_attrs(scope: Scope, remote: Arc<dyn Remote>, attrs: Attrs) -> Result<Self> {
        Ok(Self {
            id: attr_id(&attrs, Self::ENTITY)?,
            scope,
            remote,
            attrs,
        })
    }

    /// Creates a top level metric.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the metric.
    pub async fn create(remote: &Arc<dyn Remote>, scope: Scope, attrs: &Attrs) -> Result<Self> {
        let params = filter_params(attrs, VALID_METRIC_PARAMS);
        let response = remote.create_metric(scope, &params).await?;
        let attrs = into_attrs(response, "Metric has not been created")?;
        Self::from_attrs(scope, Arc::clone(remote), attrs)
    }

    /// Creates a method under the given parent (`hits`) metric.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the method. A taken system
    /// name is reported as [`crate::error::ApiErrorKind::SystemNameTaken`].
    pub async fn create_method(
        remote: &Arc<dyn Remote>,
        scope: Scope,
        parent_id: u64,
        attrs: &Attrs,
    ) -> Result<Self> {
        let params = filter_params(attrs, VALID_METHOD_PARAMS);
        let response = remote.create_method(scope, parent_id, &params).await?;
        let attrs = into_attrs(response, "Method has not been created")?;
        Self::from_attrs(scope, Arc::clone(remote), attrs)
    }

    /// Lists every metric and method of a scope.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be read.
    pub async fn list(remote: &Arc<dyn Remote>, scope: Scope) -> Result<Vec<Self>> {
        let records = collect_pages(MAX_PER_PAGE, |page, per_page| async move {
            let response = remote.list_metrics(scope, page, per_page).await?;
            into_list(response, "Metrics not read")
        })
        .await?;

        records
            .into_iter()
            .map(|attrs| Self::from_attrs(scope, Arc::clone(remote), attrs))
            .collect()
    }

    /// Lists the methods under a parent metric.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be read.
    pub async fn list_methods(
        remote: &Arc<dyn Remote>,
        scope: Scope,
        parent_id: u64,
    ) -> Result<Vec<Self>> {
        let records = collect_pages(MAX_PER_PAGE, |page, per_page| async move {
            let response = remote.list_methods(scope, parent_id, page, per_page).await?;
            into_list(response, "Methods not read")
        })
        .await?;

        records
            .into_iter()
            .map(|attrs| Self::from_attrs(scope, Arc::clone(remote), attrs))
            .collect()
    }

    /// Finds the `hits` metric of a scope.
    ///
    /// # Errors
    ///
    /// Returns an error if metrics cannot be read or `hits` is missing.
    pub async fn hits(remote: &Arc<dyn Remote>, scope: Scope) -> Result<Self> {
        let metrics = Self::list(remote, scope).await?;
        metrics
            .into_iter()
            .find(|metric| metric.system_name() == "hits")
            .ok_or_else(|| ImportError::internal("missing hits metric"))
    }

    /// Remote id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Owning scope.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Cached attributes.
    #[must_use]
    pub const fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Friendly name.
    #[must_use]
    pub fn friendly_name(&self) -> Option<&str> {
        attr_str(&self.attrs, "friendly_name")
    }

    /// Parent metric id; set for methods only.
    #[must_use]
    pub fn parent_id(&self) -> Option<u64> {
        self.attrs.get("parent_id").and_then(serde_json::Value::as_u64)
    }

    /// Returns true if this is a method.
    #[must_use]
    pub fn is_method(&self) -> bool {
        self.parent_id().is_some()
    }

    /// Deletes the metric or method.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self) -> Result<()> {
        debug!("Deleting {} {}", Self::ENTITY, self.id);
        let result = self.remote.delete_metric(self.scope, self.id).await;
        deleted_or_gone(result, Self::ENTITY, self.id)
    }
}

impl SystemNamed for Metric {
    fn id(&self) -> u64 {
        self.id
    }

    fn system_name(&self) -> &str {
        attr_str(&self.attrs, "system_name").unwrap_or_default()
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("system_name", &self.system_name())
            .field("parent_id", &self.parent_id())
            .finish()
    }
}
