//! Mapping rules.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::planner::{MAX_PER_PAGE, collect_pages};
use crate::remote::{Attrs, Remote, Scope};

use super::{attr_id, attr_str, deleted_or_gone, filter_params, into_attrs, into_list};

const VALID_PARAMS: &[&str] = &[
    "http_method",
    "pattern",
    "metric_id",
    "delta",
    "position",
    "last",
];

/// A (verb, pattern, metric) routing rule owned by a service or backend.
#[derive(Clone)]
pub struct MappingRule {
    id: u64,
    scope: Scope,
    remote: Arc<dyn Remote>,
    attrs: Attrs,
}

impl MappingRule {
    const ENTITY: &'static str = "mapping rule";

    fn from_attrs(scope: Scope, remote: Arc<dyn Remote>, attrs: Attrs) -> Result<Self> {
        Ok(Self {
            id: attr_id(&attrs, Self::ENTITY)?,
            scope,
            remote,
            attrs,
        })
    }

    /// Creates a mapping rule.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the rule.
    pub async fn create(remote: &Arc<dyn Remote>, scope: Scope, attrs: &Attrs) -> Result<Self> {
        let params = filter_params(attrs, VALID_PARAMS);
        let response = remote.create_mapping_rule(scope, &params).await?;
        let attrs = into_attrs(response, "Mapping rule has not been created")?;
        Self::from_attrs(scope, Arc::clone(remote), attrs)
    }

    /// Lists every mapping rule of a scope.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be read.
    pub async fn list(remote: &Arc<dyn Remote>, scope: Scope) -> Result<Vec<Self>> {
        let records = collect_pages(MAX_PER_PAGE, |page, per_page| async move {
            let response = remote.list_mapping_rules(scope, page, per_page).await?;
            into_list(response, "Mapping rules not read")
        })
        .await?;

        records
            .into_iter()
            .map(|attrs| Self::from_attrs(scope, Arc::clone(remote), attrs))
            .collect()
    }

    /// Remote id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Cached attributes.
    #[must_use]
    pub const fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// HTTP verb.
    #[must_use]
    pub fn http_method(&self) -> Option<&str> {
        attr_str(&self.attrs, "http_method")
    }

    /// Path pattern.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        attr_str(&self.attrs, "pattern")
    }

    /// Metric or method the rule increments.
    #[must_use]
    pub fn metric_id(&self) -> Option<u64> {
        self.attrs.get("metric_id").and_then(Value::as_u64)
    }

    /// Increment applied per matching request.
    #[must_use]
    pub fn delta(&self) -> Option<u64> {
        self.attrs.get("delta").and_then(Value::as_u64)
    }

    /// Deletes the rule. Never checks existence first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self) -> Result<()> {
        debug!("Deleting {} {}", Self::ENTITY, self.id);
        let result = self.remote.delete_mapping_rule(self.scope, self.id).await;
        deleted_or_gone(result, Self::ENTITY, self.id)
    }
}

impl fmt::Debug for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRule")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("http_method", &self.http_method())
            .field("pattern", &self.pattern())
            .finish()
    }
}
