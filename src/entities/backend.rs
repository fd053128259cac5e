//! Backend APIs: reusable units exposing metrics, methods and mapping rules.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ImportError, RemoteError, Result};
use crate::planner::{MAX_PER_PAGE, SystemNamed, collect_pages, metrics_mapping};
use crate::remote::{Attrs, Remote, Scope};

use super::{
    MappingRule, Metric, attr_id, attr_str, changed_params, deleted_or_gone, filter_params,
    into_attrs, into_list, is_lookup_miss, parse_id,
};

const VALID_PARAMS: &[&str] = &["name", "description", "system_name", "private_endpoint"];

const VALID_UPDATE_PARAMS: &[&str] = &["name", "description", "private_endpoint"];

/// Handle over a remote backend API.
#[derive(Clone)]
pub struct Backend {
    id: u64,
    remote: Arc<dyn Remote>,
    attrs: Option<Attrs>,
}

impl Backend {
    const ENTITY: &'static str = "backend";

    /// Creates an unloaded handle for a known id.
    #[must_use]
    pub fn new(id: u64, remote: Arc<dyn Remote>) -> Self {
        Self {
            id,
            remote,
            attrs: None,
        }
    }

    fn from_attrs(remote: Arc<dyn Remote>, attrs: Attrs) -> Result<Self> {
        Ok(Self {
            id: attr_id(&attrs, Self::ENTITY)?,
            remote,
            attrs: Some(attrs),
        })
    }

    /// Creates a backend.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the backend.
    pub async fn create(remote: &Arc<dyn Remote>, attrs: &Attrs) -> Result<Self> {
        let params = filter_params(attrs, VALID_PARAMS);
        let response = remote.create_backend(&params).await?;
        let attrs = into_attrs(response, "Backend has not been created")?;
        Self::from_attrs(Arc::clone(remote), attrs)
    }

    /// Finds a backend by id or system name. `None` when both lookups miss.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails for any other reason.
    pub async fn find(remote: &Arc<dyn Remote>, reference: &str) -> Result<Option<Self>> {
        if let Some(id) = parse_id(reference) {
            let mut backend = Self::new(id, Arc::clone(remote));
            match backend.ensure_loaded().await.map(|_| ()) {
                Ok(()) => return Ok(Some(backend)),
                Err(e) if is_lookup_miss(&e) => {
                    debug!("No backend with id {id}, trying system name");
                }
                Err(e) => return Err(e),
            }
        }

        Self::find_by_system_name(remote, reference).await
    }

    /// Like [`Self::find`], but a miss is a not-found error.
    ///
    /// # Errors
    ///
    /// Returns not-found if neither the id nor the system name resolve.
    pub async fn fetch(remote: &Arc<dyn Remote>, reference: &str) -> Result<Self> {
        Self::find(remote, reference)
            .await?
            .ok_or_else(|| RemoteError::not_found(Self::ENTITY, reference).into())
    }

    /// Finds a backend by system name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend list cannot be read.
    pub async fn find_by_system_name(
        remote: &Arc<dyn Remote>,
        system_name: &str,
    ) -> Result<Option<Self>> {
        let backends = collect_pages(MAX_PER_PAGE, |page, per_page| async move {
            let response = remote.list_backends(page, per_page).await?;
            into_list(response, "Backend list not read")
        })
        .await?;

        backends
            .into_iter()
            .find(|attrs| attr_str(attrs, "system_name") == Some(system_name))
            .map(|attrs| Self::from_attrs(Arc::clone(remote), attrs))
            .transpose()
    }

    /// Remote id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Scope owning this backend's metrics and mapping rules.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        Scope::Backend(self.id)
    }

    /// Fetches attributes unless already cached.
    ///
    /// # Errors
    ///
    /// Returns invalid-id for id 0, not-found if the backend does not exist.
    pub async fn ensure_loaded(&mut self) -> Result<&Attrs> {
        if self.attrs.is_none() {
            if self.id == 0 {
                return Err(RemoteError::InvalidId {
                    entity: Self::ENTITY,
                    reference: self.id.to_string(),
                }
                .into());
            }
            let response = self.remote.show_backend(self.id).await?;
            self.attrs = Some(into_attrs(response, "Backend attrs not read")?);
        }

        self.attrs
            .as_ref()
            .ok_or_else(|| ImportError::internal("backend attrs not cached"))
    }

    /// Cached system name.
    #[must_use]
    pub fn system_name(&self) -> Option<&str> {
        self.attrs.as_ref().and_then(|a| attr_str(a, "system_name"))
    }

    /// Cached private endpoint.
    #[must_use]
    pub fn private_endpoint(&self) -> Option<&str> {
        self.attrs.as_ref().and_then(|a| attr_str(a, "private_endpoint"))
    }

    /// Top level metrics (no methods).
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn metrics(&self) -> Result<Vec<Metric>> {
        let all = Metric::list(&self.remote, self.scope()).await?;
        Ok(all.into_iter().filter(|m| !m.is_method()).collect())
    }

    /// The `hits` metric.
    ///
    /// # Errors
    ///
    /// Returns an error if metrics cannot be read or `hits` is missing.
    pub async fn hits(&self) -> Result<Metric> {
        Metric::hits(&self.remote, self.scope()).await
    }

    /// Methods under `hits`.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn methods(&self) -> Result<Vec<Metric>> {
        let hits = self.hits().await?;
        Metric::list_methods(&self.remote, self.scope(), hits.id()).await
    }

    /// Mapping rules of the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn mapping_rules(&self) -> Result<Vec<MappingRule>> {
        MappingRule::list(&self.remote, self.scope()).await
    }

    /// Updates the attributes that differ from the cached ones.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the update.
    pub async fn update(&mut self, desired: &Attrs) -> Result<bool> {
        let changes = changed_params(self.ensure_loaded().await?, desired, VALID_UPDATE_PARAMS);
        if changes.is_empty() {
            return Ok(false);
        }

        let response = self.remote.update_backend(self.id, &changes).await?;
        self.attrs = Some(into_attrs(response, "Backend not updated")?);
        Ok(true)
    }

    /// Deletes the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self) -> Result<()> {
        let result = self.remote.delete_backend(self.id).await;
        deleted_or_gone(result, Self::ENTITY, self.id)
    }

    async fn metrics_and_methods(&self) -> Result<Vec<Metric>> {
        let mut all = self.metrics().await?;
        all.extend(self.methods().await?);
        Ok(all)
    }

    /// Maps this backend's metric and method ids to `other`'s by system name.
    ///
    /// # Errors
    ///
    /// Returns an error if either side's metrics cannot be read.
    pub async fn metrics_mapping(&self, other: &Self) -> Result<HashMap<u64, u64>> {
        let source = self.metrics_and_methods().await?;
        let target = other.metrics_and_methods().await?;
        Ok(metrics_mapping(&source, &target))
    }

    /// Finds a metric or method by system name.
    ///
    /// # Errors
    ///
    /// Returns an error if metrics cannot be read.
    pub async fn find_metric_or_method(&self, system_name: &str) -> Result<Option<Metric>> {
        let all = self.metrics_and_methods().await?;
        Ok(all.into_iter().find(|m| m.system_name() == system_name))
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("id", &self.id)
            .field("system_name", &self.system_name())
            .field("loaded", &self.attrs.is_some())
            .finish()
    }
}
