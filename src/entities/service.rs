//! Services (products), the top level entity an import reconciles.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{RemoteError, Result};
use crate::planner::{MAX_PER_PAGE, SystemNamed, collect_pages};
use crate::remote::{Attrs, Remote, Scope};

use super::{
    MappingRule, Metric, PolicyChain, Proxy, attr_id, attr_str, changed_params, deleted_or_gone,
    filter_params, into_attrs, into_list, is_lookup_miss, parse_id,
};

const VALID_PARAMS: &[&str] = &[
    "name",
    "description",
    "system_name",
    "backend_version",
    "deployment_option",
];

const VALID_UPDATE_PARAMS: &[&str] = &["name", "description", "backend_version"];

/// Handle over a remote service.
#[derive(Clone)]
pub struct Service {
    id: u64,
    remote: Arc<dyn Remote>,
    attrs: Option<Attrs>,
}

impl Service {
    const ENTITY: &'static str = "service";

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

    /// Creates a service.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the service.
    pub async fn create(remote: &Arc<dyn Remote>, attrs: &Attrs) -> Result<Self> {
        let params = filter_params(attrs, VALID_PARAMS);
        let response = remote.create_service(&params).await?;
        let attrs = into_attrs(response, "Service has not been created")?;
        Self::from_attrs(Arc::clone(remote), attrs)
    }

    /// Finds a service by id or system name.
    ///
    /// Returns `None` when both lookups miss.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails for any other reason.
    pub async fn find(remote: &Arc<dyn Remote>, reference: &str) -> Result<Option<Self>> {
        if let Some(id) = parse_id(reference) {
            let mut service = Self::new(id, Arc::clone(remote));
            match service.ensure_loaded().await.map(|_| ()) {
                Ok(()) => return Ok(Some(service)),
                Err(e) if is_lookup_miss(&e) => {
                    debug!("No service with id {id}, trying system name");
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

    /// Finds a service by system name.
    ///
    /// # Errors
    ///
    /// Returns an error if the service list cannot be read.
    pub async fn find_by_system_name(
        remote: &Arc<dyn Remote>,
        system_name: &str,
    ) -> Result<Option<Self>> {
        let found = Self::list(remote)
            .await?
            .into_iter()
            .find(|attrs| attr_str(attrs, "system_name") == Some(system_name));

        found
            .map(|attrs| Self::from_attrs(Arc::clone(remote), attrs))
            .transpose()
    }

    /// Lists every service of the account.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be read.
    pub async fn list(remote: &Arc<dyn Remote>) -> Result<Vec<Attrs>> {
        collect_pages(MAX_PER_PAGE, |page, per_page| async move {
            let response = remote.list_services(page, per_page).await?;
            into_list(response, "Service list not read")
        })
        .await
    }

    /// Remote id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Scope owning this service's metrics and mapping rules.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        Scope::Service(self.id)
    }

    /// Returns true once attributes are cached.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.attrs.is_some()
    }

    /// Cached attributes, if loaded.
    #[must_use]
    pub const fn attrs(&self) -> Option<&Attrs> {
        self.attrs.as_ref()
    }

    /// Fetches attributes unless already cached.
    ///
    /// # Errors
    ///
    /// Returns invalid-id for id 0, not-found if the service does not exist.
    pub async fn ensure_loaded(&mut self) -> Result<&Attrs> {
        if self.attrs.is_none() {
            if self.id == 0 {
                return Err(RemoteError::InvalidId {
                    entity: Self::ENTITY,
                    reference: self.id.to_string(),
                }
                .into());
            }
            let response = self.remote.show_service(self.id).await?;
            self.attrs = Some(into_attrs(response, "Service attrs not read")?);
        }

        self.attrs
            .as_ref()
            .ok_or_else(|| crate::error::ImportError::internal("service attrs not cached"))
    }

    /// Cached system name.
    #[must_use]
    pub fn system_name(&self) -> Option<&str> {
        self.attrs.as_ref().and_then(|a| attr_str(a, "system_name"))
    }

    /// Cached display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attrs.as_ref().and_then(|a| attr_str(a, "name"))
    }

    /// Updates the attributes that differ from the cached ones.
    ///
    /// Returns `false` without issuing a request when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the update.
    pub async fn update(&mut self, desired: &Attrs) -> Result<bool> {
        let changes = changed_params(self.ensure_loaded().await?, desired, VALID_UPDATE_PARAMS);
        if changes.is_empty() {
            debug!("Service {} is up to date", self.id);
            return Ok(false);
        }

        let response = self.remote.update_service(self.id, &changes).await?;
        self.attrs = Some(into_attrs(response, "Service has not been updated")?);
        Ok(true)
    }

    /// Deletes the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self) -> Result<()> {
        let result = self.remote.delete_service(self.id).await;
        deleted_or_gone(result, Self::ENTITY, self.id)
    }

    /// Metrics and methods of the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn metrics(&self) -> Result<Vec<Metric>> {
        Metric::list(&self.remote, self.scope()).await
    }

    /// The `hits` metric every method hangs off.
    ///
    /// # Errors
    ///
    /// Returns an error if metrics cannot be read or `hits` is missing.
    pub async fn hits(&self) -> Result<Metric> {
        Metric::hits(&self.remote, self.scope()).await
    }

    /// Methods of the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn methods(&self) -> Result<Vec<Metric>> {
        let hits = self.hits().await?;
        Metric::list_methods(&self.remote, self.scope(), hits.id()).await
    }

    /// Creates a method under `hits`.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the method.
    pub async fn create_method(&self, parent_id: u64, attrs: &Attrs) -> Result<Metric> {
        Metric::create_method(&self.remote, self.scope(), parent_id, attrs).await
    }

    /// Finds a metric or method by system name.
    ///
    /// # Errors
    ///
    /// Returns an error if metrics cannot be read.
    pub async fn find_metric_or_method(&self, system_name: &str) -> Result<Option<Metric>> {
        let metrics = self.metrics().await?;
        Ok(metrics
            .into_iter()
            .find(|metric| metric.system_name() == system_name))
    }

    /// Mapping rules of the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn mapping_rules(&self) -> Result<Vec<MappingRule>> {
        MappingRule::list(&self.remote, self.scope()).await
    }

    /// Creates a mapping rule.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the rule.
    pub async fn create_mapping_rule(&self, attrs: &Attrs) -> Result<MappingRule> {
        MappingRule::create(&self.remote, self.scope(), attrs).await
    }

    /// Unloaded handle over the service's proxy settings.
    #[must_use]
    pub fn proxy(&self) -> Proxy {
        Proxy::new(self.id, Arc::clone(&self.remote))
    }

    /// Unloaded handle over the service's policy chain.
    #[must_use]
    pub fn policies(&self) -> PolicyChain {
        PolicyChain::new(self.id, Arc::clone(&self.remote))
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("id", &self.id)
            .field("system_name", &self.system_name())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
