//! Proxy settings and policy chain of a service.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{ImportError, RemoteError, Result};
use crate::remote::{Attrs, Remote};

use super::{attr_str, changed_params, check_errors, into_attrs};

/// Handle over a service's proxy (gateway) settings.
#[derive(Clone)]
pub struct Proxy {
    service_id: u64,
    remote: Arc<dyn Remote>,
    attrs: Option<Attrs>,
}

impl Proxy {
    pub(super) fn new(service_id: u64, remote: Arc<dyn Remote>) -> Self {
        Self {
            service_id,
            remote,
            attrs: None,
        }
    }

    /// Owning service id.
    #[must_use]
    pub const fn service_id(&self) -> u64 {
        self.service_id
    }

    /// Fetches the settings unless already cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read.
    pub async fn ensure_loaded(&mut self) -> Result<&Attrs> {
        if self.attrs.is_none() {
            let response = self.remote.show_proxy(self.service_id).await?;
            self.attrs = Some(into_attrs(response, "Proxy settings not read")?);
        }

        self.attrs
            .as_ref()
            .ok_or_else(|| ImportError::internal("proxy attrs not cached"))
    }

    /// Cached attributes, if loaded.
    #[must_use]
    pub const fn attrs(&self) -> Option<&Attrs> {
        self.attrs.as_ref()
    }

    /// Staging public base URL.
    #[must_use]
    pub fn sandbox_endpoint(&self) -> Option<&str> {
        self.attrs.as_ref().and_then(|a| attr_str(a, "sandbox_endpoint"))
    }

    /// Production public base URL.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.attrs.as_ref().and_then(|a| attr_str(a, "endpoint"))
    }

    /// Private base URL of the API backend.
    #[must_use]
    pub fn api_backend(&self) -> Option<&str> {
        self.attrs.as_ref().and_then(|a| attr_str(a, "api_backend"))
    }

    /// Applies the settings that differ from the cached ones.
    ///
    /// Returns `false` without issuing a request when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the settings.
    pub async fn update(&mut self, settings: &Attrs) -> Result<bool> {
        let keys: Vec<&str> = settings.keys().map(String::as_str).collect();
        let changes = changed_params(self.ensure_loaded().await?, settings, &keys);
        if changes.is_empty() {
            debug!("Proxy of service {} is up to date", self.service_id);
            return Ok(false);
        }

        let response = self.remote.update_proxy(self.service_id, &changes).await?;
        self.attrs = Some(into_attrs(response, "Service proxy not updated")?);
        Ok(true)
    }

    /// Deploys the current configuration to staging, bumping its version.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the deploy.
    pub async fn deploy(&mut self) -> Result<&Attrs> {
        let response = self.remote.deploy_proxy(self.service_id).await?;
        self.attrs = Some(into_attrs(response, "Proxy version not bumped")?);
        self.attrs
            .as_ref()
            .ok_or_else(|| ImportError::internal("proxy attrs not cached"))
    }

    /// Replaces the OIDC flow configuration.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the configuration.
    pub async fn update_oidc(&self, configuration: &Attrs) -> Result<Attrs> {
        let response = self
            .remote
            .update_oidc(self.service_id, configuration)
            .await?;
        into_attrs(response, "Service oidc has not been updated")
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("service_id", &self.service_id)
            .field("loaded", &self.attrs.is_some())
            .finish()
    }
}

/// Handle over a service's gateway policy chain.
#[derive(Clone)]
pub struct PolicyChain {
    service_id: u64,
    remote: Arc<dyn Remote>,
    chain: Option<Vec<Value>>,
}

impl PolicyChain {
    pub(super) fn new(service_id: u64, remote: Arc<dyn Remote>) -> Self {
        Self {
            service_id,
            remote,
            chain: None,
        }
    }

    /// Fetches the chain unless already cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain cannot be read.
    pub async fn ensure_loaded(&mut self) -> Result<&[Value]> {
        if self.chain.is_none() {
            let response = self.remote.show_policies(self.service_id).await?;
            self.chain = Some(into_chain(response, "Policy chain not read")?);
        }

        self.chain
            .as_deref()
            .ok_or_else(|| ImportError::internal("policy chain not cached"))
    }

    /// Replaces the chain. Returns `false` without a request when unchanged.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the chain.
    pub async fn update(&mut self, chain: Vec<Value>) -> Result<bool> {
        if self.ensure_loaded().await? == chain.as_slice() {
            debug!("Policy chain of service {} is up to date", self.service_id);
            return Ok(false);
        }

        let response = self.remote.update_policies(self.service_id, &chain).await?;
        self.chain = Some(into_chain(response, "Service policies not updated")?);
        Ok(true)
    }
}

fn into_chain(value: Value, message: &str) -> Result<Vec<Value>> {
    match check_errors(value, message)? {
        Value::Array(chain) => Ok(chain),
        other => Err(RemoteError::InvalidResponse {
            message: format!("{message}: expected a policy list, got {other}"),
        }
        .into()),
    }
}

impl fmt::Debug for PolicyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyChain")
            .field("service_id", &self.service_id)
            .field("policies", &self.chain.as_ref().map(Vec::len))
            .finish()
    }
}
