//! ActiveDocs: interactive documentation published from the imported spec.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::remote::{Attrs, Remote};

use super::{attr_id, attr_str, changed_params, filter_params, into_attrs, into_list};

const VALID_PARAMS: &[&str] = &[
    "name",
    "system_name",
    "service_id",
    "body",
    "description",
    "published",
    "skip_swagger_validations",
];

const VALID_UPDATE_PARAMS: &[&str] = &[
    "name",
    "service_id",
    "body",
    "description",
    "published",
    "skip_swagger_validations",
];

/// Handle over a remote ActiveDocs spec.
#[derive(Clone)]
pub struct ActiveDocs {
    id: u64,
    remote: Arc<dyn Remote>,
    attrs: Attrs,
}

impl ActiveDocs {
    const ENTITY: &'static str = "activedocs";

    fn from_attrs(remote: Arc<dyn Remote>, attrs: Attrs) -> Result<Self> {
        Ok(Self {
            id: attr_id(&attrs, Self::ENTITY)?,
            remote,
            attrs,
        })
    }

    /// Creates an ActiveDocs spec.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects it; a taken system name is
    /// reported as [`crate::error::ApiErrorKind::SystemNameTaken`].
    pub async fn create(remote: &Arc<dyn Remote>, attrs: &Attrs) -> Result<Self> {
        let params = filter_params(attrs, VALID_PARAMS);
        let response = remote.create_activedocs(&params).await?;
        let attrs = into_attrs(response, "ActiveDocs has not been created")?;
        Self::from_attrs(Arc::clone(remote), attrs)
    }

    /// Finds an ActiveDocs spec by system name.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn find_by_system_name(
        remote: &Arc<dyn Remote>,
        system_name: &str,
    ) -> Result<Option<Self>> {
        let response = remote.list_activedocs().await?;
        let found = into_list(response, "ActiveDocs list not read")?
            .into_iter()
            .find(|attrs| attr_str(attrs, "system_name") == Some(system_name));

        found
            .map(|attrs| Self::from_attrs(Arc::clone(remote), attrs))
            .transpose()
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

    /// System name.
    #[must_use]
    pub fn system_name(&self) -> Option<&str> {
        attr_str(&self.attrs, "system_name")
    }

    /// Whether the docs are visible to developers.
    #[must_use]
    pub fn published(&self) -> Option<bool> {
        self.attrs.get("published").and_then(serde_json::Value::as_bool)
    }

    /// Updates the attributes that differ from the cached ones.
    ///
    /// # Errors
    ///
    /// Returns an api error if the remote rejects the update.
    pub async fn update(&mut self, desired: &Attrs) -> Result<bool> {
        let changes = changed_params(&self.attrs, desired, VALID_UPDATE_PARAMS);
        if changes.is_empty() {
            debug!("ActiveDocs {} is up to date", self.id);
            return Ok(false);
        }

        let response = self.remote.update_activedocs(self.id, &changes).await?;
        self.attrs = into_attrs(response, "ActiveDocs has not been updated")?;
        Ok(true)
    }
}

impl fmt::Debug for ActiveDocs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveDocs")
            .field("id", &self.id)
            .field("system_name", &self.system_name())
            .finish()
    }
}
