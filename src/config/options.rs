//! Import options and the destination URL format.

use std::fmt;

use reqwest::Url;
use serde::Serialize;

use crate::error::{ConfigError, ImportError, Result};

/// Kind of OpenID Connect issuer the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OidcIssuerType {
    /// Generic REST issuer.
    Rest,
    /// Red Hat SSO / Keycloak.
    Keycloak,
}

impl OidcIssuerType {
    /// Value sent to the proxy settings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Keycloak => "keycloak",
        }
    }
}

impl fmt::Display for OidcIssuerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User supplied overrides for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportOptions {
    /// System name of the target service; derived from the title when absent.
    pub target_system_name: Option<String>,
    /// Create ActiveDocs unpublished.
    pub activedocs_hidden: bool,
    /// Skip structural validation of the definition.
    pub skip_openapi_validation: bool,
    /// Leave mapping rule patterns open ended.
    pub prefix_matching: bool,
    /// OIDC issuer type.
    pub oidc_issuer_type: Option<OidcIssuerType>,
    /// OIDC issuer endpoint, credentials included.
    pub oidc_issuer_endpoint: Option<String>,
    /// User key for the default credentials policy.
    pub default_credentials_userkey: Option<String>,
    /// Base path of the private (backend) URLs.
    pub override_private_basepath: Option<String>,
    /// Base path of the public (gateway) URLs.
    pub override_public_basepath: Option<String>,
    /// Staging public base URL.
    pub staging_public_base_url: Option<String>,
    /// Production public base URL.
    pub production_public_base_url: Option<String>,
    /// Private base URL of the API backend.
    pub override_private_base_url: Option<String>,
    /// Secret token the gateway sends to the backend.
    pub backend_api_secret_token: Option<String>,
    /// Host header the gateway sends to the backend.
    pub backend_api_host_header: Option<String>,
}

impl ImportOptions {
    /// Checks option values that can be verified offline.
    ///
    /// # Errors
    ///
    /// Returns an invalid-option error for malformed URLs or base paths.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("oidc-issuer-endpoint", &self.oidc_issuer_endpoint),
            ("staging-public-base-url", &self.staging_public_base_url),
            ("production-public-base-url", &self.production_public_base_url),
            ("override-private-base-url", &self.override_private_base_url),
        ] {
            if let Some(value) = value {
                check_url(name, value)?;
            }
        }

        for (name, value) in [
            ("override-private-basepath", &self.override_private_basepath),
            ("override-public-basepath", &self.override_public_basepath),
        ] {
            if let Some(value) = value
                && !value.starts_with('/')
            {
                return Err(invalid(name, "base path must start with '/'"));
            }
        }

        if let Some(name) = &self.target_system_name
            && name.trim().is_empty()
        {
            return Err(invalid("target-system-name", "cannot be empty"));
        }

        Ok(())
    }

    /// Whether ActiveDocs are created published.
    #[must_use]
    pub const fn activedocs_published(&self) -> bool {
        !self.activedocs_hidden
    }
}

fn invalid(name: &str, message: impl Into<String>) -> ImportError {
    ConfigError::InvalidOption {
        name: name.to_string(),
        message: message.into(),
    }
    .into()
}

fn check_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| invalid(name, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(name, "expected an http(s) URL"));
    }
    Ok(url)
}

/// A 3scale admin portal and the credentials to reach it.
///
/// Written as `http[s]://<access_token>@<admin portal host>`.
#[derive(Clone, PartialEq, Eq)]
pub struct Destination {
    endpoint: Url,
    access_token: String,
}

impl Destination {
    /// Parses a destination URL.
    ///
    /// # Errors
    ///
    /// Returns an invalid-option error if the URL is malformed or carries no
    /// access token.
    pub fn parse(value: &str) -> Result<Self> {
        const NAME: &str = "destination";

        let mut url = check_url(NAME, value)?;
        if url.host_str().is_none() {
            return Err(invalid(NAME, "missing host"));
        }

        let access_token = url.username().to_string();
        if access_token.is_empty() {
            return Err(invalid(
                NAME,
                "missing access token, expected http[s]://<access_token>@<host>",
            ));
        }

        url.set_username("")
            .and_then(|()| url.set_password(None))
            .map_err(|()| invalid(NAME, "cannot strip credentials"))?;
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self {
            endpoint: url,
            access_token,
        })
    }

    /// Admin portal base URL, credentials stripped.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_token", &"***")
            .finish()
    }
}
