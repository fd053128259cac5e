//! Operations and security schemes extracted from an API definition.

use serde::Serialize;
use std::fmt;

/// HTTP verbs an operation can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// PATCH
    Patch,
    /// TRACE
    Trace,
}

impl HttpVerb {
    /// Every verb, in the order path items are scanned.
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
        Self::Trace,
    ];

    /// Key used in a path item object.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }

    /// Upper case form used by mapping rules.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLocation {
    /// Query string parameter.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

/// OAuth2 flow declared by the definition, normalized across Swagger 2 and OAS 3 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthFlow {
    /// `implicit`
    Implicit,
    /// `password`
    Password,
    /// `application` / `clientCredentials`
    ClientCredentials,
    /// `accessCode` / `authorizationCode`
    AuthorizationCode,
}

impl OAuthFlow {
    /// Parses a flow name from either spec version.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "implicit" => Some(Self::Implicit),
            "password" => Some(Self::Password),
            "application" | "clientCredentials" => Some(Self::ClientCredentials),
            "accessCode" | "authorizationCode" => Some(Self::AuthorizationCode),
            _ => None,
        }
    }

    /// OIDC configuration flag enabling this flow on the gateway.
    #[must_use]
    pub const fn oidc_flag(self) -> &'static str {
        match self {
            Self::Implicit => "implicit_flow_enabled",
            Self::Password => "direct_access_grants_enabled",
            Self::ClientCredentials => "service_accounts_enabled",
            Self::AuthorizationCode => "standard_flow_enabled",
        }
    }
}

/// Kind of a security scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecurityKind {
    /// API key credentials.
    ApiKey {
        /// Parameter name carrying the key.
        name: String,
        /// Where the key is sent.
        location: KeyLocation,
    },
    /// OAuth2 / OpenID Connect.
    OAuth2 {
        /// Declared flow, if any.
        flow: Option<OAuthFlow>,
    },
}

/// The single security requirement applied to the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Security {
    /// Scheme id as named in the definition.
    pub id: String,
    /// Scheme details.
    pub kind: SecurityKind,
    /// Scopes required by the requirement.
    pub scopes: Vec<String>,
}

impl Security {
    /// Returns true for OAuth2 / OpenID Connect schemes.
    #[must_use]
    pub const fn is_oauth2(&self) -> bool {
        matches!(self.kind, SecurityKind::OAuth2 { .. })
    }
}

/// One (verb, path) pair of the definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// HTTP verb.
    pub verb: HttpVerb,
    /// Path template, relative to the base path.
    pub path: String,
    /// `operationId`, if declared.
    pub operation_id: Option<String>,
    /// `summary`, if declared.
    pub summary: Option<String>,
    /// `description`, if declared.
    pub description: Option<String>,
    /// Security requirement ids applying to this operation.
    pub security: Vec<String>,
}

impl Operation {
    /// Human readable method name: the `operationId`, else `VERB path`.
    #[must_use]
    pub fn friendly_name(&self) -> String {
        self.operation_id
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.verb, self.path))
    }

    /// Method system name derived from the friendly name.
    #[must_use]
    pub fn system_name(&self) -> String {
        to_system_name(&self.friendly_name())
    }
}

/// Lower cases and replaces every character outside `[a-z0-9_]` with `_`.
#[must_use]
pub fn to_system_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
