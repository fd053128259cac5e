//! Normalized view over a Swagger 2.0 or OpenAPI 3.x document.

use reqwest::Url;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::operation::{HttpVerb, KeyLocation, OAuthFlow, Operation, Security, SecurityKind};

/// OpenAPI format family of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVersion {
    /// Swagger 2.0.
    Swagger2,
    /// OpenAPI 3.x.
    OpenApi3,
}

impl SpecVersion {
    /// Detects the family from the top level version key.
    #[must_use]
    pub fn detect(document: &Value) -> Option<Self> {
        if document.get("openapi").is_some() {
            Some(Self::OpenApi3)
        } else if document.get("swagger").is_some() {
            Some(Self::Swagger2)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Swagger2 => f.write_str("Swagger 2.0"),
            Self::OpenApi3 => f.write_str("OpenAPI 3"),
        }
    }
}

/// Parsed API definition.
#[derive(Debug, Clone)]
pub struct ApiSpec {
    version: SpecVersion,
    title: String,
    description: Option<String>,
    base_path: Option<String>,
    private_base_url: Option<String>,
    operations: Vec<Operation>,
    security: Option<Security>,
}

impl ApiSpec {
    /// Builds the normalized view of a document.
    ///
    /// # Errors
    ///
    /// Returns a schema error if the document lacks a version key or title,
    /// declares an unsupported security scheme, or more than one global
    /// security requirement.
    pub fn from_document(document: &Value) -> Result<Self> {
        let version = SpecVersion::detect(document).ok_or_else(|| {
            ConfigError::schema("missing 'swagger' or 'openapi' version key", "/")
        })?;

        let title = document
            .pointer("/info/title")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::schema("missing title", "/info/title"))?
            .to_string();

        let description = document
            .pointer("/info/description")
            .and_then(Value::as_str)
            .map(String::from);

        let (base_path, private_base_url) = match version {
            SpecVersion::Swagger2 => swagger_urls(document),
            SpecVersion::OpenApi3 => openapi3_urls(document),
        };

        let security = parse_security(document, version)?;
        let default_security: Vec<String> = security.iter().map(|s| s.id.clone()).collect();
        let operations = parse_operations(document, &default_security);

        debug!(
            "Parsed {:?} definition '{}' with {} operations",
            version,
            title,
            operations.len()
        );

        Ok(Self {
            version,
            title,
            description,
            base_path,
            private_base_url,
            operations,
            security,
        })
    }

    /// Format family.
    #[must_use]
    pub const fn version(&self) -> SpecVersion {
        self.version
    }

    /// `info.title`.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// `info.description`.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Base path every operation path is relative to.
    ///
    /// Swagger `basePath`, or the path of the first OpenAPI server URL.
    #[must_use]
    pub fn base_path(&self) -> &str {
        self.base_path.as_deref().unwrap_or("/")
    }

    /// Scheme and host of the API backend, when the document declares one.
    #[must_use]
    pub fn private_base_url(&self) -> Option<&str> {
        self.private_base_url.as_deref()
    }

    /// Operations in document order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The global security requirement, if any.
    #[must_use]
    pub const fn security(&self) -> Option<&Security> {
        self.security.as_ref()
    }

    /// Returns a copy of `document` pointing its server at `url`.
    #[must_use]
    pub fn with_server_url(&self, document: &Value, url: &Url) -> Value {
        let mut document = document.clone();
        let Some(root) = document.as_object_mut() else {
            return document;
        };

        match self.version {
            SpecVersion::OpenApi3 => {
                root.insert("servers".into(), json!([{ "url": url.as_str() }]));
            }
            SpecVersion::Swagger2 => {
                let host = match (url.host_str(), url.port()) {
                    (Some(host), Some(port)) => format!("{host}:{port}"),
                    (Some(host), None) => host.to_string(),
                    (None, _) => return document,
                };
                root.insert("host".into(), json!(host));
                root.insert("schemes".into(), json!([url.scheme()]));
                root.insert("basePath".into(), json!(url.path()));
            }
        }

        document
    }
}

fn swagger_urls(document: &Value) -> (Option<String>, Option<String>) {
    let base_path = document
        .get("basePath")
        .and_then(Value::as_str)
        .map(String::from);

    let private_base_url = document.get("host").and_then(Value::as_str).map(|host| {
        let scheme = document
            .pointer("/schemes/0")
            .and_then(Value::as_str)
            .unwrap_or("https");
        format!("{scheme}://{host}")
    });

    (base_path, private_base_url)
}

fn openapi3_urls(document: &Value) -> (Option<String>, Option<String>) {
    let Some(server) = document.pointer("/servers/0/url").and_then(Value::as_str) else {
        return (None, None);
    };

    match Url::parse(server) {
        Ok(url) => {
            let origin = url.origin().ascii_serialization();
            let path = url.path().trim_end_matches('/');
            let base_path = (!path.is_empty()).then(|| path.to_string());
            (base_path, Some(origin))
        }
        // Relative server URL: path only
        Err(_) => {
            let path = server.trim_end_matches('/');
            ((!path.is_empty()).then(|| path.to_string()), None)
        }
    }
}

fn parse_operations(document: &Value, default_security: &[String]) -> Vec<Operation> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut operations = Vec::new();
    for (path, item) in paths {
        for verb in HttpVerb::ALL {
            let Some(op) = item.get(verb.key()) else {
                continue;
            };

            let security = op
                .get("security")
                .and_then(Value::as_array)
                .map_or_else(|| default_security.to_vec(), |reqs| requirement_ids(reqs));

            operations.push(Operation {
                verb,
                path: path.clone(),
                operation_id: op.get("operationId").and_then(Value::as_str).map(String::from),
                summary: op.get("summary").and_then(Value::as_str).map(String::from),
                description: op.get("description").and_then(Value::as_str).map(String::from),
                security,
            });
        }
    }

    operations
}

fn requirement_ids(requirements: &[Value]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for requirement in requirements {
        if let Some(map) = requirement.as_object() {
            for id in map.keys() {
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
            }
        }
    }
    ids
}

fn parse_security(document: &Value, version: SpecVersion) -> Result<Option<Security>> {
    let requirements = document
        .get("security")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let ids = requirement_ids(requirements);
    if ids.len() > 1 {
        return Err(ConfigError::schema(
            "only one security requirement is supported",
            "/security",
        )
        .into());
    }
    let Some(id) = ids.into_iter().next() else {
        return Ok(None);
    };

    let scopes = requirements
        .iter()
        .filter_map(|r| r.get(&id))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect();

    let definitions_path = match version {
        SpecVersion::Swagger2 => "/securityDefinitions",
        SpecVersion::OpenApi3 => "/components/securitySchemes",
    };
    let field = format!("{definitions_path}/{id}");
    let scheme = document
        .pointer(definitions_path)
        .and_then(|defs| defs.get(&id))
        .ok_or_else(|| ConfigError::schema(format!("security scheme '{id}' not defined"), &field))?;

    let kind = match scheme.get("type").and_then(Value::as_str) {
        Some("apiKey") => {
            let name = scheme
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| ConfigError::schema("apiKey scheme without name", &field))?;
            let location = match scheme.get("in").and_then(Value::as_str) {
                Some("query") => KeyLocation::Query,
                Some("cookie") => KeyLocation::Cookie,
                _ => KeyLocation::Header,
            };
            SecurityKind::ApiKey {
                name: name.to_string(),
                location,
            }
        }
        Some("oauth2") => {
            let flow = match version {
                SpecVersion::Swagger2 => scheme.get("flow").and_then(Value::as_str),
                SpecVersion::OpenApi3 => scheme
                    .get("flows")
                    .and_then(Value::as_object)
                    .and_then(|flows| flows.keys().next())
                    .map(String::as_str),
            };
            SecurityKind::OAuth2 {
                flow: flow.and_then(OAuthFlow::parse),
            }
        }
        Some("openIdConnect") => SecurityKind::OAuth2 { flow: None },
        other => {
            return Err(ConfigError::schema(
                format!("unsupported security scheme type {}", other.unwrap_or("<none>")),
                &field,
            )
            .into());
        }
    };

    Ok(Some(Security { id, kind, scopes }))
}
