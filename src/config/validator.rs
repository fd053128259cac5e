//! Structural validation of API definitions.
//!
//! Checks the parts of a Swagger 2.0 / OpenAPI 3.x document the import relies
//! on before any remote call is made. Problems are collected into a
//! [`ValidationResult`]; the first error fails validation.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::openapi::{HttpVerb, SpecVersion};

/// Security scheme types the import can translate into gateway settings.
const SUPPORTED_SECURITY_TYPES: &[&str] = &["apiKey", "oauth2", "openIdConnect"];

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The document path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ValidationResult {
    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }
}

/// Validator for API definitions.
#[derive(Debug, Default)]
pub struct SpecValidator;

impl SpecValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a parsed document.
    ///
    /// # Errors
    ///
    /// Returns a schema validation error naming the first problem found.
    pub fn validate(&self, document: &Value) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        match SpecVersion::detect(document) {
            Some(version) => {
                Self::validate_version(document, version, &mut result);
                Self::validate_info(document, &mut result);
                Self::validate_paths(document, &mut result);
                Self::validate_security(document, version, &mut result);
            }
            None => result.error("/", "missing 'swagger' or 'openapi' version key"),
        }

        if let Some(first_error) = result.errors.first() {
            return Err(ConfigError::SchemaValidation {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }
            .into());
        }

        debug!(
            "API definition validation passed with {} warnings",
            result.warnings.len()
        );
        Ok(result)
    }

    fn validate_version(document: &Value, version: SpecVersion, result: &mut ValidationResult) {
        match version {
            SpecVersion::Swagger2 => {
                if document.get("swagger").and_then(Value::as_str) != Some("2.0") {
                    result.error("/swagger", "swagger version must be \"2.0\"");
                }
            }
            SpecVersion::OpenApi3 => {
                let declared = document.get("openapi").and_then(Value::as_str);
                if !declared.is_some_and(|v| v.starts_with("3.")) {
                    result.error("/openapi", "openapi version must be 3.x");
                }
                if let Some(servers) = document.get("servers")
                    && !servers.is_array()
                {
                    result.error("/servers", "servers must be an array");
                }
            }
        }
    }

    fn validate_info(document: &Value, result: &mut ValidationResult) {
        let Some(info) = document.get("info").and_then(Value::as_object) else {
            result.error("/info", "info object is required");
            return;
        };

        match info.get("title").and_then(Value::as_str) {
            Some(title) if !title.trim().is_empty() => {}
            Some(_) => result.error("/info/title", "title cannot be empty"),
            None => result.error("/info/title", "title is required"),
        }

        if !info.get("version").is_some_and(|v| v.is_string() || v.is_number()) {
            result.error("/info/version", "version is required");
        }
    }

    fn validate_paths(document: &Value, result: &mut ValidationResult) {
        let Some(paths) = document.get("paths").and_then(Value::as_object) else {
            result.error("/paths", "paths object is required");
            return;
        };

        let mut operation_ids = HashSet::new();
        let mut operations = 0_usize;

        for (path, item) in paths {
            let field = format!("/paths/{path}");
            if !path.starts_with('/') {
                result.error(&field, format!("path '{path}' must start with '/'"));
            }
            let Some(item) = item.as_object() else {
                result.error(&field, "path item must be an object");
                continue;
            };

            for verb in HttpVerb::ALL {
                let Some(operation) = item.get(verb.key()) else {
                    continue;
                };
                operations += 1;
                let op_field = format!("{field}/{}", verb.key());
                Self::validate_operation(operation, &op_field, &mut operation_ids, result);
            }
        }

        if operations == 0 {
            result
                .warnings
                .push(String::from("No operations defined in API definition"));
        }
    }

    fn validate_operation<'a>(
        operation: &'a Value,
        field: &str,
        operation_ids: &mut HashSet<&'a str>,
        result: &mut ValidationResult,
    ) {
        let Some(operation) = operation.as_object() else {
            result.error(field, "operation must be an object");
            return;
        };

        if let Some(id) = operation.get("operationId").and_then(Value::as_str)
            && !operation_ids.insert(id)
        {
            result.error(
                format!("{field}/operationId"),
                format!("Duplicate operationId: {id}"),
            );
        }

        if let Some(security) = operation.get("security")
            && !security.is_array()
        {
            result.error(format!("{field}/security"), "security must be an array");
        }
    }

    fn validate_security(document: &Value, version: SpecVersion, result: &mut ValidationResult) {
        let definitions_path = match version {
            SpecVersion::Swagger2 => "/securityDefinitions",
            SpecVersion::OpenApi3 => "/components/securitySchemes",
        };
        let empty = Map::new();
        let definitions = document
            .pointer(definitions_path)
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        for (id, scheme) in definitions {
            Self::validate_scheme(scheme, &format!("{definitions_path}/{id}"), result);
        }

        let Some(requirements) = document.get("security") else {
            return;
        };
        let Some(requirements) = requirements.as_array() else {
            result.error("/security", "security must be an array");
            return;
        };

        let mut ids: Vec<&str> = Vec::new();
        for requirement in requirements {
            let Some(requirement) = requirement.as_object() else {
                result.error("/security", "security requirement must be an object");
                continue;
            };
            for id in requirement.keys() {
                if !definitions.contains_key(id) {
                    result.error(
                        "/security",
                        format!("security scheme '{id}' is not defined"),
                    );
                }
                if !ids.contains(&id.as_str()) {
                    ids.push(id);
                }
            }
        }

        if ids.len() > 1 {
            result.error("/security", "only one security requirement is supported");
        }
    }

    fn validate_scheme(scheme: &Value, field: &str, result: &mut ValidationResult) {
        let kind = scheme.get("type").and_then(Value::as_str);
        match kind {
            Some("apiKey") => {
                if scheme.get("name").and_then(Value::as_str).is_none() {
                    result.error(format!("{field}/name"), "apiKey scheme requires a name");
                }
                match scheme.get("in").and_then(Value::as_str) {
                    Some("query" | "header") => {}
                    Some("cookie") => result.warnings.push(format!(
                        "{field}: cookie credentials are sent as headers by the gateway"
                    )),
                    _ => result.error(format!("{field}/in"), "apiKey scheme requires 'in'"),
                }
            }
            Some(other) if SUPPORTED_SECURITY_TYPES.contains(&other) => {}
            Some(other) => result.error(
                format!("{field}/type"),
                format!("unsupported security scheme type '{other}'"),
            ),
            None => result.error(format!("{field}/type"), "security scheme type is required"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use serde_json::json;

    fn valid_swagger() -> Value {
        json!({
            "swagger": "2.0",
            "info": { "title": "Petstore", "version": "1.0.0" },
            "securityDefinitions": {
                "api_key": { "type": "apiKey", "name": "api_key", "in": "header" }
            },
            "security": [{ "api_key": [] }],
            "paths": {
                "/pets": { "get": { "operationId": "listPets" } }
            }
        })
    }

    fn first_field(document: &Value) -> Option<String> {
        match SpecValidator::new().validate(document) {
            Err(ImportError::Config(ConfigError::SchemaValidation { field, .. })) => field,
            _ => None,
        }
    }

    #[test]
    fn test_valid_document() {
        let result = SpecValidator::new().validate(&valid_swagger()).expect("valid");
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_title() {
        let mut document = valid_swagger();
        document["info"] = json!({ "version": "1" });
        assert_eq!(first_field(&document).as_deref(), Some("/info/title"));
    }

    #[test]
    fn test_missing_paths() {
        let mut document = valid_swagger();
        if let Some(root) = document.as_object_mut() {
            root.remove("paths");
        }
        assert_eq!(first_field(&document).as_deref(), Some("/paths"));
    }

    #[test]
    fn test_unsupported_security_type() {
        let mut document = valid_swagger();
        document["securityDefinitions"]["basic"] = json!({ "type": "basic" });
        assert_eq!(
            first_field(&document).as_deref(),
            Some("/securityDefinitions/basic/type")
        );
    }

    #[test]
    fn test_duplicate_operation_id() {
        let mut document = valid_swagger();
        document["paths"]["/pets"]["post"] = json!({ "operationId": "listPets" });
        assert_eq!(
            first_field(&document).as_deref(),
            Some("/paths//pets/post/operationId")
        );
    }

    #[test]
    fn test_empty_paths_is_a_warning() {
        let document = json!({
            "openapi": "3.0.2",
            "info": { "title": "Empty", "version": "1" },
            "paths": {}
        });
        let result = SpecValidator::new().validate(&document).expect("valid");
        assert_eq!(result.warnings.len(), 1);
    }
}
