//! Shared state of one import run.
//!
//! Inputs are fixed at construction. The produced slots (target service,
//! operation list, delete flag) are filled by the steps, in order.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::config::ImportOptions;
use crate::entities::Service;
use crate::error::{PipelineError, Result};
use crate::openapi::{ApiSpec, Operation, Security, to_system_name};
use crate::remote::{Attrs, Remote};

/// An operation plus the metadata the pipeline attaches to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOperation {
    operation: Operation,
    metric_id: Option<u64>,
}

impl ImportOperation {
    /// Wraps an operation with no metadata yet.
    #[must_use]
    pub const fn new(operation: Operation) -> Self {
        Self {
            operation,
            metric_id: None,
        }
    }

    /// The underlying operation.
    #[must_use]
    pub const fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Metric or method the operation is counted against.
    #[must_use]
    pub const fn metric_id(&self) -> Option<u64> {
        self.metric_id
    }

    /// Records the resolved metric or method.
    pub const fn set_metric_id(&mut self, metric_id: u64) {
        self.metric_id = Some(metric_id);
    }

    /// Attributes of the method counting this operation.
    #[must_use]
    pub fn method_attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert("friendly_name".into(), json!(self.operation.friendly_name()));
        attrs.insert("system_name".into(), json!(self.operation.system_name()));
        if let Some(description) = &self.operation.description {
            attrs.insert("description".into(), json!(description));
        }
        attrs
    }

    /// Mapping rule pattern under `public_base_path`.
    ///
    /// Strict matching anchors the pattern with `$`.
    #[must_use]
    pub fn pattern(&self, public_base_path: &str, prefix_matching: bool) -> String {
        let mut pattern = join_paths(public_base_path, &self.operation.path);
        if !prefix_matching {
            pattern.push('$');
        }
        pattern
    }

    /// Attributes of the mapping rule routing this operation.
    ///
    /// # Errors
    ///
    /// Returns a missing-context error if no metric was resolved yet.
    pub fn mapping_rule(&self, public_base_path: &str, prefix_matching: bool) -> Result<Attrs> {
        let metric_id = self
            .metric_id
            .ok_or(PipelineError::MissingContext { slot: "metric_id" })?;

        let mut attrs = Attrs::new();
        attrs.insert("http_method".into(), json!(self.operation.verb.as_str()));
        attrs.insert(
            "pattern".into(),
            json!(self.pattern(public_base_path, prefix_matching)),
        );
        attrs.insert("metric_id".into(), json!(metric_id));
        attrs.insert("delta".into(), json!(1));
        Ok(attrs)
    }
}

/// Joins a base path and a relative path with exactly one `/` between them.
#[must_use]
pub fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return if base.is_empty() { "/".into() } else { base.into() };
    }
    format!("{base}/{path}")
}

/// State shared by every step of one run.
pub struct SyncContext {
    api_spec: ApiSpec,
    resource: Value,
    remote: Arc<dyn Remote>,
    options: ImportOptions,
    target: Option<Service>,
    operations: Option<Vec<ImportOperation>>,
    delete_mapping_rules: bool,
}

impl SyncContext {
    /// Creates the context of an import. Mapping rule deletion is on.
    #[must_use]
    pub fn new(
        api_spec: ApiSpec,
        resource: Value,
        remote: Arc<dyn Remote>,
        options: ImportOptions,
    ) -> Self {
        Self {
            api_spec,
            resource,
            remote,
            options,
            target: None,
            operations: None,
            delete_mapping_rules: true,
        }
    }

    /// Parsed definition.
    #[must_use]
    pub const fn api_spec(&self) -> &ApiSpec {
        &self.api_spec
    }

    /// Raw document as loaded.
    #[must_use]
    pub const fn resource(&self) -> &Value {
        &self.resource
    }

    /// Remote API handle.
    #[must_use]
    pub const fn remote(&self) -> &Arc<dyn Remote> {
        &self.remote
    }

    /// User overrides.
    #[must_use]
    pub const fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Security requirement of the definition.
    #[must_use]
    pub const fn security(&self) -> Option<&Security> {
        self.api_spec.security()
    }

    /// System name of the target: the override, else derived from the title.
    #[must_use]
    pub fn target_system_name(&self) -> String {
        self.options
            .target_system_name
            .clone()
            .unwrap_or_else(|| to_system_name(self.api_spec.title()))
    }

    /// Base path the gateway exposes.
    #[must_use]
    pub fn public_base_path(&self) -> &str {
        self.options
            .override_public_basepath
            .as_deref()
            .unwrap_or_else(|| self.api_spec.base_path())
    }

    /// Base path the backend serves.
    #[must_use]
    pub fn private_base_path(&self) -> &str {
        self.options
            .override_private_basepath
            .as_deref()
            .unwrap_or_else(|| self.api_spec.base_path())
    }

    /// The resolved target service.
    ///
    /// # Errors
    ///
    /// Returns a missing-context error before the target was resolved.
    pub fn target(&self) -> Result<&Service> {
        self.target
            .as_ref()
            .ok_or_else(|| PipelineError::MissingContext { slot: "target" }.into())
    }

    /// Mutable access to the resolved target service.
    ///
    /// # Errors
    ///
    /// Returns a missing-context error before the target was resolved.
    pub fn target_mut(&mut self) -> Result<&mut Service> {
        self.target
            .as_mut()
            .ok_or_else(|| PipelineError::MissingContext { slot: "target" }.into())
    }

    /// Stores the resolved target service.
    pub fn set_target(&mut self, service: Service) {
        self.target = Some(service);
    }

    /// Operations of the definition, computed on first access.
    pub fn operations(&mut self) -> &[ImportOperation] {
        let spec = &self.api_spec;
        self.operations
            .get_or_insert_with(|| collect_operations(spec))
            .as_slice()
    }

    /// The target and the operation list, borrowed together.
    ///
    /// # Errors
    ///
    /// Returns a missing-context error before the target was resolved.
    pub fn target_and_operations(&mut self) -> Result<(&Service, &mut [ImportOperation])> {
        let Self {
            api_spec,
            target,
            operations,
            ..
        } = self;

        let target = target
            .as_ref()
            .ok_or(PipelineError::MissingContext { slot: "target" })?;
        let operations = operations.get_or_insert_with(|| collect_operations(api_spec));
        Ok((target, operations.as_mut_slice()))
    }

    /// Whether existing mapping rules are deleted before new ones are created.
    #[must_use]
    pub const fn delete_mapping_rules(&self) -> bool {
        self.delete_mapping_rules
    }

    /// Sets the mapping rule deletion flag.
    pub const fn set_delete_mapping_rules(&mut self, delete: bool) {
        self.delete_mapping_rules = delete;
    }
}

fn collect_operations(spec: &ApiSpec) -> Vec<ImportOperation> {
    spec.operations()
        .iter()
        .cloned()
        .map(ImportOperation::new)
        .collect()
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("title", &self.api_spec.title())
            .field("target", &self.target)
            .field("operations", &self.operations.as_ref().map(Vec::len))
            .field("delete_mapping_rules", &self.delete_mapping_rules)
            .finish_non_exhaustive()
    }
}
