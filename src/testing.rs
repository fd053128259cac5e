//! In-memory [`Remote`] used by entity and pipeline tests.
//!
//! Behaves like the admin API where the import depends on it: ids are
//! allocated sequentially, system names are unique per scope, every service
//! and backend gets a `hits` metric, lists are paginated and rejected
//! requests answer with a structured `errors` object.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{RemoteError, Result};
use crate::remote::{Attrs, Remote, Scope};

/// A canned failure for one call.
#[derive(Debug, Clone)]
pub enum Injected {
    /// Answer with `{"errors": ...}`.
    Api(Value),
    /// Fail with an unexpected HTTP status.
    Status(u16),
}

#[derive(Default)]
struct State {
    next_id: u64,
    services: Vec<Attrs>,
    backends: Vec<Attrs>,
    metrics: HashMap<Scope, Vec<Attrs>>,
    mapping_rules: HashMap<Scope, Vec<Attrs>>,
    proxies: HashMap<u64, Attrs>,
    oidc: HashMap<u64, Attrs>,
    policies: HashMap<u64, Vec<Value>>,
    activedocs: Vec<Attrs>,
    calls: Vec<String>,
    failures: HashMap<String, Injected>,
}

impl State {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, attrs: &Attrs) -> Attrs {
        let mut record = attrs.clone();
        record.insert("id".into(), json!(self.allocate()));
        record
    }

    fn add_hits(&mut self, scope: Scope) {
        let hits = self.record(&object(json!({
            "friendly_name": "Hits",
            "system_name": "hits",
            "unit": "hit",
        })));
        self.metrics.entry(scope).or_default().push(hits);
    }
}

fn object(value: Value) -> Attrs {
    match value {
        Value::Object(map) => map,
        _ => Attrs::new(),
    }
}

fn taken() -> Value {
    json!({ "errors": { "system_name": ["has already been taken"] } })
}

fn has_system_name(records: &[Attrs], attrs: &Attrs) -> bool {
    let wanted = attrs.get("system_name");
    wanted.is_some() && records.iter().any(|r| r.get("system_name") == wanted)
}

fn page(records: &[Attrs], page: u32, per_page: usize) -> Value {
    let start = (page.saturating_sub(1) as usize).saturating_mul(per_page);
    Value::Array(
        records
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .map(Value::Object)
            .collect(),
    )
}

fn merge(record: &mut Attrs, attrs: &Attrs) {
    for (key, value) in attrs {
        record.insert(key.clone(), value.clone());
    }
}

fn missing(entity: &str, id: u64) -> crate::error::ImportError {
    RemoteError::not_found("resource", format!("{entity} {id}")).into()
}

/// Removes the record with the given id, failing like the api when it is absent.
fn remove(records: Option<&mut Vec<Attrs>>, entity: &str, id: u64) -> Result<()> {
    let records = records.ok_or_else(|| missing(entity, id))?;
    let before = records.len();
    records.retain(|r| r["id"] != id);
    if records.len() == before {
        return Err(missing(entity, id));
    }
    Ok(())
}

/// In-memory admin API.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<State>,
}

impl FakeRemote {
    /// Creates an empty account.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `call` fail.
    pub fn inject(&self, call: &str, failure: Injected) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(call.to_string(), failure);
    }

    /// Every call made so far, by name.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of times `call` was made.
    pub fn count(&self, call: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| *c == call)
            .count()
    }

    /// Forgets the call log.
    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Adds a service directly; returns its id.
    pub fn seed_service(&self, attrs: Value) -> u64 {
        let mut state = self.state.lock().unwrap();
        Self::insert_service(&mut state, &object(attrs))
    }

    /// Adds a backend directly; returns its id.
    pub fn seed_backend(&self, attrs: Value) -> u64 {
        let mut state = self.state.lock().unwrap();
        let record = state.record(&object(attrs));
        let id = record["id"].as_u64().unwrap();
        state.backends.push(record);
        state.add_hits(Scope::Backend(id));
        id
    }

    /// Adds a metric or method directly; returns its id.
    pub fn seed_metric(&self, scope: Scope, attrs: Value) -> u64 {
        let mut state = self.state.lock().unwrap();
        let record = state.record(&object(attrs));
        let id = record["id"].as_u64().unwrap();
        state.metrics.entry(scope).or_default().push(record);
        id
    }

    /// Services of the account.
    pub fn services(&self) -> Vec<Attrs> {
        self.state.lock().unwrap().services.clone()
    }

    /// Metrics and methods of a scope.
    pub fn metrics(&self, scope: Scope) -> Vec<Attrs> {
        let state = self.state.lock().unwrap();
        state.metrics.get(&scope).cloned().unwrap_or_default()
    }

    /// Mapping rules of a scope.
    pub fn mapping_rules(&self, scope: Scope) -> Vec<Attrs> {
        let state = self.state.lock().unwrap();
        state.mapping_rules.get(&scope).cloned().unwrap_or_default()
    }

    /// Proxy settings of a service.
    pub fn proxy(&self, service_id: u64) -> Attrs {
        let state = self.state.lock().unwrap();
        state.proxies.get(&service_id).cloned().unwrap_or_default()
    }

    /// OIDC configuration of a service.
    pub fn oidc(&self, service_id: u64) -> Option<Attrs> {
        self.state.lock().unwrap().oidc.get(&service_id).cloned()
    }

    /// Policy chain of a service.
    pub fn policies(&self, service_id: u64) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state.policies.get(&service_id).cloned().unwrap_or_default()
    }

    /// ActiveDocs of the account.
    pub fn activedocs(&self) -> Vec<Attrs> {
        self.state.lock().unwrap().activedocs.clone()
    }

    fn insert_service(state: &mut State, attrs: &Attrs) -> u64 {
        let record = state.record(attrs);
        let id = record["id"].as_u64().unwrap();
        let system_name = record
            .get("system_name")
            .and_then(Value::as_str)
            .unwrap_or("api")
            .to_string();
        state.services.push(record);
        state.add_hits(Scope::Service(id));
        state.proxies.insert(
            id,
            object(json!({
                "service_id": id,
                "sandbox_endpoint": format!("https://{system_name}-staging.gw.example.com:443"),
                "endpoint": format!("https://{system_name}.gw.example.com:443"),
                "version": 1,
            })),
        );
        state.policies.insert(
            id,
            vec![json!({
                "name": "apicast",
                "version": "builtin",
                "configuration": {},
                "enabled": true,
            })],
        );
        id
    }

    /// Logs the call and returns the injected failure, if any.
    fn enter(&self, call: &str) -> Result<Option<Value>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.to_string());
        match state.failures.get(call) {
            Some(Injected::Api(errors)) => Ok(Some(json!({ "errors": errors }))),
            Some(Injected::Status(status)) => {
                Err(RemoteError::request_failed(*status, "injected failure").into())
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Remote for FakeRemote {
    async fn list_services(&self, page_no: u32, per_page: usize) -> Result<Value> {
        self.enter("list_services")?;
        Ok(page(&self.state.lock().unwrap().services, page_no, per_page))
    }

    async fn show_service(&self, id: u64) -> Result<Value> {
        self.enter("show_service")?;
        let state = self.state.lock().unwrap();
        state
            .services
            .iter()
            .find(|s| s["id"] == id)
            .map(|s| Value::Object(s.clone()))
            .ok_or_else(|| missing("service", id))
    }

    async fn create_service(&self, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("create_service")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        if has_system_name(&state.services, attrs) {
            return Ok(taken());
        }
        let id = Self::insert_service(&mut state, attrs);
        let created = state.services.iter().find(|s| s["id"] == id).cloned();
        Ok(created.map_or(Value::Null, Value::Object))
    }

    async fn update_service(&self, id: u64, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("update_service")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        let service = state
            .services
            .iter_mut()
            .find(|s| s["id"] == id)
            .ok_or_else(|| missing("service", id))?;
        merge(service, attrs);
        Ok(Value::Object(service.clone()))
    }

    async fn delete_service(&self, id: u64) -> Result<()> {
        self.enter("delete_service")?;
        remove(Some(&mut self.state.lock().unwrap().services), "service", id)
    }

    async fn list_backends(&self, page_no: u32, per_page: usize) -> Result<Value> {
        self.enter("list_backends")?;
        Ok(page(&self.state.lock().unwrap().backends, page_no, per_page))
    }

    async fn show_backend(&self, id: u64) -> Result<Value> {
        self.enter("show_backend")?;
        let state = self.state.lock().unwrap();
        state
            .backends
            .iter()
            .find(|b| b["id"] == id)
            .map(|b| Value::Object(b.clone()))
            .ok_or_else(|| missing("backend", id))
    }

    async fn create_backend(&self, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("create_backend")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        if has_system_name(&state.backends, attrs) {
            return Ok(taken());
        }
        let record = state.record(attrs);
        let id = record["id"].as_u64().unwrap();
        state.backends.push(record.clone());
        state.add_hits(Scope::Backend(id));
        Ok(Value::Object(record))
    }

    async fn update_backend(&self, id: u64, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("update_backend")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        let backend = state
            .backends
            .iter_mut()
            .find(|b| b["id"] == id)
            .ok_or_else(|| missing("backend", id))?;
        merge(backend, attrs);
        Ok(Value::Object(backend.clone()))
    }

    async fn delete_backend(&self, id: u64) -> Result<()> {
        self.enter("delete_backend")?;
        remove(Some(&mut self.state.lock().unwrap().backends), "backend", id)
    }

    async fn list_metrics(&self, scope: Scope, page_no: u32, per_page: usize) -> Result<Value> {
        self.enter("list_metrics")?;
        let state = self.state.lock().unwrap();
        let metrics = state.metrics.get(&scope).map(Vec::as_slice).unwrap_or_default();
        Ok(page(metrics, page_no, per_page))
    }

    async fn create_metric(&self, scope: Scope, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("create_metric")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        if has_system_name(state.metrics.get(&scope).map(Vec::as_slice).unwrap_or_default(), attrs) {
            return Ok(taken());
        }
        let record = state.record(attrs);
        state.metrics.entry(scope).or_default().push(record.clone());
        Ok(Value::Object(record))
    }

    async fn list_methods(
        &self,
        scope: Scope,
        metric_id: u64,
        page_no: u32,
        per_page: usize,
    ) -> Result<Value> {
        self.enter("list_methods")?;
        let state = self.state.lock().unwrap();
        let methods: Vec<Attrs> = state
            .metrics
            .get(&scope)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|m| m.get("parent_id") == Some(&json!(metric_id)))
            .cloned()
            .collect();
        Ok(page(&methods, page_no, per_page))
    }

    async fn create_method(&self, scope: Scope, metric_id: u64, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("create_method")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        if has_system_name(state.metrics.get(&scope).map(Vec::as_slice).unwrap_or_default(), attrs) {
            return Ok(taken());
        }
        let mut record = state.record(attrs);
        record.insert("parent_id".into(), json!(metric_id));
        state.metrics.entry(scope).or_default().push(record.clone());
        Ok(Value::Object(record))
    }

    async fn delete_metric(&self, scope: Scope, id: u64) -> Result<()> {
        self.enter("delete_metric")?;
        remove(self.state.lock().unwrap().metrics.get_mut(&scope), "metric", id)
    }

    async fn list_mapping_rules(&self, scope: Scope, page_no: u32, per_page: usize) -> Result<Value> {
        self.enter("list_mapping_rules")?;
        let state = self.state.lock().unwrap();
        let rules = state.mapping_rules.get(&scope).map(Vec::as_slice).unwrap_or_default();
        Ok(page(rules, page_no, per_page))
    }

    async fn create_mapping_rule(&self, scope: Scope, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("create_mapping_rule")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        let record = state.record(attrs);
        state.mapping_rules.entry(scope).or_default().push(record.clone());
        Ok(Value::Object(record))
    }

    async fn delete_mapping_rule(&self, scope: Scope, id: u64) -> Result<()> {
        self.enter("delete_mapping_rule")?;
        remove(self.state.lock().unwrap().mapping_rules.get_mut(&scope), "mapping rule", id)
    }

    async fn show_proxy(&self, service_id: u64) -> Result<Value> {
        self.enter("show_proxy")?;
        let state = self.state.lock().unwrap();
        state
            .proxies
            .get(&service_id)
            .map(|p| Value::Object(p.clone()))
            .ok_or_else(|| missing("proxy", service_id))
    }

    async fn update_proxy(&self, service_id: u64, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("update_proxy")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        let proxy = state
            .proxies
            .get_mut(&service_id)
            .ok_or_else(|| missing("proxy", service_id))?;
        merge(proxy, attrs);
        Ok(Value::Object(proxy.clone()))
    }

    async fn deploy_proxy(&self, service_id: u64) -> Result<Value> {
        if let Some(errors) = self.enter("deploy_proxy")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        let proxy = state
            .proxies
            .get_mut(&service_id)
            .ok_or_else(|| missing("proxy", service_id))?;
        let version = proxy.get("version").and_then(Value::as_u64).unwrap_or(0) + 1;
        proxy.insert("version".into(), json!(version));
        Ok(Value::Object(proxy.clone()))
    }

    async fn update_oidc(&self, service_id: u64, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("update_oidc")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        state.oidc.insert(service_id, attrs.clone());
        Ok(Value::Object(attrs.clone()))
    }

    async fn show_policies(&self, service_id: u64) -> Result<Value> {
        self.enter("show_policies")?;
        let state = self.state.lock().unwrap();
        Ok(Value::Array(
            state.policies.get(&service_id).cloned().unwrap_or_default(),
        ))
    }

    async fn update_policies(&self, service_id: u64, chain: &[Value]) -> Result<Value> {
        if let Some(errors) = self.enter("update_policies")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        state.policies.insert(service_id, chain.to_vec());
        Ok(Value::Array(chain.to_vec()))
    }

    async fn list_activedocs(&self) -> Result<Value> {
        self.enter("list_activedocs")?;
        Ok(page(&self.state.lock().unwrap().activedocs, 1, usize::MAX))
    }

    async fn create_activedocs(&self, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("create_activedocs")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        if has_system_name(&state.activedocs, attrs) {
            return Ok(taken());
        }
        let record = state.record(attrs);
        state.activedocs.push(record.clone());
        Ok(Value::Object(record))
    }

    async fn update_activedocs(&self, id: u64, attrs: &Attrs) -> Result<Value> {
        if let Some(errors) = self.enter("update_activedocs")? {
            return Ok(errors);
        }
        let mut state = self.state.lock().unwrap();
        let docs = state
            .activedocs
            .iter_mut()
            .find(|d| d["id"] == id)
            .ok_or_else(|| missing("activedocs", id))?;
        merge(docs, attrs);
        Ok(Value::Object(docs.clone()))
    }
}
