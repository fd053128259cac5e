//! Step 8: gateway policy chain of the target service.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::OidcIssuerType;
use crate::error::Result;
use crate::openapi::SecurityKind;
use crate::pipeline::{Step, SyncContext};

/// Merges the policies the definition calls for into the current chain.
#[derive(Debug, Default)]
pub struct UpdatePoliciesStep;

fn builtin(name: &str, configuration: Value) -> Value {
    json!({
        "name": name,
        "version": "builtin",
        "configuration": configuration,
        "enabled": true,
    })
}

/// Policies required by the definition and the overrides.
#[must_use]
pub fn desired_policies(context: &SyncContext) -> Vec<Value> {
    let options = context.options();
    let mut policies = Vec::new();

    if context.security().is_none()
        && let Some(user_key) = &options.default_credentials_userkey
    {
        policies.push(builtin(
            "default_credentials",
            json!({ "auth_type": "user_key", "user_key": user_key }),
        ));
    }

    if let Some(security) = context.security()
        && matches!(security.kind, SecurityKind::OAuth2 { .. })
        && !security.scopes.is_empty()
        && options.oidc_issuer_type == Some(OidcIssuerType::Keycloak)
    {
        let client_roles: Vec<Value> = security
            .scopes
            .iter()
            .map(|scope| json!({ "name": scope }))
            .collect();
        policies.push(builtin(
            "keycloak_role_check",
            json!({
                "type": "whitelist",
                "scopes": [{ "realm_roles": [], "client_roles": client_roles }],
            }),
        ));
    }

    let public_base_path = context.public_base_path();
    let private_base_path = context.private_base_path();
    if public_base_path != private_base_path {
        policies.push(builtin(
            "url_rewriting",
            json!({
                "commands": [{
                    "op": "sub",
                    "regex": format!("^{public_base_path}"),
                    "replace": private_base_path,
                }],
            }),
        ));
    }

    policies
}

fn policy_name(policy: &Value) -> Option<&str> {
    policy.get("name").and_then(Value::as_str)
}

/// Merges `desired` into `current`.
///
/// A policy already in the chain is replaced in place; a new one is put in
/// front of the chain. `apicast` is appended when missing.
#[must_use]
pub fn merge_policies(current: &[Value], desired: Vec<Value>) -> Vec<Value> {
    let mut chain = current.to_vec();
    let mut front = Vec::new();

    for policy in desired {
        let position = chain
            .iter()
            .position(|existing| policy_name(existing) == policy_name(&policy));
        match position {
            Some(index) => chain[index] = policy,
            None => front.push(policy),
        }
    }
    front.append(&mut chain);

    if !front.iter().any(|p| policy_name(p) == Some("apicast")) {
        front.push(builtin("apicast", json!({})));
    }
    front
}

#[async_trait]
impl Step for UpdatePoliciesStep {
    fn name(&self) -> &'static str {
        "update policies"
    }

    async fn execute(&self, context: &mut SyncContext) -> Result<()> {
        let desired = desired_policies(context);
        if desired.is_empty() {
            debug!("No policies required");
            return Ok(());
        }

        let mut policies = context.target()?.policies();
        let merged = merge_policies(policies.ensure_loaded().await?, desired);
        if policies.update(merged).await? {
            info!("Updated policy chain of service {}", context.target()?.id());
        }
        Ok(())
    }
}
