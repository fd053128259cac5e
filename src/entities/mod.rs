//! Typed handles over remote records.
//!
//! Each handle holds the remote id and an optional cached attribute snapshot.
//! Loading is explicit (`ensure_loaded`); after a mutation the cache is
//! replaced with the server's response instead of being re-fetched.

mod activedocs;
mod backend;
mod mapping_rule;
mod metric;
mod proxy;
mod service;

pub use activedocs::ActiveDocs;
pub use backend::Backend;
pub use mapping_rule::MappingRule;
pub use metric::Metric;
pub use proxy::{PolicyChain, Proxy};
pub use service::Service;

use serde_json::Value;
use tracing::debug;

use crate::error::{ImportError, RemoteError, Result};
use crate::remote::Attrs;

/// Fails with an api error when the payload carries a structured error list.
fn check_errors(value: Value, message: &str) -> Result<Value> {
    match value {
        Value::Object(mut map) if map.contains_key("errors") => {
            let errors = map.remove("errors").unwrap_or(Value::Null);
            Err(RemoteError::api(message, errors).into())
        }
        other => Ok(other),
    }
}

/// Converts a single record payload into attributes.
fn into_attrs(value: Value, message: &str) -> Result<Attrs> {
    match check_errors(value, message)? {
        Value::Object(map) => Ok(map),
        other => Err(RemoteError::InvalidResponse {
            message: format!("{message}: expected an object, got {other}"),
        }
        .into()),
    }
}

/// Converts a list payload into attribute records.
fn into_list(value: Value, message: &str) -> Result<Vec<Attrs>> {
    match check_errors(value, message)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| into_attrs(item, message))
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(RemoteError::InvalidResponse {
            message: format!("{message}: expected a list, got {other}"),
        }
        .into()),
    }
}

/// Keeps only the whitelisted keys.
fn filter_params(attrs: &Attrs, valid: &[&str]) -> Attrs {
    attrs
        .iter()
        .filter(|(key, _)| valid.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Whitelisted keys of `desired` whose value differs from `current`.
fn changed_params(current: &Attrs, desired: &Attrs, valid: &[&str]) -> Attrs {
    desired
        .iter()
        .filter(|(key, value)| valid.contains(&key.as_str()) && current.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Reads the numeric `id` attribute.
fn attr_id(attrs: &Attrs, entity: &'static str) -> Result<u64> {
    attrs.get("id").and_then(Value::as_u64).ok_or_else(|| {
        ImportError::from(RemoteError::InvalidResponse {
            message: format!("{entity} record has no id"),
        })
    })
}

fn attr_str<'a>(attrs: &'a Attrs, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(Value::as_str)
}

/// Parses a reference as a concrete id. Zero is not a concrete id.
fn parse_id(reference: &str) -> Option<u64> {
    reference.trim().parse().ok().filter(|id| *id != 0)
}

/// Counts a delete of a record that is already gone as done.
fn deleted_or_gone(result: Result<()>, entity: &str, id: u64) -> Result<()> {
    match result {
        Err(ImportError::Remote(RemoteError::NotFound { .. })) => {
            debug!("{entity} {id} was already deleted");
            Ok(())
        }
        other => other,
    }
}

/// Returns true for lookup errors that should fall back to a system name search.
const fn is_lookup_miss(err: &ImportError) -> bool {
    matches!(
        err,
        ImportError::Remote(RemoteError::NotFound { .. } | RemoteError::InvalidId { .. })
    )
}
