//! Step 3: one method per operation.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::entities::Service;
use crate::error::{ImportError, Result};
use crate::pipeline::{Step, SyncContext};
use crate::planner::{SystemNamed, missing};
use crate::remote::Attrs;

/// Creates the methods missing on the target and records the metric id of
/// every operation.
#[derive(Debug, Default)]
pub struct CreateMethodsStep;

/// Creates a method, falling back to the metric or method already owning its
/// system name. Returns the id and whether a method was created.
async fn create_or_reuse(
    service: &Service,
    hits_id: u64,
    system_name: &str,
    attrs: &Attrs,
) -> Result<(u64, bool)> {
    match service.create_method(hits_id, attrs).await {
        Ok(method) => Ok((method.id(), true)),
        Err(e) if e.is_already_exists() => {
            warn!("Method {system_name} not created, a metric with the same system_name exists");
            service
                .find_metric_or_method(system_name)
                .await?
                .map(|existing| (existing.id(), false))
                .ok_or(e)
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl Step for CreateMethodsStep {
    fn name(&self) -> &'static str {
        "create methods"
    }

    async fn execute(&self, context: &mut SyncContext) -> Result<()> {
        let (service, operations) = context.target_and_operations()?;

        let hits = service.hits().await?;
        let existing = service.methods().await?;
        let mut known: HashMap<String, u64> = existing
            .iter()
            .map(|method| (method.system_name().to_string(), method.id()))
            .collect();

        let desired: Vec<(String, Attrs)> = operations
            .iter()
            .map(|op| (op.operation().system_name(), op.method_attrs()))
            .collect();
        let to_create = missing(&desired, &existing, |(system_name, _), method| {
            system_name == method.system_name()
        });

        let mut created = 0_usize;
        for (system_name, attrs) in to_create {
            // Two operations may share a system name
            if known.contains_key(system_name) {
                continue;
            }
            let (id, was_created) = create_or_reuse(service, hits.id(), system_name, attrs).await?;
            known.insert(system_name.clone(), id);
            if was_created {
                created += 1;
            }
        }

        for op in operations.iter_mut() {
            let system_name = op.operation().system_name();
            let id = known.get(&system_name).copied().ok_or_else(|| {
                ImportError::internal(format!("no metric resolved for method {system_name}"))
            })?;
            op.set_metric_id(id);
        }

        info!(
            "Service {} has {} methods, created {created}",
            service.id(),
            known.len()
        );
        Ok(())
    }
}
