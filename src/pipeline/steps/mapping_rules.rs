//! Steps 4 and 5: replace the mapping rules of the target service.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;
use crate::pipeline::{Step, SyncContext};
use crate::remote::Attrs;

/// Deletes every mapping rule of the target when the context asks for it.
#[derive(Debug, Default)]
pub struct DestroyMappingRulesStep;

#[async_trait]
impl Step for DestroyMappingRulesStep {
    fn name(&self) -> &'static str {
        "destroy mapping rules"
    }

    async fn execute(&self, context: &mut SyncContext) -> Result<()> {
        if !context.delete_mapping_rules() {
            debug!("Keeping existing mapping rules");
            return Ok(());
        }

        let service = context.target()?;
        let rules = service.mapping_rules().await?;
        for rule in &rules {
            rule.delete().await?;
        }

        info!(
            "Deleted {} mapping rules of service {}",
            rules.len(),
            service.id()
        );
        Ok(())
    }
}

/// Creates one mapping rule per operation.
#[derive(Debug, Default)]
pub struct CreateMappingRulesStep;

#[async_trait]
impl Step for CreateMappingRulesStep {
    fn name(&self) -> &'static str {
        "create mapping rules"
    }

    async fn execute(&self, context: &mut SyncContext) -> Result<()> {
        let public_base_path = context.public_base_path().to_string();
        let prefix_matching = context.options().prefix_matching;

        let rules = context
            .operations()
            .iter()
            .map(|op| op.mapping_rule(&public_base_path, prefix_matching))
            .collect::<Result<Vec<Attrs>>>()?;

        let service = context.target()?;
        for rule in &rules {
            let created = service.create_mapping_rule(rule).await?;
            debug!(
                "Created mapping rule {} {:?} {:?}",
                created.id(),
                created.http_method(),
                created.pattern()
            );
        }

        info!(
            "Created {} mapping rules on service {}",
            rules.len(),
            service.id()
        );
        Ok(())
    }
}
