//! The unit of work of an import.

use async_trait::async_trait;

use crate::error::Result;

use super::SyncContext;

/// One reconciliation step.
///
/// Steps read their inputs from the context and leave their products in it;
/// they never talk to each other directly.
#[async_trait]
pub trait Step: Send + Sync {
    /// Name used in logs, reports and error messages.
    fn name(&self) -> &'static str;

    /// Runs the step.
    async fn execute(&self, context: &mut SyncContext) -> Result<()>;
}
