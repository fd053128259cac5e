//! Synchronization pipeline.
//!
//! A run builds a [`SyncContext`] from the parsed definition and the options,
//! then executes the fixed list of steps in order:
//!
//! 1. create or update the target service
//! 2. proxy settings
//! 3. methods
//! 4. delete existing mapping rules
//! 5. mapping rules
//! 6. ActiveDocs
//! 7. OIDC configuration
//! 8. policy chain
//!
//! The proxy version bump runs last, only when every step succeeded.

mod context;
mod runner;
mod step;
pub mod steps;

pub use context::{ImportOperation, SyncContext, join_paths};
pub use runner::{Pipeline, PipelineReport, StepRecord};
pub use step::Step;
