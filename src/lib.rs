// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # 3scale OpenAPI import
//!
//! Imports an OpenAPI (Swagger 2.0 or OAS 3.x) definition into a 3scale
//! account, creating or updating the service that exposes it.
//!
//! ## Overview
//!
//! One import run:
//!
//! - creates or updates the target service, found by system name
//! - applies gateway settings and authentication derived from the definition
//! - creates one method per operation and one mapping rule per method
//! - publishes the definition as ActiveDocs
//! - configures OIDC flows and the policy chain
//! - deploys the resulting configuration to staging
//!
//! Running the same import twice leaves the account unchanged, apart from
//! mapping rules which are always recreated.
//!
//! ## Modules
//!
//! - [`config`]: definition loading, validation and import options
//! - [`openapi`]: typed view over a parsed definition
//! - [`remote`]: 3scale admin API trait and HTTP client
//! - [`entities`]: lazily loaded handles over remote objects
//! - [`planner`]: collection diffs and pagination
//! - [`pipeline`]: sync context, steps and the runner
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```text
//! threescale-import openapi \
//!     --destination https://$TOKEN@acme-admin.3scale.net \
//!     --target-system-name petstore \
//!     petstore.yaml
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod openapi;
pub mod pipeline;
pub mod planner;
pub mod remote;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{Destination, ImportOptions, SpecLoader, SpecValidator};
pub use error::{ImportError, Result};
pub use openapi::ApiSpec;
pub use pipeline::{Pipeline, PipelineReport, SyncContext};
pub use remote::{Remote, ThreeScaleClient};
