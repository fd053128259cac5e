//! API definition model.
//!
//! Normalizes Swagger 2.0 and OpenAPI 3.x documents into an ordered list of
//! operations and a single security requirement.

mod operation;
mod spec;

pub use operation::{
    HttpVerb, KeyLocation, OAuthFlow, Operation, Security, SecurityKind, to_system_name,
};
pub use spec::{ApiSpec, SpecVersion};
