//! The reconciliation steps, in pipeline order.

mod activedocs;
mod bump;
mod mapping_rules;
mod methods;
mod oidc;
mod policies;
mod proxy;
mod service;

pub use activedocs::CreateActiveDocsStep;
pub use bump::BumpProxyVersionStep;
pub use mapping_rules::{CreateMappingRulesStep, DestroyMappingRulesStep};
pub use methods::CreateMethodsStep;
pub use oidc::{UpdateOidcStep, oidc_configuration};
pub use policies::{UpdatePoliciesStep, desired_policies, merge_policies};
pub use proxy::{UpdateProxyStep, proxy_settings};
pub use service::CreateServiceStep;
