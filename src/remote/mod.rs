//! 3scale Account Management API integration module.
//!
//! This module provides the remote contract consumed by the entity layer and
//! its HTTP implementation.

mod api;
mod client;

pub use api::{Attrs, Remote, Scope};
pub use client::ThreeScaleClient;
