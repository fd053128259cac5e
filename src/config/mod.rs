//! Configuration module for the import.
//!
//! This module handles everything settled before the first remote call:
//! - Loading the API definition from a file, URL or stdin
//! - Structural validation of the definition
//! - Import options and the destination URL

mod options;
mod parser;
mod validator;

pub use options::{Destination, ImportOptions, OidcIssuerType};
pub use parser::{STDIN_RESOURCE, SpecLoader};
pub use validator::{SpecValidator, ValidationError, ValidationResult};
