//! Command-line interface of the import tool.

mod commands;
mod output;

pub use commands::{Cli, Commands, OpenApiArgs, OutputFormat};
pub use output::OutputFormatter;
