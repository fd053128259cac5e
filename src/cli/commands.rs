//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};

use crate::config::{ImportOptions, OidcIssuerType, STDIN_RESOURCE};

/// Import OpenAPI definitions into 3scale.
#[derive(Parser, Debug)]
#[command(name = "threescale-import")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// 3scale admin portal, as `http[s]://<access_token>@<host>`.
    #[arg(short, long, global = true, env = "THREESCALE_DESTINATION")]
    pub destination: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import an OpenAPI definition into a service.
    Openapi(OpenApiArgs),

    /// Check an OpenAPI definition offline and list its operations.
    Validate {
        /// File path, http(s) URL, or `-` for stdin.
        #[arg(default_value = STDIN_RESOURCE)]
        resource: String,
    },
}

/// Arguments of the `openapi` command.
#[derive(Args, Debug, Clone, Default)]
pub struct OpenApiArgs {
    /// File path, http(s) URL, or `-` for stdin.
    pub resource: String,

    /// System name of the target service (default: derived from the title).
    #[arg(short, long)]
    pub target_system_name: Option<String>,

    /// Create ActiveDocs in hidden state.
    #[arg(long)]
    pub activedocs_hidden: bool,

    /// Skip OpenAPI schema validation.
    #[arg(long)]
    pub skip_openapi_validation: bool,

    /// Use prefix matching instead of strict matching on mapping rules.
    #[arg(long)]
    pub prefix_matching: bool,

    /// OIDC issuer type.
    #[arg(long, value_enum)]
    pub oidc_issuer_type: Option<OidcIssuerType>,

    /// OIDC issuer endpoint, credentials included.
    #[arg(long)]
    pub oidc_issuer_endpoint: Option<String>,

    /// User key for the default credentials policy, for APIs without security.
    #[arg(long)]
    pub default_credentials_userkey: Option<String>,

    /// Override the base path of the private (backend) URLs.
    #[arg(long)]
    pub override_private_basepath: Option<String>,

    /// Override the base path of the public (gateway) URLs.
    #[arg(long)]
    pub override_public_basepath: Option<String>,

    /// Custom staging public URL.
    #[arg(long)]
    pub staging_public_base_url: Option<String>,

    /// Custom production public URL.
    #[arg(long)]
    pub production_public_base_url: Option<String>,

    /// Custom private base URL of the API backend.
    #[arg(long)]
    pub override_private_base_url: Option<String>,

    /// Secret token sent by the gateway to the backend.
    #[arg(long)]
    pub backend_api_secret_token: Option<String>,

    /// Host header sent by the gateway to the backend.
    #[arg(long)]
    pub backend_api_host_header: Option<String>,
}

impl OpenApiArgs {
    /// Import options carried by the flags.
    #[must_use]
    pub fn to_options(&self) -> ImportOptions {
        ImportOptions {
            target_system_name: self.target_system_name.clone(),
            activedocs_hidden: self.activedocs_hidden,
            skip_openapi_validation: self.skip_openapi_validation,
            prefix_matching: self.prefix_matching,
            oidc_issuer_type: self.oidc_issuer_type,
            oidc_issuer_endpoint: self.oidc_issuer_endpoint.clone(),
            default_credentials_userkey: self.default_credentials_userkey.clone(),
            override_private_basepath: self.override_private_basepath.clone(),
            override_public_basepath: self.override_public_basepath.clone(),
            staging_public_base_url: self.staging_public_base_url.clone(),
            production_public_base_url: self.production_public_base_url.clone(),
            override_private_base_url: self.override_private_base_url.clone(),
            backend_api_secret_token: self.backend_api_secret_token.clone(),
            backend_api_host_header: self.backend_api_host_header.clone(),
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
