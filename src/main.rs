//! 3scale import CLI entrypoint.
//!
//! This is the main entrypoint for the threescale-import command-line tool.

use std::process::ExitCode;
use std::sync::Arc;

use threescale_import::cli::{Cli, Commands, OpenApiArgs, OutputFormatter};
use threescale_import::config::{Destination, SpecLoader, SpecValidator};
use threescale_import::error::{ConfigError, Result};
use threescale_import::openapi::ApiSpec;
use threescale_import::pipeline::{Pipeline, SyncContext};
use threescale_import::remote::{Remote, ThreeScaleClient};

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    // .env values feed the clap env fallbacks
    if let Err(e) = SpecLoader::new().load_dotenv() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    match cli.command {
        Commands::Openapi(args) => cmd_openapi(cli.destination.as_deref(), &args, formatter).await,
        Commands::Validate { resource } => cmd_validate(&resource, formatter).await,
    }
}

/// Import a definition into the destination account.
async fn cmd_openapi(
    destination: Option<&str>,
    args: &OpenApiArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let destination = destination.ok_or_else(|| ConfigError::MissingOption {
        name: String::from("destination"),
    })?;
    let destination = Destination::parse(destination)?;
    debug!("Destination: {destination:?}");

    let options = args.to_options();
    options.validate()?;

    let document = SpecLoader::new().load(&args.resource).await?;
    if options.skip_openapi_validation {
        warn!("Skipping OpenAPI validation");
    } else {
        let result = SpecValidator::new().validate(&document)?;
        for warning in &result.warnings {
            warn!("{warning}");
        }
    }

    let api_spec = ApiSpec::from_document(&document)?;
    info!(
        "Importing '{}' ({} operations) into {}",
        api_spec.title(),
        api_spec.operations().len(),
        destination.endpoint()
    );

    let client = ThreeScaleClient::new(destination.endpoint().clone(), destination.access_token())?;
    let remote: Arc<dyn Remote> = Arc::new(client);
    let mut context = SyncContext::new(api_spec, document, remote, options);

    let report = Pipeline::canonical().run(&mut context).await?;
    println!("{}", formatter.format_report(&report));
    Ok(())
}

/// Validate a definition offline.
async fn cmd_validate(resource: &str, formatter: &OutputFormatter) -> Result<()> {
    info!("Validating definition: {resource}");

    let document = SpecLoader::new().load(resource).await?;
    let result = SpecValidator::new().validate(&document)?;
    let api_spec = ApiSpec::from_document(&document)?;

    println!("{}", formatter.format_validation(&api_spec, &result));
    Ok(())
}
