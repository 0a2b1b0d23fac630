//! pipeconf binary
//!
//! Prints resolved step options and records step outputs in the shared
//! pipeline environment.

use anyhow::Result;
use clap::Parser;
use pipeconf_cli::{execute, Cli, CliSettings};
use pipeconf_sdk::StepConfigResolverBuilder;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "pipeconf_cli=info,pipeconf_sdk=info,pipeconf_resolver=info";
const VERBOSE_FILTER: &str =
    "pipeconf_cli=debug,pipeconf_sdk=debug,pipeconf_resolver=debug,pipeconf_repository=debug";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose)?;

    // Load settings
    let settings = CliSettings::load()?;
    debug!(?settings, "Loaded settings");

    let resolver = StepConfigResolverBuilder::new()
        .with_config(settings.resolver_config(&cli))
        .build()
        .await?;

    let output = execute(&cli, &resolver).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Initialize tracing subscriber; logs go to stderr so stdout stays parseable
fn init_tracing(verbose: bool) -> Result<()> {
    let default_filter = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
