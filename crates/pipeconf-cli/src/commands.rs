//! Subcommand handlers
//!
//! Handlers return the text to print so they can be tested without capturing
//! stdout.

use anyhow::Result;
use pipeconf_core::StepSchema;
use pipeconf_parser::ParametersParser;
use pipeconf_sdk::{StepConfigResolver, StepInvocation, StepOutputs};
use tracing::info;

use crate::args::{parse_output, parse_step_flags, Cli, CliCommand};

/// Origin name of the `--parameters-json` layer
const PARAMETERS_ORIGIN: &str = "parametersJSON";

/// Execute the parsed command line
pub async fn execute(cli: &Cli, resolver: &StepConfigResolver) -> Result<String> {
    match &cli.command {
        CliCommand::Steps => Ok(resolver.step_names().await?.join("\n")),
        CliCommand::GetConfig {
            step,
            show_secrets,
            flags,
        } => get_config(cli, resolver, step, *show_secrets, flags).await,
        CliCommand::Run { step, outputs, flags } => run(cli, resolver, step, outputs, flags).await,
    }
}

async fn get_config(
    cli: &Cli,
    resolver: &StepConfigResolver,
    step: &str,
    show_secrets: bool,
    flags: &[String],
) -> Result<String> {
    let schema = resolver.schema(step).await?;
    let invocation = invocation(cli, &schema, flags)?;
    let options = resolver.resolve_schema(&schema, &invocation)?;

    let json = if show_secrets {
        options.to_json()
    } else {
        options.to_redacted_json()
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

async fn run(
    cli: &Cli,
    resolver: &StepConfigResolver,
    step: &str,
    outputs: &[String],
    flags: &[String],
) -> Result<String> {
    let mut step_outputs = StepOutputs::new();
    for output in outputs {
        let (resource, path, value) = parse_output(output)?;
        step_outputs = step_outputs.with(resource, path, value);
    }

    let schema = resolver.schema(step).await?;
    let invocation = invocation(cli, &schema, flags)?;
    let report = resolver
        .harness(schema.name(), invocation)
        .run(|options| async move {
            info!(step = %options.step(), parameters = options.len(), "Resolved step options");
            Ok::<_, std::io::Error>(step_outputs)
        })
        .await?;

    Ok(report
        .recorded
        .iter()
        .map(|key| format!("recorded {}/{}", key.step, key.path))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn invocation(cli: &Cli, schema: &StepSchema, flags: &[String]) -> Result<StepInvocation> {
    let mut invocation = StepInvocation::new();
    for (name, value) in parse_step_flags(schema, flags)? {
        invocation = invocation.with_flag(name, value);
    }
    if let Some(stage) = &cli.stage_name {
        invocation = invocation.with_stage(stage.clone());
    }
    if let Some(json) = &cli.parameters_json {
        let parameters = ParametersParser::parse_json(json, PARAMETERS_ORIGIN)?;
        invocation = invocation.with_parameters(parameters);
    }
    Ok(invocation)
}
