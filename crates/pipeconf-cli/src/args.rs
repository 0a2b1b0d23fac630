//! Command line arguments
//!
//! General flags and subcommands are static. Step parameters become flags only
//! once the step schema is known, so everything after the step name is parsed
//! a second time against a command built from that schema.

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, Parser, Subcommand};
use pipeconf_core::{ParamType, RawValue, StepSchema};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pipeconf")]
#[command(version, about = "Resolve the configuration of pipeline steps")]
pub struct Cli {
    /// Pipeline configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Stage whose `stages.<name>` section applies
    #[arg(long = "stage-name", global = true)]
    pub stage_name: Option<String>,

    /// Root directory of the shared pipeline environment
    #[arg(long = "env-root", global = true)]
    pub env_root: Option<PathBuf>,

    /// Directory with additional step metadata documents
    #[arg(long = "metadata-dir", global = true)]
    pub metadata_dir: Option<PathBuf>,

    /// Parameters document as JSON
    #[arg(long = "parameters-json", global = true)]
    pub parameters_json: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not send telemetry events
    #[arg(long = "no-telemetry", global = true)]
    pub no_telemetry: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// List the known steps
    Steps,

    /// Print the resolved options of a step as JSON
    GetConfig {
        /// Step name or former step name
        step: String,

        /// Print secret values instead of masking them
        #[arg(long)]
        show_secrets: bool,

        /// Step parameter flags, e.g. `--installCommand "npm ci"`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        flags: Vec<String>,
    },

    /// Run a step and record its outputs in the shared environment
    Run {
        /// Step name or former step name
        step: String,

        /// Output to record, as `<resource>/<path>=<value>`
        #[arg(long = "output", value_name = "RESOURCE/PATH=VALUE")]
        outputs: Vec<String>,

        /// Step parameter flags
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        flags: Vec<String>,
    },
}

/// Build the command that accepts one flag per parameter of `schema`
///
/// Flags carry the canonical parameter name. A `bool` flag may be given
/// without a value (`--verbose` or `--verbose=false`); a `[]string` flag
/// may repeat.
pub fn step_command(schema: &StepSchema) -> Command {
    let mut command = Command::new(schema.name().to_string()).no_binary_name(true);
    if let Some(description) = schema.description() {
        command = command.about(description.to_string());
    }

    for param in schema.parameters() {
        let mut arg = Arg::new(param.name.clone())
            .long(param.name.clone())
            .value_name(param.param_type.type_name());
        if let Some(description) = &param.description {
            arg = arg.help(description.clone());
        }
        arg = if param.param_type.is_switch() {
            arg.num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .action(ArgAction::Set)
        } else if param.param_type == ParamType::StringList {
            // Scanner options such as `-Dsonar.x=y` are values
            arg.allow_hyphen_values(true).action(ArgAction::Append)
        } else {
            arg.allow_hyphen_values(true).action(ArgAction::Set)
        };
        command = command.arg(arg);
    }
    command
}

/// Parse step parameter flags into raw values keyed by canonical name
///
/// Missing mandatory parameters are not an error here; other layers may
/// still supply them.
pub fn parse_step_flags(
    schema: &StepSchema,
    flags: &[String],
) -> Result<BTreeMap<String, RawValue>> {
    let matches = step_command(schema).try_get_matches_from(flags)?;
    Ok(step_flags(schema, &matches))
}

fn step_flags(schema: &StepSchema, matches: &ArgMatches) -> BTreeMap<String, RawValue> {
    let mut flags = BTreeMap::new();
    for param in schema.parameters() {
        let Some(values) = matches.get_many::<String>(param.name.as_str()) else {
            continue;
        };
        let mut values: Vec<String> = values.cloned().collect();
        let raw = match param.param_type {
            ParamType::StringList => RawValue::List(values),
            _ => match values.pop() {
                Some(value) => RawValue::Text(value),
                None => continue,
            },
        };
        flags.insert(param.name.clone(), raw);
    }
    flags
}

/// Split `<resource>/<path>=<value>`
pub fn parse_output(output: &str) -> Result<(String, String, String)> {
    let (key, value) = output.split_once('=').ok_or_else(|| {
        anyhow::anyhow!("Output '{}' is not of the form <resource>/<path>=<value>", output)
    })?;
    let (resource, path) = key
        .split_once('/')
        .filter(|(resource, path)| !resource.is_empty() && !path.is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!("Output key '{}' is not of the form <resource>/<path>", key)
        })?;
    Ok((resource.to_string(), path.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeconf_core::ParameterSpec;

    fn schema() -> StepSchema {
        StepSchema::builder("karmaExecuteTests")
            .parameter(ParameterSpec::string("installCommand").mandatory())
            .parameter(ParameterSpec::bool("legacyPRHandling"))
            .parameter(ParameterSpec::new("options", ParamType::StringList))
            .build()
            .unwrap()
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_general_flags_before_subcommand() {
        let cli = Cli::try_parse_from([
            "pipeconf",
            "--stage-name",
            "Acceptance",
            "--verbose",
            "get-config",
            "karmaExecuteTests",
            "--installCommand",
            "npm ci",
        ])
        .unwrap();

        assert_eq!(cli.stage_name.as_deref(), Some("Acceptance"));
        assert!(cli.verbose);
        match cli.command {
            CliCommand::GetConfig { step, flags, show_secrets } => {
                assert_eq!(step, "karmaExecuteTests");
                assert_eq!(flags, args(&["--installCommand", "npm ci"]));
                assert!(!show_secrets);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_run_collects_outputs() {
        let cli = Cli::try_parse_from([
            "pipeconf",
            "run",
            "--output",
            "commonPipelineEnvironment/github/owner=SAP",
            "setupCommonPipelineEnvironment",
        ])
        .unwrap();

        match cli.command {
            CliCommand::Run { step, outputs, flags } => {
                assert_eq!(step, "setupCommonPipelineEnvironment");
                assert_eq!(outputs, args(&["commonPipelineEnvironment/github/owner=SAP"]));
                assert!(flags.is_empty());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_step_flags_by_type() {
        let flags = parse_step_flags(
            &schema(),
            &args(&[
                "--installCommand",
                "npm ci",
                "--legacyPRHandling",
                "--options",
                "-X",
                "--options",
                "-e",
            ]),
        )
        .unwrap();

        assert_eq!(flags.get("installCommand"), Some(&RawValue::text("npm ci")));
        assert_eq!(flags.get("legacyPRHandling"), Some(&RawValue::text("true")));
        assert_eq!(flags.get("options"), Some(&RawValue::list(["-X", "-e"])));
    }

    #[test]
    fn test_bool_flag_with_explicit_value() {
        let flags = parse_step_flags(&schema(), &args(&["--legacyPRHandling=false"])).unwrap();
        assert_eq!(flags.get("legacyPRHandling"), Some(&RawValue::text("false")));
        // Missing mandatory flags are left to the resolver
        assert!(!flags.contains_key("installCommand"));
    }

    #[test]
    fn test_unknown_step_flag_is_rejected() {
        let result = parse_step_flags(&schema(), &args(&["--runCommand", "npm test"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_output() {
        assert_eq!(
            parse_output("commonPipelineEnvironment/github/owner=SAP").unwrap(),
            (
                "commonPipelineEnvironment".to_string(),
                "github/owner".to_string(),
                "SAP".to_string()
            )
        );
        assert_eq!(parse_output("a/b=").unwrap().2, "");
        assert!(parse_output("commonPipelineEnvironment=SAP").is_err());
        assert!(parse_output("/path=x").is_err());
        assert!(parse_output("no-value").is_err());
    }
}
