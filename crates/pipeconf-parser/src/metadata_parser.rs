//! Step metadata parser
//!
//! Parses a step metadata document into a validated `StepSchema`:
//!
//! ```yaml
//! metadata:
//!   name: karmaExecuteTests
//!   description: Executes the Karma test runner
//!   aliases:
//!     - name: executeKarmaTests
//! spec:
//!   inputs:
//!     params:
//!       - name: installCommand
//!         type: string
//!         mandatory: true
//!         default: npm install --quiet
//!         scope: [GENERAL, PARAMETERS, STAGES, STEPS]
//!         aliases:
//!           - name: install
//!             deprecated: true
//!         resourceRef:
//!           - name: commonPipelineEnvironment
//!             param: custom/installCommand
//!   outputs:
//!     resources:
//!       - name: commonPipelineEnvironment
//!         params:
//!           - name: custom/testResult
//! ```

use crate::error::{ParseError, Result};
use crate::yaml_parser::YamlParser;
use pipeconf_core::{Alias, ParamType, ParameterSpec, ResourceRef, Scope, StepOutput, StepSchema};
use serde_yaml::Value as YamlValue;
use tracing::warn;

const PARAM_FIELDS: &[&str] = &[
    "name",
    "type",
    "description",
    "longDescription",
    "mandatory",
    "default",
    "scope",
    "aliases",
    "resourceRef",
    "possibleValues",
    "secret",
];

/// Step metadata parser
pub struct StepMetadataParser;

impl StepMetadataParser {
    /// Parse step metadata from YAML string
    pub fn parse(yaml_str: &str) -> Result<StepSchema> {
        let yaml = YamlParser::parse(yaml_str)?;
        Self::parse_from_yaml(&yaml)
    }

    /// Parse step metadata from YAML value
    pub fn parse_from_yaml(yaml: &YamlValue) -> Result<StepSchema> {
        let metadata = yaml.get("metadata").ok_or_else(|| ParseError::MissingField {
            field: "metadata".to_string(),
        })?;

        let name = YamlParser::get_string(metadata, "name").map_err(|_| ParseError::MissingField {
            field: "metadata.name".to_string(),
        })?;

        let mut builder = StepSchema::builder(&name);

        if let Some(description) = YamlParser::get_optional_string(metadata, "description") {
            builder = builder.description(description);
        }

        for (alias, _) in YamlParser::get_name_list(metadata, "aliases") {
            builder = builder.step_alias(alias);
        }

        let spec = yaml.get("spec");

        let params = spec
            .and_then(|s| s.get("inputs"))
            .and_then(|i| YamlParser::get_optional_array(i, "params"));
        if let Some(params) = params {
            for (idx, param) in params.iter().enumerate() {
                builder = builder.parameter(Self::parse_parameter(param, idx, &name)?);
            }
        }

        let resources = spec
            .and_then(|s| s.get("outputs"))
            .and_then(|o| YamlParser::get_optional_array(o, "resources"));
        if let Some(resources) = resources {
            for output in Self::parse_outputs(resources) {
                builder = builder.output(output);
            }
        }

        Ok(builder.build()?)
    }

    /// Parse a single parameter declaration
    fn parse_parameter(yaml: &YamlValue, index: usize, step: &str) -> Result<ParameterSpec> {
        let name = YamlParser::get_string(yaml, "name").map_err(|_| ParseError::MissingField {
            field: format!("spec.inputs.params[{}].name", index),
        })?;

        let context = format!("parameter '{}'", name);
        for warning in YamlParser::validate_fields(yaml, PARAM_FIELDS, &context) {
            warn!(step = %step, "{}", warning);
        }

        let param_type = match YamlParser::get_optional_string(yaml, "type") {
            Some(ty) => ty.parse::<ParamType>().map_err(|e| ParseError::InvalidValue {
                field: format!("{}.type", name),
                message: e.to_string(),
            })?,
            None => ParamType::default(),
        };

        let mut param = ParameterSpec::new(&name, param_type);
        param.mandatory = YamlParser::get_optional_bool(yaml, "mandatory").unwrap_or(false);
        param.secret = YamlParser::get_optional_bool(yaml, "secret").unwrap_or(false);
        param.description = YamlParser::get_optional_string(yaml, "description");
        param.default = yaml.get("default").and_then(YamlParser::to_raw_value);

        if let Some(scopes) = YamlParser::get_optional_array(yaml, "scope") {
            for scope in scopes {
                let scope_str = scope.as_str().ok_or_else(|| ParseError::InvalidValue {
                    field: format!("{}.scope", name),
                    message: "Scope entries must be strings".to_string(),
                })?;
                let scope = scope_str.parse::<Scope>().map_err(|e| ParseError::InvalidValue {
                    field: format!("{}.scope", name),
                    message: e.to_string(),
                })?;
                param.scopes.insert(scope);
            }
        }

        param.aliases = YamlParser::get_name_list(yaml, "aliases")
            .into_iter()
            .map(|(alias, decl)| Alias {
                name: alias,
                deprecated: YamlParser::get_optional_bool(&decl, "deprecated").unwrap_or(false),
            })
            .collect();

        if let Some(refs) = YamlParser::get_optional_array(yaml, "resourceRef") {
            for (ref_idx, reference) in refs.iter().enumerate() {
                param.resource_refs.push(Self::parse_resource_ref(reference, &name, ref_idx)?);
            }
        }

        if let Some(values) = YamlParser::get_optional_array(yaml, "possibleValues") {
            param.possible_values =
                values.iter().filter_map(YamlParser::scalar_to_string).collect();
        }

        Ok(param)
    }

    fn parse_resource_ref(yaml: &YamlValue, param: &str, index: usize) -> Result<ResourceRef> {
        let step = YamlParser::get_string(yaml, "name").map_err(|_| ParseError::MissingField {
            field: format!("{}.resourceRef[{}].name", param, index),
        })?;
        let path = YamlParser::get_string(yaml, "param").map_err(|_| ParseError::MissingField {
            field: format!("{}.resourceRef[{}].param", param, index),
        })?;
        Ok(ResourceRef::new(step, path))
    }

    fn parse_outputs(resources: &[YamlValue]) -> Vec<StepOutput> {
        let mut outputs = Vec::new();
        for resource in resources {
            let Some(resource_name) = YamlParser::get_optional_string(resource, "name") else {
                continue;
            };
            for (path, _) in YamlParser::get_name_list(resource, "params") {
                outputs.push(StepOutput::new(&resource_name, path));
            }
        }
        outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeconf_core::RawValue;

    const SONAR: &str = r#"
metadata:
  name: sonarExecuteScan
  description: Executes the Sonar scanner
spec:
  inputs:
    params:
      - name: host
        type: string
        scope: [PARAMETERS, STAGES, STEPS]
        aliases:
          - name: sonarServerUrl
      - name: owner
        type: string
        scope: [GENERAL, PARAMETERS, STAGES, STEPS]
        aliases:
          - name: githubOrg
        resourceRef:
          - name: commonPipelineEnvironment
            param: github/owner
      - name: legacyPRHandling
        type: bool
        default: false
        scope: [PARAMETERS, STAGES, STEPS]
"#;

    #[test]
    fn test_parse_step_metadata() {
        let schema = StepMetadataParser::parse(SONAR).unwrap();

        assert_eq!(schema.name(), "sonarExecuteScan");
        assert_eq!(schema.description(), Some("Executes the Sonar scanner"));
        assert_eq!(schema.parameters().len(), 3);

        let owner = schema.parameter("owner").unwrap();
        assert_eq!(owner.scopes.len(), 4);
        assert_eq!(
            owner.resource_refs,
            vec![ResourceRef::new("commonPipelineEnvironment", "github/owner")]
        );
        assert_eq!(schema.canonical_name("githubOrg"), Some("owner"));

        let legacy = schema.parameter("legacyPRHandling").unwrap();
        assert_eq!(legacy.param_type, ParamType::Bool);
        assert_eq!(legacy.default, Some(RawValue::text("false")));
    }

    #[test]
    fn test_missing_metadata_name() {
        let err = StepMetadataParser::parse("metadata:\n  description: x\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingField { ref field } if field == "metadata.name"));
    }

    #[test]
    fn test_unknown_scope_is_rejected() {
        let yaml = r#"
metadata:
  name: step
spec:
  inputs:
    params:
      - name: p
        scope: [STAGE]
"#;
        let err = StepMetadataParser::parse(yaml).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { ref field, .. } if field == "p.scope"));
    }

    #[test]
    fn test_alias_collision_surfaces_as_schema_error() {
        let yaml = r#"
metadata:
  name: step
spec:
  inputs:
    params:
      - name: a
        aliases: [shared]
      - name: b
        aliases: [shared]
"#;
        let err = StepMetadataParser::parse(yaml).unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
    }
}
