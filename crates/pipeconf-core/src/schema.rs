//! Step parameter schemas
//!
//! A `StepSchema` is the static, declarative description of one step's
//! parameters. It is built once (from step metadata or by hand) and then
//! drives every invocation of the resolution engine for that step.

use crate::error::{CoreError, SchemaError};
use crate::types::{ParamType, RawValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Configuration scope a parameter may draw its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scope {
    /// `general` section of the configuration file
    General,
    /// `stages.<stage>` section of the configuration file
    Stages,
    /// `steps.<step>` section of the configuration file
    Steps,
    /// Parameters handed over directly by the orchestrator
    Parameters,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::General, Scope::Stages, Scope::Steps, Scope::Parameters];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::General => "GENERAL",
            Scope::Stages => "STAGES",
            Scope::Steps => "STEPS",
            Scope::Parameters => "PARAMETERS",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GENERAL" => Ok(Scope::General),
            "STAGES" => Ok(Scope::Stages),
            "STEPS" => Ok(Scope::Steps),
            "PARAMETERS" => Ok(Scope::Parameters),
            _ => Err(CoreError::UnknownScope(s.to_string())),
        }
    }
}

/// Alternate spelling of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,

    /// Former parameter name kept for compatibility
    #[serde(default)]
    pub deprecated: bool,
}

impl Alias {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deprecated: false,
        }
    }

    pub fn deprecated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deprecated: true,
        }
    }
}

/// Reference into the shared pipeline environment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Producing step or named resource (e.g. `commonPipelineEnvironment`)
    pub step: String,
    /// Path of the recorded value (e.g. `github/owner`)
    pub path: String,
}

impl ResourceRef {
    pub fn new(step: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.step, self.path)
    }
}

/// Declaration of one step parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Canonical name, unique within the step
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: ParamType,

    #[serde(default)]
    pub mandatory: bool,

    /// Scopes whose configuration layers may supply the value
    #[serde(default)]
    pub scopes: BTreeSet<Scope>,

    /// Alternate names, in declaration order
    #[serde(default)]
    pub aliases: Vec<Alias>,

    /// Shared-environment fallbacks, in declaration order
    #[serde(default)]
    pub resource_refs: Vec<ResourceRef>,

    #[serde(default)]
    pub default: Option<RawValue>,

    #[serde(default)]
    pub description: Option<String>,

    /// Allow-list of accepted values; empty means unrestricted
    #[serde(default)]
    pub possible_values: Vec<String>,

    /// Mask the value in logs and reports
    #[serde(default)]
    pub secret: bool,
}

impl ParameterSpec {
    /// Create an optional parameter without scopes
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            mandatory: false,
            scopes: BTreeSet::new(),
            aliases: Vec::new(),
            resource_refs: Vec::new(),
            default: None,
            description: None,
            possible_values: Vec::new(),
            secret: false,
        }
    }

    /// Shorthand for a string parameter
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    /// Shorthand for a bool parameter
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Bool)
    }

    /// Mark parameter as mandatory
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Mark parameter as secret
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = Scope>) -> Self {
        self.scopes.extend(scopes);
        self
    }

    /// Declare every scope
    pub fn with_all_scopes(self) -> Self {
        self.with_scopes(Scope::ALL)
    }

    pub fn with_alias(mut self, name: impl Into<String>) -> Self {
        self.aliases.push(Alias::new(name));
        self
    }

    pub fn with_deprecated_alias(mut self, name: impl Into<String>) -> Self {
        self.aliases.push(Alias::deprecated(name));
        self
    }

    pub fn with_resource_ref(mut self, step: impl Into<String>, path: impl Into<String>) -> Self {
        self.resource_refs.push(ResourceRef::new(step, path));
        self
    }

    pub fn with_default(mut self, default: impl Into<RawValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_possible_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.possible_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether the parameter declares a scope
    pub fn in_scope(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }

    /// Every accepted key: canonical name first, then aliases in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(|a| a.name.as_str()))
    }

    /// Find an alias declaration by name
    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.name == name)
    }
}

/// Shared-environment entry a step may record after success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Resource name the entry is recorded under
    pub resource: String,
    pub path: String,
}

impl StepOutput {
    pub fn new(resource: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            path: path.into(),
        }
    }
}

/// Validated parameter schema of one step
///
/// Construction goes through [`StepSchemaBuilder`], which rejects duplicate
/// parameter names and aliases claimed by more than one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSchema {
    name: String,
    description: Option<String>,
    aliases: Vec<String>,
    parameters: Vec<ParameterSpec>,
    outputs: Vec<StepOutput>,
    /// accepted key -> index into `parameters`
    key_index: HashMap<String, usize>,
}

impl StepSchema {
    pub fn builder(name: impl Into<String>) -> StepSchemaBuilder {
        StepSchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Former names of the step
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Parameters in declaration order
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn outputs(&self) -> &[StepOutput] {
        &self.outputs
    }

    /// Get a parameter by canonical name
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Map any accepted spelling to its parameter
    pub fn lookup(&self, key: &str) -> Option<&ParameterSpec> {
        self.key_index.get(key).map(|idx| &self.parameters[*idx])
    }

    /// Map any accepted spelling to its canonical name
    pub fn canonical_name(&self, key: &str) -> Option<&str> {
        self.lookup(key).map(|p| p.name.as_str())
    }

    /// Whether the step may record `resource/path` after success.
    /// Entries under the step's own name are always allowed.
    pub fn declares_output(&self, resource: &str, path: &str) -> bool {
        resource == self.name
            || self
                .outputs
                .iter()
                .any(|o| o.resource == resource && o.path == path)
    }

    /// Whether `name` is the step name or one of its former names
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

/// Builder for [`StepSchema`]
#[derive(Debug, Clone)]
pub struct StepSchemaBuilder {
    name: String,
    description: Option<String>,
    aliases: Vec<String>,
    parameters: Vec<ParameterSpec>,
    outputs: Vec<StepOutput>,
}

impl StepSchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            parameters: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a former name of the step
    pub fn step_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameters(mut self, parameters: impl IntoIterator<Item = ParameterSpec>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn output(mut self, output: StepOutput) -> Self {
        self.outputs.push(output);
        self
    }

    /// Validate and build the schema
    pub fn build(self) -> Result<StepSchema, SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyStepName);
        }

        let mut key_index: HashMap<String, usize> = HashMap::new();

        // Canonical names first so an alias can never shadow a later parameter
        for (idx, param) in self.parameters.iter().enumerate() {
            if param.name.trim().is_empty() {
                return Err(SchemaError::EmptyParameterName {
                    step: self.name.clone(),
                });
            }
            if key_index.insert(param.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateParameter {
                    step: self.name.clone(),
                    name: param.name.clone(),
                });
            }
        }

        for (idx, param) in self.parameters.iter().enumerate() {
            for alias in &param.aliases {
                match key_index.get(&alias.name) {
                    Some(owner) if *owner == idx => {}
                    Some(owner) => {
                        return Err(SchemaError::AliasCollision {
                            step: self.name.clone(),
                            alias: alias.name.clone(),
                            first: self.parameters[*owner].name.clone(),
                            second: param.name.clone(),
                        });
                    }
                    None => {
                        key_index.insert(alias.name.clone(), idx);
                    }
                }
            }
        }

        Ok(StepSchema {
            name: self.name,
            description: self.description,
            aliases: self.aliases,
            parameters: self.parameters,
            outputs: self.outputs,
            key_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sonar_like() -> StepSchemaBuilder {
        StepSchema::builder("sonarExecuteScan")
            .parameter(
                ParameterSpec::string("host")
                    .with_scopes([Scope::Parameters, Scope::Stages, Scope::Steps])
                    .with_alias("sonarServerUrl"),
            )
            .parameter(
                ParameterSpec::string("token")
                    .with_scopes([Scope::Parameters])
                    .with_alias("sonarToken")
                    .secret(),
            )
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("GENERAL".parse::<Scope>().unwrap(), Scope::General);
        assert_eq!("stages".parse::<Scope>().unwrap(), Scope::Stages);
        assert!("STAGE".parse::<Scope>().is_err());
    }

    #[test]
    fn test_lookup_by_alias() {
        let schema = sonar_like().build().unwrap();

        assert_eq!(schema.canonical_name("host"), Some("host"));
        assert_eq!(schema.canonical_name("sonarServerUrl"), Some("host"));
        assert_eq!(schema.canonical_name("sonarToken"), Some("token"));
        assert_eq!(schema.canonical_name("unknown"), None);
    }

    #[test]
    fn test_alias_collision_between_parameters() {
        let result = sonar_like()
            .parameter(ParameterSpec::string("url").with_alias("sonarServerUrl"))
            .build();

        assert_eq!(
            result.unwrap_err(),
            SchemaError::AliasCollision {
                step: "sonarExecuteScan".to_string(),
                alias: "sonarServerUrl".to_string(),
                first: "host".to_string(),
                second: "url".to_string(),
            }
        );
    }

    #[test]
    fn test_alias_shadowing_canonical_name_is_rejected() {
        let result = StepSchema::builder("step")
            .parameter(ParameterSpec::string("owner").with_alias("repository"))
            .parameter(ParameterSpec::string("repository"))
            .build();

        assert!(matches!(
            result,
            Err(SchemaError::AliasCollision { ref alias, .. }) if alias == "repository"
        ));
    }

    #[test]
    fn test_duplicate_parameter() {
        let result = sonar_like().parameter(ParameterSpec::string("host")).build();
        assert!(matches!(result, Err(SchemaError::DuplicateParameter { .. })));
    }

    #[test]
    fn test_empty_step_name() {
        assert_eq!(
            StepSchema::builder("  ").build().unwrap_err(),
            SchemaError::EmptyStepName
        );
    }

    #[test]
    fn test_outputs_and_step_aliases() {
        let schema = StepSchema::builder("artifactPrepareVersion")
            .step_alias("setVersion")
            .output(StepOutput::new("commonPipelineEnvironment", "artifactVersion"))
            .build()
            .unwrap();

        assert!(schema.answers_to("setVersion"));
        assert!(schema.declares_output("commonPipelineEnvironment", "artifactVersion"));
        assert!(schema.declares_output("artifactPrepareVersion", "anything"));
        assert!(!schema.declares_output("commonPipelineEnvironment", "github/owner"));
    }

    #[test]
    fn test_parameter_keys_order() {
        let param = ParameterSpec::string("owner")
            .with_alias("githubOrg")
            .with_deprecated_alias("org");
        let keys: Vec<&str> = param.keys().collect();
        assert_eq!(keys, vec!["owner", "githubOrg", "org"]);
        assert!(param.alias("org").unwrap().deprecated);
    }
}
