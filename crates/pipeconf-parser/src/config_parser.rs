//! Pipeline configuration file parser
//!
//! The configuration file carries one section per scope:
//!
//! ```yaml
//! general:
//!   githubApiUrl: https://github.example.com/api/v3
//! stages:
//!   Acceptance:
//!     installCommand: npm ci
//! steps:
//!   karmaExecuteTests:
//!     modulePath: ./frontend
//! ```
//!
//! Each section is exposed as a `ConfigLayer` of the matching kind.

use crate::error::{ParseError, Result};
use crate::yaml_parser::YamlParser;
use pipeconf_core::{ConfigLayer, LayerKind, RawValue, StepSchema};
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use tracing::{debug, warn};

type Section = BTreeMap<String, RawValue>;

/// Parsed pipeline configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Where the document came from; used to name the layers
    pub origin: String,
    general: Section,
    stages: BTreeMap<String, Section>,
    steps: BTreeMap<String, Section>,
}

impl PipelineConfig {
    /// A configuration without any entries
    pub fn empty(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Default::default()
        }
    }

    /// The `general` section
    pub fn general_layer(&self) -> ConfigLayer {
        ConfigLayer {
            kind: LayerKind::General,
            name: format!("{}#general", self.origin),
            entries: self.general.clone(),
        }
    }

    /// The `stages.<stage>` section, if present
    pub fn stage_layer(&self, stage: &str) -> Option<ConfigLayer> {
        self.stages.get(stage).map(|section| ConfigLayer {
            kind: LayerKind::Stages,
            name: format!("{}#stages.{}", self.origin, stage),
            entries: section.clone(),
        })
    }

    /// The `steps.<step>` section, merged with sections filed under former
    /// step names. The current name wins, then former names in declared order.
    pub fn step_layer(&self, schema: &StepSchema) -> Option<ConfigLayer> {
        let mut entries = self.steps.get(schema.name()).cloned();

        for alias in schema.aliases() {
            let Some(section) = self.steps.get(alias) else {
                continue;
            };
            warn!(
                step = %schema.name(),
                alias = %alias,
                "Configuration uses former step name; please rename the section"
            );
            let merged = entries.get_or_insert_with(Section::new);
            for (key, value) in section {
                merged.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        entries.map(|entries| ConfigLayer {
            kind: LayerKind::Steps,
            name: format!("{}#steps.{}", self.origin, schema.name()),
            entries,
        })
    }

    /// All file layers relevant to one step invocation
    pub fn layers_for(&self, schema: &StepSchema, stage: Option<&str>) -> Vec<ConfigLayer> {
        let mut layers = vec![self.general_layer()];
        if let Some(stage_layer) = stage.and_then(|s| self.stage_layer(s)) {
            layers.push(stage_layer);
        }
        if let Some(step_layer) = self.step_layer(schema) {
            layers.push(step_layer);
        }
        layers
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }
}

/// Pipeline configuration parser
pub struct PipelineConfigParser;

impl PipelineConfigParser {
    /// Parse a configuration document from YAML string
    pub fn parse(yaml_str: &str, origin: impl Into<String>) -> Result<PipelineConfig> {
        let yaml = YamlParser::parse(yaml_str)?;
        Self::parse_from_yaml(&yaml, origin)
    }

    /// Parse a configuration document from YAML value
    pub fn parse_from_yaml(yaml: &YamlValue, origin: impl Into<String>) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::empty(origin);

        // An empty file is a valid, empty configuration
        if yaml.is_null() {
            return Ok(config);
        }
        if !yaml.is_mapping() {
            return Err(ParseError::InvalidValue {
                field: "root".to_string(),
                message: "Configuration document must be a mapping".to_string(),
            });
        }

        let sections = ["general", "stages", "steps"];
        for warning in YamlParser::validate_fields(yaml, &sections, "configuration") {
            warn!(origin = %config.origin, "{}", warning);
        }

        if let Some(general) = yaml.get("general") {
            config.general = Self::parse_section(general, "general")?;
        }
        if let Some(stages) = yaml.get("stages") {
            config.stages = Self::parse_named_sections(stages, "stages")?;
        }
        if let Some(steps) = yaml.get("steps") {
            config.steps = Self::parse_named_sections(steps, "steps")?;
        }

        debug!(
            origin = %config.origin,
            stages = config.stages.len(),
            steps = config.steps.len(),
            "Parsed pipeline configuration"
        );

        Ok(config)
    }

    fn parse_named_sections(yaml: &YamlValue, field: &str) -> Result<BTreeMap<String, Section>> {
        if yaml.is_null() {
            return Ok(BTreeMap::new());
        }
        let mapping = yaml.as_mapping().ok_or_else(|| ParseError::InvalidValue {
            field: field.to_string(),
            message: "Expected a mapping of names to sections".to_string(),
        })?;

        let mut sections = BTreeMap::new();
        for (name, section) in mapping {
            let name = YamlParser::scalar_to_string(name).ok_or_else(|| ParseError::InvalidValue {
                field: field.to_string(),
                message: "Section names must be scalars".to_string(),
            })?;
            let parsed = Self::parse_section(section, &format!("{}.{}", field, name))?;
            sections.insert(name, parsed);
        }
        Ok(sections)
    }

    fn parse_section(yaml: &YamlValue, field: &str) -> Result<Section> {
        if yaml.is_null() {
            return Ok(Section::new());
        }
        let mapping = yaml.as_mapping().ok_or_else(|| ParseError::InvalidValue {
            field: field.to_string(),
            message: "Expected a mapping of parameter names to values".to_string(),
        })?;

        let mut section = Section::new();
        for (key, value) in mapping {
            let Some(key) = key.as_str() else {
                return Err(ParseError::InvalidValue {
                    field: field.to_string(),
                    message: "Parameter names must be strings".to_string(),
                });
            };
            if let Some(raw) = YamlParser::to_raw_value(value) {
                section.insert(key.to_string(), raw);
            }
        }
        Ok(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeconf_core::ParameterSpec;

    const CONFIG: &str = r#"
general:
  githubApiUrl: https://github.example.com/api/v3
  verbose: true
stages:
  Acceptance:
    installCommand: npm ci
steps:
  karmaExecuteTests:
    modulePath: ./frontend
  executeKarma:
    modulePath: ./legacy
    runCommand: npm run legacy
"#;

    fn karma() -> StepSchema {
        StepSchema::builder("karmaExecuteTests")
            .step_alias("executeKarma")
            .parameter(ParameterSpec::string("modulePath"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_sections() {
        let config = PipelineConfigParser::parse(CONFIG, ".pipeline/config.yml").unwrap();

        let general = config.general_layer();
        assert_eq!(general.kind, LayerKind::General);
        assert_eq!(general.name, ".pipeline/config.yml#general");
        assert_eq!(general.get("verbose"), Some(&RawValue::text("true")));

        let stage = config.stage_layer("Acceptance").unwrap();
        assert_eq!(stage.get("installCommand"), Some(&RawValue::text("npm ci")));
        assert!(config.stage_layer("Release").is_none());
    }

    #[test]
    fn test_step_layer_merges_former_names() {
        let config = PipelineConfigParser::parse(CONFIG, "config.yml").unwrap();
        let layer = config.step_layer(&karma()).unwrap();

        assert_eq!(layer.kind, LayerKind::Steps);
        assert_eq!(layer.get("modulePath"), Some(&RawValue::text("./frontend")));
        assert_eq!(layer.get("runCommand"), Some(&RawValue::text("npm run legacy")));
    }

    #[test]
    fn test_layers_for_without_stage() {
        let config = PipelineConfigParser::parse(CONFIG, "config.yml").unwrap();
        let kinds: Vec<LayerKind> = config
            .layers_for(&karma(), None)
            .iter()
            .map(|l| l.kind)
            .collect();
        assert_eq!(kinds, vec![LayerKind::General, LayerKind::Steps]);
    }

    #[test]
    fn test_empty_document() {
        let config = PipelineConfigParser::parse("", "config.yml").unwrap();
        assert!(config.general_layer().is_empty());
        assert_eq!(config.step_names().count(), 0);
    }

    #[test]
    fn test_non_mapping_section_is_rejected() {
        let err = PipelineConfigParser::parse("general: [a, b]\n", "config.yml").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { ref field, .. } if field == "general"));
    }
}
