//! pipeconf Parser - YAML/JSON parsers for step metadata and configuration
//!
//! This crate converts configuration documents into pipeconf core types:
//! - Step metadata documents into validated `StepSchema`s
//! - The pipeline configuration file into general/stage/step `ConfigLayer`s
//! - The orchestrator's parameters JSON into a `Parameters` layer

pub mod config_parser;
pub mod error;
pub mod metadata_parser;
pub mod parameters_parser;
pub mod yaml_parser;

// Re-export main parser types
pub use config_parser::{PipelineConfig, PipelineConfigParser};
pub use error::{ParseError, Result};
pub use metadata_parser::StepMetadataParser;
pub use parameters_parser::ParametersParser;
pub use yaml_parser::{find_similar, YamlParser};
