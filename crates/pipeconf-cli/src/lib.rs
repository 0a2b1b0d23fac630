//! pipeconf command line
//!
//! Resolves step options from flags, environment variables, the parameters
//! document, the pipeline configuration file and the shared pipeline
//! environment.

pub mod args;
pub mod commands;
pub mod settings;

pub use args::{Cli, CliCommand};
pub use commands::execute;
pub use settings::CliSettings;
