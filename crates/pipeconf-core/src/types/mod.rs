//! Value types for pipeconf
//!
//! - `RawValue`: textual value as supplied by a configuration source
//! - `ParamValue`: typed value after validation
//! - `ParamType`: declared parameter type

pub mod param_type;
pub mod value;

pub use param_type::ParamType;
pub use value::{ParamValue, RawValue};
