//! Parsing and validation of `vgen.toml` configuration files.
//!
//! This crate reads the conversion settings file and produces a strongly-typed
//! [`VgenConfig`], plus the [`AttrTranslate`] table the emitter uses to turn
//! attribute keys into vendor attributes.

#![warn(missing_docs)]

pub mod attr;
pub mod error;
pub mod loader;
pub mod types;

pub use attr::AttrTranslate;
pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, validate_module_name};
pub use types::*;
