//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::VgenConfig;
use std::path::Path;
use vgen_ir::is_reserved_keyword;

/// Loads and validates `vgen.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<VgenConfig, ConfigError> {
    load_config_file(&project_dir.join("vgen.toml"))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<VgenConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<VgenConfig, ConfigError> {
    let config: VgenConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks identifiers and time literals the emitter copies verbatim.
fn validate_config(config: &VgenConfig) -> Result<(), ConfigError> {
    validate_module_name(&config.module.name)?;
    for (field, value) in [
        ("verilog.time_unit", &config.verilog.time_unit),
        ("verilog.time_precision", &config.verilog.time_precision),
    ] {
        if !is_time_literal(value) {
            return Err(ConfigError::BadTimeLiteral {
                field,
                value: value.clone(),
            });
        }
    }
    if let Some(platform) = &config.platform {
        if platform.device.is_empty() {
            return Err(ConfigError::MissingField("platform.device"));
        }
    }
    Ok(())
}

/// Checks that `name` can be emitted as the Verilog module name.
pub fn validate_module_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::MissingField("module.name"));
    }
    if !is_identifier(name) {
        return Err(ConfigError::BadModuleName(name.to_string()));
    }
    if is_reserved_keyword(name) {
        return Err(ConfigError::ReservedModuleName(name.to_string()));
    }
    Ok(())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn is_time_literal(s: &str) -> bool {
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (magnitude, unit) = s.split_at(split);
    matches!(magnitude, "1" | "10" | "100")
        && matches!(unit.trim_start(), "s" | "ms" | "us" | "ns" | "ps" | "fs")
}
