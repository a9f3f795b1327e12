//! Configuration types deserialized from `vgen.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use vgen_ir::AttrValue;

/// The top-level configuration parsed from `vgen.toml`.
///
/// Every section is optional; an empty file yields the defaults used by the
/// converter when no configuration is given.
#[derive(Debug, Default, Deserialize)]
pub struct VgenConfig {
    /// Output module settings.
    #[serde(default)]
    pub module: ModuleConfig,
    /// Verilog emission knobs.
    #[serde(default)]
    pub verilog: VerilogConfig,
    /// Attribute translation.
    #[serde(default)]
    pub attributes: AttributeConfig,
    /// Target platform, if any.
    #[serde(default)]
    pub platform: Option<PlatformConfig>,
}

/// The `[module]` section.
#[derive(Debug, Deserialize)]
pub struct ModuleConfig {
    /// Name of the emitted Verilog module.
    #[serde(default = "default_module_name")]
    pub name: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: default_module_name(),
        }
    }
}

fn default_module_name() -> String {
    "top".to_string()
}

/// The `[verilog]` section.
#[derive(Debug, Deserialize)]
pub struct VerilogConfig {
    /// Group combinational statements by shared targets. `false` selects the
    /// per-signal layout that is easier to read in simulation.
    #[serde(default = "default_true")]
    pub regular_comb: bool,
    /// Emit reset values as declaration initializers on registers.
    #[serde(default = "default_true")]
    pub regs_init: bool,
    /// Time unit of the `` `timescale `` directive.
    #[serde(default = "default_time_unit")]
    pub time_unit: String,
    /// Time precision of the `` `timescale `` directive.
    #[serde(default = "default_time_precision")]
    pub time_precision: String,
}

impl Default for VerilogConfig {
    fn default() -> Self {
        Self {
            regular_comb: true,
            regs_init: true,
            time_unit: default_time_unit(),
            time_precision: default_time_precision(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_time_unit() -> String {
    "1ns".to_string()
}

fn default_time_precision() -> String {
    "1ps".to_string()
}

/// One entry of the `[attributes.translate]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AttrRule {
    /// Emitted attribute name.
    pub name: String,
    /// Emitted attribute value.
    pub value: AttrValue,
}

/// The `[attributes]` section.
#[derive(Debug, Deserialize)]
pub struct AttributeConfig {
    /// Keys missing from `translate` are emitted as `key = "true"`.
    #[serde(default = "default_true")]
    pub passthrough: bool,
    /// Key to vendor attribute mapping.
    #[serde(default)]
    pub translate: BTreeMap<String, AttrRule>,
    /// Keys that are never emitted.
    #[serde(default)]
    pub drop: Vec<String>,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            passthrough: true,
            translate: BTreeMap::new(),
            drop: Vec::new(),
        }
    }
}

/// The `[platform]` section.
#[derive(Debug, Deserialize)]
pub struct PlatformConfig {
    /// Device name printed in the banner.
    pub device: String,
    /// Names of the signals that form the default port list.
    #[serde(default)]
    pub io: Vec<String>,
}
