//! `vgen convert`: fragment JSON to Verilog.
//!
//! 1. Load the configuration (`--config`, else `vgen.toml` beside the fragment)
//! 2. Read the fragment
//! 3. Build the platform from the `[platform]` section
//! 4. Resolve `--io` names, if any
//! 5. Convert and write the module and its data files

use std::error::Error;
use std::path::{Path, PathBuf};

use vgen_config::{validate_module_name, PlatformConfig, VgenConfig};
use vgen_ir::{Fragment, SignalId};
use vgen_lower::GenericPlatform;
use vgen_verilog::{ConvertOptions, Converter};

use crate::{ConvertArgs, GlobalArgs};

/// Runs the `vgen convert` command. Returns exit code 0 on success.
pub fn run(args: &ConvertArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let fragment_path = Path::new(&args.fragment);
    let config = load_settings(global, fragment_path)?;
    let fragment = read_fragment(fragment_path)?;

    let mut options = ConvertOptions::from_config(&config);
    if let Some(name) = &args.name {
        validate_module_name(name)?;
        options.name = name.clone();
    }
    if args.debug_comb {
        options.regular_comb = false;
    }
    if args.no_regs_init {
        options.regs_init = false;
    }

    let platform = match &config.platform {
        Some(p) => Some(build_platform(p, &fragment)?),
        None => None,
    };
    let mut converter = Converter::new(options);
    if !args.io.is_empty() {
        converter = converter.ios(resolve_io(&fragment, &args.io)?);
    }
    if let Some(p) = &platform {
        converter = converter.platform(p);
    }
    let output = converter.convert(fragment)?;

    if args.stdout {
        print!("{}", output.main_source);
        return Ok(0);
    }
    let dir = args.output.as_deref().map_or_else(|| PathBuf::from("."), PathBuf::from);
    let written = output.write(&dir)?;
    if !global.quiet {
        for path in &written {
            eprintln!("     Wrote {}", path.display());
        }
    }
    Ok(0)
}

/// Loads the explicit configuration file, else `vgen.toml` next to the
/// fragment, else the defaults.
fn load_settings(global: &GlobalArgs, fragment: &Path) -> Result<VgenConfig, Box<dyn Error>> {
    if let Some(path) = &global.config {
        return Ok(vgen_config::load_config_file(Path::new(path))?);
    }
    let dir = fragment.parent().unwrap_or_else(|| Path::new("."));
    if dir.join("vgen.toml").is_file() {
        log::debug!("using {}", dir.join("vgen.toml").display());
        return Ok(vgen_config::load_config(dir)?);
    }
    Ok(VgenConfig::default())
}

fn read_fragment(path: &Path) -> Result<Fragment, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {e}", path.display()))?;
    let fragment: Fragment = serde_json::from_str(&text)
        .map_err(|e| format!("invalid fragment '{}': {e}", path.display()))?;
    log::debug!(
        "read fragment: {} signals, {} comb statements, {} domains, {} specials",
        fragment.signals.len(),
        fragment.comb.len(),
        fragment.sync.len(),
        fragment.specials.len()
    );
    Ok(fragment)
}

fn build_platform(
    config: &PlatformConfig,
    fragment: &Fragment,
) -> Result<GenericPlatform, Box<dyn Error>> {
    let io = resolve_io(fragment, &config.io)?;
    Ok(GenericPlatform::new(config.device.clone()).with_io(io))
}

/// Maps signal names to IDs. A name matches a signal's explicit name, its
/// joined backtrace, or its backtrace leaf, and must match exactly one signal.
fn resolve_io(fragment: &Fragment, names: &[String]) -> Result<Vec<SignalId>, Box<dyn Error>> {
    names
        .iter()
        .map(|name| -> Result<SignalId, Box<dyn Error>> {
            let found: Vec<SignalId> = fragment
                .signals
                .iter()
                .filter(|(_, s)| {
                    s.name_override.as_deref() == Some(name.as_str())
                        || s.backtrace.join("_") == *name
                        || s.backtrace.last() == Some(name)
                })
                .map(|(id, _)| id)
                .collect();
            match found.as_slice() {
                [id] => Ok(*id),
                [] => Err(format!("no signal named '{name}'").into()),
                _ => Err(format!(
                    "signal name '{name}' is ambiguous ({} matches)",
                    found.len()
                )
                .into()),
            }
        })
        .collect()
}
