//! The conversion driver.

use crate::comb::render_comb;
use crate::decl::{render_module_header, render_signals, NetPlan};
use crate::error::ConvertError;
use crate::expr::ExprPrinter;
use crate::hierarchy::{render_hierarchy, Hierarchy};
use crate::layout::{banner, separator, timescale, trailer};
use crate::namespace::Namespace;
use crate::output::ConvOutput;
use crate::specials::{render_specials, EmitCx, SpecialOverrides};
use crate::sync::render_sync;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use vgen_config::{AttrTranslate, VgenConfig};
use vgen_ir::{list_clock_domains, reserved_keywords, Fragment, IntoFragment, SignalId};
use vgen_lower::{lower_fragment, verify_clock_domains, LowerError, Platform};

/// Knobs of one conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Module name, also the stem of the main file.
    pub name: String,
    /// Group combinational logic by shared targets instead of per signal.
    pub regular_comb: bool,
    /// Initialize registers with their reset value in the declaration.
    pub regs_init: bool,
    /// `` `timescale `` unit.
    pub time_unit: String,
    /// `` `timescale `` precision.
    pub time_precision: String,
    /// Attribute key translation.
    pub attr_translate: AttrTranslate,
    /// Date printed in the banner and trailer. The current local time when unset.
    pub timestamp: Option<NaiveDateTime>,
    /// Revision printed in the banner.
    pub revision: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            name: "top".to_string(),
            regular_comb: true,
            regs_init: true,
            time_unit: "1ns".to_string(),
            time_precision: "1ps".to_string(),
            attr_translate: AttrTranslate::passthrough(),
            timestamp: None,
            revision: None,
        }
    }
}

impl ConvertOptions {
    /// Takes every setting from a loaded configuration.
    pub fn from_config(config: &VgenConfig) -> Self {
        Self {
            name: config.module.name.clone(),
            regular_comb: config.verilog.regular_comb,
            regs_init: config.verilog.regs_init,
            time_unit: config.verilog.time_unit.clone(),
            time_precision: config.verilog.time_precision.clone(),
            attr_translate: AttrTranslate::from_config(&config.attributes),
            timestamp: None,
            revision: None,
        }
    }
}

/// Converts one fragment into a Verilog module.
///
/// ```ignore
/// let out = Converter::new(ConvertOptions::default())
///     .ios(ports)
///     .convert(fragment)?;
/// out.write(Path::new("build"))?;
/// ```
pub struct Converter<'a> {
    options: ConvertOptions,
    ios: Option<BTreeSet<SignalId>>,
    platform: Option<&'a dyn Platform>,
    overrides: Option<&'a SpecialOverrides>,
    hierarchy: Option<&'a dyn Hierarchy>,
}

impl<'a> Converter<'a> {
    /// A converter with no ports, platform, overrides or hierarchy.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            ios: None,
            platform: None,
            overrides: None,
            hierarchy: None,
        }
    }

    /// Sets the module ports. Without this, or with an empty list, the
    /// platform's I/O signals are used.
    pub fn ios(mut self, ios: impl IntoIterator<Item = SignalId>) -> Self {
        self.ios = Some(ios.into_iter().collect());
        self
    }

    /// Sets the target platform.
    pub fn platform(mut self, platform: &'a dyn Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Sets user lowerers and emitters.
    pub fn overrides(mut self, overrides: &'a SpecialOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Sets the hierarchy printed in the `Hierarchy` section.
    pub fn hierarchy(mut self, hierarchy: &'a dyn Hierarchy) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    /// Lowers and emits `fragment`.
    ///
    /// Any error aborts the whole conversion; nothing is returned or written.
    pub fn convert(self, fragment: impl IntoFragment) -> Result<ConvOutput, ConvertError> {
        let empty = SpecialOverrides::new();
        let overrides = self.overrides.unwrap_or(&empty);
        let options = &self.options;

        let mut fragment = fragment.into_fragment();
        verify_clock_domains(&fragment)?;
        let report = lower_fragment(&mut fragment, overrides, self.platform)?;

        // an empty explicit list counts as not given
        let ios = match (self.ios.filter(|ios| !ios.is_empty()), self.platform) {
            (Some(ios), _) => ios,
            (None, Some(platform)) => platform.io_signals(&fragment),
            (None, None) => BTreeSet::new(),
        };
        if ios.is_empty() {
            return Err(ConvertError::MissingIoSignals);
        }
        name_ports(&mut fragment, &ios)?;

        let clocks: BTreeSet<SignalId> = list_clock_domains(&fragment)
            .iter()
            .filter_map(|d| fragment.clock_domains.get(d))
            .map(|cd| cd.clk)
            .collect();
        let plan = NetPlan::new(&fragment, &clocks);
        let mut used = plan.sigs.clone();
        used.extend(ios.iter().copied());
        let ns = Namespace::build(
            &fragment.signals,
            &used,
            &fragment.specials,
            &fragment.clock_domains,
            &reserved_keywords(),
        )?;

        let printer = ExprPrinter::new(&ns, &fragment.signals);
        let ports = plan.ports(&ios, &printer)?;
        let date = options
            .timestamp
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        let device = self.platform.map_or("Unknown", |p| p.device());
        let revision = options.revision.as_deref().unwrap_or("Unknown");
        let translate = &options.attr_translate;

        let mut output = ConvOutput {
            module_name: options.name.clone(),
            ..ConvOutput::default()
        };
        let mut v = banner(&options.name, device, revision, date);
        v.push_str(&timescale(&options.time_unit, &options.time_precision));
        v.push_str(&separator("Module"));
        v.push_str(&render_module_header(&options.name, &ports, &printer, translate)?);
        v.push_str(&separator("Hierarchy"));
        v.push_str(&render_hierarchy(self.hierarchy));
        v.push_str(&separator("Signals"));
        v.push_str(&render_signals(&plan, &ios, &printer, translate, options.regs_init)?);
        v.push_str(&separator("Combinatorial Logic"));
        v.push_str(&render_comb(&fragment.comb, &plan, printer, options.regular_comb)?);
        v.push_str(&separator("Synchronous Logic"));
        v.push_str(&render_sync(&fragment.sync, printer)?);
        v.push_str(&separator("Specialized Logic"));
        {
            let mut cx = EmitCx::new(printer, &options.name, &mut output);
            v.push_str(&render_specials(&fragment.specials, overrides, translate, &mut cx)?);
        }
        v.push_str("endmodule\n");
        v.push_str(&trailer(date));

        log::info!(
            "converted '{}': {} ports, {} identifiers, {} specials lowered, {} emitted, {} data files",
            options.name,
            ports.len(),
            ns.len(),
            report.lowered_specials.len(),
            fragment.specials.len(),
            output.data_files.len()
        );
        output.main_source = v;
        output.ports = ports;
        output.ns = ns;
        Ok(output)
    }
}

/// Ports without an explicit name take the last element of their backtrace.
fn name_ports(fragment: &mut Fragment, ios: &BTreeSet<SignalId>) -> Result<(), ConvertError> {
    for &id in ios {
        if !fragment.signals.contains(id) {
            return Err(LowerError::UnresolvedSignal(id).into());
        }
        let signal = &mut fragment.signals[id];
        if signal.name_override.is_none() {
            if let Some(leaf) = signal.backtrace.last().filter(|l| !l.is_empty()) {
                signal.name_override = Some(leaf.clone());
            }
        }
    }
    Ok(())
}
