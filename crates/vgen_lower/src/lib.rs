//! Lowering passes for the vgen Verilog generator.
//!
//! The pipeline rewrites a [`Fragment`] in place until every construct left
//! in it maps directly onto Verilog:
//! 1. **Complex-slice lowering**: part-selects only on signals
//! 2. **Reset insertion**: resets stay with declarations and comb defaults
//! 3. **Basic-operator lowering**: clock references and array proxies
//! 4. **Specials lowering**: override, platform and built-in lowerers
//! 5. **Basic-operator lowering** again, for logic produced by step 4
//!
//! # Usage
//!
//! ```ignore
//! use vgen_lower::{lower_fragment, NoOverrides};
//! let report = lower_fragment(&mut fragment, &NoOverrides, None)?;
//! ```

#![warn(missing_docs)]

mod basics;
mod error;
mod pass;
mod platform;
mod resets;
mod rewrite;
mod slices;
mod specials;

pub use error::LowerError;
pub use platform::{GenericPlatform, Platform};
pub use specials::{
    DdrOutputLowerer, LowerCx, Lowered, LowererRegistry, MultiRegLowerer, NoOverrides,
    SpecialLowerer,
};

use std::collections::BTreeSet;
use vgen_ir::{list_clock_domains, Fragment, SpecialId};

/// What the pipeline did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoweringReport {
    /// Specials absorbed by a lowerer; they are gone from the fragment.
    pub lowered_specials: BTreeSet<SpecialId>,
    /// Proxy signals allocated for complex slices.
    pub slice_proxies: usize,
    /// Array proxies turned into `case` statements.
    pub array_proxies: usize,
    /// Clock references resolved to domain clocks.
    pub clock_refs: usize,
    /// Registers whose reset value is carried by their declaration.
    pub reset_registers: usize,
}

/// Checks that every clock domain the fragment names is declared.
///
/// Domains are checked in name order, so the first missing name is reported.
pub fn verify_clock_domains(fragment: &Fragment) -> Result<(), LowerError> {
    for name in list_clock_domains(fragment) {
        if !fragment.clock_domains.contains_key(&name) {
            return Err(LowerError::UnresolvedClockDomain {
                name,
                available: fragment.clock_domains.keys().cloned().collect(),
            });
        }
    }
    Ok(())
}

/// Runs the full lowering pipeline on `fragment`.
///
/// `overrides` is consulted before the platform for special lowerers.
pub fn lower_fragment(
    fragment: &mut Fragment,
    overrides: &dyn LowererRegistry,
    platform: Option<&dyn Platform>,
) -> Result<LoweringReport, LowerError> {
    fragment
        .check_signal_refs()
        .map_err(LowerError::UnresolvedSignal)?;
    fragment
        .check_signal_widths()
        .map_err(LowerError::ZeroWidthSignal)?;
    let mut report = LoweringReport::default();
    pass::run_passes(fragment, overrides, platform, &mut report)?;
    // special lowerers may have added sync logic in new domains
    verify_clock_domains(fragment)?;
    log::debug!(
        "lowering done: {} slice proxies, {} array proxies, {} clock refs, {} specials lowered",
        report.slice_proxies,
        report.array_proxies,
        report.clock_refs,
        report.lowered_specials.len()
    );
    Ok(report)
}
