//! Pass runner.

use crate::basics::BasicLowerer;
use crate::error::LowerError;
use crate::platform::Platform;
use crate::resets::insert_resets;
use crate::rewrite::rewrite_fragment;
use crate::slices::SliceLowerer;
use crate::specials::{lower_specials, LowererRegistry};
use crate::LoweringReport;
use vgen_ir::Fragment;

/// A whole-fragment lowering pass.
pub(crate) trait LowerPass {
    /// Name used in log messages.
    fn name(&self) -> &'static str;

    /// Runs the pass, recording what it did in `report`.
    fn run(&self, fragment: &mut Fragment, report: &mut LoweringReport) -> Result<(), LowerError>;
}

struct SlicePass;

impl LowerPass for SlicePass {
    fn name(&self) -> &'static str {
        "complex slices"
    }

    fn run(&self, fragment: &mut Fragment, report: &mut LoweringReport) -> Result<(), LowerError> {
        let mut rw = SliceLowerer::default();
        rewrite_fragment(&mut rw, fragment)?;
        report.slice_proxies += rw.proxies;
        Ok(())
    }
}

struct ResetPass;

impl LowerPass for ResetPass {
    fn name(&self) -> &'static str {
        "resets"
    }

    fn run(&self, fragment: &mut Fragment, report: &mut LoweringReport) -> Result<(), LowerError> {
        report.reset_registers = insert_resets(fragment);
        Ok(())
    }
}

struct BasicPass;

impl LowerPass for BasicPass {
    fn name(&self) -> &'static str {
        "basics"
    }

    fn run(&self, fragment: &mut Fragment, report: &mut LoweringReport) -> Result<(), LowerError> {
        let mut rw = BasicLowerer::default();
        rewrite_fragment(&mut rw, fragment)?;
        report.clock_refs += rw.clocks;
        report.array_proxies += rw.arrays;
        Ok(())
    }
}

struct SpecialsPass<'a> {
    overrides: &'a dyn LowererRegistry,
    platform: Option<&'a dyn Platform>,
}

impl LowerPass for SpecialsPass<'_> {
    fn name(&self) -> &'static str {
        "specials"
    }

    fn run(&self, fragment: &mut Fragment, report: &mut LoweringReport) -> Result<(), LowerError> {
        let lowered = lower_specials(fragment, self.overrides, self.platform)?;
        report.lowered_specials.extend(lowered);
        Ok(())
    }
}

/// Runs all lowering passes in order. Basic lowering runs again after the
/// specials pass so that logic produced by lowerers is normalized too.
pub(crate) fn run_passes(
    fragment: &mut Fragment,
    overrides: &dyn LowererRegistry,
    platform: Option<&dyn Platform>,
    report: &mut LoweringReport,
) -> Result<(), LowerError> {
    let passes: Vec<Box<dyn LowerPass + '_>> = vec![
        Box::new(SlicePass),
        Box::new(ResetPass),
        Box::new(BasicPass),
        Box::new(SpecialsPass {
            overrides,
            platform,
        }),
        Box::new(BasicPass),
    ];

    for pass in &passes {
        pass.run(fragment, report)?;
        log::debug!(
            "pass '{}': {} signals, {} comb statements, {} specials",
            pass.name(),
            fragment.signals.len(),
            fragment.comb.len(),
            fragment.specials.len()
        );
    }
    Ok(())
}
