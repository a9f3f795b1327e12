//! Specials lowering.
//!
//! Each special is offered to a lowerer found by its tag: user overrides
//! first, then the platform, then the built-ins of this module. A lowerer
//! that absorbs a special replaces it with ordinary statements and possibly
//! new specials, which are offered in turn. Specials nobody absorbs are left
//! for the Verilog emitter.

use crate::error::LowerError;
use crate::platform::Platform;
use std::collections::{BTreeMap, BTreeSet};
use vgen_ir::{
    Arena, Attribute, ClockDomain, Expr, Fragment, Shape, Signal, SignalId, Special, SpecialId,
    SpecialKind, Statement,
};

/// What a lowerer produced in place of a special.
#[derive(Debug, Default)]
pub struct Lowered {
    /// Combinational statements to append.
    pub comb: Vec<Statement>,
    /// Clocked statements to append, with their domain.
    pub sync: Vec<(String, Statement)>,
    /// New specials. Their IDs are reassigned on insertion.
    pub specials: Vec<Special>,
}

/// The part of the fragment a lowerer may touch.
pub struct LowerCx<'a> {
    signals: &'a mut Arena<SignalId, Signal>,
    clock_domains: &'a BTreeMap<String, ClockDomain>,
    platform: Option<&'a dyn Platform>,
}

impl<'a> LowerCx<'a> {
    /// Wraps fragment state for a lowerer call.
    pub fn new(
        signals: &'a mut Arena<SignalId, Signal>,
        clock_domains: &'a BTreeMap<String, ClockDomain>,
        platform: Option<&'a dyn Platform>,
    ) -> Self {
        Self {
            signals,
            clock_domains,
            platform,
        }
    }

    /// Adds a signal to the fragment.
    pub fn new_signal(&mut self, signal: Signal) -> SignalId {
        self.signals.alloc(signal)
    }

    /// Looks up a signal.
    pub fn signal(&self, id: SignalId) -> &Signal {
        &self.signals[id]
    }

    /// Natural shape of an expression.
    pub fn shape(&self, expr: &Expr) -> Shape {
        expr.shape(self.signals)
    }

    /// A declared clock domain.
    pub fn clock_domain(&self, name: &str) -> Option<&ClockDomain> {
        self.clock_domains.get(name)
    }

    /// The target platform, if any.
    pub fn platform(&self) -> Option<&'a dyn Platform> {
        self.platform
    }
}

/// Replaces specials of one tag with plain logic.
pub trait SpecialLowerer {
    /// Lowers `special`, or returns `None` to leave it to the emitter.
    ///
    /// A lowerer that declines must not allocate signals.
    fn lower(&self, special: &Special, cx: &mut LowerCx) -> Result<Option<Lowered>, LowerError>;
}

/// A source of lowerers keyed by special tag.
pub trait LowererRegistry {
    /// The lowerer for `tag`, if one is registered.
    fn lowerer(&self, tag: &str) -> Option<&dyn SpecialLowerer>;
}

impl LowererRegistry for BTreeMap<String, Box<dyn SpecialLowerer>> {
    fn lowerer(&self, tag: &str) -> Option<&dyn SpecialLowerer> {
        self.get(tag).map(|l| l.as_ref())
    }
}

/// A registry with no entries.
pub struct NoOverrides;

impl LowererRegistry for NoOverrides {
    fn lowerer(&self, _tag: &str) -> Option<&dyn SpecialLowerer> {
        None
    }
}

/// Lowers `multireg` specials into a chain of registers in the output domain.
pub struct MultiRegLowerer;

impl SpecialLowerer for MultiRegLowerer {
    fn lower(&self, special: &Special, cx: &mut LowerCx) -> Result<Option<Lowered>, LowerError> {
        let SpecialKind::MultiReg(r) = &special.kind else {
            return Ok(None);
        };
        let mut out = Lowered::default();
        if r.n == 0 {
            out.comb.push(Statement::assign(r.o.clone(), r.i.clone()));
            return Ok(Some(out));
        }

        let shape = cx.shape(&r.i);
        let mut path = match (&special.name_override, special.backtrace.is_empty()) {
            (Some(name), _) => vec![name.clone()],
            (None, false) => special.backtrace.clone(),
            (None, true) => vec!["multireg".to_string()],
        };
        let mut regs = Vec::with_capacity(r.n as usize);
        for k in 0..r.n {
            path.push(format!("regs{k}"));
            let mut reg = Signal::with_shape(shape)
                .reset(r.reset)
                .attr(Attribute::key("no_retiming"));
            reg.backtrace = path.clone();
            path.pop();
            regs.push(Expr::signal(cx.new_signal(reg)));
        }

        let mut src = r.i.clone();
        for reg in &regs {
            out.sync
                .push((r.odomain.clone(), Statement::assign(reg.clone(), src)));
            src = reg.clone();
        }
        out.comb.push(Statement::assign(r.o.clone(), src));
        Ok(Some(out))
    }
}

/// `ddr_output` has no portable form. Reaching this lowerer means no
/// override or platform handled it.
pub struct DdrOutputLowerer;

impl SpecialLowerer for DdrOutputLowerer {
    fn lower(&self, special: &Special, cx: &mut LowerCx) -> Result<Option<Lowered>, LowerError> {
        let tag = special.tag().to_string();
        Err(match cx.platform() {
            None => LowerError::MissingPlatform {
                special: special.id,
                tag,
            },
            Some(_) => LowerError::UnimplementedSpecial {
                special: special.id,
                tag,
            },
        })
    }
}

fn builtin_lowerer(tag: &str) -> Option<&'static dyn SpecialLowerer> {
    match tag {
        "multireg" => Some(&MultiRegLowerer),
        "ddr_output" => Some(&DdrOutputLowerer),
        _ => None,
    }
}

/// Runs the lowering loop and returns the IDs of the absorbed specials.
pub(crate) fn lower_specials(
    fragment: &mut Fragment,
    overrides: &dyn LowererRegistry,
    platform: Option<&dyn Platform>,
) -> Result<BTreeSet<SpecialId>, LowerError> {
    fragment.specials.sort_by_key(|s| s.id);
    let mut next_id = fragment.alloc_special_id().as_raw();
    let mut lowered = BTreeSet::new();

    let mut i = 0;
    while i < fragment.specials.len() {
        let tag = fragment.specials[i].tag().to_string();
        let lowerer = overrides
            .lowerer(&tag)
            .or_else(|| platform.and_then(|p| p.lowerer(&tag)))
            .or_else(|| builtin_lowerer(&tag));
        let Some(lowerer) = lowerer else {
            i += 1;
            continue;
        };

        let mut cx = LowerCx::new(&mut fragment.signals, &fragment.clock_domains, platform);
        let Some(out) = lowerer.lower(&fragment.specials[i], &mut cx)? else {
            i += 1;
            continue;
        };

        let special = fragment.specials.remove(i);
        log::debug!(
            "lowered special {} ('{tag}') into {} comb, {} sync statements and {} specials",
            special.id,
            out.comb.len(),
            out.sync.len(),
            out.specials.len()
        );
        lowered.insert(special.id);
        fragment.comb.extend(out.comb);
        for (domain, stmt) in out.sync {
            fragment.add_sync(&domain, stmt);
        }
        for mut new in out.specials {
            new.id = SpecialId::from_raw(next_id);
            next_id += 1;
            fragment.specials.push(new);
        }
    }
    Ok(lowered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::GenericPlatform;
    use vgen_ir::{DdrOutput, Instance, MultiReg};

    fn multireg(f: &mut Fragment, n: u32) -> (SignalId, SignalId) {
        let i = f.add_signal(Signal::new(2));
        let o = f.add_signal(Signal::new(2));
        f.add_special(SpecialKind::MultiReg(MultiReg {
            i: Expr::signal(i),
            o: Expr::signal(o),
            odomain: "sys".into(),
            n,
            reset: 1,
        }));
        (i, o)
    }

    #[test]
    fn multireg_becomes_register_chain() {
        let mut f = Fragment::new();
        let (i, o) = multireg(&mut f, 2);
        let lowered = lower_specials(&mut f, &NoOverrides, None).unwrap();
        assert_eq!(lowered.len(), 1);
        assert!(f.specials.is_empty());

        let r0 = SignalId::from_raw(2);
        let r1 = SignalId::from_raw(3);
        assert_eq!(f.signals[r0].reset, 1);
        assert!(f.signals[r1].attrs.contains(&Attribute::key("no_retiming")));
        assert_eq!(f.signals[r1].backtrace, vec!["multireg", "regs1"]);
        assert_eq!(
            f.sync["sys"],
            vec![
                Statement::assign(Expr::signal(r0), Expr::signal(i)),
                Statement::assign(Expr::signal(r1), Expr::signal(r0)),
            ]
        );
        assert_eq!(
            f.comb,
            vec![Statement::assign(Expr::signal(o), Expr::signal(r1))]
        );
    }

    #[test]
    fn zero_stage_multireg_is_a_wire() {
        let mut f = Fragment::new();
        let (i, o) = multireg(&mut f, 0);
        lower_specials(&mut f, &NoOverrides, None).unwrap();
        assert!(f.sync.is_empty());
        assert_eq!(f.comb, vec![Statement::assign(Expr::signal(o), Expr::signal(i))]);
    }

    fn ddr(f: &mut Fragment) {
        let a = f.add_signal(Signal::new(1));
        f.add_special(SpecialKind::DdrOutput(DdrOutput {
            i1: Expr::signal(a),
            i2: Expr::signal(a),
            o: Expr::signal(a),
            domain: "sys".into(),
        }));
    }

    #[test]
    fn ddr_without_platform_needs_one() {
        let mut f = Fragment::new();
        ddr(&mut f);
        let err = lower_specials(&mut f, &NoOverrides, None).unwrap_err();
        assert!(matches!(err, LowerError::MissingPlatform { .. }));
    }

    #[test]
    fn ddr_with_bare_platform_is_unimplemented() {
        let mut f = Fragment::new();
        ddr(&mut f);
        let platform = GenericPlatform::new("ice40");
        let err = lower_specials(&mut f, &NoOverrides, Some(&platform)).unwrap_err();
        assert!(matches!(err, LowerError::UnimplementedSpecial { .. }));
    }

    /// Turns any special into an instance of a vendor primitive.
    struct ToInstance;

    impl SpecialLowerer for ToInstance {
        fn lower(
            &self,
            special: &Special,
            _cx: &mut LowerCx,
        ) -> Result<Option<Lowered>, LowerError> {
            let inst = Special::new(
                special.id,
                SpecialKind::Instance(Instance {
                    of: "ODDR".into(),
                    params: vec![],
                    ports: vec![],
                }),
            );
            Ok(Some(Lowered {
                specials: vec![inst],
                ..Lowered::default()
            }))
        }
    }

    #[test]
    fn platform_lowerer_wins_over_builtin() {
        let mut f = Fragment::new();
        ddr(&mut f);
        let mut platform = GenericPlatform::new("xc7");
        platform.add_lowerer("ddr_output", Box::new(ToInstance));
        let lowered = lower_specials(&mut f, &NoOverrides, Some(&platform)).unwrap();
        assert_eq!(lowered.into_iter().collect::<Vec<_>>(), vec![SpecialId::from_raw(0)]);
        assert_eq!(f.specials.len(), 1);
        assert_eq!(f.specials[0].tag(), "instance");
        assert_eq!(f.specials[0].id, SpecialId::from_raw(1));
    }

    #[test]
    fn override_wins_over_platform_and_new_specials_are_revisited() {
        let mut f = Fragment::new();
        multireg(&mut f, 2);
        let mut overrides: BTreeMap<String, Box<dyn SpecialLowerer>> = BTreeMap::new();
        // multireg -> instance; instances have no lowerer and stay
        overrides.insert("multireg".into(), Box::new(ToInstance));
        let lowered = lower_specials(&mut f, &overrides, None).unwrap();
        assert_eq!(lowered.len(), 1);
        assert!(f.sync.is_empty());
        assert_eq!(f.specials[0].tag(), "instance");
    }

    #[test]
    fn unknown_tags_are_left_for_the_emitter() {
        let mut f = Fragment::new();
        f.add_special(SpecialKind::Instance(Instance {
            of: "BUFG".into(),
            params: vec![],
            ports: vec![],
        }));
        let lowered = lower_specials(&mut f, &NoOverrides, None).unwrap();
        assert!(lowered.is_empty());
        assert_eq!(f.specials.len(), 1);
    }
}
