//! Net classification, the module header and signal declarations.

use crate::attr::render_attributes;
use crate::error::ConvertError;
use crate::expr::ExprPrinter;
use crate::output::{NetKind, PortDecl, PortDirection};
use std::collections::BTreeSet;
use vgen_config::AttrTranslate;
use vgen_ir::{
    group_by_targets, list_signals, list_special_ios, list_targets, Expr, Fragment, Signal,
    SignalId, Statement, StatementGroup,
};

/// Which signals exist in the module body and how each one is driven.
///
/// Built once per conversion; the header, the declarations and both
/// combinational layouts read the same classification.
#[derive(Debug, Clone)]
pub struct NetPlan {
    /// Every signal the module mentions, ports included.
    pub sigs: BTreeSet<SignalId>,
    /// Signals assigned by statements or driven by a special.
    pub targets: BTreeSet<SignalId>,
    /// Targets declared `wire`.
    pub wires: BTreeSet<SignalId>,
    /// Signals connected to a bidirectional special I/O.
    pub inouts: BTreeSet<SignalId>,
    /// Combinational statements partitioned by shared targets.
    pub groups: Vec<StatementGroup>,
}

impl NetPlan {
    /// Classifies the nets of a lowered fragment. `clocks` are the clock
    /// signals of the domains in use.
    pub fn new(fragment: &Fragment, clocks: &BTreeSet<SignalId>) -> Self {
        let mut sigs = list_signals(fragment);
        sigs.extend(list_special_ios(&fragment.specials, true, true, true));
        sigs.extend(clocks.iter().copied());
        let special_outs = list_special_ios(&fragment.specials, false, true, true);
        let inouts = list_special_ios(&fragment.specials, false, false, true);

        let mut targets: BTreeSet<SignalId> = list_targets(&fragment.comb).into_iter().collect();
        for stmts in fragment.sync.values() {
            targets.extend(list_targets(stmts));
        }
        targets.extend(special_outs.iter().copied());

        let groups = group_by_targets(&fragment.comb);
        let mut wires = special_outs;
        for group in &groups {
            if use_wire(&fragment.comb, group) {
                wires.extend(group.targets.iter().copied());
            }
        }

        Self {
            sigs,
            targets,
            wires,
            inouts,
            groups,
        }
    }

    /// Declares `ios` in name order.
    pub fn ports(
        &self,
        ios: &BTreeSet<SignalId>,
        printer: &ExprPrinter<'_>,
    ) -> Result<Vec<PortDecl>, ConvertError> {
        let ns = printer.namespace();
        let mut ports = ios
            .iter()
            .map(|&signal| {
                let (direction, kind) = if self.inouts.contains(&signal) {
                    (PortDirection::InOut, NetKind::Wire)
                } else if self.targets.contains(&signal) {
                    let kind = if self.wires.contains(&signal) {
                        NetKind::Wire
                    } else {
                        NetKind::Reg
                    };
                    (PortDirection::Output, kind)
                } else {
                    (PortDirection::Input, NetKind::Wire)
                };
                Ok(PortDecl {
                    signal,
                    name: ns.signal(signal)?.to_string(),
                    direction,
                    kind,
                })
            })
            .collect::<Result<Vec<_>, ConvertError>>()?;
        ports.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ports)
    }
}

/// A group is a continuous assignment when it is one plain `Assign` whose
/// target is not a part-select.
pub fn use_wire(stmts: &[Statement], group: &StatementGroup) -> bool {
    match group.statements.as_slice() {
        [only] => matches!(
            &stmts[*only],
            Statement::Assign { target, .. } if !matches!(target, Expr::Slice { .. })
        ),
        _ => false,
    }
}

/// `signed [w-1:0] name`, with the parts that apply.
pub fn declarator(signal: &Signal, name: &str) -> String {
    let mut r = String::new();
    if signal.signed {
        r.push_str("signed ");
    }
    if signal.width > 1 {
        r.push_str(&format!("[{}:0] ", signal.width - 1));
    }
    r.push_str(name);
    r
}

/// The `module name (...);` header.
pub fn render_module_header(
    name: &str,
    ports: &[PortDecl],
    printer: &ExprPrinter<'_>,
    translate: &AttrTranslate,
) -> Result<String, ConvertError> {
    let mut lines = Vec::with_capacity(ports.len());
    for port in ports {
        let signal = signal_of(printer, port.signal)?;
        let mut line = String::new();
        let attr = render_attributes(&signal.attrs, translate);
        if !attr.is_empty() {
            line.push_str("    ");
            line.push_str(&attr);
        }
        let kind = match (port.direction, port.kind) {
            (PortDirection::InOut, _) => "inout  wire ",
            (PortDirection::Output, NetKind::Wire) => "output wire ",
            (PortDirection::Output, NetKind::Reg) => "output reg  ",
            (PortDirection::Input, _) => "input  wire ",
        };
        line.push_str("    ");
        line.push_str(kind);
        line.push_str(&declarator(signal, &port.name));
        lines.push(line);
    }
    Ok(format!("module {name} (\n{}\n);\n\n", lines.join(",\n")))
}

/// Declarations for every non-port signal, in name order.
pub fn render_signals(
    plan: &NetPlan,
    ios: &BTreeSet<SignalId>,
    printer: &ExprPrinter<'_>,
    translate: &AttrTranslate,
    regs_init: bool,
) -> Result<String, ConvertError> {
    let ns = printer.namespace();
    let mut named = plan
        .sigs
        .difference(ios)
        .map(|&id| Ok((ns.signal(id)?, id)))
        .collect::<Result<Vec<_>, ConvertError>>()?;
    named.sort();

    let mut r = String::new();
    for (name, id) in named {
        let signal = signal_of(printer, id)?;
        r.push_str(&render_attributes(&signal.attrs, translate));
        if plan.wires.contains(&id) {
            r.push_str(&format!("wire {};\n", declarator(signal, name)));
        } else {
            r.push_str(&format!("reg  {}", declarator(signal, name)));
            if regs_init {
                r.push_str(&format!(" = {}", printer.constant(&signal.reset_const())));
            }
            r.push_str(";\n");
        }
    }
    Ok(r)
}

pub(crate) fn signal_of<'a>(
    printer: &ExprPrinter<'a>,
    id: SignalId,
) -> Result<&'a Signal, ConvertError> {
    printer
        .signals()
        .try_get(id)
        .ok_or(ConvertError::UnnamedSignal(id))
}
