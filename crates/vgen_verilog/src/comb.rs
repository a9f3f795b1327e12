//! Combinational logic.
//!
//! The regular layout prints one block per target group. The debug layout
//! prints one block per target signal so that each signal's logic can be read
//! on its own in simulation. Both share the wire/reg classification of
//! [`NetPlan`].

use crate::decl::{use_wire, NetPlan};
use crate::error::ConvertError;
use crate::expr::ExprPrinter;
use crate::node::{AssignKind, NodePrinter, TAB};
use std::collections::HashMap;
use vgen_ir::{list_targets, SignalId, Statement, StatementGroup};

/// Renders the combinational section.
pub fn render_comb(
    stmts: &[Statement],
    plan: &NetPlan,
    printer: ExprPrinter<'_>,
    regular: bool,
) -> Result<String, ConvertError> {
    let mut r = if regular {
        render_grouped(stmts, plan, printer)?
    } else {
        render_per_target(stmts, plan, printer)?
    };
    r.push('\n');
    Ok(r)
}

fn render_grouped(
    stmts: &[Statement],
    plan: &NetPlan,
    printer: ExprPrinter<'_>,
) -> Result<String, ConvertError> {
    let mut r = String::new();
    for group in &plan.groups {
        if use_wire(stmts, group) {
            r.push_str(&render_assign(stmts, group, printer)?);
            continue;
        }
        let ns = printer.namespace();
        let mut targets = group
            .targets
            .iter()
            .map(|&t| Ok((ns.signal(t)?, t)))
            .collect::<Result<Vec<_>, ConvertError>>()?;
        targets.sort();

        let body = NodePrinter::new(printer, AssignKind::NonBlocking);
        r.push_str("always @(*) begin\n");
        for (_, t) in targets {
            r.push_str(&render_default(t, printer)?);
        }
        for &i in &group.statements {
            r.push_str(&body.render_one(&stmts[i], 1)?);
        }
        r.push_str("end\n");
    }
    Ok(r)
}

fn render_per_target(
    stmts: &[Statement],
    plan: &NetPlan,
    printer: ExprPrinter<'_>,
) -> Result<String, ConvertError> {
    let mut group_of: HashMap<SignalId, usize> = HashMap::new();
    for (g, group) in plan.groups.iter().enumerate() {
        for &t in &group.targets {
            group_of.insert(t, g);
        }
    }

    let mut r = String::new();
    let mut assigned = vec![false; plan.groups.len()];
    for t in list_targets(stmts) {
        let Some(&g) = group_of.get(&t) else {
            continue;
        };
        let group = &plan.groups[g];
        if use_wire(stmts, group) {
            if !assigned[g] {
                assigned[g] = true;
                r.push_str(&render_assign(stmts, group, printer)?);
            }
            continue;
        }
        let body = NodePrinter::new(printer, AssignKind::NonBlocking).filtered(t);
        r.push_str("always @(*) begin\n");
        r.push_str(&render_default(t, printer)?);
        for &i in &group.statements {
            r.push_str(&body.render_one(&stmts[i], 1)?);
        }
        r.push_str("end\n");
    }

    // statements without targets ($display, $finish) keep a block of their own
    let body = NodePrinter::new(printer, AssignKind::NonBlocking);
    for group in plan.groups.iter().filter(|g| g.targets.is_empty()) {
        r.push_str("always @(*) begin\n");
        for &i in &group.statements {
            r.push_str(&body.render_one(&stmts[i], 1)?);
        }
        r.push_str("end\n");
    }
    Ok(r)
}

fn render_assign(
    stmts: &[Statement],
    group: &StatementGroup,
    printer: ExprPrinter<'_>,
) -> Result<String, ConvertError> {
    let mut r = String::new();
    let blocking = NodePrinter::new(printer, AssignKind::Blocking);
    for &i in &group.statements {
        r.push_str("assign ");
        r.push_str(&blocking.render_one(&stmts[i], 0)?);
    }
    Ok(r)
}

/// `t <= reset;` at the top of a procedural block.
fn render_default(t: SignalId, printer: ExprPrinter<'_>) -> Result<String, ConvertError> {
    let signal = crate::decl::signal_of(&printer, t)?;
    Ok(format!(
        "{TAB}{} <= {};\n",
        printer.namespace().signal(t)?,
        printer.constant(&signal.reset_const())
    ))
}
