//! Clocked logic.

use crate::error::ConvertError;
use crate::expr::ExprPrinter;
use crate::node::{AssignKind, NodePrinter};
use std::collections::BTreeMap;
use vgen_ir::Statement;

/// One `always @(posedge clk)` block per domain, in domain name order.
pub fn render_sync(
    sync: &BTreeMap<String, Vec<Statement>>,
    printer: ExprPrinter<'_>,
) -> Result<String, ConvertError> {
    let body = NodePrinter::new(printer, AssignKind::Signal);
    let mut r = String::new();
    for (domain, stmts) in sync {
        let clk = printer.namespace().clock(domain)?;
        r.push_str(&format!("always @(posedge {clk}) begin\n"));
        r.push_str(&body.render(stmts, 1)?);
        r.push_str("end\n\n");
    }
    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;
    use std::collections::BTreeSet;
    use vgen_ir::{Expr, Fragment, Signal};

    #[test]
    fn domains_in_name_order_with_variable_aware_operators() {
        let mut f = Fragment::new();
        let sys_clk = f.add_signal(Signal::new(1).named("sys_clk"));
        let pix_clk = f.add_signal(Signal::new(1).named("pix_clk"));
        let d = f.add_signal(Signal::new(1).named("d"));
        let q = f.add_signal(Signal::new(1).named("q"));
        let v = f.add_signal(Signal::new(1).named("v").variable());
        f.add_clock_domain("sys", sys_clk);
        f.add_clock_domain("pix", pix_clk);
        f.add_sync("sys", Statement::assign(Expr::signal(v), Expr::signal(d)));
        f.add_sync("sys", Statement::assign(Expr::signal(q), Expr::signal(v)));
        f.add_sync("pix", Statement::assign(Expr::signal(q), Expr::signal(d)));

        let used: BTreeSet<_> = f.signals.ids().collect();
        let ns = Namespace::build(&f.signals, &used, &[], &f.clock_domains, &BTreeSet::new())
            .unwrap();
        let r = render_sync(&f.sync, ExprPrinter::new(&ns, &f.signals)).unwrap();
        assert_eq!(
            r,
            "always @(posedge pix_clk) begin\n    q <= d;\nend\n\n\
             always @(posedge sys_clk) begin\n    v = d;\n    q <= v;\nend\n\n"
        );
    }

    #[test]
    fn unknown_domain_is_an_error() {
        let mut f = Fragment::new();
        let q = f.add_signal(Signal::new(1));
        f.add_sync("sys", Statement::assign(Expr::signal(q), Expr::signal(q)));
        let ns = Namespace::default();
        assert!(matches!(
            render_sync(&f.sync, ExprPrinter::new(&ns, &f.signals)),
            Err(ConvertError::UnknownClockDomain(_))
        ));
    }
}
