//! Statement rendering.

use crate::error::ConvertError;
use crate::expr::ExprPrinter;
use vgen_ir::{Expr, SignalId, Statement};

/// One level of indentation.
pub const TAB: &str = "    ";

/// Which assignment operator a statement list is printed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignKind {
    /// Always `=`.
    Blocking,
    /// Always `<=`.
    NonBlocking,
    /// `=` for variable targets, `<=` for the rest.
    Signal,
}

/// Prints statement lists with a fixed assignment kind and an optional
/// target filter.
///
/// With a filter, statements that do not assign the filtered signal print as
/// nothing, and so do statements without any target.
pub struct NodePrinter<'a> {
    expr: ExprPrinter<'a>,
    kind: AssignKind,
    filter: Option<SignalId>,
}

impl<'a> NodePrinter<'a> {
    /// Creates an unfiltered printer.
    pub fn new(expr: ExprPrinter<'a>, kind: AssignKind) -> Self {
        Self {
            expr,
            kind,
            filter: None,
        }
    }

    /// Restricts output to statements assigning `target`.
    pub fn filtered(mut self, target: SignalId) -> Self {
        self.filter = Some(target);
        self
    }

    /// Renders `stmts` at indentation `level`.
    pub fn render(&self, stmts: &[Statement], level: usize) -> Result<String, ConvertError> {
        let mut out = String::new();
        for stmt in stmts {
            out.push_str(&self.render_one(stmt, level)?);
        }
        Ok(out)
    }

    /// Renders one statement at indentation `level`.
    pub fn render_one(&self, stmt: &Statement, level: usize) -> Result<String, ConvertError> {
        if !self.selected(stmt) {
            return Ok(String::new());
        }
        let tab = TAB.repeat(level);
        match stmt {
            Statement::Assign { target, value } => Ok(format!(
                "{tab}{}{}{};\n",
                self.expr.render(target)?,
                self.operator(target)?,
                self.expr.render(value)?
            )),
            Statement::If {
                cond,
                then_body,
                else_body,
            } => {
                let mut r = format!("{tab}if ({}) begin\n", self.expr.render(cond)?);
                r.push_str(&self.render(then_body, level + 1)?);
                if !else_body.is_empty() {
                    r.push_str(&format!("{tab}end else begin\n"));
                    r.push_str(&self.render(else_body, level + 1)?);
                }
                r.push_str(&format!("{tab}end\n"));
                Ok(r)
            }
            Statement::Case {
                test,
                arms,
                default,
            } => {
                if arms.is_empty() && default.is_none() {
                    return Ok(String::new());
                }
                let inner = TAB.repeat(level + 1);
                let mut r = format!("{tab}case ({})\n", self.expr.render(test)?);
                let mut sorted: Vec<_> = arms.iter().collect();
                sorted.sort_by_key(|arm| arm.value.value);
                for arm in sorted {
                    r.push_str(&format!("{inner}{}: begin\n", self.expr.constant(&arm.value)));
                    r.push_str(&self.render(&arm.body, level + 2)?);
                    r.push_str(&format!("{inner}end\n"));
                }
                if let Some(body) = default {
                    r.push_str(&format!("{inner}default: begin\n"));
                    r.push_str(&self.render(body, level + 2)?);
                    r.push_str(&format!("{inner}end\n"));
                }
                r.push_str(&format!("{tab}endcase\n"));
                Ok(r)
            }
            Statement::Block(body) => self.render(body, level),
            Statement::Display { format, args } => {
                let mut r = string_literal(format);
                for arg in args {
                    r.push_str(", ");
                    r.push_str(&self.expr.render(arg)?);
                }
                Ok(format!("{tab}$display({r});\n"))
            }
            Statement::Finish => Ok(format!("{tab}$finish;\n")),
            Statement::Unsupported { .. } => Err(ConvertError::unsupported(stmt)),
        }
    }

    fn selected(&self, stmt: &Statement) -> bool {
        match self.filter {
            None => true,
            Some(target) => {
                let mut targets = Vec::new();
                stmt.collect_targets(&mut targets);
                targets.contains(&target)
            }
        }
    }

    fn operator(&self, target: &Expr) -> Result<&'static str, ConvertError> {
        match self.kind {
            AssignKind::Blocking => Ok(" = "),
            AssignKind::NonBlocking => Ok(" <= "),
            AssignKind::Signal => match target.is_variable(self.expr.signals()) {
                Some(true) => Ok(" = "),
                Some(false) => Ok(" <= "),
                None => Err(ConvertError::unsupported(target)),
            },
        }
    }
}

/// Quotes `text` as a Verilog string literal.
fn string_literal(text: &str) -> String {
    let mut r = String::with_capacity(text.len() + 2);
    r.push('"');
    for c in text.chars() {
        match c {
            '"' => r.push_str("\\\""),
            '\\' => r.push_str("\\\\"),
            '\n' => r.push_str("\\n"),
            '\t' => r.push_str("\\t"),
            c => r.push(c),
        }
    }
    r.push('"');
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;
    use std::collections::{BTreeMap, BTreeSet};
    use vgen_ir::{Arena, CaseArm, Const, Signal};

    fn setup() -> (Arena<SignalId, Signal>, Namespace) {
        let mut signals = Arena::new();
        signals.alloc(Signal::new(1).named("c"));
        signals.alloc(Signal::new(4).named("a"));
        signals.alloc(Signal::new(4).named("b"));
        signals.alloc(Signal::new(4).named("v").variable());
        let used: BTreeSet<SignalId> = signals.ids().collect();
        let ns =
            Namespace::build(&signals, &used, &[], &BTreeMap::new(), &BTreeSet::new()).unwrap();
        (signals, ns)
    }

    fn sig(i: u32) -> Expr {
        Expr::signal(SignalId::from_raw(i))
    }

    #[test]
    fn if_else_layout() {
        let (signals, ns) = setup();
        let p = NodePrinter::new(ExprPrinter::new(&ns, &signals), AssignKind::NonBlocking);
        let stmt = Statement::if_else(
            sig(0),
            vec![Statement::assign(sig(1), sig(2))],
            vec![Statement::assign(sig(1), Expr::constant(0, 4))],
        );
        assert_eq!(
            p.render_one(&stmt, 1).unwrap(),
            "    if (c) begin\n        a <= b;\n    end else begin\n        a <= 4'd0;\n    end\n"
        );
        let no_else = Statement::if_then(sig(0), vec![Statement::assign(sig(1), sig(2))]);
        assert_eq!(
            p.render_one(&no_else, 0).unwrap(),
            "if (c) begin\n    a <= b;\nend\n"
        );
    }

    #[test]
    fn case_arms_sorted_with_default_last() {
        let (signals, ns) = setup();
        let p = NodePrinter::new(ExprPrinter::new(&ns, &signals), AssignKind::Blocking);
        let stmt = Statement::Case {
            test: sig(2),
            arms: vec![
                CaseArm {
                    value: Const::new(3, 4),
                    body: vec![Statement::assign(sig(1), sig(2))],
                },
                CaseArm {
                    value: Const::new(1, 4),
                    body: vec![],
                },
            ],
            default: Some(vec![Statement::Finish]),
        };
        assert_eq!(
            p.render_one(&stmt, 0).unwrap(),
            "case (b)\n    4'd1: begin\n    end\n    4'd3: begin\n        a = b;\n    end\n    \
             default: begin\n        $finish;\n    end\nendcase\n"
        );
        let empty = Statement::Case {
            test: sig(2),
            arms: vec![],
            default: None,
        };
        assert_eq!(p.render_one(&empty, 0).unwrap(), "");
    }

    #[test]
    fn signal_kind_follows_variables() {
        let (signals, ns) = setup();
        let p = NodePrinter::new(ExprPrinter::new(&ns, &signals), AssignKind::Signal);
        assert_eq!(
            p.render_one(&Statement::assign(sig(3), sig(1)), 0).unwrap(),
            "v = a;\n"
        );
        assert_eq!(
            p.render_one(&Statement::assign(sig(1), sig(3)), 0).unwrap(),
            "a <= v;\n"
        );
        let mixed = Expr::cat(vec![sig(1), sig(3)]);
        assert!(matches!(
            p.render_one(&Statement::assign(mixed, sig(2)), 0),
            Err(ConvertError::UnsupportedConstruct { .. })
        ));
    }

    #[test]
    fn filter_drops_other_targets() {
        let (signals, ns) = setup();
        let p = NodePrinter::new(ExprPrinter::new(&ns, &signals), AssignKind::NonBlocking)
            .filtered(SignalId::from_raw(1));
        let stmts = vec![
            Statement::assign(sig(2), sig(1)),
            Statement::if_then(
                sig(0),
                vec![
                    Statement::assign(sig(1), sig(2)),
                    Statement::assign(sig(2), sig(2)),
                ],
            ),
            Statement::Display {
                format: "a=%d".into(),
                args: vec![sig(1)],
            },
        ];
        assert_eq!(
            p.render(&stmts, 0).unwrap(),
            "if (c) begin\n    a <= b;\nend\n"
        );
    }

    #[test]
    fn display_and_unsupported() {
        let (signals, ns) = setup();
        let p = NodePrinter::new(ExprPrinter::new(&ns, &signals), AssignKind::Signal);
        let d = Statement::Display {
            format: "a=%d b=%d".into(),
            args: vec![sig(1), sig(2)],
        };
        assert_eq!(p.render_one(&d, 1).unwrap(), "    $display(\"a=%d b=%d\", a, b);\n");
        let u = Statement::Unsupported {
            description: "assert".into(),
        };
        assert!(p.render_one(&u, 0).is_err());
    }

    #[test]
    fn display_format_is_escaped() {
        let (signals, ns) = setup();
        let p = NodePrinter::new(ExprPrinter::new(&ns, &signals), AssignKind::NonBlocking);
        let stmt = Statement::Display {
            format: "say \"hi\" at C:\\tmp\n".into(),
            args: vec![sig(1)],
        };
        assert_eq!(
            p.render_one(&stmt, 0).unwrap(),
            "$display(\"say \\\"hi\\\" at C:\\\\tmp\\n\", a);\n"
        );
    }
}
