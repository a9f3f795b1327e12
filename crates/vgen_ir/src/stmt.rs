//! Statements.
//!
//! The same statement tree is used for combinational lists and per-domain
//! clocked lists; only the emitter context decides between blocking and
//! non-blocking assignment.

use crate::expr::{Const, Expr};
use crate::ids::SignalId;
use serde::{Deserialize, Serialize};

/// One arm of a [`Statement::Case`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseArm {
    /// The matched value.
    pub value: Const,
    /// Statements run on a match.
    pub body: Vec<Statement>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    /// `target = value` or `target <= value`.
    Assign {
        /// The assigned lvalue.
        target: Expr,
        /// The assigned value.
        value: Expr,
    },
    /// A two-way branch.
    If {
        /// Condition.
        cond: Expr,
        /// Taken when `cond` is non-zero.
        #[serde(default)]
        then_body: Vec<Statement>,
        /// Taken otherwise.
        #[serde(default)]
        else_body: Vec<Statement>,
    },
    /// A multi-way branch on a value.
    Case {
        /// The tested value.
        test: Expr,
        /// Arms; emitted sorted by value.
        #[serde(default)]
        arms: Vec<CaseArm>,
        /// Fallback arm.
        #[serde(default)]
        default: Option<Vec<Statement>>,
    },
    /// A flat sequence, spliced into the enclosing list on emission.
    Block(Vec<Statement>),
    /// Simulation print.
    Display {
        /// Format string, emitted quoted.
        format: String,
        /// Printed values.
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// Simulation stop.
    Finish,
    /// A node no emitter understands. Reaching an emitter is an error.
    Unsupported {
        /// Human readable description for the error message.
        description: String,
    },
}

impl Statement {
    /// An assignment.
    pub fn assign(target: Expr, value: Expr) -> Self {
        Statement::Assign { target, value }
    }

    /// An `if` without `else`.
    pub fn if_then(cond: Expr, then_body: Vec<Statement>) -> Self {
        Statement::If {
            cond,
            then_body,
            else_body: Vec::new(),
        }
    }

    /// An `if` with `else`.
    pub fn if_else(cond: Expr, then_body: Vec<Statement>, else_body: Vec<Statement>) -> Self {
        Statement::If {
            cond,
            then_body,
            else_body,
        }
    }

    /// A `case` without a default arm.
    pub fn case(test: Expr, arms: Vec<CaseArm>) -> Self {
        Statement::Case {
            test,
            arms,
            default: None,
        }
    }

    /// Collects the signals assigned anywhere inside the statement, in order
    /// of appearance. Duplicates are kept.
    pub fn collect_targets(&self, out: &mut Vec<SignalId>) {
        match self {
            Statement::Assign { target, .. } => target.collect_targets(out),
            Statement::If {
                then_body,
                else_body,
                ..
            } => {
                for s in then_body.iter().chain(else_body) {
                    s.collect_targets(out);
                }
            }
            Statement::Case { arms, default, .. } => {
                for s in arms.iter().flat_map(|a| &a.body) {
                    s.collect_targets(out);
                }
                for s in default.iter().flatten() {
                    s.collect_targets(out);
                }
            }
            Statement::Block(body) => body.iter().for_each(|s| s.collect_targets(out)),
            Statement::Display { .. } | Statement::Finish | Statement::Unsupported { .. } => {}
        }
    }

    /// Calls `f` on every expression held by the statement tree, targets
    /// included.
    pub fn for_each_expr(&self, f: &mut impl FnMut(&Expr)) {
        match self {
            Statement::Assign { target, value } => {
                f(target);
                f(value);
            }
            Statement::If {
                cond,
                then_body,
                else_body,
            } => {
                f(cond);
                for s in then_body.iter().chain(else_body) {
                    s.for_each_expr(f);
                }
            }
            Statement::Case {
                test,
                arms,
                default,
            } => {
                f(test);
                for s in arms.iter().flat_map(|a| &a.body) {
                    s.for_each_expr(f);
                }
                for s in default.iter().flatten() {
                    s.for_each_expr(f);
                }
            }
            Statement::Block(body) => body.iter().for_each(|s| s.for_each_expr(f)),
            Statement::Display { args, .. } => args.iter().for_each(f),
            Statement::Finish | Statement::Unsupported { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(i: u32) -> Expr {
        Expr::signal(SignalId::from_raw(i))
    }

    #[test]
    fn targets_of_nested_branches() {
        let stmt = Statement::if_else(
            sig(0),
            vec![Statement::assign(sig(1), sig(0))],
            vec![Statement::case(
                sig(0),
                vec![CaseArm {
                    value: Const::new(0, 1),
                    body: vec![Statement::assign(Expr::slice(sig(2), 0, 1), sig(0))],
                }],
            )],
        );
        let mut targets = Vec::new();
        stmt.collect_targets(&mut targets);
        assert_eq!(targets, vec![SignalId::from_raw(1), SignalId::from_raw(2)]);
    }

    #[test]
    fn display_args_are_visited() {
        let stmt = Statement::Display {
            format: "%d".into(),
            args: vec![sig(3)],
        };
        let mut seen = 0;
        stmt.for_each_expr(&mut |_| seen += 1);
        assert_eq!(seen, 1);
        let mut targets = Vec::new();
        stmt.collect_targets(&mut targets);
        assert!(targets.is_empty());
    }

    #[test]
    fn json_form() {
        let stmt: Statement = serde_json::from_str(
            r#"{"if": {"cond": {"signal": 0}, "then_body": [{"assign": {"target": {"signal": 1}, "value": {"const": {"value": 1, "width": 1}}}}]}}"#,
        )
        .unwrap();
        assert_eq!(
            stmt,
            Statement::if_then(sig(0), vec![Statement::assign(sig(1), Expr::constant(1, 1))])
        );
    }
}
