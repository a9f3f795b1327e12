//! Shared traversal for expression-rewriting passes.
//!
//! A pass implements [`ExprRewriter`] and hands it to [`rewrite_fragment`],
//! which walks comb lists, every sync list and special I/Os. Rewriters may
//! allocate signals, append combinational statements, and queue statements
//! that must run right after the assignment being rewritten.

use crate::error::LowerError;
use std::collections::BTreeMap;
use vgen_ir::{
    Arena, CaseArm, ClockDomain, Expr, Fragment, IoDirection, Shape, Signal, SignalId, Statement,
};

/// Mutable state shared by a rewriter during one fragment walk.
pub(crate) struct RewriteCx<'a> {
    pub signals: &'a mut Arena<SignalId, Signal>,
    pub clock_domains: &'a BTreeMap<String, ClockDomain>,
    /// Appended to the fragment's comb list after the walk.
    pub comb: Vec<Statement>,
    /// Spliced in after the assignment currently being rewritten.
    pub after: Vec<Statement>,
}

impl RewriteCx<'_> {
    pub fn shape(&self, expr: &Expr) -> Shape {
        expr.shape(self.signals)
    }

    pub fn new_signal(&mut self, signal: Signal) -> SignalId {
        self.signals.alloc(signal)
    }
}

pub(crate) trait ExprRewriter {
    /// Rewrites `expr`. `target` is set when the expression is assigned to.
    fn rewrite(
        &mut self,
        expr: Expr,
        target: bool,
        cx: &mut RewriteCx,
    ) -> Result<Expr, LowerError>;
}

/// Rebuilds `expr` with every direct child passed through `f`.
///
/// The flag handed to `f` is the target context of the child: slices and
/// concatenations forward it, array choices forward it, everything else
/// (including array keys) is read.
pub(crate) fn map_children(
    expr: Expr,
    target: bool,
    f: &mut impl FnMut(Expr, bool) -> Result<Expr, LowerError>,
) -> Result<Expr, LowerError> {
    Ok(match expr {
        e @ (Expr::Const(_) | Expr::Signal(_) | Expr::ClockSignal(_)) => e,
        Expr::Unary { op, operand } => Expr::unary(op, f(*operand, false)?),
        Expr::Binary { op, lhs, rhs } => Expr::binary(op, f(*lhs, false)?, f(*rhs, false)?),
        Expr::Mux {
            cond,
            then_val,
            else_val,
        } => Expr::mux(f(*cond, false)?, f(*then_val, false)?, f(*else_val, false)?),
        Expr::Slice { value, start, stop } => Expr::slice(f(*value, target)?, start, stop),
        Expr::Cat(parts) => Expr::cat(
            parts
                .into_iter()
                .map(|p| f(p, target))
                .collect::<Result<_, _>>()?,
        ),
        Expr::Replicate { value, count } => Expr::replicate(f(*value, false)?, count),
        Expr::ArrayProxy { choices, key } => {
            let choices = choices
                .into_iter()
                .map(|c| f(c, target))
                .collect::<Result<_, _>>()?;
            Expr::array(choices, f(*key, false)?)
        }
    })
}

/// Rewrites one assignment. Statements queued by the rewriter while visiting
/// it follow the assignment in the result.
pub(crate) fn rewrite_assign<R: ExprRewriter>(
    rw: &mut R,
    target: Expr,
    value: Expr,
    cx: &mut RewriteCx,
) -> Result<Vec<Statement>, LowerError> {
    let outer = std::mem::take(&mut cx.after);
    let target = rw.rewrite(target, true, cx)?;
    let value = rw.rewrite(value, false, cx)?;
    let mut out = vec![Statement::assign(target, value)];
    out.append(&mut cx.after);
    cx.after = outer;
    Ok(out)
}

/// Rewrites a statement list. Assignments may expand into several statements.
pub(crate) fn rewrite_stmts<R: ExprRewriter>(
    rw: &mut R,
    stmts: Vec<Statement>,
    cx: &mut RewriteCx,
) -> Result<Vec<Statement>, LowerError> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        match stmt {
            Statement::Assign { target, value } => {
                out.extend(rewrite_assign(rw, target, value, cx)?);
            }
            Statement::If {
                cond,
                then_body,
                else_body,
            } => out.push(Statement::If {
                cond: rw.rewrite(cond, false, cx)?,
                then_body: rewrite_stmts(rw, then_body, cx)?,
                else_body: rewrite_stmts(rw, else_body, cx)?,
            }),
            Statement::Case {
                test,
                arms,
                default,
            } => {
                let test = rw.rewrite(test, false, cx)?;
                let arms = arms
                    .into_iter()
                    .map(|arm| {
                        Ok(CaseArm {
                            value: arm.value,
                            body: rewrite_stmts(rw, arm.body, cx)?,
                        })
                    })
                    .collect::<Result<_, LowerError>>()?;
                let default = default.map(|d| rewrite_stmts(rw, d, cx)).transpose()?;
                out.push(Statement::Case {
                    test,
                    arms,
                    default,
                });
            }
            Statement::Block(body) => out.push(Statement::Block(rewrite_stmts(rw, body, cx)?)),
            Statement::Display { format, args } => out.push(Statement::Display {
                format,
                args: args
                    .into_iter()
                    .map(|a| rw.rewrite(a, false, cx))
                    .collect::<Result<_, _>>()?,
            }),
            s @ (Statement::Finish | Statement::Unsupported { .. }) => out.push(s),
        }
    }
    Ok(out)
}

/// Runs `rw` over the whole fragment.
///
/// Special outputs are rewritten in target context; anything queued for
/// them runs combinationally.
pub(crate) fn rewrite_fragment<R: ExprRewriter>(
    rw: &mut R,
    fragment: &mut Fragment,
) -> Result<(), LowerError> {
    let mut cx = RewriteCx {
        signals: &mut fragment.signals,
        clock_domains: &fragment.clock_domains,
        comb: Vec::new(),
        after: Vec::new(),
    };

    let comb = std::mem::take(&mut fragment.comb);
    let mut comb = rewrite_stmts(rw, comb, &mut cx)?;

    for stmts in fragment.sync.values_mut() {
        let taken = std::mem::take(stmts);
        *stmts = rewrite_stmts(rw, taken, &mut cx)?;
    }

    for special in &mut fragment.specials {
        for (direction, expr) in special.ios_mut() {
            let taken = std::mem::replace(expr, Expr::constant(0, 1));
            *expr = rw.rewrite(taken, direction == IoDirection::Out, &mut cx)?;
            cx.comb.append(&mut cx.after);
        }
    }

    comb.append(&mut cx.comb);
    fragment.comb = comb;
    Ok(())
}
