//! Basic-operator lowering.
//!
//! Resolves `ClockSignal` leaves to the clock of their domain and turns
//! `ArrayProxy` reads and writes into `case` statements over a fresh
//! variable. Running it twice changes nothing the second time.

use crate::error::LowerError;
use crate::rewrite::{map_children, rewrite_assign, ExprRewriter, RewriteCx};
use vgen_ir::{bits_for, CaseArm, Const, Expr, Signal, Statement};

/// Rewriter state with counters for the pass log.
#[derive(Default)]
pub(crate) struct BasicLowerer {
    pub clocks: usize,
    pub arrays: usize,
}

impl ExprRewriter for BasicLowerer {
    fn rewrite(
        &mut self,
        expr: Expr,
        target: bool,
        cx: &mut RewriteCx,
    ) -> Result<Expr, LowerError> {
        match expr {
            Expr::ClockSignal(name) => match cx.clock_domains.get(&name) {
                Some(cd) => {
                    self.clocks += 1;
                    Ok(Expr::signal(cd.clk))
                }
                None => Err(LowerError::UnresolvedClockDomain {
                    name,
                    available: cx.clock_domains.keys().cloned().collect(),
                }),
            },
            proxy @ Expr::ArrayProxy { .. } => self.lower_array(proxy, target, cx),
            e => map_children(e, target, &mut |c, t| self.rewrite(c, t, cx)),
        }
    }
}

impl BasicLowerer {
    fn lower_array(
        &mut self,
        proxy: Expr,
        target: bool,
        cx: &mut RewriteCx,
    ) -> Result<Expr, LowerError> {
        let shape = cx.shape(&proxy);
        let Expr::ArrayProxy { choices, key } = proxy else {
            return Ok(proxy);
        };
        if choices.is_empty() {
            return Err(LowerError::unsupported(&Expr::ArrayProxy { choices, key }));
        }
        self.arrays += 1;
        let muxed = cx.new_signal(Signal::with_shape(shape).at(&["array_muxed"]).variable());
        let muxed_expr = Expr::signal(muxed);

        let key = self.rewrite(*key, false, cx)?;
        let mut arms = Vec::with_capacity(choices.len());
        for (n, choice) in choices.into_iter().enumerate() {
            let body = if target {
                rewrite_assign(self, choice, muxed_expr.clone(), cx)?
            } else {
                vec![Statement::assign(
                    muxed_expr.clone(),
                    self.rewrite(choice, false, cx)?,
                )]
            };
            let n = n as i128;
            arms.push(CaseArm {
                value: Const::new(n, bits_for(n, false)),
                body,
            });
        }
        // the highest choice doubles as the fallback for out-of-range keys
        let default = arms.pop().map(|arm| arm.body);
        let case = Statement::Case {
            test: key,
            arms,
            default,
        };

        if target {
            cx.after.push(case);
        } else {
            cx.comb.push(case);
        }
        Ok(muxed_expr)
    }
}
