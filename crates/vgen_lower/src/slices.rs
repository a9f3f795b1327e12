//! Complex-slice lowering.
//!
//! Verilog only allows part-selects on named objects. A slice of anything
//! else is first narrowed through concatenations and replications; what
//! remains is either a signal, a whole expression, or gets a proxy signal.

use crate::error::LowerError;
use crate::rewrite::{map_children, rewrite_assign, ExprRewriter, RewriteCx};
use vgen_ir::{Arena, Expr, Signal, SignalId, Statement};

/// Rewriter state. `proxies` counts the slice proxy signals allocated.
#[derive(Default)]
pub(crate) struct SliceLowerer {
    pub proxies: usize,
}

impl ExprRewriter for SliceLowerer {
    fn rewrite(
        &mut self,
        expr: Expr,
        target: bool,
        cx: &mut RewriteCx,
    ) -> Result<Expr, LowerError> {
        match expr {
            slice @ Expr::Slice { .. } => self.lower_slice(slice, target, cx),
            e => map_children(e, target, &mut |c, t| self.rewrite(c, t, cx)),
        }
    }
}

impl SliceLowerer {
    fn lower_slice(
        &mut self,
        expr: Expr,
        target: bool,
        cx: &mut RewriteCx,
    ) -> Result<Expr, LowerError> {
        let Expr::Slice { start, stop, .. } = expr else {
            return Ok(expr);
        };
        if stop <= start || stop > slice_source_width(&expr, cx.signals) {
            return Err(LowerError::unsupported(&expr));
        }
        let length = stop - start;

        let mut node = expr;
        let mut start = 0;
        while let Expr::Slice { value, start: s, .. } = node {
            start += s;
            node = *value;
            loop {
                (node, start) = narrow_cat(node, start, length, cx.signals);
                let (narrowed, offset, progressed) =
                    narrow_replicate(node, start, length, cx.signals);
                node = narrowed;
                start = offset;
                if !progressed {
                    break;
                }
            }
        }

        if start == 0 && node.width(cx.signals) == length {
            return self.rewrite(node, target, cx);
        }
        if let Expr::Signal(_) = node {
            return Ok(Expr::slice(node, start, start + length));
        }

        let shape = cx.shape(&node);
        if shape.width == u32::MAX {
            // width saturated, no declarable proxy
            return Err(LowerError::unsupported(&node));
        }
        let proxy = cx.new_signal(Signal::with_shape(shape).at(&["slice_proxy"]));
        self.proxies += 1;
        let (t, v) = if target {
            (node, Expr::signal(proxy))
        } else {
            (Expr::signal(proxy), node)
        };
        let stmts: Vec<Statement> = rewrite_assign(self, t, v, cx)?;
        cx.comb.extend(stmts);
        Ok(Expr::slice(Expr::signal(proxy), start, start + length))
    }
}

fn slice_source_width(slice: &Expr, signals: &Arena<SignalId, Signal>) -> u32 {
    match slice {
        Expr::Slice { value, .. } => value.width(signals),
        other => other.width(signals),
    }
}

/// Descends into the concatenation part that holds all of
/// `start..start + length`, repeatedly.
fn narrow_cat(
    mut node: Expr,
    mut start: u32,
    length: u32,
    signals: &Arena<SignalId, Signal>,
) -> (Expr, u32) {
    while let Expr::Cat(mut parts) = node {
        let mut cat_start: u32 = 0;
        let mut found = None;
        for (i, part) in parts.iter().enumerate() {
            let w = part.width(signals);
            let cat_stop = cat_start.saturating_add(w);
            if cat_start <= start && start < cat_stop && cat_stop >= start + length {
                found = Some(i);
                break;
            }
            cat_start = cat_stop;
        }
        match found {
            Some(i) => {
                start -= cat_start;
                node = parts.swap_remove(i);
            }
            None => return (Expr::Cat(parts), start),
        }
    }
    (node, start)
}

/// Descends into the replicated value while the slice stays inside one
/// period. The flag reports whether anything was removed.
fn narrow_replicate(
    mut node: Expr,
    mut start: u32,
    length: u32,
    signals: &Arena<SignalId, Signal>,
) -> (Expr, u32, bool) {
    let mut progressed = false;
    while let Expr::Replicate { value, count } = node {
        let w = value.width(signals);
        if w == 0 || start / w != (start + length - 1) / w {
            return (Expr::Replicate { value, count }, start, progressed);
        }
        start %= w;
        node = *value;
        progressed = true;
    }
    (node, start, progressed)
}
