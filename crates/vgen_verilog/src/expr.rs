//! Expression rendering.

use crate::error::ConvertError;
use crate::namespace::Namespace;
use vgen_ir::{Arena, Const, Expr, Signal, SignalId, UnaryOp};

/// Renders expressions against a namespace.
#[derive(Clone, Copy)]
pub struct ExprPrinter<'a> {
    ns: &'a Namespace,
    signals: &'a Arena<SignalId, Signal>,
}

impl<'a> ExprPrinter<'a> {
    /// Creates a printer.
    pub fn new(ns: &'a Namespace, signals: &'a Arena<SignalId, Signal>) -> Self {
        Self { ns, signals }
    }

    /// The namespace names are taken from.
    pub fn namespace(&self) -> &'a Namespace {
        self.ns
    }

    /// The signal table shapes are taken from.
    pub fn signals(&self) -> &'a Arena<SignalId, Signal> {
        self.signals
    }

    /// Renders `expr` as Verilog source.
    pub fn render(&self, expr: &Expr) -> Result<String, ConvertError> {
        self.print(expr).map(|(text, _)| text)
    }

    /// Renders a constant.
    pub fn constant(&self, c: &Const) -> String {
        render_const(c)
    }

    /// Returns the text and whether the result is signed.
    fn print(&self, expr: &Expr) -> Result<(String, bool), ConvertError> {
        match expr {
            Expr::Const(c) => Ok((render_const(c), c.signed)),
            Expr::Signal(id) => {
                let signed = self
                    .signals
                    .try_get(*id)
                    .map(|s| s.signed)
                    .ok_or(ConvertError::UnnamedSignal(*id))?;
                Ok((self.ns.signal(*id)?.to_string(), signed))
            }
            Expr::Unary { op, operand } => {
                let (r, s) = self.print(operand)?;
                let (text, signed) = match op {
                    UnaryOp::Neg if !s => (format!("-{}", promote(&r)), true),
                    _ => (format!("{}{r}", op.symbol()), s),
                };
                Ok((format!("({text})"), signed))
            }
            Expr::Binary { op, lhs, rhs } => {
                let (mut r1, s1) = self.print(lhs)?;
                let (mut r2, s2) = self.print(rhs)?;
                if !op.is_shift() {
                    if s2 && !s1 {
                        r1 = promote(&r1);
                    }
                    if s1 && !s2 {
                        r2 = promote(&r2);
                    }
                }
                let signed = !op.is_comparison() && (s1 || s2);
                Ok((format!("({r1} {} {r2})", op.symbol()), signed))
            }
            Expr::Mux {
                cond,
                then_val,
                else_val,
            } => {
                let (r0, _) = self.print(cond)?;
                let (mut r1, s1) = self.print(then_val)?;
                let (mut r2, s2) = self.print(else_val)?;
                if s2 && !s1 {
                    r1 = promote(&r1);
                }
                if s1 && !s2 {
                    r2 = promote(&r2);
                }
                Ok((format!("({r0} ? {r1} : {r2})"), s1 || s2))
            }
            Expr::Slice { value, start, stop } => {
                let Expr::Signal(id) = value.as_ref() else {
                    return Err(ConvertError::unsupported(expr));
                };
                let width = self
                    .signals
                    .try_get(*id)
                    .map(|s| s.width)
                    .ok_or(ConvertError::UnnamedSignal(*id))?;
                let name = self.ns.signal(*id)?;
                // a 1-bit signal cannot be indexed
                if width == 1 && *start == 0 && *stop == 1 {
                    return Ok((name.to_string(), false));
                }
                if *stop <= *start || *stop > width {
                    return Err(ConvertError::unsupported(expr));
                }
                let range = if start + 1 == *stop {
                    format!("[{start}]")
                } else {
                    format!("[{}:{start}]", stop - 1)
                };
                Ok((format!("{name}{range}"), false))
            }
            Expr::Cat(parts) => {
                if parts.is_empty() {
                    return Err(ConvertError::unsupported(expr));
                }
                let rendered = parts
                    .iter()
                    .rev()
                    .map(|p| self.render(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((format!("{{{}}}", rendered.join(", ")), false))
            }
            Expr::Replicate { value, count } => {
                let r = self.render(value)?;
                Ok((format!("{{{count}{{{r}}}}}"), false))
            }
            Expr::ClockSignal(_) | Expr::ArrayProxy { .. } => Err(ConvertError::unsupported(expr)),
        }
    }
}

/// `W'dV` for unsigned constants, `W'sdV` for signed ones. Negative values are
/// written as their two's complement in `W` bits.
fn render_const(c: &Const) -> String {
    let width = c.width.max(1);
    let value = if width >= 128 {
        c.value as u128
    } else {
        (c.value as u128) & ((1u128 << width) - 1)
    };
    if c.signed {
        format!("{width}'sd{value}")
    } else {
        format!("{width}'d{value}")
    }
}

/// Zero-extends an unsigned operand by one bit and reinterprets it as signed.
fn promote(r: &str) -> String {
    format!("$signed({{1'd0, {r}}})")
}
