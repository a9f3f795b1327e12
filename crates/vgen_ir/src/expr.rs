//! Expression trees.
//!
//! [`Expr`] is an immutable tree built through the constructor functions on
//! this type. Lowering passes build new trees instead of editing shared ones.
//! [`Expr::shape`] gives the natural width and signedness of any expression.

use crate::arena::Arena;
use crate::ids::SignalId;
use crate::signal::Signal;
use serde::{Deserialize, Serialize};

/// Width and signedness of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    /// Width in bits.
    pub width: u32,
    /// Whether the value is two's complement.
    pub signed: bool,
}

impl Shape {
    /// An unsigned shape.
    pub fn unsigned(width: u32) -> Self {
        Self {
            width,
            signed: false,
        }
    }

    /// A signed shape.
    pub fn signed(width: u32) -> Self {
        Self {
            width,
            signed: true,
        }
    }
}

/// Minimum number of bits needed to represent `n`.
///
/// Negative numbers and `require_sign_bit` add room for a sign bit. Zero needs
/// one bit.
pub fn bits_for(n: i128, require_sign_bit: bool) -> u32 {
    let (magnitude, sign) = if n > 0 {
        // ceil(log2(n + 1)) is the bit length of n
        (128 - n.leading_zeros(), require_sign_bit)
    } else {
        // ceil(log2(-n)); zero and -1 need no magnitude bits
        let m = n.unsigned_abs();
        let bits = if m <= 1 { 0 } else { 128 - (m - 1).leading_zeros() };
        (bits, true)
    };
    magnitude + u32::from(sign)
}

/// A sized constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Const {
    /// The value. Negative values only make sense for signed constants.
    pub value: i128,
    /// Width in bits.
    pub width: u32,
    /// Signedness.
    #[serde(default)]
    pub signed: bool,
}

impl Const {
    /// An unsigned constant of explicit width.
    pub fn new(value: i128, width: u32) -> Self {
        Self {
            value,
            width,
            signed: false,
        }
    }

    /// A constant sized to fit its value; negative values become signed.
    pub fn natural(value: i128) -> Self {
        Self {
            value,
            width: bits_for(value, false),
            signed: value < 0,
        }
    }

    /// Shape of the constant.
    pub fn shape(&self) -> Shape {
        Shape {
            width: self.width,
            signed: self.signed,
        }
    }
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise NOT (`~`).
    Not,
    /// Arithmetic negation (`-`).
    Neg,
}

impl UnaryOp {
    /// The Verilog operator token.
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "~",
            UnaryOp::Neg => "-",
        }
    }
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Arithmetic left shift.
    Shl,
    /// Arithmetic right shift.
    Shr,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

impl BinaryOp {
    /// The Verilog operator token.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Shl => "<<<",
            BinaryOp::Shr => ">>>",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    /// Shifts keep the signedness of the left operand and never promote.
    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }

    /// Comparisons produce a single unsigned bit.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A sized constant.
    Const(Const),
    /// A whole signal.
    Signal(SignalId),
    /// The clock of a named domain, resolved by basic lowering.
    ClockSignal(String),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `cond ? then_val : else_val`.
    Mux {
        /// Selector.
        cond: Box<Expr>,
        /// Value when the selector is non-zero.
        then_val: Box<Expr>,
        /// Value when the selector is zero.
        else_val: Box<Expr>,
    },
    /// Bits `start..stop` (half-open, LSB is bit 0).
    Slice {
        /// The sliced value.
        value: Box<Expr>,
        /// First bit.
        start: u32,
        /// One past the last bit.
        stop: u32,
    },
    /// Concatenation, least significant part first.
    Cat(Vec<Expr>),
    /// `count` copies of `value`.
    Replicate {
        /// The repeated value.
        value: Box<Expr>,
        /// Number of repetitions.
        count: u32,
    },
    /// `choices[key]`, resolved by basic lowering.
    ArrayProxy {
        /// Candidate values.
        choices: Vec<Expr>,
        /// Index expression.
        key: Box<Expr>,
    },
}

impl Expr {
    /// A whole-signal reference.
    pub fn signal(id: SignalId) -> Self {
        Expr::Signal(id)
    }

    /// An unsigned constant of explicit width.
    pub fn constant(value: i128, width: u32) -> Self {
        Expr::Const(Const::new(value, width))
    }

    /// The clock of a domain.
    pub fn clock(domain: impl Into<String>) -> Self {
        Expr::ClockSignal(domain.into())
    }

    /// Bits `start..stop` of `value`.
    pub fn slice(value: Expr, start: u32, stop: u32) -> Self {
        Expr::Slice {
            value: Box::new(value),
            start,
            stop,
        }
    }

    /// Bit `index` of `value`.
    pub fn bit(value: Expr, index: u32) -> Self {
        Self::slice(value, index, index + 1)
    }

    /// Concatenation, least significant part first.
    pub fn cat(parts: Vec<Expr>) -> Self {
        Expr::Cat(parts)
    }

    /// `count` copies of `value`.
    pub fn replicate(value: Expr, count: u32) -> Self {
        Expr::Replicate {
            value: Box::new(value),
            count,
        }
    }

    /// `choices[key]`.
    pub fn array(choices: Vec<Expr>, key: Expr) -> Self {
        Expr::ArrayProxy {
            choices,
            key: Box::new(key),
        }
    }

    /// `cond ? then_val : else_val`.
    pub fn mux(cond: Expr, then_val: Expr, else_val: Expr) -> Self {
        Expr::Mux {
            cond: Box::new(cond),
            then_val: Box::new(then_val),
            else_val: Box::new(else_val),
        }
    }

    /// A unary operation.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// A binary operation.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `lhs & rhs`.
    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::And, lhs, rhs)
    }

    /// `lhs | rhs`.
    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Or, lhs, rhs)
    }

    /// `lhs + rhs`.
    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Add, lhs, rhs)
    }

    /// `lhs == rhs`.
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Eq, lhs, rhs)
    }

    /// `~operand`.
    pub fn not(operand: Expr) -> Self {
        Self::unary(UnaryOp::Not, operand)
    }

    /// Natural width and signedness of the expression. Widths saturate at
    /// `u32::MAX`.
    ///
    /// # Panics
    ///
    /// Panics on a signal ID that is not part of `signals`.
    pub fn shape(&self, signals: &Arena<SignalId, Signal>) -> Shape {
        match self {
            Expr::Const(c) => c.shape(),
            Expr::Signal(id) => signals[*id].shape(),
            Expr::ClockSignal(_) => Shape::unsigned(1),
            Expr::Unary { op, operand } => {
                let s = operand.shape(signals);
                match op {
                    UnaryOp::Not => s,
                    UnaryOp::Neg if s.signed => s,
                    UnaryOp::Neg => Shape::signed(s.width.saturating_add(1)),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                binary_shape(*op, lhs.shape(signals), rhs.shape(signals))
            }
            Expr::Mux {
                then_val, else_val, ..
            } => bitwise_shape(then_val.shape(signals), else_val.shape(signals)),
            Expr::Slice { start, stop, .. } => Shape::unsigned(stop.saturating_sub(*start)),
            Expr::Cat(parts) => Shape::unsigned(
                parts
                    .iter()
                    .fold(0u32, |w, p| w.saturating_add(p.shape(signals).width)),
            ),
            Expr::Replicate { value, count } => {
                Shape::unsigned(value.shape(signals).width.saturating_mul(*count))
            }
            Expr::ArrayProxy { choices, .. } => choices
                .iter()
                .map(|c| c.shape(signals))
                .reduce(bitwise_shape)
                .unwrap_or(Shape::unsigned(1)),
        }
    }

    /// Width of the expression.
    pub fn width(&self, signals: &Arena<SignalId, Signal>) -> u32 {
        self.shape(signals).width
    }

    /// Returns the signal ID when the expression is a whole signal.
    pub fn as_signal(&self) -> Option<SignalId> {
        match self {
            Expr::Signal(id) => Some(*id),
            _ => None,
        }
    }

    /// Calls `f` on every direct child expression.
    pub fn for_each_child(&self, mut f: impl FnMut(&Expr)) {
        match self {
            Expr::Const(_) | Expr::Signal(_) | Expr::ClockSignal(_) => {}
            Expr::Unary { operand, .. } => f(operand),
            Expr::Binary { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            Expr::Mux {
                cond,
                then_val,
                else_val,
            } => {
                f(cond);
                f(then_val);
                f(else_val);
            }
            Expr::Slice { value, .. } | Expr::Replicate { value, .. } => f(value),
            Expr::Cat(parts) => parts.iter().for_each(f),
            Expr::ArrayProxy { choices, key } => {
                choices.iter().for_each(&mut f);
                f(key);
            }
        }
    }

    /// Collects every signal read or written by the expression.
    pub fn collect_signals(&self, out: &mut Vec<SignalId>) {
        if let Expr::Signal(id) = self {
            out.push(*id);
        }
        self.for_each_child(|child| child.collect_signals(out));
    }

    /// Collects the signals written when the expression is an assignment target.
    ///
    /// Array keys are read, not written, and are skipped.
    pub fn collect_targets(&self, out: &mut Vec<SignalId>) {
        match self {
            Expr::Signal(id) => out.push(*id),
            Expr::Slice { value, .. } => value.collect_targets(out),
            Expr::Cat(parts) => parts.iter().for_each(|p| p.collect_targets(out)),
            Expr::ArrayProxy { choices, .. } => {
                choices.iter().for_each(|c| c.collect_targets(out))
            }
            _ => {}
        }
    }

    /// Collects the clock domains named by `ClockSignal` leaves.
    pub fn collect_domains(&self, out: &mut Vec<String>) {
        if let Expr::ClockSignal(domain) = self {
            out.push(domain.clone());
        }
        self.for_each_child(|child| child.collect_domains(out));
    }

    /// Whether an assignment target updates immediately.
    ///
    /// Returns `None` for non-lvalues and for concatenations mixing variables
    /// and non-variables.
    pub fn is_variable(&self, signals: &Arena<SignalId, Signal>) -> Option<bool> {
        match self {
            Expr::Signal(id) => Some(signals[*id].variable),
            Expr::Slice { value, .. } => value.is_variable(signals),
            Expr::Cat(parts) => {
                let mut kinds = parts.iter().map(|p| p.is_variable(signals));
                let first = kinds.next()??;
                for kind in kinds {
                    if kind? != first {
                        return None;
                    }
                }
                Some(first)
            }
            _ => None,
        }
    }
}

/// Shape of `a op b` where `op` is bitwise: mixed signedness gives the
/// unsigned side an extra bit.
fn bitwise_shape(a: Shape, b: Shape) -> Shape {
    match (a.signed, b.signed) {
        (false, false) => Shape::unsigned(a.width.max(b.width)),
        (true, true) => Shape::signed(a.width.max(b.width)),
        (false, true) => Shape::signed(a.width.saturating_add(1).max(b.width)),
        (true, false) => Shape::signed(a.width.max(b.width.saturating_add(1))),
    }
}

fn binary_shape(op: BinaryOp, a: Shape, b: Shape) -> Shape {
    match op {
        BinaryOp::Add | BinaryOp::Sub => {
            let w = bitwise_shape(a, b);
            Shape {
                width: w.width.saturating_add(1),
                signed: w.signed,
            }
        }
        BinaryOp::Mul => Shape {
            width: a.width.saturating_add(b.width),
            signed: a.signed || b.signed,
        },
        BinaryOp::Shl => {
            // worst case shift by the largest value representable in b
            let extra = if b.width >= 32 {
                u32::MAX - a.width
            } else {
                (1u32 << b.width) - 1
            };
            Shape {
                width: a.width.saturating_add(extra),
                signed: a.signed,
            }
        }
        BinaryOp::Shr => a,
        BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => bitwise_shape(a, b),
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => Shape::unsigned(1),
    }
}
