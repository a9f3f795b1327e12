//! Fragment IR for the vgen Verilog generator.
//!
//! A [`Fragment`] holds the signals, combinational and clocked statements,
//! clock domains and special primitives of one circuit. The lowering passes in
//! `vgen_lower` rewrite it in place and `vgen_verilog` renders the result.

#![warn(missing_docs)]

pub mod arena;
pub mod attribute;
pub mod expr;
pub mod fragment;
pub mod ids;
pub mod keywords;
pub mod signal;
pub mod special;
pub mod stmt;
pub mod visit;

pub use arena::{Arena, ArenaId};
pub use attribute::{AttrValue, Attribute};
pub use expr::{bits_for, BinaryOp, Const, Expr, Shape, UnaryOp};
pub use fragment::{ClockDomain, Fragment, IntoFragment};
pub use ids::{SignalId, SpecialId};
pub use keywords::{is_reserved_keyword, reserved_keywords, KEYWORDS};
pub use signal::Signal;
pub use special::{
    CustomSpecial, DdrOutput, Instance, InstanceParam, InstancePort, IoDirection, Memory,
    MemoryPort, MultiReg, ParamValue, PortMode, Special, SpecialIo, SpecialKind, Tristate,
};
pub use stmt::{CaseArm, Statement};
pub use visit::{
    group_by_targets, list_clock_domains, list_signals, list_special_ios, list_targets,
    StatementGroup,
};
