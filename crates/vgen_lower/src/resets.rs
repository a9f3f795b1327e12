//! Reset insertion.
//!
//! Clocked statements are never rewritten. Reset values reach the output as
//! declaration initializers of registers and as the default assignments at
//! the top of combinational procedural blocks, both produced by the emitter.
//! This pass only counts the registers whose reset travels that way.

use std::collections::BTreeSet;
use vgen_ir::{list_targets, Fragment, SignalId};

/// Returns the number of distinct registers assigned in any clocked list.
pub(crate) fn insert_resets(fragment: &Fragment) -> usize {
    let registers: BTreeSet<SignalId> = fragment
        .sync
        .values()
        .flat_map(|stmts| list_targets(stmts))
        .collect();
    registers.len()
}
