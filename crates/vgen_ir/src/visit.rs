//! Read-only traversals over fragments and statement lists.

use crate::fragment::Fragment;
use crate::ids::SignalId;
use crate::special::{IoDirection, Special};
use crate::stmt::Statement;
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeSet, HashMap};

/// Every signal referenced by the fragment's statements and specials.
///
/// Clock domain signals are not included; the emitter adds the clocks of the
/// domains it actually uses.
pub fn list_signals(fragment: &Fragment) -> BTreeSet<SignalId> {
    let mut refs = Vec::new();
    for stmt in fragment.comb.iter().chain(fragment.sync.values().flatten()) {
        stmt.for_each_expr(&mut |e| e.collect_signals(&mut refs));
    }
    for special in &fragment.specials {
        for io in special.ios() {
            io.expr.collect_signals(&mut refs);
        }
    }
    refs.into_iter().collect()
}

/// Signals assigned by `stmts`, in order of first appearance.
pub fn list_targets(stmts: &[Statement]) -> Vec<SignalId> {
    let mut all = Vec::new();
    for stmt in stmts {
        stmt.collect_targets(&mut all);
    }
    let mut seen = BTreeSet::new();
    all.retain(|id| seen.insert(*id));
    all
}

/// Signals connected to special I/Os of the selected directions.
pub fn list_special_ios(
    specials: &[Special],
    ins: bool,
    outs: bool,
    inouts: bool,
) -> BTreeSet<SignalId> {
    let mut refs = Vec::new();
    for special in specials {
        for io in special.ios() {
            let wanted = match io.direction {
                IoDirection::In => ins,
                IoDirection::Out => outs,
                IoDirection::InOut => inouts,
            };
            if wanted {
                io.expr.collect_signals(&mut refs);
            }
        }
    }
    refs.into_iter().collect()
}

/// Every clock domain name the fragment depends on: sync lists, clock
/// references in expressions, and specials bound to a domain.
pub fn list_clock_domains(fragment: &Fragment) -> BTreeSet<String> {
    let mut domains: Vec<String> = fragment.sync.keys().cloned().collect();
    for stmt in fragment.comb.iter().chain(fragment.sync.values().flatten()) {
        stmt.for_each_expr(&mut |e| e.collect_domains(&mut domains));
    }
    for special in &fragment.specials {
        for io in special.ios() {
            io.expr.collect_domains(&mut domains);
        }
        domains.extend(special.clock_domains().into_iter().map(str::to_string));
    }
    domains.into_iter().collect()
}

/// A set of statements that share assignment targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementGroup {
    /// Union of the targets of all member statements.
    pub targets: BTreeSet<SignalId>,
    /// Indices of member statements, ascending.
    pub statements: Vec<usize>,
}

/// Partitions `stmts` into groups whose target sets are pairwise disjoint.
///
/// Two statements land in the same group when they are connected through a
/// chain of shared targets. Groups are ordered by their first statement.
pub fn group_by_targets(stmts: &[Statement]) -> Vec<StatementGroup> {
    let mut uf = UnionFind::<usize>::new(stmts.len());
    let mut owner: HashMap<SignalId, usize> = HashMap::new();
    let mut targets_of = Vec::with_capacity(stmts.len());
    for (i, stmt) in stmts.iter().enumerate() {
        let mut targets = Vec::new();
        stmt.collect_targets(&mut targets);
        for t in &targets {
            let first = *owner.entry(*t).or_insert(i);
            uf.union(first, i);
        }
        targets_of.push(targets);
    }

    let mut groups: Vec<StatementGroup> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for (i, targets) in targets_of.into_iter().enumerate() {
        let root = uf.find(i);
        let index = *slot.entry(root).or_insert_with(|| {
            groups.push(StatementGroup {
                targets: BTreeSet::new(),
                statements: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[index];
        group.targets.extend(targets);
        group.statements.push(i);
    }
    groups
}
